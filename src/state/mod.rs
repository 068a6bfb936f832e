//! Published state shared with rendering layers

mod store;

pub use store::StateStore;
