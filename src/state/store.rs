//! Observable state container
//!
//! Rendering layers subscribe to published state and read the latest value.
//! Backed by a `tokio::sync::watch` channel so subscribers are woken on every
//! change without the producer ever blocking.

use tokio::sync::watch;

/// Holds the latest value of some published state
pub struct StateStore<T> {
    sender: watch::Sender<T>,
}

impl<T> StateStore<T> {
    pub fn new(initial: T) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// Subscribe to changes; the receiver starts at the current value
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.sender.subscribe()
    }

    /// Replace the whole value
    pub fn next(&self, value: T) {
        self.sender.send_replace(value);
    }

    /// Derive the next value from the current one
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        self.sender.send_modify(|value| *value = f(value));
    }

    /// Like [`update`](Self::update), but `f` may decline by returning `None`.
    ///
    /// `f` runs under the write lock, so whatever it checks cannot change
    /// before the new value lands. Subscribers are only woken on a write.
    pub fn update_if(&self, f: impl FnOnce(&T) -> Option<T>) -> bool {
        self.sender.send_if_modified(|value| match f(value) {
            Some(next) => {
                *value = next;
                true
            }
            None => false,
        })
    }

    /// Read a projection of the current value without cloning all of it
    pub fn select<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.sender.borrow())
    }
}

impl<T: Clone> StateStore<T> {
    pub fn get_latest(&self) -> T {
        self.sender.borrow().clone()
    }
}

impl<T: Default> Default for StateStore<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
