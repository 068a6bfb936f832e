//! Waveform resampling
//!
//! Recordings produce a variable number of level readings. Rendering and
//! storage need a fixed number of bars, so the readings are either reduced
//! with Largest-Triangle-Three-Buckets (which keeps loud transients visible)
//! or stretched by repeating each reading over a bucket.
//!
//! See Sveinn Steinarsson, "Downsampling Time Series for Visual
//! Representation" for the LTTB algorithm.

use log::warn;

/// Resample `data` to exactly `target_size` values.
///
/// Returns the input unchanged when it already has the requested length.
pub fn resample(data: &[f64], target_size: usize) -> Vec<f64> {
    match data.len().cmp(&target_size) {
        std::cmp::Ordering::Equal => data.to_vec(),
        std::cmp::Ordering::Greater => downsample(data, target_size),
        std::cmp::Ordering::Less => upsample(data, target_size),
    }
}

/// Reduce `data` to `target_size` points with LTTB.
///
/// The first and last readings are always kept.
pub fn downsample(data: &[f64], target_size: usize) -> Vec<f64> {
    if target_size == 0 || data.len() <= target_size {
        return data.to_vec();
    }

    if target_size == 1 {
        return vec![mean(data)];
    }

    let last = data.len() - 1;
    if target_size == 2 {
        return vec![data[0], data[last]];
    }

    // First and last points are fixed, so only the interior is bucketed
    let bucket_size = (data.len() - 2) as f64 / (target_size - 2) as f64;

    let mut result = Vec::with_capacity(target_size);
    result.push(data[0]);
    let mut anchor_index = 0;

    for bucket in 1..target_size - 1 {
        let anchor = data[anchor_index];
        let next_mean = next_bucket_mean(data, bucket, bucket_size);

        let start = bucket_start(bucket - 1, bucket_size);
        let end = bucket_start(bucket, bucket_size).min(last).max(start + 1);
        let units_a_to_c = (1 + end - start) as f64;

        let mut max_area = -1.0;
        let mut selected = start;

        for index in start..end {
            let value = data[index];
            let units_a_to_b = (index - start + 1) as f64;
            let units_b_to_c = units_a_to_c - units_a_to_b;

            let area = heron_area(
                side(anchor - value, units_a_to_b),
                side(value - next_mean, units_b_to_c),
                side(anchor - next_mean, units_a_to_c),
            );

            if area > max_area {
                max_area = area;
                selected = index;
            }
        }

        result.push(data[selected]);
        anchor_index = selected;
    }

    result.push(data[last]);
    result
}

/// Stretch `values` to `target_size` by repeating each value over a bucket.
///
/// The remainder of the division is spread over the earliest values, one
/// extra copy each.
pub fn upsample(values: &[f64], target_size: usize) -> Vec<f64> {
    if values.is_empty() {
        warn!("Cannot extend empty array of amplitudes");
        return values.to_vec();
    }

    if values.len() > target_size {
        warn!(
            "Requested to extend waveform data of length {} to shorter size {}",
            values.len(),
            target_size
        );
        return values.to_vec();
    }

    if values.len() == target_size {
        return values.to_vec();
    }

    let bucket_size = target_size / values.len();
    let remainder = target_size % values.len();

    let mut result = Vec::with_capacity(target_size);
    for (i, &value) in values.iter().enumerate() {
        let extra = usize::from(i < remainder);
        result.extend(std::iter::repeat(value).take(bucket_size + extra));
    }
    result
}

fn bucket_start(bucket: usize, bucket_size: f64) -> usize {
    (bucket as f64 * bucket_size).floor() as usize + 1
}

fn next_bucket_mean(data: &[f64], bucket: usize, bucket_size: f64) -> f64 {
    let start = bucket_start(bucket, bucket_size).min(data.len() - 1);
    let end = bucket_start(bucket + 1, bucket_size).min(data.len());
    if start >= end {
        return data[data.len() - 1];
    }
    mean(&data[start..end])
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Distance combining the amplitude delta with the index distance
fn side(amplitude_delta: f64, units: f64) -> f64 {
    amplitude_delta.hypot(units)
}

fn heron_area(a: f64, b: f64, c: f64) -> f64 {
    let s = (a + b + c) / 2.0;
    // Rounding can push degenerate triangles slightly negative
    (s * (s - a) * (s - b) * (s - c)).max(0.0).sqrt()
}
