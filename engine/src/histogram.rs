//! FILENAME: engine/src/histogram.rs
//! PURPOSE: Fixed-width histogram of a numeric stream.
//! CONTEXT: Buckets are centred on multiples of the width: a value lands in
//! bucket `floor(v / width + 0.5)`, whose centre is `index * width`.

use std::collections::BTreeMap;

use log::debug;

use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone)]
pub struct Histogram {
    width: f64,
    buckets: BTreeMap<i64, u64>,
}

impl Histogram {
    /// `width` must be finite and strictly positive.
    pub fn new(width: f64) -> EngineResult<Self> {
        if !width.is_finite() || width <= 0.0 {
            return Err(EngineError::construction(
                width.to_string(),
                "bucket width must be a finite number greater than zero",
            ));
        }
        Ok(Histogram {
            width,
            buckets: BTreeMap::new(),
        })
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    /// Counts `value` in its bucket. Non-finite values are ignored.
    pub fn put(&mut self, value: f64) {
        if !value.is_finite() {
            debug!("histogram ignores non-finite value {}", value);
            return;
        }
        let index = (value / self.width + 0.5).floor() as i64;
        *self.buckets.entry(index).or_insert(0) += 1;
    }

    /// `(centre, count)` pairs in ascending centre order.
    pub fn buckets(&self) -> impl Iterator<Item = (f64, u64)> + '_ {
        self.buckets
            .iter()
            .map(move |(&index, &count)| (index as f64 * self.width, count))
    }

    /// Total number of counted values.
    pub fn total(&self) -> u64 {
        self.buckets.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_degenerate_widths() {
        for width in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                Histogram::new(width),
                Err(EngineError::Construction { .. })
            ));
        }
    }

    #[test]
    fn values_round_to_nearest_centre() {
        let mut h = Histogram::new(1.0).unwrap();
        for v in [0.2, 0.4, 0.5, 1.49, -0.5, -0.51] {
            h.put(v);
        }
        let buckets: Vec<_> = h.buckets().collect();
        assert_eq!(buckets, vec![(-1.0, 1), (0.0, 3), (1.0, 2)]);
        assert_eq!(h.total(), 6);
    }

    #[test]
    fn centres_scale_with_width() {
        let mut h = Histogram::new(2.5).unwrap();
        h.put(6.0);
        h.put(4.0);
        h.put(100.0);
        let buckets: Vec<_> = h.buckets().collect();
        assert_eq!(buckets, vec![(5.0, 2), (100.0, 1)]);
    }

    #[test]
    fn ignores_non_finite_values() {
        let mut h = Histogram::new(1.0).unwrap();
        h.put(f64::NAN);
        h.put(f64::INFINITY);
        assert_eq!(h.total(), 0);
    }
}
