//! FILENAME: engine/src/aggregator.rs
//! PURPOSE: Incremental numeric reducers and the factory that builds them.
//! CONTEXT: Every metric cell of a group-by or pivot table is backed by one
//! `Aggregator`. Values are fed one at a time with `put` and the result is
//! read with `get`; no aggregator ever forgets a value.
//!
//! KINDS:
//! - `count`, `sum`, `mean`, `min`, `max`
//! - `stdev`: sample standard deviation, single-pass (Welford)
//! - `ci_gauss <level>`: width of the Gaussian confidence interval of the mean
//!
//! Under-populated statistics (`mean` with no values, `stdev` and `ci_gauss`
//! with fewer than two) read as NaN from `get`; `try_get` reports them as
//! `None` so callers can turn them into errors.

use std::fmt;

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::{EngineError, EngineResult};

// ============================================================================
// AGGREGATOR SPEC (FACTORY)
// ============================================================================

/// A validated aggregator construction string.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AggregatorSpec {
    Count,
    Sum,
    Mean,
    Min,
    Max,
    StdDev,
    /// Confidence level in the open interval (0, 1).
    ConfidenceInterval(f64),
}

impl AggregatorSpec {
    /// Parses a construction string such as `"sum"` or `"ci_gauss 0.95"`.
    pub fn parse(input: &str) -> EngineResult<Self> {
        let call = parser::parse_aggregator(input)
            .map_err(|e| EngineError::construction(input, e.message))?;
        Self::from_call(&call).map_err(|reason| EngineError::construction(input, reason))
    }

    /// Maps a parsed call to a known kind, checking its parameters.
    pub fn from_call(call: &parser::AggregatorCall) -> Result<Self, String> {
        let simple = match call.keyword.as_str() {
            "count" => Some(AggregatorSpec::Count),
            "sum" => Some(AggregatorSpec::Sum),
            "mean" => Some(AggregatorSpec::Mean),
            "min" => Some(AggregatorSpec::Min),
            "max" => Some(AggregatorSpec::Max),
            "stdev" => Some(AggregatorSpec::StdDev),
            _ => None,
        };

        if let Some(spec) = simple {
            if !call.args.is_empty() {
                return Err(format!("\"{}\" takes no parameters", call.keyword));
            }
            return Ok(spec);
        }

        match call.keyword.as_str() {
            "ci_gauss" => match call.args.as_slice() {
                [level] if *level > 0.0 && *level < 1.0 => {
                    Ok(AggregatorSpec::ConfidenceInterval(*level))
                }
                [level] => Err(format!(
                    "confidence level {} is outside the open interval (0, 1)",
                    level
                )),
                _ => Err("\"ci_gauss\" takes exactly one confidence level".to_string()),
            },
            other => Err(format!("unknown aggregator \"{}\"", other)),
        }
    }

    /// Builds a fresh aggregator of this kind.
    pub fn build(&self) -> Aggregator {
        match *self {
            AggregatorSpec::Count => Aggregator::Count(Count::default()),
            AggregatorSpec::Sum => Aggregator::Sum(Sum::default()),
            AggregatorSpec::Mean => Aggregator::Mean(Mean::default()),
            AggregatorSpec::Min => Aggregator::Min(Min::default()),
            AggregatorSpec::Max => Aggregator::Max(Max::default()),
            AggregatorSpec::StdDev => Aggregator::StdDev(StdDev::default()),
            AggregatorSpec::ConfidenceInterval(level) => {
                Aggregator::ConfidenceInterval(ConfidenceInterval::new(level))
            }
        }
    }
}

/// Canonical construction string, used in metric keys.
impl fmt::Display for AggregatorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregatorSpec::Count => write!(f, "count"),
            AggregatorSpec::Sum => write!(f, "sum"),
            AggregatorSpec::Mean => write!(f, "mean"),
            AggregatorSpec::Min => write!(f, "min"),
            AggregatorSpec::Max => write!(f, "max"),
            AggregatorSpec::StdDev => write!(f, "stdev"),
            AggregatorSpec::ConfidenceInterval(level) => write!(f, "ci_gauss {}", level),
        }
    }
}

/// Shorthand for `AggregatorSpec::parse(input)?.build()`.
pub fn create_from_string(input: &str) -> EngineResult<Aggregator> {
    Ok(AggregatorSpec::parse(input)?.build())
}

// ============================================================================
// REDUCERS
// ============================================================================

/// Number of values put.
#[derive(Debug, Clone, Default)]
pub struct Count {
    count: u64,
}

impl Count {
    pub fn put(&mut self, _value: f64) {
        self.count += 1;
    }

    pub fn get(&self) -> f64 {
        self.count as f64
    }

    pub fn observations(&self) -> u64 {
        self.count
    }
}

/// Running total.
#[derive(Debug, Clone, Default)]
pub struct Sum {
    sum: f64,
}

impl Sum {
    pub fn put(&mut self, value: f64) {
        self.sum += value;
    }

    pub fn get(&self) -> f64 {
        self.sum
    }
}

/// `sum / count`.
#[derive(Debug, Clone, Default)]
pub struct Mean {
    sum: Sum,
    count: Count,
}

impl Mean {
    pub fn put(&mut self, value: f64) {
        self.sum.put(value);
        self.count.put(value);
    }

    pub fn get(&self) -> f64 {
        if self.count.observations() == 0 {
            return f64::NAN;
        }
        self.sum.get() / self.count.get()
    }
}

/// Smallest value seen; +inf before the first value.
#[derive(Debug, Clone)]
pub struct Min {
    min: f64,
}

impl Default for Min {
    fn default() -> Self {
        Min { min: f64::INFINITY }
    }
}

impl Min {
    pub fn put(&mut self, value: f64) {
        if value < self.min {
            self.min = value;
        }
    }

    pub fn get(&self) -> f64 {
        self.min
    }
}

/// Largest value seen; -inf before the first value.
#[derive(Debug, Clone)]
pub struct Max {
    max: f64,
}

impl Default for Max {
    fn default() -> Self {
        Max {
            max: f64::NEG_INFINITY,
        }
    }
}

impl Max {
    pub fn put(&mut self, value: f64) {
        if value > self.max {
            self.max = value;
        }
    }

    pub fn get(&self) -> f64 {
        self.max
    }
}

/// Sample standard deviation over a single pass.
///
/// Keeps the running mean `a`, the sum of squared deviations `q` and the
/// count `k`. Each value updates them as
/// `a' = a + (v - a) / (k + 1)`, `q' = q + (v - a) * (v - a')`.
#[derive(Debug, Clone, Default)]
pub struct StdDev {
    a: f64,
    q: f64,
    k: u64,
}

impl StdDev {
    pub fn put(&mut self, value: f64) {
        let k = self.k as f64;
        let new_a = self.a + (value - self.a) / (k + 1.0);
        let new_q = self.q + (value - self.a) * (value - new_a);
        self.a = new_a;
        self.q = new_q;
        self.k += 1;
    }

    /// `sqrt(q / (k - 1))`; NaN below two values.
    pub fn get(&self) -> f64 {
        if self.k < 2 {
            return f64::NAN;
        }
        (self.q / (self.k as f64 - 1.0)).sqrt()
    }

    pub fn observations(&self) -> u64 {
        self.k
    }
}

/// Width of the central `level` interval of Normal(mean, stdev / sqrt(count)).
#[derive(Debug, Clone)]
pub struct ConfidenceInterval {
    level: f64,
    count: Count,
    mean: Mean,
    stdev: StdDev,
}

impl ConfidenceInterval {
    pub fn new(level: f64) -> Self {
        ConfidenceInterval {
            level,
            count: Count::default(),
            mean: Mean::default(),
            stdev: StdDev::default(),
        }
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn put(&mut self, value: f64) {
        self.count.put(value);
        self.mean.put(value);
        self.stdev.put(value);
    }

    pub fn get(&self) -> f64 {
        if self.count.observations() < 2 {
            return f64::NAN;
        }

        let sigma = self.stdev.get() / self.count.get().sqrt();
        if sigma == 0.0 {
            // Degenerate distribution: every value was identical.
            return 0.0;
        }

        let lower_p = (1.0 - self.level) * 0.5;
        let upper_p = lower_p + self.level;
        match Normal::new(self.mean.get(), sigma) {
            Ok(dist) => dist.inverse_cdf(upper_p) - dist.inverse_cdf(lower_p),
            Err(_) => f64::NAN,
        }
    }
}

// ============================================================================
// AGGREGATOR
// ============================================================================

/// A live reducer of one of the supported kinds.
#[derive(Debug, Clone)]
pub enum Aggregator {
    Count(Count),
    Sum(Sum),
    Mean(Mean),
    Min(Min),
    Max(Max),
    StdDev(StdDev),
    ConfidenceInterval(ConfidenceInterval),
}

impl Aggregator {
    /// Adds a value to the distribution.
    pub fn put(&mut self, value: f64) {
        match self {
            Aggregator::Count(a) => a.put(value),
            Aggregator::Sum(a) => a.put(value),
            Aggregator::Mean(a) => a.put(value),
            Aggregator::Min(a) => a.put(value),
            Aggregator::Max(a) => a.put(value),
            Aggregator::StdDev(a) => a.put(value),
            Aggregator::ConfidenceInterval(a) => a.put(value),
        }
    }

    /// Current aggregated value. Under-populated statistics read as NaN.
    pub fn get(&self) -> f64 {
        match self {
            Aggregator::Count(a) => a.get(),
            Aggregator::Sum(a) => a.get(),
            Aggregator::Mean(a) => a.get(),
            Aggregator::Min(a) => a.get(),
            Aggregator::Max(a) => a.get(),
            Aggregator::StdDev(a) => a.get(),
            Aggregator::ConfidenceInterval(a) => a.get(),
        }
    }

    /// Like `get`, but `None` when the kind needs more values than it has seen.
    pub fn try_get(&self) -> Option<f64> {
        let enough = match self {
            Aggregator::Mean(a) => a.count.observations() >= 1,
            Aggregator::StdDev(a) => a.observations() >= 2,
            Aggregator::ConfidenceInterval(a) => a.count.observations() >= 2,
            _ => true,
        };
        enough.then(|| self.get())
    }

    /// Values seen so far, for the kinds that track it.
    pub fn observations(&self) -> Option<u64> {
        match self {
            Aggregator::Count(a) => Some(a.observations()),
            Aggregator::Mean(a) => Some(a.count.observations()),
            Aggregator::StdDev(a) => Some(a.observations()),
            Aggregator::ConfidenceInterval(a) => Some(a.count.observations()),
            _ => None,
        }
    }

    /// The kind name, as used in construction strings.
    pub fn name(&self) -> &'static str {
        match self {
            Aggregator::Count(_) => "count",
            Aggregator::Sum(_) => "sum",
            Aggregator::Mean(_) => "mean",
            Aggregator::Min(_) => "min",
            Aggregator::Max(_) => "max",
            Aggregator::StdDev(_) => "stdev",
            Aggregator::ConfidenceInterval(_) => "ci_gauss",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TOLERANCE: f64 = 0.01;

    fn feed(spec: &str, values: &[f64]) -> Aggregator {
        let mut aggregator = create_from_string(spec).unwrap();
        for &v in values {
            aggregator.put(v);
        }
        aggregator
    }

    #[test]
    fn count_counts_puts() {
        assert_eq!(feed("count", &[1.0; 5]).get(), 5.0);
    }

    #[test]
    fn sum_of_equal_elements() {
        assert_eq!(feed("sum", &[1.0; 5]).get(), 5.0);
    }

    #[test]
    fn mean_of_small_set() {
        assert!((feed("mean", &[1.0, 2.0, 3.0, 4.0]).get() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn min_and_max_start_at_infinities() {
        assert_eq!(feed("min", &[]).get(), f64::INFINITY);
        assert_eq!(feed("max", &[]).get(), f64::NEG_INFINITY);
        assert_eq!(feed("min", &[3.0, -1.0, 2.0]).get(), -1.0);
        assert_eq!(feed("max", &[3.0, -1.0, 2.0]).get(), 3.0);
    }

    #[test]
    fn stdev_matches_reference_sample() {
        let stdev = feed("stdev", &[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).get();
        assert!((stdev - 2.138089935).abs() < TOLERANCE);
    }

    #[test]
    fn stdev_is_stable_for_large_offsets() {
        let values: Vec<f64> = [4.0, 7.0, 13.0, 16.0].iter().map(|v| v + 1e9).collect();
        let stdev = feed("stdev", &values).get();
        assert!((stdev - 30.0_f64.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn underpopulated_statistics_read_as_nan() {
        assert!(feed("mean", &[]).get().is_nan());
        assert!(feed("stdev", &[]).get().is_nan());
        assert!(feed("stdev", &[1.0]).get().is_nan());
        assert!(feed("ci_gauss 0.95", &[1.0]).get().is_nan());
    }

    #[test]
    fn try_get_reports_underpopulated_statistics() {
        assert_eq!(feed("mean", &[]).try_get(), None);
        assert_eq!(feed("stdev", &[1.0]).try_get(), None);
        assert_eq!(feed("ci_gauss 0.9", &[1.0]).try_get(), None);
        assert_eq!(feed("stdev", &[1.0, 3.0]).try_get(), Some(2.0_f64.sqrt()));
        assert_eq!(feed("min", &[]).try_get(), Some(f64::INFINITY));
    }

    #[test]
    fn confidence_interval_width_matches_normal_quantiles() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let width = feed("ci_gauss 0.95", &values).get();
        // 2 * z(0.975) * s / sqrt(n)
        let expected = 2.0 * 1.959964 * 2.138089935 / 8.0_f64.sqrt();
        assert!((width - expected).abs() < TOLERANCE);
    }

    #[test]
    fn confidence_interval_of_constant_values_is_zero() {
        assert_eq!(feed("ci_gauss 0.5", &[3.0, 3.0, 3.0]).get(), 0.0);
    }

    #[test]
    fn factory_recognizes_all_kinds() {
        for (input, name) in [
            ("count", "count"),
            ("sum", "sum"),
            ("mean", "mean"),
            ("min", "min"),
            ("max", "max"),
            ("stdev", "stdev"),
            ("ci_gauss 0.95", "ci_gauss"),
        ] {
            assert_eq!(create_from_string(input).unwrap().name(), name);
        }
    }

    #[test]
    fn factory_rejects_unknown_and_malformed_strings() {
        for input in [
            "",
            "median",
            "Sum",
            "sum 3",
            "ci_gauss",
            "ci_gauss x",
            "ci_gauss 0.5 0.6",
            "ci_gauss 1.5",
            "ci_gauss 0",
        ] {
            let err = AggregatorSpec::parse(input).unwrap_err();
            assert!(
                matches!(err, EngineError::Construction { .. }),
                "expected construction error for {:?}",
                input
            );
        }
    }

    #[test]
    fn spec_display_is_canonical() {
        assert_eq!(AggregatorSpec::parse("ci_gauss   .95").unwrap().to_string(), "ci_gauss 0.95");
        assert_eq!(AggregatorSpec::parse(" stdev ").unwrap().to_string(), "stdev");
    }

    proptest! {
        #[test]
        fn count_equals_number_of_puts(values in prop::collection::vec(-1e6f64..1e6, 0..200)) {
            prop_assert_eq!(feed("count", &values).get(), values.len() as f64);
        }

        #[test]
        fn sum_equals_total(values in prop::collection::vec(-1e6f64..1e6, 1..200)) {
            let expected: f64 = values.iter().sum();
            prop_assert!((feed("sum", &values).get() - expected).abs() <= 1e-6 * values.len() as f64);
        }

        #[test]
        fn mean_is_sum_over_count(values in prop::collection::vec(-1e6f64..1e6, 1..200)) {
            let sum = feed("sum", &values).get();
            let count = feed("count", &values).get();
            prop_assert!((feed("mean", &values).get() - sum / count).abs() < 1e-9);
        }
    }
}
