// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use super::distribution::ErrorDistribution;
use crate::common::NumStdDev;
use crate::job::points::log2_points;

/// Lower and upper confidence bounds at one, two and three standard
/// deviations, indexed by [`NumStdDev::index`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub lower: [f64; 3],
    pub upper: [f64; 3],
}

impl Bounds {
    /// Collects bounds by querying each confidence level.
    pub fn from_fn(
        lower: impl Fn(NumStdDev) -> f64,
        upper: impl Fn(NumStdDev) -> f64,
    ) -> Self {
        Self {
            lower: NumStdDev::ALL.map(&lower),
            upper: NumStdDev::ALL.map(&upper),
        }
    }

    pub fn lower(&self, num_std_dev: NumStdDev) -> f64 {
        self.lower[num_std_dev.index()]
    }

    pub fn upper(&self, num_std_dev: NumStdDev) -> f64 {
        self.upper[num_std_dev.index()]
    }
}

/// What one trial reports for one checkpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialOutcome {
    pub estimate: f64,
    pub bounds: Option<Bounds>,
}

impl TrialOutcome {
    pub fn estimate(estimate: f64) -> Self {
        Self {
            estimate,
            bounds: None,
        }
    }

    pub fn with_bounds(estimate: f64, bounds: Bounds) -> Self {
        Self {
            estimate,
            bounds: Some(bounds),
        }
    }
}

/// Accuracy of an estimator at one checkpoint, accumulated over trials.
///
/// Every getter divides by the number of trials and panics if no trial has
/// been recorded yet.
#[derive(Debug, Clone)]
pub struct AccuracyStats {
    true_value: u64,
    sum_est: f64,
    sum_rel_err: f64,
    sum_sq_rel_err: f64,
    count: u64,
    below_lower: [u64; 3],
    above_upper: [u64; 3],
    sum_lower: [f64; 3],
    sum_upper: [f64; 3],
    rel_errors: ErrorDistribution,
}

impl AccuracyStats {
    /// Creates an accumulator for `true_value` whose relative-error tracker
    /// has capacity `k`.
    pub fn new(true_value: u64, k: u16) -> Self {
        Self {
            true_value,
            sum_est: 0.0,
            sum_rel_err: 0.0,
            sum_sq_rel_err: 0.0,
            count: 0,
            below_lower: [0; 3],
            above_upper: [0; 3],
            sum_lower: [0.0; 3],
            sum_upper: [0.0; 3],
            rel_errors: ErrorDistribution::new(k),
        }
    }

    /// Creates one accumulator per checkpoint.
    pub fn from_checkpoints(checkpoints: &[u64], k: u16) -> Vec<Self> {
        checkpoints.iter().map(|&p| Self::new(p, k)).collect()
    }

    pub fn true_value(&self) -> u64 {
        self.true_value
    }

    /// Number of trials recorded.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Records one estimate.
    ///
    /// # Panics
    ///
    /// Panics if the true value is zero, where relative error is undefined,
    /// or if the estimate is not finite.
    pub fn update(&mut self, estimate: f64) {
        assert!(
            self.true_value != 0,
            "relative error is undefined for a true value of zero"
        );
        assert!(
            estimate.is_finite(),
            "estimate {estimate} for true value {} is not finite",
            self.true_value
        );
        let rel_err = estimate / self.true_value as f64 - 1.0;
        self.sum_est += estimate;
        self.sum_rel_err += rel_err;
        self.sum_sq_rel_err += rel_err * rel_err;
        self.rel_errors.update(rel_err);
        self.count += 1;
    }

    /// Records one estimate and checks whether the true value falls outside
    /// each declared confidence interval. The bounds themselves are summed
    /// so their mean width can be reported.
    pub fn update_with_bounds(&mut self, estimate: f64, bounds: &Bounds) {
        self.update(estimate);
        let truth = self.true_value as f64;
        for i in 0..3 {
            self.sum_lower[i] += bounds.lower[i];
            self.sum_upper[i] += bounds.upper[i];
            if truth < bounds.lower[i] {
                self.below_lower[i] += 1;
            }
            if truth > bounds.upper[i] {
                self.above_upper[i] += 1;
            }
        }
    }

    /// Records a trial outcome, with or without bounds.
    pub fn record(&mut self, outcome: &TrialOutcome) {
        match &outcome.bounds {
            Some(bounds) => self.update_with_bounds(outcome.estimate, bounds),
            None => self.update(outcome.estimate),
        }
    }

    pub fn mean_estimate(&self) -> f64 {
        self.sum_est / self.trials()
    }

    pub fn mean_rel_err(&self) -> f64 {
        self.sum_rel_err / self.trials()
    }

    pub fn rms_rel_err(&self) -> f64 {
        (self.sum_sq_rel_err / self.trials()).sqrt()
    }

    /// Fraction of trials whose true value was below the lower bound.
    pub fn below_lower_ratio(&self, num_std_dev: NumStdDev) -> f64 {
        self.below_lower[num_std_dev.index()] as f64 / self.trials()
    }

    /// Fraction of trials whose true value was above the upper bound.
    pub fn above_upper_ratio(&self, num_std_dev: NumStdDev) -> f64 {
        self.above_upper[num_std_dev.index()] as f64 / self.trials()
    }

    /// Mean lower bound relative to the true value, minus one.
    pub fn mean_rel_lower_bound(&self, num_std_dev: NumStdDev) -> f64 {
        self.relative_mean(self.sum_lower[num_std_dev.index()])
    }

    /// Mean upper bound relative to the true value, minus one.
    pub fn mean_rel_upper_bound(&self, num_std_dev: NumStdDev) -> f64 {
        self.relative_mean(self.sum_upper[num_std_dev.index()])
    }

    fn relative_mean(&self, sum: f64) -> f64 {
        sum / self.trials() / self.true_value as f64 - 1.0
    }

    /// Quantiles of the relative error distribution.
    pub fn rel_err_quantiles(&self, fractions: &[f64]) -> Vec<f64> {
        self.trials();
        match self.rel_errors.quantiles(fractions) {
            Some(quantiles) => quantiles,
            None => unreachable!("tracker is empty although trials were recorded"),
        }
    }

    fn trials(&self) -> f64 {
        assert!(
            self.count > 0,
            "no trials recorded for true value {}",
            self.true_value
        );
        self.count as f64
    }
}

/// Creates one accumulator per checkpoint of
/// [`log2_points(lg_min, lg_max, ppo)`](log2_points).
pub fn build_log2_accuracy_stats(
    lg_min: u32,
    lg_max: u32,
    ppo: u32,
    k: u16,
) -> Vec<AccuracyStats> {
    AccuracyStats::from_checkpoints(&log2_points(lg_min, lg_max, ppo), k)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_error_sums() {
        let mut stats = AccuracyStats::new(100, 200);
        stats.update(110.0);
        stats.update(90.0);
        assert_eq!(stats.count(), 2);
        assert_eq!(stats.mean_estimate(), 100.0);
        assert!(stats.mean_rel_err().abs() < 1e-12);
        assert!((stats.rms_rel_err() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_bounds_from_fn() {
        let bounds = Bounds::from_fn(
            |s| 10.0 - s.as_u8() as f64,
            |s| 10.0 + s.as_u8() as f64,
        );
        assert_eq!(bounds.lower, [9.0, 8.0, 7.0]);
        assert_eq!(bounds.upper(NumStdDev::Two), 12.0);
    }

    #[test]
    #[should_panic(expected = "is not finite")]
    fn test_nan_estimate() {
        AccuracyStats::new(8, 200).update(f64::NAN);
    }

    #[test]
    #[should_panic(expected = "no trials recorded")]
    fn test_rms_before_any_trial() {
        AccuracyStats::new(8, 200).rms_rel_err();
    }
}
