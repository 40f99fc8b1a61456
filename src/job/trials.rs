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

//! Trial counts that shrink as the input grows.
//!
//! Small inputs are cheap and noisy, so they get many repetitions; large
//! inputs are expensive, so they get few. The count is interpolated linearly
//! in log-log space between `2^lg_max_trials` at `x = 2^lg_min_x` and
//! `2^lg_min_trials` at `x = 2^lg_max_x`.

/// Returns the number of trials to run at input size `x`.
///
/// `slope = (lg_max_trials - lg_min_trials) / (lg_min_x - lg_max_x)` and the
/// result is `round(2^(slope * (log2(x) - lg_min_x) + lg_max_trials))`.
/// Inputs at or below `2^lg_min_x` get `2^lg_max_trials`, inputs at or above
/// `2^lg_max_x` get `2^lg_min_trials`. A degenerate range
/// (`lg_min_x == lg_max_x`) always yields `2^lg_max_trials`.
///
/// # Examples
///
/// ```
/// # use datasketches_characterization::job::trials::num_trials;
/// assert_eq!(num_trials(1 << 4, 4, 20, 6, 14), 1 << 14);
/// assert_eq!(num_trials(1 << 20, 4, 20, 6, 14), 1 << 6);
/// assert_eq!(num_trials(1 << 12, 4, 20, 6, 14), 1 << 10);
/// ```
pub fn num_trials(
    x: u64,
    lg_min_x: u32,
    lg_max_x: u32,
    lg_min_trials: u32,
    lg_max_trials: u32,
) -> u64 {
    let max_trials = 1u64 << lg_max_trials;
    let min_trials = 1u64 << lg_min_trials;
    if lg_min_x == lg_max_x || x <= (1u64 << lg_min_x) {
        return max_trials;
    }
    if x >= (1u64 << lg_max_x) {
        return min_trials;
    }
    let slope =
        (lg_max_trials as f64 - lg_min_trials as f64) / (lg_min_x as f64 - lg_max_x as f64);
    let lg_trials = slope * ((x as f64).log2() - lg_min_x as f64) + lg_max_trials as f64;
    2f64.powf(lg_trials).round() as u64
}

/// The exponents of one trial scaling curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialScaler {
    pub lg_min_x: u32,
    pub lg_max_x: u32,
    pub lg_min_trials: u32,
    pub lg_max_trials: u32,
}

impl TrialScaler {
    /// See [`num_trials`].
    pub fn num_trials(&self, x: u64) -> u64 {
        num_trials(
            x,
            self.lg_min_x,
            self.lg_max_x,
            self.lg_min_trials,
            self.lg_max_trials,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_outside_range() {
        assert_eq!(num_trials(1, 4, 20, 6, 14), 1 << 14);
        assert_eq!(num_trials(1 << 30, 4, 20, 6, 14), 1 << 6);
    }

    #[test]
    fn test_degenerate_range() {
        assert_eq!(num_trials(1 << 10, 8, 8, 2, 5), 1 << 5);
    }
}
