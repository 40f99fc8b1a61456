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

use crate::kll::KllSketch;

/// Capacity of the error tracker used by the accuracy profiles.
pub const DEFAULT_TRACKER_K: u16 = 10_000;

/// Bounded-memory distribution of real-valued samples.
///
/// Samples are kept in a KLL sketch, so quantile answers carry the sketch's
/// rank error for the configured `k` and do not depend on insertion order.
/// Queries never mutate the tracker and may be repeated at any point of the
/// stream.
#[derive(Debug, Clone)]
pub struct ErrorDistribution {
    sketch: KllSketch<f64>,
}

impl Default for ErrorDistribution {
    fn default() -> Self {
        Self::new(DEFAULT_TRACKER_K)
    }
}

impl ErrorDistribution {
    /// Creates an empty tracker with capacity parameter `k`.
    ///
    /// # Panics
    ///
    /// Panics if `k` is outside the range the KLL sketch accepts.
    pub fn new(k: u16) -> Self {
        Self {
            sketch: KllSketch::new(k),
        }
    }

    /// Records one sample. NaN samples are ignored.
    pub fn update(&mut self, value: f64) {
        self.sketch.update(value);
    }

    /// Returns the number of samples recorded.
    pub fn n(&self) -> u64 {
        self.sketch.n()
    }

    /// Returns the approximate value below which each fraction of the
    /// samples fall, or `None` if nothing has been recorded.
    ///
    /// Fraction 0 and 1 return the exact minimum and maximum.
    ///
    /// # Panics
    ///
    /// Panics if any fraction is outside `[0, 1]`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use datasketches_characterization::stats::ErrorDistribution;
    /// let mut errors = ErrorDistribution::new(200);
    /// for i in 0..=100 {
    ///     errors.update(i as f64 / 100.0 - 0.5);
    /// }
    /// let q = errors.quantiles(&[0.0, 0.5, 1.0]).unwrap();
    /// assert_eq!(q, vec![-0.5, 0.0, 0.5]);
    /// ```
    pub fn quantiles(&self, fractions: &[f64]) -> Option<Vec<f64>> {
        self.sketch.quantiles(fractions, true)
    }
}
