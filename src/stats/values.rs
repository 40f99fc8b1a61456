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

/// Distribution of a measured quantity at one checkpoint, such as the bytes
/// a sketch holds or the worst rank error of a trial.
#[derive(Debug, Clone)]
pub struct ValueStats {
    point: u64,
    count: u64,
    sum: f64,
    values: ErrorDistribution,
}

impl ValueStats {
    pub fn new(point: u64, k: u16) -> Self {
        Self {
            point,
            count: 0,
            sum: 0.0,
            values: ErrorDistribution::new(k),
        }
    }

    /// Creates one accumulator per checkpoint.
    pub fn from_checkpoints(checkpoints: &[u64], k: u16) -> Vec<Self> {
        checkpoints.iter().map(|&p| Self::new(p, k)).collect()
    }

    pub fn point(&self) -> u64 {
        self.point
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn update(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
        self.values.update(value);
    }

    /// # Panics
    ///
    /// Panics if no value has been recorded.
    pub fn mean(&self) -> f64 {
        assert!(self.count > 0, "no values recorded at {}", self.point);
        self.sum / self.count as f64
    }

    /// # Panics
    ///
    /// Panics if no value has been recorded.
    pub fn quantiles(&self, fractions: &[f64]) -> Vec<f64> {
        match self.values.quantiles(fractions) {
            Some(quantiles) => quantiles,
            None => panic!("no values recorded at {}", self.point),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_extremes() {
        let mut stats = ValueStats::new(64, 200);
        for v in [4.0, 8.0, 12.0] {
            stats.update(v);
        }
        assert_eq!(stats.mean(), 8.0);
        assert_eq!(stats.quantiles(&[0.0, 1.0]), vec![4.0, 12.0]);
    }

    #[test]
    #[should_panic(expected = "no values recorded at 64")]
    fn test_quantiles_when_empty() {
        ValueStats::new(64, 200).quantiles(&[0.5]);
    }
}
