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

use crate::common::NumStdDev;

/// HIP accumulator and the `sum(2^-register)` needed by the raw estimator.
///
/// The sum is split in two parts, registers below 32 and at or above 32, so
/// that tiny inverse powers are not lost against large ones.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct HipEstimator {
    pub hip_accum: f64,
    pub kxq0: f64,
    pub kxq1: f64,
    pub out_of_order: bool,
}

impl HipEstimator {
    /// All registers start at zero, so `kxq0 = k * 2^0`.
    pub fn new(lg_k: u8) -> Self {
        Self {
            hip_accum: 0.0,
            kxq0: (1u32 << lg_k) as f64,
            kxq1: 0.0,
            out_of_order: false,
        }
    }

    /// Accounts for one register growing from `old_value` to `new_value`.
    ///
    /// Must run before the register itself changes.
    pub fn update(&mut self, lg_k: u8, old_value: u8, new_value: u8) {
        let k = (1u32 << lg_k) as f64;
        if !self.out_of_order {
            self.hip_accum += k / (self.kxq0 + self.kxq1);
        }
        self.remove_register(old_value);
        self.add_register(new_value);
    }

    pub fn add_register(&mut self, value: u8) {
        if value < 32 {
            self.kxq0 += inv_pow2(value);
        } else {
            self.kxq1 += inv_pow2(value);
        }
    }

    pub fn remove_register(&mut self, value: u8) {
        if value < 32 {
            self.kxq0 -= inv_pow2(value);
        } else {
            self.kxq1 -= inv_pow2(value);
        }
    }

    pub fn estimate(&self, lg_k: u8, num_zeros: u32) -> f64 {
        if !self.out_of_order {
            return self.hip_accum;
        }

        let k = (1u32 << lg_k) as f64;
        let raw = self.raw_estimate(lg_k);
        if raw <= 2.5 * k && num_zeros > 0 {
            // linear counting
            return k * (k / num_zeros as f64).ln();
        }
        raw
    }

    fn raw_estimate(&self, lg_k: u8) -> f64 {
        let k = (1u32 << lg_k) as f64;
        let alpha = match lg_k {
            4 => 0.673,
            5 => 0.697,
            6 => 0.709,
            _ => 0.7213 / (1.0 + 1.079 / k),
        };
        alpha * k * k / (self.kxq0 + self.kxq1)
    }

    /// Relative standard error of the current estimator.
    pub fn rse(&self, lg_k: u8) -> f64 {
        let k = (1u32 << lg_k) as f64;
        let factor = if self.out_of_order {
            (3.0 * std::f64::consts::LN_2 - 1.0).sqrt()
        } else {
            std::f64::consts::LN_2.sqrt()
        };
        factor / k.sqrt()
    }

    /// Lower bound, never below the number of registers already hit.
    pub fn lower_bound(&self, lg_k: u8, num_zeros: u32, num_std_dev: NumStdDev) -> f64 {
        let num_hit = ((1u32 << lg_k) - num_zeros) as f64;
        if num_hit == 0.0 {
            return 0.0;
        }
        let eps = num_std_dev.as_u8() as f64 * self.rse(lg_k);
        let result = self.estimate(lg_k, num_zeros) / (1.0 + eps);
        result.max(num_hit)
    }

    pub fn upper_bound(&self, lg_k: u8, num_zeros: u32, num_std_dev: NumStdDev) -> f64 {
        if num_zeros == 1u32 << lg_k {
            return 0.0;
        }
        let eps = num_std_dev.as_u8() as f64 * self.rse(lg_k);
        self.estimate(lg_k, num_zeros) / (1.0 - eps)
    }
}

#[inline]
fn inv_pow2(value: u8) -> f64 {
    f64::from_bits((1023u64 - value as u64) << 52)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inv_pow2() {
        assert_eq!(inv_pow2(0), 1.0);
        assert_eq!(inv_pow2(1), 0.5);
        assert_eq!(inv_pow2(40), 0.5f64.powi(40));
    }

    #[test]
    fn test_linear_counting_when_out_of_order() {
        let mut est = HipEstimator::new(10);
        est.out_of_order = true;
        // half the registers hit with value 1
        for _ in 0..512 {
            est.update(10, 0, 1);
        }
        let expected = 1024.0 * 2f64.ln();
        assert!((est.estimate(10, 512) - expected).abs() < 1e-9);
        assert_eq!(est.hip_accum, 0.0);
    }

    #[test]
    fn test_bounds_bracket_estimate() {
        let mut est = HipEstimator::new(12);
        for _ in 0..100 {
            est.update(12, 0, 1);
        }
        let e = est.estimate(12, 4096 - 100);
        for s in NumStdDev::ALL {
            assert!(est.lower_bound(12, 4096 - 100, s) <= e);
            assert!(est.upper_bound(12, 4096 - 100, s) >= e);
        }
        assert!(est.lower_bound(12, 4096 - 100, NumStdDev::Three) >= 100.0);
    }
}
