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

use std::hash::Hash;

use super::MAX_LG_K;
use super::MIN_LG_K;
use super::coupon;
use super::estimator::HipEstimator;
use super::get_slot;
use super::get_value;
use crate::common::NumStdDev;

/// HyperLogLog sketch with one byte per register.
///
/// See the [hll module level documentation](crate::hll) for more.
#[derive(Debug, Clone, PartialEq)]
pub struct HllSketch {
    pub(super) lg_k: u8,
    pub(super) registers: Box<[u8]>,
    pub(super) num_zeros: u32,
    pub(super) estimator: HipEstimator,
}

impl HllSketch {
    /// Creates an empty sketch with `2^lg_k` registers.
    ///
    /// # Panics
    ///
    /// Panics if `lg_k` is not in [MIN_LG_K, MAX_LG_K].
    ///
    /// # Examples
    ///
    /// ```
    /// # use datasketches_characterization::hll::HllSketch;
    /// let mut sketch = HllSketch::new(12);
    /// for i in 0..1000u64 {
    ///     sketch.update(i);
    /// }
    /// assert!((sketch.estimate() - 1000.0).abs() < 50.0);
    /// ```
    pub fn new(lg_k: u8) -> Self {
        assert!(
            (MIN_LG_K..=MAX_LG_K).contains(&lg_k),
            "lg_k must be in [{MIN_LG_K}, {MAX_LG_K}], got {lg_k}"
        );
        let k = 1u32 << lg_k;
        Self {
            lg_k,
            registers: vec![0u8; k as usize].into_boxed_slice(),
            num_zeros: k,
            estimator: HipEstimator::new(lg_k),
        }
    }

    pub fn lg_k(&self) -> u8 {
        self.lg_k
    }

    pub fn is_empty(&self) -> bool {
        self.num_zeros == 1 << self.lg_k
    }

    /// Returns true if the sketch is the result of a union.
    pub fn is_out_of_order(&self) -> bool {
        self.estimator.out_of_order
    }

    /// Presents an item to the sketch.
    pub fn update<H: Hash>(&mut self, item: H) {
        self.update_coupon(coupon(item));
    }

    pub(super) fn update_coupon(&mut self, coupon: u32) {
        let mask = (1u32 << self.lg_k) - 1;
        let slot = get_slot(coupon) & mask;
        self.update_register(slot, get_value(coupon));
    }

    /// Raises register `slot` to `value` if that is larger.
    pub(super) fn update_register(&mut self, slot: u32, value: u8) {
        let old_value = self.registers[slot as usize];
        if value <= old_value {
            return;
        }
        self.estimator.update(self.lg_k, old_value, value);
        self.registers[slot as usize] = value;
        if old_value == 0 {
            self.num_zeros -= 1;
        }
    }

    pub fn estimate(&self) -> f64 {
        self.estimator.estimate(self.lg_k, self.num_zeros)
    }

    pub fn lower_bound(&self, num_std_dev: NumStdDev) -> f64 {
        self.estimator
            .lower_bound(self.lg_k, self.num_zeros, num_std_dev)
    }

    pub fn upper_bound(&self, num_std_dev: NumStdDev) -> f64 {
        self.estimator
            .upper_bound(self.lg_k, self.num_zeros, num_std_dev)
    }

    /// Returns a copy of this sketch folded down to `2^lg_k` registers.
    ///
    /// Slots are the low bits of the hash, so register `i` of the smaller
    /// sketch is the maximum over every slot congruent to `i`.
    pub(super) fn downsample(&self, lg_k: u8) -> HllSketch {
        debug_assert!(lg_k <= self.lg_k);
        if lg_k == self.lg_k {
            return self.clone();
        }
        let mut result = HllSketch::new(lg_k);
        let mask = (1u32 << lg_k) - 1;
        for (slot, &value) in self.registers.iter().enumerate() {
            result.update_register(slot as u32 & mask, value);
        }
        result.estimator.out_of_order = true;
        result.estimator.hip_accum = 0.0;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sketch() {
        let sketch = HllSketch::new(MIN_LG_K);
        assert!(sketch.is_empty());
        assert_eq!(sketch.estimate(), 0.0);
        assert_eq!(sketch.lower_bound(NumStdDev::One), 0.0);
        assert_eq!(sketch.upper_bound(NumStdDev::One), 0.0);
    }

    #[test]
    fn test_duplicates_do_not_change_estimate() {
        let mut sketch = HllSketch::new(10);
        for i in 0..100u64 {
            sketch.update(i);
        }
        let before = sketch.estimate();
        for i in 0..100u64 {
            sketch.update(i);
        }
        assert_eq!(sketch.estimate(), before);
    }

    #[test]
    fn test_downsample_keeps_register_maxima() {
        let mut sketch = HllSketch::new(8);
        sketch.update_register(3, 5);
        sketch.update_register(3 + 16, 7);
        let folded = sketch.downsample(4);
        assert_eq!(folded.registers[3], 7);
        assert_eq!(folded.num_zeros, 15);
        assert!(folded.is_out_of_order());
    }

    #[test]
    #[should_panic(expected = "lg_k must be in")]
    fn test_lg_k_too_small() {
        HllSketch::new(3);
    }
}
