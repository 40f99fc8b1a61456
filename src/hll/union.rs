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

use super::HllSketch;
use super::MAX_LG_K;
use super::MIN_LG_K;

/// Union of HLL sketches.
///
/// Registers are merged by maximum. The union adopts the smallest `lg_k` it
/// has seen, folding wider inputs down to match.
#[derive(Debug, Clone)]
pub struct HllUnion {
    gadget: HllSketch,
}

impl HllUnion {
    /// Creates an empty union with at most `2^lg_max_k` registers.
    ///
    /// # Panics
    ///
    /// Panics if `lg_max_k` is not in [MIN_LG_K, MAX_LG_K].
    pub fn new(lg_max_k: u8) -> Self {
        assert!(
            (MIN_LG_K..=MAX_LG_K).contains(&lg_max_k),
            "lg_max_k must be in [{MIN_LG_K}, {MAX_LG_K}], got {lg_max_k}"
        );
        Self {
            gadget: HllSketch::new(lg_max_k),
        }
    }

    pub fn lg_k(&self) -> u8 {
        self.gadget.lg_k
    }

    /// Merges a sketch into the union.
    pub fn update(&mut self, sketch: &HllSketch) {
        if sketch.is_empty() {
            return;
        }
        if sketch.lg_k < self.gadget.lg_k {
            self.gadget = self.gadget.downsample(sketch.lg_k);
        }
        let mask = (1u32 << self.gadget.lg_k) - 1;
        let gadget = &mut self.gadget;
        gadget.estimator.out_of_order = true;
        for (slot, &value) in sketch.registers.iter().enumerate() {
            gadget.update_register(slot as u32 & mask, value);
        }
        gadget.estimator.hip_accum = 0.0;
    }

    /// Returns the union as a sketch, estimated without HIP.
    pub fn result(&self) -> HllSketch {
        self.gadget.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::NumStdDev;

    #[test]
    fn test_union_of_disjoint_streams() {
        let mut a = HllSketch::new(12);
        let mut b = HllSketch::new(12);
        for i in 0..5000u64 {
            a.update(i);
            b.update(i + 5000);
        }
        let mut union = HllUnion::new(12);
        union.update(&a);
        union.update(&b);
        let result = union.result();
        assert!(result.is_out_of_order());
        let est = result.estimate();
        assert!((est - 10_000.0).abs() < 10_000.0 * 0.06, "estimate {est}");
        assert!(result.lower_bound(NumStdDev::Three) <= est);
        assert!(result.upper_bound(NumStdDev::Three) >= est);
    }

    #[test]
    fn test_union_adopts_smaller_lg_k() {
        let mut small = HllSketch::new(8);
        small.update(1u64);
        let mut union = HllUnion::new(12);
        union.update(&small);
        assert_eq!(union.lg_k(), 8);
    }
}
