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

//! HyperLogLog sketch for distinct counting.
//!
//! Every register is one byte and holds the largest "leading zeros + 1" seen
//! among the hashes routed to it. While a sketch is built from a single
//! stream it is estimated with the HIP (historic inverse probability)
//! accumulator, which is updated every time a register grows. Once a sketch
//! is the product of a union the update history is lost, and the estimate
//! falls back to the raw HyperLogLog formula with linear counting at small
//! cardinalities.
//!
//! # Coupons
//!
//! A coupon is a 32-bit value encoding both a slot number (26 bits) and a
//! value (6 bits). The slot identifies which register to update, and the
//! value is the number of leading zeros in the hash plus one.

use std::hash::Hash;

mod estimator;
mod serialization;
mod sketch;
mod union;

pub use self::sketch::HllSketch;
pub use self::union::HllUnion;

/// Minimum log2 of the number of registers.
pub const MIN_LG_K: u8 = 4;
/// Maximum log2 of the number of registers.
pub const MAX_LG_K: u8 = 21;
/// Default log2 of the number of registers.
pub const DEFAULT_LG_K: u8 = 12;

const DEFAULT_SEED: u32 = 9001;

const KEY_BITS_26: u32 = 26;
const KEY_MASK_26: u32 = (1 << KEY_BITS_26) - 1;

#[inline]
fn get_slot(coupon: u32) -> u32 {
    coupon & KEY_MASK_26
}

#[inline]
fn get_value(coupon: u32) -> u8 {
    (coupon >> KEY_BITS_26) as u8
}

/// Hashes an item into a coupon.
fn coupon<H: Hash>(item: H) -> u32 {
    let mut hasher = mur3::Hasher128::with_seed(DEFAULT_SEED);
    item.hash(&mut hasher);
    let (lo, hi) = hasher.finish128();

    let slot = lo as u32 & KEY_MASK_26;
    let value = hi.leading_zeros().min(62) + 1;
    (value << KEY_BITS_26) | slot
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coupon_fields() {
        for item in 0u64..1000 {
            let c = coupon(item);
            assert!((1..=63).contains(&get_value(c)));
            assert!(get_slot(c) <= KEY_MASK_26);
            assert_eq!(c, coupon(item));
        }
    }
}
