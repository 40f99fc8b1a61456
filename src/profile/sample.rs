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

//! Item types the quantile profiles are instantiated with.

use std::fmt;

use crate::common::random::RandomSource;
use crate::common::random::XorShift64;
use crate::kll::KllItem;

/// How a profile synthesizes items of one numeric type.
#[allow(private_bounds)]
pub trait SampleValue: KllItem + Copy + fmt::Debug {
    /// Name used in logs and report notes.
    const TYPE_NAME: &'static str;

    /// The item whose rank in the stream `1..=n` is `i`.
    fn from_rank(i: u64) -> Self;

    /// A random item.
    fn random(rng: &mut XorShift64) -> Self;
}

impl SampleValue for f32 {
    const TYPE_NAME: &'static str = "float";

    fn from_rank(i: u64) -> Self {
        i as f32
    }

    fn random(rng: &mut XorShift64) -> Self {
        rng.next_f64() as f32
    }
}

impl SampleValue for f64 {
    const TYPE_NAME: &'static str = "double";

    fn from_rank(i: u64) -> Self {
        i as f64
    }

    fn random(rng: &mut XorShift64) -> Self {
        rng.next_f64()
    }
}

impl SampleValue for i64 {
    const TYPE_NAME: &'static str = "int64";

    fn from_rank(i: u64) -> Self {
        i as i64
    }

    fn random(rng: &mut XorShift64) -> Self {
        rng.next_u64() as i64
    }
}

/// Tag selecting the item type of a quantile profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemType {
    Float,
    Double,
    Int64,
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ItemType::Float => f32::TYPE_NAME,
            ItemType::Double => f64::TYPE_NAME,
            ItemType::Int64 => i64::TYPE_NAME,
        };
        f.write_str(name)
    }
}

/// Calls `$body` with `$t` bound to the Rust type of an [`ItemType`].
macro_rules! with_item_type {
    ($item:expr, $t:ident => $body:expr) => {
        match $item {
            $crate::profile::sample::ItemType::Float => {
                type $t = f32;
                $body
            }
            $crate::profile::sample::ItemType::Double => {
                type $t = f64;
                $body
            }
            $crate::profile::sample::ItemType::Int64 => {
                type $t = i64;
                $body
            }
        }
    };
}

pub(crate) use with_item_type;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rank_is_exact() {
        assert_eq!(f32::from_rank(1 << 20), 1048576.0);
        assert_eq!(i64::from_rank(42), 42);
    }

    #[test]
    fn test_dispatch_by_tag() {
        let size = with_item_type!(ItemType::Float, T => std::mem::size_of::<T>());
        assert_eq!(size, 4);
        assert_eq!(ItemType::Int64.to_string(), "int64");
    }
}
