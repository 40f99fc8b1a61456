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

use super::sketch::KllItem;

/// Capacity of the level at `height` in a stack of `num_levels` levels.
///
/// The top level holds `k` items, and each level below it holds two thirds
/// of the one above, never fewer than `m`.
pub(super) fn level_capacity(k: u16, num_levels: usize, height: usize, m: u8) -> u32 {
    assert!(height < num_levels, "height must be < num_levels");
    let depth = (num_levels - height - 1) as i32;
    let cap = (k as f64 * (2.0f64 / 3.0).powi(depth)).round() as u32;
    cap.max(m as u32)
}

pub(super) fn total_capacity(k: u16, m: u8, num_levels: usize) -> u32 {
    (0..num_levels)
        .map(|height| level_capacity(k, num_levels, height, m))
        .sum()
}

/// Sum of item weights, where an item on level `h` weighs `2^h`.
pub(super) fn total_weight<T>(levels: &[Vec<T>]) -> u64 {
    levels
        .iter()
        .enumerate()
        .map(|(height, level)| (level.len() as u64) << height)
        .sum()
}

/// Merges two sorted runs into one sorted run.
pub(super) fn merge_sorted<T: KllItem>(left: Vec<T>, right: Vec<T>) -> Vec<T> {
    if left.is_empty() {
        return right;
    }
    if right.is_empty() {
        return left;
    }

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_left = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => T::cmp(l, r).is_le(),
            _ => break,
        };
        merged.extend(if take_left { left.next() } else { right.next() });
    }
    merged.extend(left);
    merged.extend(right);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_capacity_shrinks_towards_bottom() {
        assert_eq!(level_capacity(200, 1, 0, 8), 200);
        assert_eq!(level_capacity(200, 2, 1, 8), 200);
        assert_eq!(level_capacity(200, 2, 0, 8), 133);
        assert_eq!(level_capacity(200, 3, 0, 8), 89);
        assert_eq!(level_capacity(200, 20, 0, 8), 8);
    }

    #[test]
    fn test_total_weight() {
        let levels = vec![vec![1.0f64, 2.0], vec![3.0], vec![4.0, 5.0]];
        assert_eq!(total_weight(&levels), 2 + 2 + 8);
    }

    #[test]
    fn test_merge_sorted_is_stable_and_sorted() {
        let merged = merge_sorted(vec![1i64, 3, 5, 7], vec![2, 3, 8]);
        assert_eq!(merged, vec![1, 2, 3, 3, 5, 7, 8]);
        assert_eq!(merge_sorted(Vec::new(), vec![4i64]), vec![4]);
    }
}
