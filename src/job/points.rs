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

//! Logarithmically spaced checkpoints.
//!
//! A checkpoint is an input size at which a profile samples a sketch. The
//! sequence is dense at small sizes and sparse at large ones: with `ppo`
//! points per octave, every doubling of the input contributes at most `ppo`
//! checkpoints. Rounding collapses some of the low-end points, and those are
//! skipped rather than repeated, so the sequence is always strictly
//! increasing.
//!
//! ```
//! # use datasketches_characterization::job::points::log2_points;
//! let points = log2_points(0, 5, 2);
//! assert_eq!(points, vec![1, 2, 3, 4, 6, 8, 11, 16, 23, 32]);
//! ```

/// Largest exponent accepted for a checkpoint range.
pub const MAX_LG_POINT: u32 = 62;

/// Returns the smallest checkpoint strictly greater than `current_point`.
///
/// The generating index `round(log2(max(current_point, 1)) * ppo)` is
/// advanced until `round(2^(gi / ppo))` exceeds the current point.
///
/// # Panics
///
/// Panics if `points_per_octave` is zero.
///
/// # Examples
///
/// ```
/// # use datasketches_characterization::job::points::next_point;
/// assert_eq!(next_point(2, 1), 2);
/// assert_eq!(next_point(2, 4), 6);
/// assert_eq!(next_point(1, 16), 32);
/// ```
pub fn next_point(points_per_octave: u32, current_point: u64) -> u64 {
    assert!(points_per_octave > 0, "points per octave must be positive");
    let ppo = points_per_octave as f64;
    let mut gi = ((current_point.max(1) as f64).log2() * ppo).round() as i64;
    loop {
        gi += 1;
        let candidate = 2f64.powf(gi as f64 / ppo).round() as u64;
        if candidate > current_point {
            return candidate;
        }
    }
}

/// Returns how many times [`next_point`] runs, starting at `2^lg_start`,
/// before the produced point exceeds `2^lg_end`.
///
/// This is also the number of checkpoints in `[2^lg_start, 2^lg_end]`.
///
/// # Panics
///
/// Panics if `lg_end` exceeds [`MAX_LG_POINT`] or `lg_start > lg_end`.
pub fn count_points(lg_start: u32, lg_end: u32, points_per_octave: u32) -> usize {
    check_range(lg_start, lg_end);
    let end = 1u64 << lg_end;
    let mut point = 1u64 << lg_start;
    let mut count = 0;
    while point <= end {
        point = next_point(points_per_octave, point);
        count += 1;
    }
    count
}

/// Returns every checkpoint in `[2^lg_start, 2^lg_end]` in increasing order.
///
/// # Panics
///
/// Panics if `lg_end` exceeds [`MAX_LG_POINT`] or `lg_start > lg_end`.
pub fn log2_points(lg_start: u32, lg_end: u32, points_per_octave: u32) -> Vec<u64> {
    check_range(lg_start, lg_end);
    let end = 1u64 << lg_end;
    let mut points = Vec::with_capacity(count_points(lg_start, lg_end, points_per_octave));
    let mut point = 1u64 << lg_start;
    while point <= end {
        points.push(point);
        point = next_point(points_per_octave, point);
    }
    points
}

fn check_range(lg_start: u32, lg_end: u32) {
    assert!(
        lg_end <= MAX_LG_POINT,
        "lg_end must be <= {MAX_LG_POINT}, got {lg_end}"
    );
    assert!(
        lg_start <= lg_end,
        "lg_start must be <= lg_end, got {lg_start} > {lg_end}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_point_skips_collapsed_values() {
        // round(2^(1/4)) == 1, so the first distinct point after 1 is 2^(2/4) rounded
        assert_eq!(next_point(4, 1), 2);
        assert_eq!(next_point(16, 1), 2);
        assert_eq!(next_point(16, 2), 3);
    }

    #[test]
    fn test_zero_is_treated_as_one_for_the_index() {
        assert_eq!(next_point(1, 0), 2);
        assert_eq!(next_point(2, 0), 1);
    }

    #[test]
    #[should_panic(expected = "lg_start must be <= lg_end")]
    fn test_inverted_range() {
        count_points(5, 4, 2);
    }
}
