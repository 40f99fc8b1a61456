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

use datasketches_characterization::job::points::count_points;
use datasketches_characterization::job::points::log2_points;
use datasketches_characterization::job::points::next_point;
use googletest::assert_that;
use googletest::prelude::eq;

#[test]
fn test_reference_series_at_two_points_per_octave() {
    let mut series = vec![1u64];
    while series.len() < 14 {
        series.push(next_point(2, *series.last().unwrap()));
    }
    assert_eq!(
        series,
        vec![1, 2, 3, 4, 6, 8, 11, 16, 23, 32, 45, 64, 91, 128]
    );
}

#[test]
fn test_one_point_per_octave_is_powers_of_two() {
    let points = log2_points(0, 10, 1);
    let powers: Vec<u64> = (0..=10).map(|i| 1u64 << i).collect();
    assert_eq!(points, powers);
    assert_that!(count_points(0, 10, 1), eq(11));
}

#[test]
fn test_strictly_increasing_for_any_density() {
    for ppo in 1..=64 {
        let points = log2_points(0, 16, ppo);
        assert!(
            points.windows(2).all(|w| w[0] < w[1]),
            "not strictly increasing at ppo {ppo}"
        );
        assert_eq!(points.len(), count_points(0, 16, ppo));
        assert_eq!(points[0], 1);
        assert_eq!(*points.last().unwrap(), 1 << 16);
    }
}

#[test]
fn test_count_matches_next_point_iterations() {
    for (lg_start, lg_end, ppo) in [(0, 10, 2), (3, 12, 4), (5, 5, 16), (0, 20, 16)] {
        let end = 1u64 << lg_end;
        let mut point = 1u64 << lg_start;
        let mut iterations = 0;
        while point <= end {
            point = next_point(ppo, point);
            iterations += 1;
        }
        assert_eq!(count_points(lg_start, lg_end, ppo), iterations);
    }
    assert_that!(count_points(0, 10, 2), eq(20));
}

#[test]
fn test_next_point_from_zero() {
    assert_eq!(next_point(1, 0), 2);
    assert_eq!(next_point(2, 0), 1);
}

#[test]
#[should_panic(expected = "lg_start must be <= lg_end")]
fn test_inverted_range() {
    log2_points(5, 4, 1);
}
