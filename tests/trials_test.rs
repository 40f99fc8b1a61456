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

use datasketches_characterization::job::trials::TrialScaler;
use datasketches_characterization::job::trials::num_trials;
use googletest::assert_that;
use googletest::prelude::eq;

const SCALER: TrialScaler = TrialScaler {
    lg_min_x: 4,
    lg_max_x: 20,
    lg_min_trials: 6,
    lg_max_trials: 14,
};

#[test]
fn test_boundaries_are_pinned() {
    // most trials at the smallest input, fewest at the largest
    assert_that!(SCALER.num_trials(1 << 4), eq(1 << 14));
    assert_that!(SCALER.num_trials(1 << 20), eq(1 << 6));
}

#[test]
fn test_midpoint_is_log_linear() {
    assert_eq!(SCALER.num_trials(1 << 12), 1 << 10);
    assert_eq!(num_trials(1 << 8, 4, 20, 6, 14), 1 << 12);
}

#[test]
fn test_monotonically_non_increasing() {
    let mut last = u64::MAX;
    for x in (0..=22).map(|lg| 1u64 << lg) {
        let trials = SCALER.num_trials(x);
        assert!(trials <= last, "{trials} trials at {x} after {last}");
        last = trials;
    }
}

#[test]
fn test_clamped_outside_range() {
    assert_eq!(SCALER.num_trials(1), 1 << 14);
    assert_eq!(SCALER.num_trials(1 << 30), 1 << 6);
}
