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

use datasketches_characterization::common::NumStdDev;
use datasketches_characterization::hll::HllSketch;
use datasketches_characterization::hll::HllUnion;
use googletest::assert_that;
use googletest::prelude::ge;
use googletest::prelude::le;
use googletest::prelude::near;

const RELATIVE_ERROR_FOR_LG_K_12: f64 = 0.05;

#[test]
fn test_one_value() {
    let mut sketch = HllSketch::new(12);
    sketch.update(1u64);
    assert!(!sketch.is_empty());
    assert_eq!(sketch.estimate(), 1.0);
    assert_eq!(sketch.lower_bound(NumStdDev::Three), 1.0);
    assert_that!(sketch.upper_bound(NumStdDev::One), ge(1.0));
}

#[test]
fn test_many_values() {
    const N: u64 = 100_000;
    const N_F64: f64 = N as f64;

    let mut sketch = HllSketch::new(12);
    for i in 0..N {
        sketch.update(i);
    }
    assert_that!(
        sketch.estimate(),
        near(N_F64, RELATIVE_ERROR_FOR_LG_K_12 * N_F64)
    );
    for s in NumStdDev::ALL {
        assert_that!(sketch.estimate(), ge(sketch.lower_bound(s)));
        assert_that!(sketch.estimate(), le(sketch.upper_bound(s)));
    }
    assert!(sketch.lower_bound(NumStdDev::Three) <= sketch.lower_bound(NumStdDev::One));
}

#[test]
fn test_union_estimate_and_wider_bounds() {
    const N: u64 = 50_000;
    let mut sketches: Vec<HllSketch> = (0..4).map(|_| HllSketch::new(12)).collect();
    for i in 0..N {
        sketches[(i % 4) as usize].update(i);
    }
    let mut union = HllUnion::new(12);
    for sketch in &sketches {
        union.update(sketch);
    }
    let result = union.result();
    assert!(result.is_out_of_order());
    assert_that!(
        result.estimate(),
        near(N as f64, RELATIVE_ERROR_FOR_LG_K_12 * N as f64)
    );

    let mut single = HllSketch::new(12);
    for i in 0..N {
        single.update(i);
    }
    let width = |s: &HllSketch| s.upper_bound(NumStdDev::One) / s.lower_bound(NumStdDev::One);
    assert!(width(&result) > width(&single));
}

#[test]
fn test_serialization_keeps_estimator_state() {
    let mut sketch = HllSketch::new(10);
    for i in 0..3000u64 {
        sketch.update(i);
    }
    let bytes = sketch.serialize();
    assert_eq!(bytes.len(), 40 + 1024);
    let restored = HllSketch::deserialize(&bytes).unwrap();
    assert_eq!(restored, sketch);
    assert_eq!(restored.estimate(), sketch.estimate());

    let mut union = HllUnion::new(10);
    union.update(&sketch);
    let merged = HllSketch::deserialize(&union.result().serialize()).unwrap();
    assert!(merged.is_out_of_order());
}
