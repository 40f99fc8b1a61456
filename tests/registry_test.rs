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

use std::io;
use std::io::Write;
use std::sync::Arc;
use std::sync::Mutex;

use datasketches_characterization::error::ErrorKind;
use datasketches_characterization::job::Report;
use datasketches_characterization::job::TrialSchedule;
use datasketches_characterization::profile::DistinctCountAccuracyConfig;
use datasketches_characterization::profile::ItemType;
use datasketches_characterization::profile::PointSchedule;
use datasketches_characterization::profile::Profile;
use datasketches_characterization::profile::ProfileRegistry;
use datasketches_characterization::profile::RankAccuracyConfig;
use datasketches_characterization::profile::TimingConfig;
use datasketches_characterization::profile::TimingTarget;
use googletest::assert_that;
use googletest::prelude::contains_substring;
use googletest::prelude::eq;

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn small_points(lg_max: u32) -> PointSchedule {
    PointSchedule {
        lg_min: 0,
        lg_max,
        ppo: 2,
    }
}

#[test]
fn test_builtin_names() {
    let registry = ProfileRegistry::builtin();
    let names: Vec<&str> = registry.names().collect();
    assert_that!(names.len(), eq(10));
    assert!(names.windows(2).all(|w| w[0] < w[1]));
    for name in [
        "hll-sketch-accuracy",
        "hll-union-accuracy",
        "kll-sketch-accuracy-float",
        "kll-sketch-accuracy-double",
        "hll-sketch-memory",
        "kll-sketch-memory-float",
        "kll-sketch-memory-int64",
        "hll-sketch-timing",
        "kll-sketch-timing-float",
        "kll-sketch-timing-double",
    ] {
        assert!(names.contains(&name), "{name} is not registered");
    }
    assert_that!(registry.to_string(), contains_substring("HLL_8 lg_k=12"));
}

#[test]
fn test_unknown_name_lists_registered_names() {
    let registry = ProfileRegistry::builtin();
    let err = registry.get("cpc-sketch-accuracy").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    assert_eq!(err.context_value("name"), Some("cpc-sketch-accuracy"));
    let known = err.context_value("known").unwrap();
    for name in registry.names() {
        assert_that!(known, contains_substring(name));
    }
}

#[test]
fn test_distinct_count_profile_reports_coverage() {
    let profile = Profile::DistinctCountAccuracy(DistinctCountAccuracyConfig {
        lg_k: 10,
        points: small_points(8),
        trials: TrialSchedule::from_lg(2, 4, 1, false),
        tracker_k: 200,
        ..Default::default()
    });
    let captured = Captured::default();
    profile.run(&mut Report::new(captured.clone())).unwrap();

    let text = captured.text();
    assert_that!(text, contains_substring("TrueU\tTrials\tMeanEst"));
    assert_that!(text, contains_substring("LB3<"));
    // HIP estimates a single key exactly
    assert_that!(text, contains_substring("\n1\t16\t1.00\t0.000000\t0.000000"));
}

#[test]
fn test_rank_profile_exact_mode() {
    let mut config = RankAccuracyConfig::new(ItemType::Double);
    config.points = small_points(6);
    config.trials = TrialSchedule::from_lg(0, 1, 1, false);
    config.tracker_k = 200;
    let captured = Captured::default();
    Profile::RankAccuracy(config)
        .run(&mut Report::new(captured.clone()))
        .unwrap();

    let text = captured.text();
    assert_that!(text, contains_substring("StreamLen\tTrials\tMeanMaxRankErr"));
    assert_that!(text, contains_substring("\n64\t2\t0.000000\t0.000000"));
}

#[test]
fn test_timing_profile_rows() {
    let mut config = TimingConfig::new(TimingTarget::Kll {
        k: 200,
        item: ItemType::Float,
    });
    config.points = PointSchedule {
        lg_min: 0,
        lg_max: 4,
        ppo: 1,
    };
    config.lg_min_trials = 0;
    config.lg_max_trials = 2;
    let captured = Captured::default();
    Profile::Timing(config)
        .run(&mut Report::new(captured.clone()))
        .unwrap();

    let text = captured.text();
    let rows: Vec<&str> = text.lines().filter(|l| !l.starts_with('#')).collect();
    assert_eq!(rows.len(), 6);
    assert!(rows[0].starts_with("InU\tTrials\tBuild_ns"));
    assert!(rows[1].starts_with("1\t4\t"));
    assert!(rows[5].starts_with("16\t1\t"));
    // 16 floats: full preamble, one level offset, min, max and the items
    assert!(rows[5].ends_with(&format!("\t{:.1}", (20 + 4 + 18 * 4) as f64)));
}

#[test]
fn test_memory_profile_needs_counting_allocator() {
    let registry = ProfileRegistry::builtin();
    let err = registry
        .get("hll-sketch-memory")
        .unwrap()
        .run(&mut Report::new(io::sink()))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
}
