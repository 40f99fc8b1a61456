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
use datasketches_characterization::memory::AllocationScope;
use datasketches_characterization::memory::CountingAllocator;
use datasketches_characterization::memory::allocator_installed;
use datasketches_characterization::profile::ItemType;
use datasketches_characterization::profile::MemoryConfig;
use datasketches_characterization::profile::MemoryTarget;
use datasketches_characterization::profile::PointSchedule;
use datasketches_characterization::profile::Profile;
use googletest::assert_that;
use googletest::prelude::contains_substring;
use googletest::prelude::eq;

#[global_allocator]
static GLOBAL: CountingAllocator = CountingAllocator::system();

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

fn small_config(target: MemoryTarget) -> MemoryConfig {
    let mut config = MemoryConfig::new(target);
    config.points = PointSchedule {
        lg_min: 0,
        lg_max: 6,
        ppo: 1,
    };
    config.trials = TrialSchedule::from_lg(0, 2, 1, false);
    config.tracker_k = 200;
    config
}

#[test]
fn test_scope_counts_live_bytes() {
    let scope = AllocationScope::enter();
    let buffer = vec![0u8; 64];
    let live = scope.live_bytes();
    drop(buffer);
    assert_that!(live, eq(64));
    assert_that!(scope.live_bytes(), eq(0));
    scope.finish().unwrap();
}

#[test]
fn test_scope_reports_leak() {
    let scope = AllocationScope::enter();
    let kept = vec![1u64; 16];
    let err = scope.finish().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MemoryLeak);
    assert_eq!(err.context_value("live_bytes"), Some("128"));
    drop(kept);
}

#[test]
fn test_scopes_are_independent_per_trial() {
    let outer = AllocationScope::enter();
    let kept = vec![0u8; 32];
    let inner = AllocationScope::enter();
    let scratch = vec![0u8; 100];
    drop(scratch);
    inner.finish().unwrap();
    let live = outer.live_bytes();
    drop(kept);
    assert_eq!(live, 32);
    outer.finish().unwrap();
}

#[test]
fn test_hll_memory_profile() {
    assert!(allocator_installed());
    let captured = Captured::default();
    let profile = Profile::Memory(small_config(MemoryTarget::Hll { lg_k: 8 }));
    profile.run(&mut Report::new(captured.clone())).unwrap();

    let text = captured.text();
    assert_that!(text, contains_substring("InU\tTrials\tMeanBytes"));
    // the register array is the only heap allocation of the sketch
    assert_that!(text, contains_substring("\n64\t4\t256.000000\t256.000000"));
}

#[test]
fn test_kll_memory_profile_releases_everything() {
    for item in [ItemType::Float, ItemType::Int64] {
        let profile = Profile::Memory(small_config(MemoryTarget::Kll { k: 200, item }));
        profile.run(&mut Report::new(io::sink())).unwrap();
    }
}
