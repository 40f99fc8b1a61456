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

//! Heap footprint of sketches as they grow.
//!
//! Every trial runs inside its own [`AllocationScope`]: the sketch is built
//! inside the scope, its live bytes are read at each checkpoint, and once it
//! is dropped the scope must be back at zero.

use tracing::error;
use tracing::info;

use super::PointSchedule;
use super::sample::ItemType;
use super::sample::with_item_type;
use crate::common::random::RandomSource;
use crate::common::random::XorShift64;
use crate::error::Error;
use crate::error::ErrorKind;
use crate::hll::HllSketch;
use crate::job::ProgressiveJob;
use crate::job::Report;
use crate::job::TrialRunner;
use crate::job::TrialSchedule;
use crate::job::report::write_value_table;
use crate::kll::KllSketch;
use crate::memory::AllocationScope;
use crate::memory::allocator_installed;
use crate::sketch::StreamSketch;
use crate::stats::DEFAULT_TRACKER_K;
use crate::stats::ValueStats;

/// The sketch whose footprint is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryTarget {
    Hll { lg_k: u8 },
    Kll { k: u16, item: ItemType },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryConfig {
    pub target: MemoryTarget,
    pub points: PointSchedule,
    pub trials: TrialSchedule,
    pub tracker_k: u16,
}

impl MemoryConfig {
    pub fn new(target: MemoryTarget) -> Self {
        Self {
            target,
            points: PointSchedule {
                lg_min: 0,
                lg_max: 20,
                ppo: 16,
            },
            trials: TrialSchedule::from_lg(2, 10, 4, true),
            tracker_k: DEFAULT_TRACKER_K,
        }
    }
}

pub fn run(config: &MemoryConfig, report: &mut Report) -> Result<(), Error> {
    if !allocator_installed() {
        return Err(Error::new(
            ErrorKind::ConfigInvalid,
            "memory profiles need the counting allocator as the global allocator",
        ));
    }
    config.points.validate()?;
    let checkpoints = config.points.points();
    info!(sketch = ?config.target, checkpoints = checkpoints.len(), "sketch memory");

    let mut stats = ValueStats::from_checkpoints(&checkpoints, config.tracker_k);
    let mut job = ProgressiveJob::new(config.trials)?;
    match config.target {
        MemoryTarget::Hll { lg_k } => {
            report.note(format!("# HLL_8 lg_k={lg_k}"))?;
            let runner = MemoryRunner {
                checkpoints,
                make_sketch: move || HllSketch::new(lg_k),
            };
            job.run(&runner, &mut stats, report)
        }
        MemoryTarget::Kll { k, item } => with_item_type!(item, T => {
            report.note(format!("# KLL<{item}> k={k}"))?;
            let runner = MemoryRunner {
                checkpoints,
                make_sketch: move || KllSketch::<T>::new(k),
            };
            job.run(&runner, &mut stats, report)
        }),
    }
}

/// Measures the live bytes of one sketch per trial.
pub struct MemoryRunner<F> {
    pub checkpoints: Vec<u64>,
    pub make_sketch: F,
}

impl<S, F> TrialRunner for MemoryRunner<F>
where
    S: StreamSketch,
    F: Fn() -> S + Sync,
{
    type Outcome = Vec<f64>;
    type State = Vec<ValueStats>;

    fn run_trial(&self, rng: &mut XorShift64) -> Result<Self::Outcome, Error> {
        // sized up front so the outcome does not allocate inside the scope
        let mut bytes = Vec::with_capacity(self.checkpoints.len());
        let mut key = rng.next_u64();
        let mut seen = 0;

        let scope = AllocationScope::enter();
        let mut sketch = (self.make_sketch)();
        for &point in &self.checkpoints {
            while seen < point {
                sketch.feed(key, rng);
                key = key.wrapping_add(1);
                seen += 1;
            }
            bytes.push(scope.live_bytes() as f64);
        }
        drop(sketch);
        scope.finish().inspect_err(|err| error!(%err, "sketch leaked memory"))?;
        Ok(bytes)
    }

    fn merge(&self, state: &mut Self::State, outcome: Self::Outcome) {
        for (stats, value) in state.iter_mut().zip(outcome) {
            stats.update(value);
        }
    }

    fn report(&self, state: &Self::State, report: &mut Report) -> Result<(), Error> {
        write_value_table(report, state, "InU", "Bytes")
    }
}
