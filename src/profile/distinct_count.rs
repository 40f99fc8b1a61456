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

//! Accuracy of distinct-count sketches.
//!
//! Every trial streams unique keys into a fresh sketch and, at each
//! checkpoint, records the estimate and the declared bounds against the
//! exact number of keys seen so far. The union variant spreads the stream
//! over several sketches and measures the union of them instead.

use tracing::info;

use super::PointSchedule;
use crate::common::random::RandomSource;
use crate::common::random::XorShift64;
use crate::error::Error;
use crate::hll::HllSketch;
use crate::hll::HllUnion;
use crate::job::ProgressiveJob;
use crate::job::Report;
use crate::job::TrialRunner;
use crate::job::TrialSchedule;
use crate::job::report::write_accuracy_table;
use crate::sketch::DistinctCountSketch;
use crate::sketch::DistinctCountUnion;
use crate::stats::AccuracyStats;
use crate::stats::DEFAULT_TRACKER_K;
use crate::stats::TrialOutcome;

/// What the stream is measured through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistinctCountTarget {
    /// One sketch sees the whole stream.
    Sketch,
    /// The stream is dealt round-robin to `num_sketches` sketches and the
    /// estimate is taken from their union.
    Union { num_sketches: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistinctCountAccuracyConfig {
    pub lg_k: u8,
    pub target: DistinctCountTarget,
    pub points: PointSchedule,
    pub trials: TrialSchedule,
    /// Capacity of each checkpoint's relative-error tracker.
    pub tracker_k: u16,
}

impl Default for DistinctCountAccuracyConfig {
    fn default() -> Self {
        Self {
            lg_k: 12,
            target: DistinctCountTarget::Sketch,
            points: PointSchedule {
                lg_min: 0,
                lg_max: 20,
                ppo: 16,
            },
            trials: TrialSchedule::from_lg(4, 16, 4, true),
            tracker_k: DEFAULT_TRACKER_K,
        }
    }
}

/// Runs the accuracy profile for HLL sketches.
pub fn run(config: &DistinctCountAccuracyConfig, report: &mut Report) -> Result<(), Error> {
    config.points.validate()?;
    let checkpoints = config.points.points();
    info!(
        lg_k = config.lg_k,
        sketch = ?config.target,
        checkpoints = checkpoints.len(),
        "distinct count accuracy"
    );

    let lg_k = config.lg_k;
    let mut stats = AccuracyStats::from_checkpoints(&checkpoints, config.tracker_k);
    let mut job = ProgressiveJob::new(config.trials)?;
    match config.target {
        DistinctCountTarget::Sketch => {
            let runner = SketchAccuracy {
                checkpoints,
                make_sketch: move || HllSketch::new(lg_k),
            };
            job.run(&runner, &mut stats, report)
        }
        DistinctCountTarget::Union { num_sketches } => {
            let runner = UnionAccuracy {
                checkpoints,
                num_sketches: num_sketches.max(1),
                make_sketch: move || HllSketch::new(lg_k),
                make_union: move || HllUnion::new(lg_k),
            };
            job.run(&runner, &mut stats, report)
        }
    }
}

/// Streams unique keys into one sketch.
pub struct SketchAccuracy<F> {
    pub checkpoints: Vec<u64>,
    pub make_sketch: F,
}

impl<S, F> TrialRunner for SketchAccuracy<F>
where
    S: DistinctCountSketch,
    F: Fn() -> S + Sync,
{
    type Outcome = Vec<TrialOutcome>;
    type State = Vec<AccuracyStats>;

    fn run_trial(&self, rng: &mut XorShift64) -> Result<Self::Outcome, Error> {
        let mut sketch = (self.make_sketch)();
        let mut key = rng.next_u64();
        let mut seen = 0;
        let mut outcomes = Vec::with_capacity(self.checkpoints.len());
        for &point in &self.checkpoints {
            while seen < point {
                sketch.update_key(key);
                key = key.wrapping_add(1);
                seen += 1;
            }
            outcomes.push(TrialOutcome::with_bounds(sketch.estimate(), sketch.bounds()));
        }
        Ok(outcomes)
    }

    fn merge(&self, state: &mut Self::State, outcome: Self::Outcome) {
        merge_outcomes(state, &outcome);
    }

    fn report(&self, state: &Self::State, report: &mut Report) -> Result<(), Error> {
        write_accuracy_table(report, state, true)
    }

    fn updates_per_trial(&self) -> Option<u64> {
        self.checkpoints.last().copied()
    }
}

/// Deals unique keys round-robin to several sketches and measures their union.
pub struct UnionAccuracy<F, G> {
    pub checkpoints: Vec<u64>,
    pub num_sketches: usize,
    pub make_sketch: F,
    pub make_union: G,
}

impl<U, F, G> TrialRunner for UnionAccuracy<F, G>
where
    U: DistinctCountUnion,
    F: Fn() -> U::Sketch + Sync,
    G: Fn() -> U + Sync,
{
    type Outcome = Vec<TrialOutcome>;
    type State = Vec<AccuracyStats>;

    fn run_trial(&self, rng: &mut XorShift64) -> Result<Self::Outcome, Error> {
        let mut sketches: Vec<U::Sketch> = (0..self.num_sketches)
            .map(|_| (self.make_sketch)())
            .collect();
        let mut key = rng.next_u64();
        let mut seen = 0;
        let mut outcomes = Vec::with_capacity(self.checkpoints.len());
        for &point in &self.checkpoints {
            while seen < point {
                sketches[(seen % self.num_sketches as u64) as usize].update_key(key);
                key = key.wrapping_add(1);
                seen += 1;
            }
            let mut union = (self.make_union)();
            for sketch in &sketches {
                union.update(sketch);
            }
            let result = union.result();
            outcomes.push(TrialOutcome::with_bounds(result.estimate(), result.bounds()));
        }
        Ok(outcomes)
    }

    fn merge(&self, state: &mut Self::State, outcome: Self::Outcome) {
        merge_outcomes(state, &outcome);
    }

    fn report(&self, state: &Self::State, report: &mut Report) -> Result<(), Error> {
        write_accuracy_table(report, state, true)
    }

    fn updates_per_trial(&self) -> Option<u64> {
        self.checkpoints.last().copied()
    }
}

/// Folds one trial's per-checkpoint outcomes into the accumulators.
///
/// # Panics
///
/// Panics if the trial reported a different number of checkpoints.
pub fn merge_outcomes(stats: &mut [AccuracyStats], outcomes: &[TrialOutcome]) {
    assert_eq!(
        stats.len(),
        outcomes.len(),
        "trial produced {} outcomes for {} checkpoints",
        outcomes.len(),
        stats.len()
    );
    for (s, outcome) in stats.iter_mut().zip(outcomes) {
        s.record(outcome);
    }
}
