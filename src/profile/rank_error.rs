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

//! Rank accuracy of the KLL sketch.
//!
//! A trial feeds a random permutation of `1..=n` for every stream length `n`
//! and compares the sketch's normalized rank of selected items with their
//! exact rank `i / n`. The worst absolute difference of the trial is the
//! sample recorded for that stream length.

use std::marker::PhantomData;

use tracing::info;

use super::PointSchedule;
use super::sample::ItemType;
use super::sample::SampleValue;
use super::sample::with_item_type;
use crate::common::random::RandomSource;
use crate::common::random::XorShift64;
use crate::error::Error;
use crate::job::ProgressiveJob;
use crate::job::Report;
use crate::job::TrialRunner;
use crate::job::TrialSchedule;
use crate::job::report::write_value_table;
use crate::kll::DEFAULT_K;
use crate::kll::KllSketch;
use crate::stats::DEFAULT_TRACKER_K;
use crate::stats::ValueStats;

#[derive(Debug, Clone, PartialEq)]
pub struct RankAccuracyConfig {
    pub item: ItemType,
    pub k: u16,
    pub points: PointSchedule,
    pub trials: TrialSchedule,
    /// At most this many ranks are checked per stream.
    pub max_eval_points: u64,
    pub tracker_k: u16,
}

impl RankAccuracyConfig {
    pub fn new(item: ItemType) -> Self {
        Self {
            item,
            k: DEFAULT_K,
            points: PointSchedule {
                lg_min: 0,
                lg_max: 16,
                ppo: 8,
            },
            trials: TrialSchedule::from_lg(4, 10, 4, true),
            max_eval_points: 1000,
            tracker_k: DEFAULT_TRACKER_K,
        }
    }
}

pub fn run(config: &RankAccuracyConfig, report: &mut Report) -> Result<(), Error> {
    with_item_type!(config.item, T => run_typed::<T>(config, report))
}

fn run_typed<T: SampleValue>(config: &RankAccuracyConfig, report: &mut Report) -> Result<(), Error> {
    config.points.validate()?;
    let stream_lengths = config.points.points();
    info!(item = T::TYPE_NAME, k = config.k, "kll rank accuracy");
    report.note(format!(
        "# KLL<{}> k={}, normalized rank error: {:.6}",
        T::TYPE_NAME,
        config.k,
        KllSketch::<T>::new(config.k).normalized_rank_error(false)
    ))?;

    let runner = RankErrorRunner::<T> {
        k: config.k,
        stream_lengths,
        max_eval_points: config.max_eval_points.max(1),
        item: PhantomData,
    };
    let mut stats = ValueStats::from_checkpoints(&runner.stream_lengths, config.tracker_k);
    ProgressiveJob::new(config.trials)?.run(&runner, &mut stats, report)
}

pub struct RankErrorRunner<T> {
    pub k: u16,
    pub stream_lengths: Vec<u64>,
    pub max_eval_points: u64,
    pub item: PhantomData<fn() -> T>,
}

impl<T: SampleValue> RankErrorRunner<T> {
    /// Worst rank error of one sketch fed a shuffled `1..=n`.
    pub fn max_rank_error(&self, n: u64, rng: &mut XorShift64) -> f64 {
        let mut ranks: Vec<u64> = (1..=n).collect();
        shuffle(&mut ranks, rng);
        let mut sketch = KllSketch::<T>::new(self.k);
        for &r in &ranks {
            sketch.update(T::from_rank(r));
        }

        let eval_ranks = eval_ranks(n, self.max_eval_points);
        let split_points: Vec<T> = eval_ranks.iter().map(|&r| T::from_rank(r)).collect();
        let estimated = sketch.cdf(&split_points, true).unwrap_or_default();
        eval_ranks
            .iter()
            .zip(estimated)
            .map(|(&r, est)| (est - r as f64 / n as f64).abs())
            .fold(0.0, f64::max)
    }
}

impl<T: SampleValue> TrialRunner for RankErrorRunner<T> {
    type Outcome = Vec<f64>;
    type State = Vec<ValueStats>;

    fn run_trial(&self, rng: &mut XorShift64) -> Result<Self::Outcome, Error> {
        Ok(self
            .stream_lengths
            .iter()
            .map(|&n| self.max_rank_error(n, rng))
            .collect())
    }

    fn merge(&self, state: &mut Self::State, outcome: Self::Outcome) {
        for (stats, value) in state.iter_mut().zip(outcome) {
            stats.update(value);
        }
    }

    fn report(&self, state: &Self::State, report: &mut Report) -> Result<(), Error> {
        write_value_table(report, state, "StreamLen", "MaxRankErr")
    }

    fn updates_per_trial(&self) -> Option<u64> {
        Some(self.stream_lengths.iter().fold(0u64, |acc, &n| acc.saturating_add(n)))
    }
}

/// Evenly spaced ranks in `1..=n`, all of them if `n <= max_points`.
fn eval_ranks(n: u64, max_points: u64) -> Vec<u64> {
    if n <= max_points {
        return (1..=n).collect();
    }
    // widened so that j * n cannot overflow for stream lengths near 2^62
    (1..=max_points)
        .map(|j| (j as u128 * n as u128 / max_points as u128) as u64)
        .collect()
}

/// Fisher-Yates shuffle.
fn shuffle<V>(values: &mut [V], rng: &mut XorShift64) {
    for i in (1..values.len()).rev() {
        let j = (rng.next_u64() % (i as u64 + 1)) as usize;
        values.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_ranks() {
        assert_eq!(eval_ranks(4, 10), vec![1, 2, 3, 4]);
        assert_eq!(eval_ranks(100, 4), vec![25, 50, 75, 100]);
    }

    #[test]
    fn test_eval_ranks_for_huge_streams() {
        let n = 1u64 << 62;
        let ranks = eval_ranks(n, 1000);
        assert_eq!(ranks.len(), 1000);
        assert_eq!(ranks[0], n / 1000);
        assert_eq!(ranks[999], n);
        assert!(ranks.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let mut values: Vec<u32> = (0..100).collect();
        shuffle(&mut values, &mut XorShift64::seeded(11));
        let mut sorted = values.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..100).collect::<Vec<_>>());
        assert_ne!(values, sorted);
    }

    #[test]
    fn test_exact_mode_has_no_rank_error() {
        let runner = RankErrorRunner::<f32> {
            k: 200,
            stream_lengths: vec![1, 50, 200],
            max_eval_points: 1000,
            item: PhantomData,
        };
        let outcome = runner.run_trial(&mut XorShift64::seeded(5)).unwrap();
        assert_eq!(outcome, vec![0.0, 0.0, 0.0]);
    }
}
