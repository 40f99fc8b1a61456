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

//! Speed and serialized size of sketches.
//!
//! For each stream length a number of trials scaled by
//! [`TrialScaler`] builds a sketch, feeds it the stream, serializes it and
//! reads it back. Trials run one after another on the calling thread so
//! that they do not compete for cores. Every image read back is serialized
//! again and must reproduce the original bytes.

use std::time::Duration;
use std::time::Instant;

use tracing::debug;
use tracing::error;
use tracing::info;

use super::PointSchedule;
use super::sample::ItemType;
use super::sample::with_item_type;
use crate::codec::hex_dump;
use crate::common::random::RandomSource;
use crate::common::random::XorShift64;
use crate::error::Error;
use crate::error::ErrorKind;
use crate::hll::HllSketch;
use crate::job::Report;
use crate::job::trials::TrialScaler;
use crate::kll::KllSketch;
use crate::sketch::SerializableSketch;
use crate::sketch::StreamSketch;

/// The sketch being timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingTarget {
    Hll { lg_k: u8 },
    Kll { k: u16, item: ItemType },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimingConfig {
    pub target: TimingTarget,
    pub points: PointSchedule,
    /// Trials at the longest stream.
    pub lg_min_trials: u32,
    /// Trials at the shortest stream.
    pub lg_max_trials: u32,
}

impl TimingConfig {
    pub fn new(target: TimingTarget) -> Self {
        Self {
            target,
            points: PointSchedule {
                lg_min: 0,
                lg_max: 20,
                ppo: 16,
            },
            lg_min_trials: 6,
            lg_max_trials: 14,
        }
    }

    pub fn scaler(&self) -> TrialScaler {
        TrialScaler {
            lg_min_x: self.points.lg_min,
            lg_max_x: self.points.lg_max,
            lg_min_trials: self.lg_min_trials,
            lg_max_trials: self.lg_max_trials,
        }
    }
}

pub fn run(config: &TimingConfig, report: &mut Report) -> Result<(), Error> {
    config.points.validate()?;
    if config.lg_min_trials > config.lg_max_trials || config.lg_max_trials > 30 {
        return Err(Error::new(
            ErrorKind::ConfigInvalid,
            "timing trials need lg_min_trials <= lg_max_trials <= 30",
        )
        .with_context("lg_min_trials", config.lg_min_trials)
        .with_context("lg_max_trials", config.lg_max_trials));
    }
    info!(sketch = ?config.target, "sketch timing");
    match config.target {
        TimingTarget::Hll { lg_k } => {
            report.note(format!("# HLL_8 lg_k={lg_k}"))?;
            run_timing(config, report, || HllSketch::new(lg_k))
        }
        TimingTarget::Kll { k, item } => with_item_type!(item, T => {
            report.note(format!("# KLL<{item}> k={k}"))?;
            run_timing(config, report, || KllSketch::<T>::new(k))
        }),
    }
}

fn run_timing<S, F>(config: &TimingConfig, report: &mut Report, make_sketch: F) -> Result<(), Error>
where
    S: StreamSketch + SerializableSketch,
    F: Fn() -> S,
{
    let scaler = config.scaler();
    let mut rng = XorShift64::for_trial();
    report.row([
        "InU",
        "Trials",
        "Build_ns",
        "Update_ns/u",
        "Ser_ns",
        "Deser_ns",
        "Size_bytes",
    ])?;
    for stream_len in config.points.points() {
        let trials = scaler.num_trials(stream_len);
        let mut totals = TimingTotals::default();
        for _ in 0..trials {
            totals.add(&time_trial(&make_sketch, stream_len, &mut rng)?);
        }
        debug!(stream_len, trials, "stream length timed");
        report.row(totals.row(stream_len, trials))?;
    }
    report.flush()
}

/// Measurements of one trial.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrialTiming {
    pub build: Duration,
    pub update: Duration,
    pub serialize: Duration,
    pub deserialize: Duration,
    pub size_bytes: usize,
}

/// Times one build, feed, serialize and deserialize cycle.
///
/// Fails with [`ErrorKind::CompatibilityMismatch`] if the sketch read back
/// serializes to different bytes.
pub fn time_trial<S, F>(
    make_sketch: &F,
    stream_len: u64,
    rng: &mut XorShift64,
) -> Result<TrialTiming, Error>
where
    S: StreamSketch + SerializableSketch,
    F: Fn() -> S,
{
    let start = Instant::now();
    let mut sketch = make_sketch();
    let build = start.elapsed();

    let mut key = rng.next_u64();
    let start = Instant::now();
    for _ in 0..stream_len {
        sketch.feed(key, rng);
        key = key.wrapping_add(1);
    }
    let update = start.elapsed();

    let start = Instant::now();
    let bytes = sketch.serialize();
    let serialize = start.elapsed();

    let start = Instant::now();
    let restored = S::deserialize(&bytes)?;
    let deserialize = start.elapsed();

    check_same_bytes(&bytes, &restored.serialize())?;
    Ok(TrialTiming {
        build,
        update,
        serialize,
        deserialize,
        size_bytes: bytes.len(),
    })
}

fn check_same_bytes(expected: &[u8], actual: &[u8]) -> Result<(), Error> {
    if expected == actual {
        return Ok(());
    }
    let first_difference = expected
        .iter()
        .zip(actual)
        .position(|(a, b)| a != b)
        .unwrap_or(expected.len().min(actual.len()));
    error!(first_difference, "re-serialized sketch differs");
    Err(Error::new(
        ErrorKind::CompatibilityMismatch,
        "re-serialized sketch bytes differ from the bytes it was read from",
    )
    .with_context("first_difference", first_difference)
    .with_context("expected", hex_dump(expected))
    .with_context("actual", hex_dump(actual)))
}

#[derive(Debug, Default)]
struct TimingTotals {
    build: Duration,
    update: Duration,
    serialize: Duration,
    deserialize: Duration,
    size_bytes: usize,
}

impl TimingTotals {
    fn add(&mut self, trial: &TrialTiming) {
        self.build += trial.build;
        self.update += trial.update;
        self.serialize += trial.serialize;
        self.deserialize += trial.deserialize;
        self.size_bytes += trial.size_bytes;
    }

    fn row(&self, stream_len: u64, trials: u64) -> Vec<String> {
        let per_trial = |d: Duration| d.as_nanos() as f64 / trials as f64;
        vec![
            stream_len.to_string(),
            trials.to_string(),
            format!("{:.1}", per_trial(self.build)),
            format!("{:.3}", per_trial(self.update) / stream_len.max(1) as f64),
            format!("{:.1}", per_trial(self.serialize)),
            format!("{:.1}", per_trial(self.deserialize)),
            format!("{:.1}", self.size_bytes as f64 / trials as f64),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trial_records_serialized_size() {
        let mut rng = XorShift64::seeded(17);
        let timing = time_trial(&|| HllSketch::new(8), 1000, &mut rng).unwrap();
        assert_eq!(timing.size_bytes, 40 + 256);

        let timing = time_trial(&|| KllSketch::<f64>::new(200), 1, &mut rng).unwrap();
        assert_eq!(timing.size_bytes, 8 + 8);
    }

    #[test]
    fn test_mismatch_dumps_both_images() {
        let err = check_same_bytes(&[1, 2, 3], &[1, 2, 4]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CompatibilityMismatch);
        assert_eq!(err.context_value("first_difference"), Some("2"));
        assert_eq!(err.context_value("expected"), Some("010203"));
        assert_eq!(err.context_value("actual"), Some("010204"));
    }

    #[test]
    fn test_rejects_inverted_trial_range() {
        let mut config = TimingConfig::new(TimingTarget::Hll { lg_k: 8 });
        config.lg_min_trials = 8;
        config.lg_max_trials = 4;
        let err = run(&config, &mut Report::new(std::io::sink())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }
}
