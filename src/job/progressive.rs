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

//! Progressive trial execution with anytime reporting.
//!
//! Trials run in batches whose cumulative sizes follow the checkpoint
//! sequence on the trial-count axis: starting at the minimum, each batch
//! brings the total to the next point of a log-spaced series, until the
//! maximum is reached. After a batch the job can emit a full report, so a
//! run that is stopped early still leaves usable results behind.

use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;
use std::time::Instant;

use chrono::Local;
use chrono::TimeDelta;
use rayon::prelude::*;
use tracing::debug;
use tracing::info;

use super::points::next_point;
use super::report::Report;
use crate::common::random::XorShift64;
use crate::error::Error;
use crate::error::ErrorKind;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One kind of trial and the accumulators its outcomes are merged into.
///
/// `run_trial` executes concurrently on many workers and must only touch
/// state it creates itself. `merge` is called with exclusive access to the
/// shared accumulators, once per completed trial.
pub trait TrialRunner: Sync {
    /// What one trial produces.
    type Outcome: Send;
    /// Accumulators shared by every trial of a run.
    type State: Send;

    /// Runs one independent trial.
    fn run_trial(&self, rng: &mut XorShift64) -> Result<Self::Outcome, Error>;

    /// Folds one trial's outcome into the accumulators.
    fn merge(&self, state: &mut Self::State, outcome: Self::Outcome);

    /// Writes the accumulators as a report snapshot.
    fn report(&self, state: &Self::State, report: &mut Report) -> Result<(), Error>;

    /// Sketch updates performed by one trial, if the runner counts them.
    /// When known, the progress footer adds cumulative updates and the mean
    /// time per update.
    fn updates_per_trial(&self) -> Option<u64> {
        None
    }
}

/// How many trials to run and how often to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialSchedule {
    /// Size of the first batch.
    pub min_trials: u64,
    /// Total trials of the run.
    pub max_trials: u64,
    /// Density of the cumulative batch sizes per doubling.
    pub trials_ppo: u32,
    /// Emit a report after every batch, not just the last.
    pub intermediate: bool,
}

impl TrialSchedule {
    /// A schedule running from `2^lg_min_trials` to `2^lg_max_trials` trials.
    pub fn from_lg(
        lg_min_trials: u32,
        lg_max_trials: u32,
        trials_ppo: u32,
        intermediate: bool,
    ) -> Self {
        Self {
            min_trials: 1 << lg_min_trials,
            max_trials: 1 << lg_max_trials,
            trials_ppo,
            intermediate,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.min_trials == 0 || self.min_trials > self.max_trials || self.trials_ppo == 0 {
            return Err(Error::new(
                ErrorKind::ConfigInvalid,
                "trial schedule needs 0 < min_trials <= max_trials and trials_ppo > 0",
            )
            .with_context("min_trials", self.min_trials)
            .with_context("max_trials", self.max_trials)
            .with_context("trials_ppo", self.trials_ppo));
        }
        Ok(())
    }

    /// Cumulative trial count after the batch that follows `last_trials`.
    pub fn next_total(&self, last_trials: u64) -> u64 {
        let next = if last_trials == 0 {
            self.min_trials
        } else {
            next_point(self.trials_ppo, last_trials)
        };
        next.min(self.max_trials)
    }
}

/// Lifecycle of a [`ProgressiveJob`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Unstarted,
    Running,
    Complete,
    /// A trial or a report failed. The accumulators may hold part of a
    /// batch, so the job cannot be resumed.
    Failed,
}

/// Drives a [`TrialRunner`] through a [`TrialSchedule`].
#[derive(Debug)]
pub struct ProgressiveJob {
    schedule: TrialSchedule,
    state: JobState,
    trials_done: u64,
    elapsed: Duration,
}

impl ProgressiveJob {
    pub fn new(schedule: TrialSchedule) -> Result<Self, Error> {
        schedule.validate()?;
        Ok(Self {
            schedule,
            state: JobState::Unstarted,
            trials_done: 0,
            elapsed: Duration::ZERO,
        })
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Trials completed so far.
    pub fn trials_done(&self) -> u64 {
        self.trials_done
    }

    /// Runs every remaining batch. Returns immediately if already complete.
    ///
    /// The first failing trial aborts the run and leaves the job
    /// [`JobState::Failed`]; reports written before it stay valid. Running a
    /// failed job again is a [`ErrorKind::ConfigInvalid`] error.
    pub fn run<R: TrialRunner>(
        &mut self,
        runner: &R,
        state: &mut R::State,
        report: &mut Report,
    ) -> Result<(), Error> {
        match self.state {
            JobState::Complete => return Ok(()),
            JobState::Failed => {
                return Err(Error::new(
                    ErrorKind::ConfigInvalid,
                    "job failed earlier and cannot be resumed",
                )
                .with_context("trials_done", self.trials_done));
            }
            JobState::Unstarted | JobState::Running => {}
        }
        self.state = JobState::Running;
        let result = self.run_batches(runner, state, report);
        if result.is_err() {
            self.state = JobState::Failed;
        }
        result
    }

    fn run_batches<R: TrialRunner>(
        &mut self,
        runner: &R,
        state: &mut R::State,
        report: &mut Report,
    ) -> Result<(), Error> {
        info!(
            min_trials = self.schedule.min_trials,
            max_trials = self.schedule.max_trials,
            "starting trials"
        );

        while self.trials_done < self.schedule.max_trials {
            let next = self.schedule.next_total(self.trials_done);
            let batch = next - self.trials_done;
            let start = Instant::now();
            run_batch(runner, state, batch)?;
            self.elapsed += start.elapsed();
            self.trials_done = next;
            debug!(batch, trials = next, elapsed = ?self.elapsed, "batch complete");

            let is_last = next == self.schedule.max_trials;
            if self.schedule.intermediate || is_last {
                runner.report(state, report)?;
            }
            report.note(self.progress_line(runner.updates_per_trial()))?;
            report.flush()?;
        }

        self.state = JobState::Complete;
        info!(trials = self.trials_done, elapsed = ?self.elapsed, "trials complete");
        Ok(())
    }

    fn progress_line(&self, updates_per_trial: Option<u64>) -> String {
        let per_trial = self.elapsed.as_secs_f64() / self.trials_done as f64;
        let remaining = (self.schedule.max_trials - self.trials_done) as f64 * per_trial;
        let now = Local::now();
        let completion = now + TimeDelta::milliseconds((remaining * 1000.0) as i64);
        let updates = match updates_per_trial {
            Some(n) if n > 0 => format!(
                ", Cum updates: {}, Avg update time: {:.3} ns",
                self.trials_done.saturating_mul(n),
                per_trial * 1e9 / n as f64,
            ),
            _ => String::new(),
        };
        format!(
            "# Trials: {}, Cum time: {:.3} s, Time/trial: {:.3} ms{updates}, Est time to complete: {:.3} s, Current: {}, Est complete: {}",
            self.trials_done,
            self.elapsed.as_secs_f64(),
            per_trial * 1000.0,
            remaining,
            now.format(DATE_FORMAT),
            completion.format(DATE_FORMAT),
        )
    }
}

fn run_batch<R: TrialRunner>(runner: &R, state: &mut R::State, batch: u64) -> Result<(), Error> {
    let shared = Mutex::new(state);
    (0..batch).into_par_iter().try_for_each(|_| {
        let mut rng = XorShift64::for_trial();
        let outcome = runner.run_trial(&mut rng)?;
        let mut guard = shared.lock().unwrap_or_else(PoisonError::into_inner);
        runner.merge(&mut **guard, outcome);
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batches_follow_trial_points() {
        let schedule = TrialSchedule::from_lg(2, 6, 1, true);
        let mut totals = vec![];
        let mut last = 0;
        while last < schedule.max_trials {
            last = schedule.next_total(last);
            totals.push(last);
        }
        assert_eq!(totals, vec![4, 8, 16, 32, 64]);
    }

    #[test]
    fn test_last_batch_is_clamped() {
        let schedule = TrialSchedule {
            min_trials: 1,
            max_trials: 1000,
            trials_ppo: 1,
            intermediate: false,
        };
        assert_eq!(schedule.next_total(512), 1000);
    }

    #[test]
    fn test_invalid_schedule() {
        let schedule = TrialSchedule::from_lg(5, 4, 1, true);
        let err = ProgressiveJob::new(schedule).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }
}
