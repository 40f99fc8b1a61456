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

//! Characterization profiles and the registry that names them.
//!
//! A [`Profile`] is a fully configured measurement: which sketch, which
//! checkpoints, how many trials. [`ProfileRegistry::builtin`] builds the
//! table of named profiles once; the binary looks a name up, applies the
//! command line overrides and runs the result.
//!
//! ```
//! # use datasketches_characterization::profile::ProfileRegistry;
//! let registry = ProfileRegistry::builtin();
//! assert!(registry.get("hll-sketch-accuracy").is_ok());
//! assert!(registry.get("no-such-profile").is_err());
//! ```

pub mod distinct_count;
pub mod memory;
pub mod rank_error;
pub mod sample;
pub mod timing;

use std::collections::BTreeMap;
use std::fmt;

pub use self::distinct_count::DistinctCountAccuracyConfig;
pub use self::distinct_count::DistinctCountTarget;
pub use self::memory::MemoryConfig;
pub use self::memory::MemoryTarget;
pub use self::rank_error::RankAccuracyConfig;
pub use self::sample::ItemType;
pub use self::sample::SampleValue;
pub use self::timing::TimingConfig;
pub use self::timing::TimingTarget;
use crate::error::Error;
use crate::error::ErrorKind;
use crate::job::Report;
use crate::job::TrialSchedule;
use crate::job::points::MAX_LG_POINT;
use crate::job::points::log2_points;

/// Number of sketches the union accuracy profile deals the stream to.
pub const UNION_SKETCHES: usize = 32;

/// Checkpoints `2^lg_min ..= 2^lg_max` with `ppo` points per octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointSchedule {
    pub lg_min: u32,
    pub lg_max: u32,
    pub ppo: u32,
}

impl PointSchedule {
    pub fn validate(&self) -> Result<(), Error> {
        if self.ppo == 0 || self.lg_min > self.lg_max || self.lg_max > MAX_LG_POINT {
            return Err(Error::new(
                ErrorKind::ConfigInvalid,
                format!("checkpoints need ppo > 0 and lg_min <= lg_max <= {MAX_LG_POINT}"),
            )
            .with_context("lg_min", self.lg_min)
            .with_context("lg_max", self.lg_max)
            .with_context("ppo", self.ppo));
        }
        Ok(())
    }

    /// The checkpoints.
    ///
    /// # Panics
    ///
    /// Panics if the schedule does not [`validate`](Self::validate).
    pub fn points(&self) -> Vec<u64> {
        log2_points(self.lg_min, self.lg_max, self.ppo)
    }
}

/// Command line adjustments applied to a registered profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileOverrides {
    /// Total trials become `2^lg_max_trials`.
    pub lg_max_trials: Option<u32>,
    /// The last checkpoint becomes `2^lg_max_x`.
    pub lg_max_x: Option<u32>,
    /// Report only once, after the last batch.
    pub no_intermediate: bool,
}

/// A configured measurement.
#[derive(Debug, Clone, PartialEq)]
pub enum Profile {
    DistinctCountAccuracy(DistinctCountAccuracyConfig),
    RankAccuracy(RankAccuracyConfig),
    Memory(MemoryConfig),
    Timing(TimingConfig),
}

impl Profile {
    pub fn description(&self) -> String {
        match self {
            Profile::DistinctCountAccuracy(c) => match c.target {
                DistinctCountTarget::Sketch => {
                    format!("HLL_8 lg_k={} estimate and bound coverage", c.lg_k)
                }
                DistinctCountTarget::Union { num_sketches } => format!(
                    "HLL_8 lg_k={} union of {num_sketches} sketches, estimate and bound coverage",
                    c.lg_k
                ),
            },
            Profile::RankAccuracy(c) => {
                format!("KLL<{}> k={} max rank error per stream", c.item, c.k)
            }
            Profile::Memory(c) => match c.target {
                MemoryTarget::Hll { lg_k } => format!("HLL_8 lg_k={lg_k} heap bytes"),
                MemoryTarget::Kll { k, item } => format!("KLL<{item}> k={k} heap bytes"),
            },
            Profile::Timing(c) => match c.target {
                TimingTarget::Hll { lg_k } => {
                    format!("HLL_8 lg_k={lg_k} update and serialization speed")
                }
                TimingTarget::Kll { k, item } => {
                    format!("KLL<{item}> k={k} update and serialization speed")
                }
            },
        }
    }

    /// Returns this profile with the overrides applied.
    pub fn apply(&self, overrides: &ProfileOverrides) -> Result<Profile, Error> {
        let mut profile = self.clone();
        if let Some(lg_max_x) = overrides.lg_max_x {
            let points = profile.points_mut();
            points.lg_max = lg_max_x;
            points.validate()?;
        }
        match &mut profile {
            Profile::DistinctCountAccuracy(DistinctCountAccuracyConfig { trials, .. })
            | Profile::RankAccuracy(RankAccuracyConfig { trials, .. })
            | Profile::Memory(MemoryConfig { trials, .. }) => {
                apply_to_schedule(trials, overrides)?;
            }
            Profile::Timing(config) => {
                if let Some(lg) = overrides.lg_max_trials {
                    if lg < config.lg_min_trials || lg > 30 {
                        return Err(invalid_lg_max_trials(lg, config.lg_min_trials));
                    }
                    config.lg_max_trials = lg;
                }
            }
        }
        Ok(profile)
    }

    pub fn run(&self, report: &mut Report) -> Result<(), Error> {
        match self {
            Profile::DistinctCountAccuracy(config) => distinct_count::run(config, report),
            Profile::RankAccuracy(config) => rank_error::run(config, report),
            Profile::Memory(config) => memory::run(config, report),
            Profile::Timing(config) => timing::run(config, report),
        }
    }

    fn points_mut(&mut self) -> &mut PointSchedule {
        match self {
            Profile::DistinctCountAccuracy(c) => &mut c.points,
            Profile::RankAccuracy(c) => &mut c.points,
            Profile::Memory(c) => &mut c.points,
            Profile::Timing(c) => &mut c.points,
        }
    }
}

fn apply_to_schedule(
    schedule: &mut TrialSchedule,
    overrides: &ProfileOverrides,
) -> Result<(), Error> {
    if let Some(lg) = overrides.lg_max_trials {
        if lg > MAX_LG_POINT {
            return Err(invalid_lg_max_trials(lg, 0));
        }
        schedule.max_trials = 1 << lg;
        schedule.validate()?;
    }
    if overrides.no_intermediate {
        schedule.intermediate = false;
    }
    Ok(())
}

fn invalid_lg_max_trials(lg: u32, lg_min: u32) -> Error {
    Error::new(ErrorKind::ConfigInvalid, "invalid --lg-max-trials")
        .with_context("lg_max_trials", lg)
        .with_context("lg_min_trials", lg_min)
}

/// Immutable table of the named profiles.
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: BTreeMap<&'static str, Profile>,
}

impl ProfileRegistry {
    /// The profiles shipped with this crate.
    pub fn builtin() -> Self {
        let union = DistinctCountAccuracyConfig {
            target: DistinctCountTarget::Union {
                num_sketches: UNION_SKETCHES,
            },
            ..Default::default()
        };
        let profiles = BTreeMap::from([
            (
                "hll-sketch-accuracy",
                Profile::DistinctCountAccuracy(DistinctCountAccuracyConfig::default()),
            ),
            ("hll-union-accuracy", Profile::DistinctCountAccuracy(union)),
            (
                "kll-sketch-accuracy-float",
                Profile::RankAccuracy(RankAccuracyConfig::new(ItemType::Float)),
            ),
            (
                "kll-sketch-accuracy-double",
                Profile::RankAccuracy(RankAccuracyConfig::new(ItemType::Double)),
            ),
            (
                "hll-sketch-memory",
                Profile::Memory(MemoryConfig::new(MemoryTarget::Hll { lg_k: 12 })),
            ),
            (
                "kll-sketch-memory-float",
                Profile::Memory(MemoryConfig::new(MemoryTarget::Kll {
                    k: 200,
                    item: ItemType::Float,
                })),
            ),
            (
                "kll-sketch-memory-int64",
                Profile::Memory(MemoryConfig::new(MemoryTarget::Kll {
                    k: 200,
                    item: ItemType::Int64,
                })),
            ),
            (
                "hll-sketch-timing",
                Profile::Timing(TimingConfig::new(TimingTarget::Hll { lg_k: 12 })),
            ),
            (
                "kll-sketch-timing-float",
                Profile::Timing(TimingConfig::new(TimingTarget::Kll {
                    k: 200,
                    item: ItemType::Float,
                })),
            ),
            (
                "kll-sketch-timing-double",
                Profile::Timing(TimingConfig::new(TimingTarget::Kll {
                    k: 200,
                    item: ItemType::Double,
                })),
            ),
        ]);
        Self { profiles }
    }

    /// Looks up a profile by name.
    pub fn get(&self, name: &str) -> Result<&Profile, Error> {
        self.profiles.get(name).ok_or_else(|| {
            Error::new(ErrorKind::ConfigInvalid, "unknown profile")
                .with_context("name", name)
                .with_context("known", self.names().collect::<Vec<_>>().join(", "))
        })
    }

    /// Registered names in lexical order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.profiles.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Profile)> {
        self.profiles.iter().map(|(name, profile)| (*name, profile))
    }
}

impl fmt::Display for ProfileRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, profile) in self.iter() {
            writeln!(f, "  {name:<28} {}", profile.description())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_shrink_a_profile() {
        let registry = ProfileRegistry::builtin();
        let overrides = ProfileOverrides {
            lg_max_trials: Some(5),
            lg_max_x: Some(8),
            no_intermediate: true,
        };
        let profile = registry
            .get("hll-sketch-accuracy")
            .unwrap()
            .apply(&overrides)
            .unwrap();
        let Profile::DistinctCountAccuracy(config) = profile else {
            panic!("expected a distinct count profile");
        };
        assert_eq!(config.points.lg_max, 8);
        assert_eq!(config.trials.max_trials, 32);
        assert!(!config.trials.intermediate);
    }

    #[test]
    fn test_override_below_minimum_is_rejected() {
        let registry = ProfileRegistry::builtin();
        let overrides = ProfileOverrides {
            lg_max_trials: Some(1),
            ..Default::default()
        };
        for name in ["hll-sketch-accuracy", "hll-sketch-timing"] {
            let err = registry.get(name).unwrap().apply(&overrides).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        }
    }

    #[test]
    fn test_point_schedule_validation() {
        let schedule = PointSchedule {
            lg_min: 3,
            lg_max: 2,
            ppo: 4,
        };
        assert!(schedule.validate().is_err());
        let schedule = PointSchedule { ppo: 0, ..schedule };
        assert!(schedule.validate().is_err());
    }
}
