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

//! Shared vocabulary: confidence levels and the canonical error fractions.

pub mod random;

/// Number of standard deviations of a confidence interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NumStdDev {
    /// One standard deviation, about 68.3% confidence.
    One,
    /// Two standard deviations, about 95.4% confidence.
    Two,
    /// Three standard deviations, about 99.7% confidence.
    Three,
}

impl NumStdDev {
    /// All confidence levels in ascending width.
    pub const ALL: [NumStdDev; 3] = [NumStdDev::One, NumStdDev::Two, NumStdDev::Three];

    /// Returns the number of standard deviations as an integer.
    pub fn as_u8(self) -> u8 {
        match self {
            NumStdDev::One => 1,
            NumStdDev::Two => 2,
            NumStdDev::Three => 3,
        }
    }

    /// Position of this level in arrays indexed by confidence level.
    pub fn index(self) -> usize {
        self.as_u8() as usize - 1
    }
}

/// Standard-normal CDF at -3 sigma.
pub const M3SD: f64 = 0.0013498980316301;
/// Standard-normal CDF at -2 sigma.
pub const M2SD: f64 = 0.0227501319481792;
/// Standard-normal CDF at -1 sigma.
pub const M1SD: f64 = 0.1586552539314570;
/// Standard-normal CDF at +1 sigma.
pub const P1SD: f64 = 0.8413447460685430;
/// Standard-normal CDF at +2 sigma.
pub const P2SD: f64 = 0.9772498680518210;
/// Standard-normal CDF at +3 sigma.
pub const P3SD: f64 = 0.9986501019683700;

/// Fractions at which error distributions are reported: min, -3..+3 sigma
/// with the median in the middle, and max.
pub const GAUSSIAN_FRACTIONS: [f64; 9] = [0.0, M3SD, M2SD, M1SD, 0.5, P1SD, P2SD, P3SD, 1.0];

/// Report column labels matching [`GAUSSIAN_FRACTIONS`].
pub const GAUSSIAN_LABELS: [&str; 9] = [
    "Min", "Q(.00135)", "Q(.02275)", "Q(.15866)", "Q(.5)", "Q(.84134)", "Q(.97725)",
    "Q(.99865)", "Max",
];
