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

//! Random sources for trials and sketches.
//!
//! Every trial owns an independently seeded generator so that parallel
//! workers never share a sample sequence.

use std::cell::Cell;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

const GOLDEN_GAMMA: u64 = 0x9e3779b97f4a7c15;

static TRIAL_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Random number source for trials.
pub trait RandomSource {
    /// Returns the next random 64-bit value.
    fn next_u64(&mut self) -> u64;

    /// Returns a random boolean value.
    fn next_bool(&mut self) -> bool {
        (self.next_u64() & 1) != 0
    }

    /// Returns a uniformly distributed value in `[0, 1)`.
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }
}

/// Xorshift-based random generator.
#[derive(Debug, Clone, Copy)]
pub struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    /// Creates a new generator using the provided seed.
    pub fn seeded(seed: u64) -> Self {
        let state = if seed == 0 { GOLDEN_GAMMA } else { seed };
        Self { state }
    }

    /// Creates a generator for one trial.
    ///
    /// The seed mixes the wall clock, the process id, the calling thread and a
    /// process-wide counter, so two trials never start from the same state
    /// even when they begin in the same nanosecond on different workers.
    pub fn for_trial() -> Self {
        let count = TRIAL_COUNTER.fetch_add(1, Ordering::Relaxed);
        let seed = clock_seed() ^ thread_seed() ^ count.wrapping_mul(GOLDEN_GAMMA);
        Self::seeded(mix64(seed))
    }
}

impl Default for XorShift64 {
    fn default() -> Self {
        Self::seeded(mix64(clock_seed()))
    }
}

impl RandomSource for XorShift64 {
    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

/// Returns one random bit from a generator private to the calling thread.
pub(crate) fn thread_random_bit() -> bool {
    thread_local! {
        static RNG: Cell<XorShift64> = Cell::new(XorShift64::for_trial());
    }

    RNG.with(|cell| {
        let mut rng = cell.get();
        let bit = rng.next_bool();
        cell.set(rng);
        bit
    })
}

fn clock_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    nanos as u64 ^ std::process::id() as u64
}

fn thread_seed() -> u64 {
    thread_local! {
        static MARKER: u8 = const { 0 };
    }
    // the address of a thread local differs between live threads
    MARKER.with(|m| m as *const u8 as u64)
}

// splitmix64 finalizer
fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_is_deterministic() {
        let mut a = XorShift64::seeded(42);
        let mut b = XorShift64::seeded(42);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_trial_generators_differ() {
        let mut a = XorShift64::for_trial();
        let mut b = XorShift64::for_trial();
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn test_next_f64_in_unit_interval() {
        let mut rng = XorShift64::seeded(7);
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }
}
