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

//! What the profiles need from a sketch under test.
//!
//! Profiles are written against these traits and never look inside a
//! sketch. The HLL and KLL sketches of this crate implement them.

use crate::common::NumStdDev;
use crate::common::random::XorShift64;
use crate::error::Error;
use crate::hll::HllSketch;
use crate::hll::HllUnion;
use crate::kll::KllSketch;
use crate::profile::sample::SampleValue;
use crate::stats::Bounds;

/// A distinct-count estimator with declared confidence bounds.
pub trait DistinctCountSketch {
    /// Presents one item, identified by a 64-bit key.
    fn update_key(&mut self, key: u64);

    fn estimate(&self) -> f64;

    fn lower_bound(&self, num_std_dev: NumStdDev) -> f64;

    fn upper_bound(&self, num_std_dev: NumStdDev) -> f64;

    /// Bounds at every confidence level.
    fn bounds(&self) -> Bounds {
        Bounds::from_fn(|s| self.lower_bound(s), |s| self.upper_bound(s))
    }
}

/// Merges distinct-count sketches.
pub trait DistinctCountUnion {
    type Sketch: DistinctCountSketch;

    fn update(&mut self, sketch: &Self::Sketch);

    fn result(&self) -> Self::Sketch;
}

/// A sketch with a binary image that reads back into an equal sketch.
pub trait SerializableSketch: Sized {
    fn serialize(&self) -> Vec<u8>;

    fn deserialize(bytes: &[u8]) -> Result<Self, Error>;
}

/// A sketch that can be fed a synthetic stream.
pub trait StreamSketch {
    /// Presents the item for stream position `key`. Distinct keys must map
    /// to distinct items for distinct-count sketches; value sketches may
    /// draw their item from `rng` instead.
    fn feed(&mut self, key: u64, rng: &mut XorShift64);
}

impl DistinctCountSketch for HllSketch {
    fn update_key(&mut self, key: u64) {
        self.update(key);
    }

    fn estimate(&self) -> f64 {
        HllSketch::estimate(self)
    }

    fn lower_bound(&self, num_std_dev: NumStdDev) -> f64 {
        HllSketch::lower_bound(self, num_std_dev)
    }

    fn upper_bound(&self, num_std_dev: NumStdDev) -> f64 {
        HllSketch::upper_bound(self, num_std_dev)
    }
}

impl DistinctCountUnion for HllUnion {
    type Sketch = HllSketch;

    fn update(&mut self, sketch: &HllSketch) {
        HllUnion::update(self, sketch);
    }

    fn result(&self) -> HllSketch {
        HllUnion::result(self)
    }
}

impl SerializableSketch for HllSketch {
    fn serialize(&self) -> Vec<u8> {
        HllSketch::serialize(self)
    }

    fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        HllSketch::deserialize(bytes)
    }
}

impl StreamSketch for HllSketch {
    fn feed(&mut self, key: u64, _rng: &mut XorShift64) {
        self.update(key);
    }
}

#[allow(private_bounds)]
impl<T: SampleValue> SerializableSketch for KllSketch<T> {
    fn serialize(&self) -> Vec<u8> {
        KllSketch::serialize(self)
    }

    fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        KllSketch::deserialize(bytes)
    }
}

#[allow(private_bounds)]
impl<T: SampleValue> StreamSketch for KllSketch<T> {
    fn feed(&mut self, _key: u64, rng: &mut XorShift64) {
        self.update(T::random(rng));
    }
}
