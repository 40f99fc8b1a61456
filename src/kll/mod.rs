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

//! KLL quantiles sketch.
//!
//! The sketch keeps a stack of levels: level 0 is an unsorted intake buffer
//! and every higher level holds sorted items of weight `2^level`. When the
//! sketch is full the lowest level at capacity is sorted and halved with a
//! random offset, and the surviving half is merged into the level above.
//! Capacities shrink geometrically towards the bottom of the stack, which
//! bounds memory by roughly `3k` items for any stream length.
//!
//! The sketch serves two purposes here: it tracks the distribution of
//! relative errors inside every accuracy accumulator, and it is itself a
//! sketch under test in the rank-error, memory and timing profiles.
//!
//! # Usage
//!
//! ```rust
//! # use datasketches_characterization::kll::KllSketch;
//! let mut sketch = KllSketch::<f64>::new(200);
//! for i in 0..1000 {
//!     sketch.update(i as f64);
//! }
//! let median = sketch.quantile(0.5, true).unwrap();
//! assert!((400.0..=600.0).contains(&median));
//! assert_eq!(sketch.quantile(1.0, true), Some(999.0));
//! ```

mod helper;
mod serialization;
mod sketch;
mod sorted_view;

pub(crate) use self::sketch::KllItem;
pub use self::sketch::KllSketch;

/// Default value of parameter k.
pub const DEFAULT_K: u16 = 200;
/// Default value of parameter m, the minimum level width.
pub const DEFAULT_M: u8 = 8;
/// Minimum value of parameter k.
pub const MIN_K: u16 = DEFAULT_M as u16;
/// Maximum value of parameter k.
pub const MAX_K: u16 = u16::MAX;
