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

//! Characterization of streaming sketches.
//!
//! This crate measures how well approximate data structures ("sketches")
//! do their job: the observed error of their estimates against exact
//! answers, how often the truth falls outside their declared confidence
//! bounds, how much heap they hold, and how fast they update and
//! serialize.
//!
//! The measurement machinery is generic:
//!
//! * [`job::points`] spaces checkpoints logarithmically.
//! * [`job::trials`] scales the number of repetitions to the input size.
//! * [`stats`] accumulates relative errors and their distribution.
//! * [`job::ProgressiveJob`] runs trials in growing parallel batches and
//!   reports after each one.
//!
//! The sketches under test ([`hll`] and [`kll`]) plug in through the traits
//! of [`sketch`], and [`profile`] ties both together into named runs.

pub(crate) mod codec;
pub mod common;
pub mod error;
pub mod hll;
pub mod job;
pub mod kll;
pub mod memory;
pub mod profile;
pub mod sketch;
pub mod stats;
