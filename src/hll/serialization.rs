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

//! Binary layout of an HLL sketch.
//!
//! The layout is the DataSketches HLL_8 array format: a 40 byte preamble
//! followed by one byte per register.
//!
//! ```text
//! byte 0   preamble ints (10)      byte 4   lg_arr (unused, 0)
//! byte 1   serial version (1)      byte 5   flags
//! byte 2   family (7)              byte 6   cur_min (0 for HLL_8)
//! byte 3   lg_k                    byte 7   mode (HLL | HLL_8 << 2)
//! 8..16    HIP accumulator         32..36   number of zero registers
//! 16..24   kxq0                    36..40   aux count (0 for HLL_8)
//! 24..32   kxq1                    40..     registers
//! ```

use super::HllSketch;
use super::MAX_LG_K;
use super::MIN_LG_K;
use super::estimator::HipEstimator;
use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::error::Error;

const HLL_FAMILY_ID: u8 = 7;
const SERIAL_VERSION: u8 = 1;
const HLL_PREAMBLE_INTS: u8 = 10;
const HLL_PREAMBLE_BYTES: usize = 40;

const FLAG_EMPTY: u8 = 1 << 2;
const FLAG_COMPACT: u8 = 1 << 3;
const FLAG_OUT_OF_ORDER: u8 = 1 << 4;

const CUR_MODE_HLL: u8 = 2;
const TGT_HLL_8: u8 = 2;
const MODE_BYTE: u8 = CUR_MODE_HLL | (TGT_HLL_8 << 2);

impl HllSketch {
    /// Returns the size of [`HllSketch::serialize`]'s output in bytes.
    pub fn serialized_size(&self) -> usize {
        HLL_PREAMBLE_BYTES + self.registers.len()
    }

    /// Serializes the sketch to bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = SketchBytes::with_capacity(self.serialized_size());

        let mut flags = 0;
        if self.is_empty() {
            flags |= FLAG_EMPTY;
        }
        if self.estimator.out_of_order {
            flags |= FLAG_OUT_OF_ORDER;
        }

        bytes.write_u8(HLL_PREAMBLE_INTS);
        bytes.write_u8(SERIAL_VERSION);
        bytes.write_u8(HLL_FAMILY_ID);
        bytes.write_u8(self.lg_k);
        bytes.write_u8(0);
        bytes.write_u8(flags);
        bytes.write_u8(0);
        bytes.write_u8(MODE_BYTE);
        bytes.write_f64_le(self.estimator.hip_accum);
        bytes.write_f64_le(self.estimator.kxq0);
        bytes.write_f64_le(self.estimator.kxq1);
        bytes.write_u32_le(self.num_zeros);
        bytes.write_u32_le(0);
        bytes.write(&self.registers);
        bytes.into_bytes()
    }

    /// Deserializes a sketch from bytes.
    pub fn deserialize(bytes: &[u8]) -> Result<HllSketch, Error> {
        fn make_error(tag: &'static str) -> impl FnOnce(std::io::Error) -> Error {
            move |_| Error::insufficient_data(tag)
        }

        let mut cursor = SketchSlice::new(bytes);
        let preamble_ints = cursor.read_u8().map_err(make_error("preamble_ints"))?;
        let serial_version = cursor.read_u8().map_err(make_error("serial_version"))?;
        let family_id = cursor.read_u8().map_err(make_error("family_id"))?;
        let lg_k = cursor.read_u8().map_err(make_error("lg_k"))?;
        cursor.read_u8().map_err(make_error("lg_arr"))?;
        let flags = cursor.read_u8().map_err(make_error("flags"))?;
        let cur_min = cursor.read_u8().map_err(make_error("cur_min"))?;
        let mode = cursor.read_u8().map_err(make_error("mode"))?;

        if family_id != HLL_FAMILY_ID {
            return Err(Error::invalid_family(HLL_FAMILY_ID, family_id, "HLL"));
        }
        if serial_version != SERIAL_VERSION {
            return Err(Error::deserial(format!(
                "invalid serial version: expected {SERIAL_VERSION}, got {serial_version}"
            )));
        }
        if preamble_ints != HLL_PREAMBLE_INTS {
            return Err(Error::deserial(format!(
                "invalid preamble ints: expected {HLL_PREAMBLE_INTS}, got {preamble_ints}"
            )));
        }
        if !(MIN_LG_K..=MAX_LG_K).contains(&lg_k) {
            return Err(Error::deserial(format!(
                "lg_k must be in [{MIN_LG_K}, {MAX_LG_K}], got {lg_k}"
            )));
        }
        if mode != MODE_BYTE || cur_min != 0 {
            return Err(Error::deserial(format!(
                "only HLL_8 arrays are supported, got mode byte {mode} with cur_min {cur_min}"
            )));
        }
        if flags & FLAG_COMPACT != 0 {
            return Err(Error::deserial("compact HLL_8 images are not supported"));
        }

        let estimator = HipEstimator {
            hip_accum: cursor.read_f64_le().map_err(make_error("hip_accum"))?,
            kxq0: cursor.read_f64_le().map_err(make_error("kxq0"))?,
            kxq1: cursor.read_f64_le().map_err(make_error("kxq1"))?,
            out_of_order: flags & FLAG_OUT_OF_ORDER != 0,
        };
        let num_zeros = cursor.read_u32_le().map_err(make_error("num_zeros"))?;
        cursor.read_u32_le().map_err(make_error("aux_count"))?;

        let k = 1usize << lg_k;
        if cursor.remaining() < k {
            return Err(Error::insufficient_data("registers"));
        }
        let mut registers = vec![0u8; k].into_boxed_slice();
        cursor
            .read_exact(&mut registers)
            .map_err(make_error("registers"))?;

        let actual_zeros = registers.iter().filter(|&&v| v == 0).count() as u32;
        if actual_zeros != num_zeros {
            return Err(Error::deserial(format!(
                "zero register count {num_zeros} does not match registers ({actual_zeros})"
            )));
        }

        Ok(HllSketch {
            lg_k,
            registers,
            num_zeros,
            estimator,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preamble_layout() {
        let mut sketch = HllSketch::new(4);
        let bytes = sketch.serialize();
        assert_eq!(bytes.len(), 40 + 16);
        assert_eq!(&bytes[..8], &[10, 1, 7, 4, 0, FLAG_EMPTY, 0, 10]);

        sketch.update(42u64);
        let bytes = sketch.serialize();
        assert_eq!(bytes[5], 0);
        assert_eq!(u32::from_le_bytes([bytes[32], bytes[33], bytes[34], bytes[35]]), 15);
    }

    #[test]
    fn test_rejects_short_register_array() {
        let mut sketch = HllSketch::new(6);
        sketch.update(1u64);
        let bytes = sketch.serialize();
        let err = HllSketch::deserialize(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(err.message().contains("registers"));
    }

    #[test]
    fn test_rejects_inconsistent_zero_count() {
        let mut bytes = HllSketch::new(4).serialize();
        bytes[32] = 3;
        assert!(HllSketch::deserialize(&bytes).is_err());
    }
}
