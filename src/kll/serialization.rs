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

//! Binary layout of a KLL sketch.
//!
//! The layout is the DataSketches compact KLL format: an 8 byte preamble,
//! then for sketches with more than one item the stream length, `min_k`, the
//! level count, the level offsets, min and max, and finally the retained
//! items level by level.

use super::DEFAULT_M;
use super::MAX_K;
use super::MIN_K;
use super::helper::total_capacity;
use super::helper::total_weight;
use super::sketch::KllItem;
use super::sketch::KllSketch;
use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::error::Error;

const KLL_FAMILY_ID: u8 = 15;

const SERIAL_VERSION_EMPTY_FULL: u8 = 1;
const SERIAL_VERSION_SINGLE: u8 = 2;

const PREAMBLE_INTS_SHORT: u8 = 2;
const PREAMBLE_INTS_FULL: u8 = 5;

const FLAG_EMPTY: u8 = 1 << 0;
const FLAG_LEVEL_ZERO_SORTED: u8 = 1 << 1;
const FLAG_SINGLE_ITEM: u8 = 1 << 2;

const PREAMBLE_BYTES: usize = 8;
const DATA_START: usize = 20;

#[allow(private_bounds)]
impl<T: KllItem> KllSketch<T> {
    /// Returns the size of [`KllSketch::serialize`]'s output in bytes.
    pub fn serialized_size(&self) -> usize {
        match self.n {
            0 => PREAMBLE_BYTES,
            1 => PREAMBLE_BYTES + T::SERIALIZED_SIZE,
            _ => {
                DATA_START
                    + self.levels.len() * 4
                    + (self.num_retained() + 2) * T::SERIALIZED_SIZE
            }
        }
    }

    /// Serializes the sketch to bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = SketchBytes::with_capacity(self.serialized_size());
        let is_empty = self.n == 0;
        let is_single_item = self.n == 1;

        let mut flags = 0;
        if is_empty {
            flags |= FLAG_EMPTY;
        }
        if self.level_zero_sorted {
            flags |= FLAG_LEVEL_ZERO_SORTED;
        }
        if is_single_item {
            flags |= FLAG_SINGLE_ITEM;
        }

        bytes.write_u8(if is_empty || is_single_item {
            PREAMBLE_INTS_SHORT
        } else {
            PREAMBLE_INTS_FULL
        });
        bytes.write_u8(if is_single_item {
            SERIAL_VERSION_SINGLE
        } else {
            SERIAL_VERSION_EMPTY_FULL
        });
        bytes.write_u8(KLL_FAMILY_ID);
        bytes.write_u8(flags);
        bytes.write_u16_le(self.k);
        bytes.write_u8(self.m);
        bytes.write_u8(0);

        if is_empty {
            return bytes.into_bytes();
        }

        if !is_single_item {
            bytes.write_u64_le(self.n);
            bytes.write_u16_le(self.min_k);
            bytes.write_u8(self.levels.len() as u8);
            bytes.write_u8(0);

            // offsets are relative to a buffer of full capacity, filled from the top
            let mut offset = (self.capacity() - self.num_retained()) as u32;
            for level in &self.levels {
                bytes.write_u32_le(offset);
                offset += level.len() as u32;
            }

            if let (Some(min), Some(max)) = (&self.min_item, &self.max_item) {
                T::write(min, &mut bytes);
                T::write(max, &mut bytes);
            }
        }

        for item in self.levels.iter().flatten() {
            T::write(item, &mut bytes);
        }
        bytes.into_bytes()
    }

    /// Deserializes a sketch from bytes.
    pub fn deserialize(bytes: &[u8]) -> Result<KllSketch<T>, Error> {
        fn make_error(tag: &'static str) -> impl FnOnce(std::io::Error) -> Error {
            move |_| Error::insufficient_data(tag)
        }

        let mut cursor = SketchSlice::new(bytes);
        let preamble_ints = cursor.read_u8().map_err(make_error("preamble_ints"))?;
        let serial_version = cursor.read_u8().map_err(make_error("serial_version"))?;
        let family_id = cursor.read_u8().map_err(make_error("family_id"))?;
        let flags = cursor.read_u8().map_err(make_error("flags"))?;
        let k = cursor.read_u16_le().map_err(make_error("k"))?;
        let m = cursor.read_u8().map_err(make_error("m"))?;
        cursor.read_u8().map_err(make_error("unused"))?;

        if family_id != KLL_FAMILY_ID {
            return Err(Error::invalid_family(KLL_FAMILY_ID, family_id, "KLL"));
        }
        if serial_version != SERIAL_VERSION_EMPTY_FULL && serial_version != SERIAL_VERSION_SINGLE
        {
            return Err(Error::deserial(format!(
                "invalid serial version: {serial_version}"
            )));
        }
        if m != DEFAULT_M {
            return Err(Error::deserial(format!(
                "invalid m: expected {DEFAULT_M}, got {m}"
            )));
        }
        if !(MIN_K..=MAX_K).contains(&k) {
            return Err(Error::deserial(format!("k out of range: {k}")));
        }

        let is_empty = flags & FLAG_EMPTY != 0;
        let is_single_item = flags & FLAG_SINGLE_ITEM != 0;
        let expected_preamble = if is_empty || is_single_item {
            PREAMBLE_INTS_SHORT
        } else {
            PREAMBLE_INTS_FULL
        };
        if preamble_ints != expected_preamble {
            return Err(Error::deserial(format!(
                "invalid preamble ints: expected {expected_preamble}, got {preamble_ints}"
            )));
        }

        let mut sketch = KllSketch::new(k);
        sketch.level_zero_sorted = flags & FLAG_LEVEL_ZERO_SORTED != 0;
        if is_empty {
            return Ok(sketch);
        }

        if is_single_item {
            let item = T::read(&mut cursor)?;
            sketch.n = 1;
            sketch.min_item = Some(item.clone());
            sketch.max_item = Some(item.clone());
            sketch.levels = vec![vec![item]];
            return Ok(sketch);
        }

        let n = cursor.read_u64_le().map_err(make_error("n"))?;
        let min_k = cursor.read_u16_le().map_err(make_error("min_k"))?;
        let num_levels = cursor.read_u8().map_err(make_error("num_levels"))? as usize;
        cursor.read_u8().map_err(make_error("unused2"))?;
        if num_levels == 0 {
            return Err(Error::deserial("num_levels must be > 0"));
        }
        if min_k < MIN_K || min_k > k {
            return Err(Error::deserial(format!(
                "min_k must be in [{MIN_K}, {k}], got {min_k}"
            )));
        }

        let capacity = total_capacity(k, m, num_levels);
        let mut offsets = Vec::with_capacity(num_levels + 1);
        for _ in 0..num_levels {
            offsets.push(cursor.read_u32_le().map_err(make_error("levels"))?);
        }
        offsets.push(capacity);
        if offsets.windows(2).any(|w| w[1] < w[0]) {
            return Err(Error::deserial(
                "level offsets must be non-decreasing and within capacity",
            ));
        }

        let min_item = T::read(&mut cursor)?;
        let max_item = T::read(&mut cursor)?;
        let mut levels = Vec::with_capacity(num_levels);
        for window in offsets.windows(2) {
            let size = (window[1] - window[0]) as usize;
            let mut level = Vec::with_capacity(size);
            for _ in 0..size {
                level.push(T::read(&mut cursor)?);
            }
            levels.push(level);
        }

        let weight = total_weight(&levels);
        if weight != n {
            return Err(Error::deserial(format!(
                "level weights sum to {weight}, expected n = {n}"
            )));
        }

        sketch.n = n;
        sketch.min_k = min_k;
        sketch.levels = levels;
        sketch.min_item = Some(min_item);
        sketch.max_item = Some(max_item);
        Ok(sketch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preamble_layout() {
        let mut sketch = KllSketch::<f32>::new(200);
        assert_eq!(sketch.serialize(), vec![2, 1, 15, FLAG_EMPTY, 200, 0, 8, 0]);

        sketch.update(1.5);
        let bytes = sketch.serialize();
        assert_eq!(&bytes[..4], &[2, 2, 15, FLAG_SINGLE_ITEM]);
        assert_eq!(bytes.len(), sketch.serialized_size());

        sketch.update(2.5);
        let bytes = sketch.serialize();
        assert_eq!(bytes[0], PREAMBLE_INTS_FULL);
        assert_eq!(bytes.len(), DATA_START + 4 + 4 * 4);
    }

    #[test]
    fn test_rejects_wrong_family() {
        let mut bytes = KllSketch::<f64>::new(200).serialize();
        bytes[2] = 7;
        let err = KllSketch::<f64>::deserialize(&bytes).unwrap_err();
        assert!(err.message().contains("invalid family"));
    }

    #[test]
    fn test_rejects_truncated_items() {
        let mut sketch = KllSketch::<i64>::new(200);
        for i in 0..50 {
            sketch.update(i);
        }
        let bytes = sketch.serialize();
        assert!(KllSketch::<i64>::deserialize(&bytes[..bytes.len() - 3]).is_err());
    }
}
