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

use std::cmp::Ordering;

use super::DEFAULT_K;
use super::DEFAULT_M;
use super::MAX_K;
use super::MIN_K;
use super::helper::level_capacity;
use super::helper::merge_sorted;
use super::helper::total_capacity;
use super::helper::total_weight;
use super::sorted_view::SortedView;
use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::common::random::thread_random_bit;
use crate::error::Error;

/// Item types a [`KllSketch`] can hold.
pub(crate) trait KllItem: Clone + Send + Sync + 'static {
    /// Serialized size of one item in bytes.
    const SERIALIZED_SIZE: usize;

    /// Total order used by the sketch.
    fn cmp(a: &Self, b: &Self) -> Ordering;

    /// Returns true if the item cannot be ordered and must be ignored.
    fn is_nan(_value: &Self) -> bool {
        false
    }

    fn write(value: &Self, bytes: &mut SketchBytes);

    fn read(input: &mut SketchSlice<'_>) -> Result<Self, Error>;
}

/// KLL sketch for estimating quantiles and ranks.
///
/// See the [kll module level documentation](crate::kll) for more.
#[allow(private_bounds)]
#[derive(Debug, Clone, PartialEq)]
pub struct KllSketch<T: KllItem> {
    pub(super) k: u16,
    pub(super) m: u8,
    pub(super) min_k: u16,
    pub(super) n: u64,
    pub(super) level_zero_sorted: bool,
    pub(super) levels: Vec<Vec<T>>,
    pub(super) min_item: Option<T>,
    pub(super) max_item: Option<T>,
}

impl<T: KllItem> Default for KllSketch<T> {
    fn default() -> Self {
        Self::new(DEFAULT_K)
    }
}

#[allow(private_bounds)]
impl<T: KllItem> KllSketch<T> {
    /// Creates a new sketch with the given value of k.
    ///
    /// # Panics
    ///
    /// Panics if k is not in [MIN_K, MAX_K].
    ///
    /// # Examples
    ///
    /// ```
    /// # use datasketches_characterization::kll::KllSketch;
    /// let sketch = KllSketch::<f32>::new(200);
    /// assert_eq!(sketch.k(), 200);
    /// assert!(sketch.is_empty());
    /// ```
    pub fn new(k: u16) -> Self {
        assert!(
            (MIN_K..=MAX_K).contains(&k),
            "k must be in [{MIN_K}, {MAX_K}], got {k}"
        );
        Self {
            k,
            m: DEFAULT_M,
            min_k: k,
            n: 0,
            level_zero_sorted: false,
            levels: vec![Vec::new()],
            min_item: None,
            max_item: None,
        }
    }

    /// Returns parameter k used to configure this sketch.
    pub fn k(&self) -> u16 {
        self.k
    }

    /// Returns the number of items the sketch has accepted.
    pub fn n(&self) -> u64 {
        self.n
    }

    /// Returns true if the sketch has not seen any data.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Returns the number of retained items.
    pub fn num_retained(&self) -> usize {
        self.levels.iter().map(Vec::len).sum()
    }

    /// Returns true once the sketch has started discarding items.
    pub fn is_estimation_mode(&self) -> bool {
        self.levels.len() > 1
    }

    /// Returns the minimum item seen by the sketch.
    pub fn min_item(&self) -> Option<&T> {
        self.min_item.as_ref()
    }

    /// Returns the maximum item seen by the sketch.
    pub fn max_item(&self) -> Option<&T> {
        self.max_item.as_ref()
    }

    /// Updates the sketch with a new item.
    ///
    /// NaN values are ignored for floating-point types.
    pub fn update(&mut self, item: T) {
        if T::is_nan(&item) {
            return;
        }
        self.update_min_max(&item);
        if self.num_retained() >= self.capacity() {
            self.compact();
        }
        self.levels[0].push(item);
        self.n += 1;
        self.level_zero_sorted = false;
        debug_assert_eq!(total_weight(&self.levels), self.n);
    }

    /// Returns the normalized rank of the given item.
    pub fn rank(&self, item: &T, inclusive: bool) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        Some(SortedView::build(&self.levels).rank(item, inclusive))
    }

    /// Returns the quantile for the given normalized rank.
    ///
    /// Ranks 0 and 1 return the exact minimum and maximum of the stream.
    ///
    /// # Panics
    ///
    /// Panics if rank is not in [0.0, 1.0].
    pub fn quantile(&self, rank: f64, inclusive: bool) -> Option<T> {
        self.quantiles(&[rank], inclusive)
            .and_then(|mut quantiles| quantiles.pop())
    }

    /// Returns one quantile per normalized rank, sharing a single sorted view.
    ///
    /// # Panics
    ///
    /// Panics if any rank is not in [0.0, 1.0].
    pub fn quantiles(&self, ranks: &[f64], inclusive: bool) -> Option<Vec<T>> {
        for &rank in ranks {
            assert!(
                (0.0..=1.0).contains(&rank),
                "rank must be in [0.0, 1.0], got {rank}"
            );
        }
        if self.is_empty() {
            return None;
        }

        let view = SortedView::build(&self.levels);
        let quantiles = ranks
            .iter()
            .map(|&rank| match (rank, &self.min_item, &self.max_item) {
                (r, Some(min), _) if r == 0.0 => min.clone(),
                (r, _, Some(max)) if r == 1.0 => max.clone(),
                (r, _, _) => view.quantile(r, inclusive),
            })
            .collect();
        Some(quantiles)
    }

    /// Returns the approximate CDF for the given split points.
    ///
    /// # Panics
    ///
    /// Panics if the split points are not strictly increasing or contain NaN.
    pub fn cdf(&self, split_points: &[T], inclusive: bool) -> Option<Vec<f64>> {
        if self.is_empty() {
            return None;
        }
        Some(SortedView::build(&self.levels).cdf(split_points, inclusive))
    }

    /// Returns normalized rank error for the configured k.
    pub fn normalized_rank_error(&self, pmf: bool) -> f64 {
        let k = self.min_k as f64;
        if pmf {
            2.446 / k.powf(0.9433)
        } else {
            2.296 / k.powf(0.9723)
        }
    }

    pub(super) fn capacity(&self) -> usize {
        total_capacity(self.k, self.m, self.levels.len()) as usize
    }

    fn update_min_max(&mut self, item: &T) {
        let below_min = self
            .min_item
            .as_ref()
            .is_none_or(|min| T::cmp(item, min).is_lt());
        if below_min {
            self.min_item = Some(item.clone());
        }
        let above_max = self
            .max_item
            .as_ref()
            .is_none_or(|max| T::cmp(item, max).is_gt());
        if above_max {
            self.max_item = Some(item.clone());
        }
    }

    /// Halves the lowest full level into the level above it.
    fn compact(&mut self) {
        let height = self.find_level_to_compact();
        if height + 1 == self.levels.len() {
            self.levels.push(Vec::new());
        }

        let mut current = std::mem::take(&mut self.levels[height]);
        if height == 0 && !self.level_zero_sorted {
            current.sort_by(T::cmp);
        }
        let leftover = if current.len() % 2 == 1 {
            current.pop()
        } else {
            None
        };

        let offset = usize::from(thread_random_bit());
        let promoted: Vec<T> = current.into_iter().skip(offset).step_by(2).collect();
        let above = std::mem::take(&mut self.levels[height + 1]);
        self.levels[height + 1] = merge_sorted(above, promoted);
        self.levels[height] = leftover.into_iter().collect();
    }

    fn find_level_to_compact(&self) -> usize {
        let num_levels = self.levels.len();
        (0..num_levels)
            .position(|height| {
                self.levels[height].len() as u32
                    >= level_capacity(self.k, num_levels, height, self.m)
            })
            .unwrap_or(num_levels - 1)
    }
}

impl KllItem for f32 {
    const SERIALIZED_SIZE: usize = 4;

    fn cmp(a: &Self, b: &Self) -> Ordering {
        a.total_cmp(b)
    }

    fn is_nan(value: &Self) -> bool {
        value.is_nan()
    }

    fn write(value: &Self, bytes: &mut SketchBytes) {
        bytes.write_f32_le(*value);
    }

    fn read(input: &mut SketchSlice<'_>) -> Result<Self, Error> {
        input
            .read_f32_le()
            .map_err(|_| Error::insufficient_data("f32"))
    }
}

impl KllItem for f64 {
    const SERIALIZED_SIZE: usize = 8;

    fn cmp(a: &Self, b: &Self) -> Ordering {
        a.total_cmp(b)
    }

    fn is_nan(value: &Self) -> bool {
        value.is_nan()
    }

    fn write(value: &Self, bytes: &mut SketchBytes) {
        bytes.write_f64_le(*value);
    }

    fn read(input: &mut SketchSlice<'_>) -> Result<Self, Error> {
        input
            .read_f64_le()
            .map_err(|_| Error::insufficient_data("f64"))
    }
}

impl KllItem for i64 {
    const SERIALIZED_SIZE: usize = 8;

    fn cmp(a: &Self, b: &Self) -> Ordering {
        Ord::cmp(a, b)
    }

    fn write(value: &Self, bytes: &mut SketchBytes) {
        bytes.write_i64_le(*value);
    }

    fn read(input: &mut SketchSlice<'_>) -> Result<Self, Error> {
        input
            .read_i64_le()
            .map_err(|_| Error::insufficient_data("i64"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compaction_preserves_weight() {
        let mut sketch = KllSketch::<i64>::new(MIN_K);
        for i in 0..10_000 {
            sketch.update(i);
            assert_eq!(total_weight(&sketch.levels), sketch.n());
        }
        assert!(sketch.is_estimation_mode());
        assert!(sketch.num_retained() <= sketch.capacity());
        for level in &sketch.levels[1..] {
            assert!(level.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn test_negative_zero_orders_before_zero() {
        let mut sketch = KllSketch::<f64>::new(DEFAULT_K);
        sketch.update(0.0);
        sketch.update(-0.0);
        assert_eq!(sketch.min_item().map(|v| v.is_sign_negative()), Some(true));
    }
}
