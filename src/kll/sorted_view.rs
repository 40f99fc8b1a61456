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

use super::sketch::KllItem;

/// All retained items in order, each with the cumulative weight up to and
/// including itself.
#[derive(Debug, Clone)]
pub(super) struct SortedView<T> {
    items: Vec<T>,
    cumulative: Vec<u64>,
}

impl<T: KllItem> SortedView<T> {
    pub fn build(levels: &[Vec<T>]) -> Self {
        let num_retained = levels.iter().map(Vec::len).sum();
        let mut weighted: Vec<(T, u64)> = Vec::with_capacity(num_retained);
        for (height, level) in levels.iter().enumerate() {
            let weight = 1u64 << height;
            weighted.extend(level.iter().map(|item| (item.clone(), weight)));
        }
        weighted.sort_by(|a, b| T::cmp(&a.0, &b.0));

        let mut items = Vec::with_capacity(num_retained);
        let mut cumulative = Vec::with_capacity(num_retained);
        let mut running = 0u64;
        for (item, weight) in weighted {
            running += weight;
            items.push(item);
            cumulative.push(running);
        }
        Self { items, cumulative }
    }

    fn total_weight(&self) -> u64 {
        self.cumulative.last().copied().unwrap_or(0)
    }

    /// Normalized rank of `item`: the weight of retained items below it
    /// (or at or below it if `inclusive`) over the total weight.
    pub fn rank(&self, item: &T, inclusive: bool) -> f64 {
        let idx = self.items.partition_point(|x| match T::cmp(x, item) {
            Ordering::Less => true,
            Ordering::Equal => inclusive,
            Ordering::Greater => false,
        });
        if idx == 0 {
            return 0.0;
        }
        self.cumulative[idx - 1] as f64 / self.total_weight() as f64
    }

    /// Item at normalized rank `rank`. The view must not be empty.
    pub fn quantile(&self, rank: f64, inclusive: bool) -> T {
        let total = self.total_weight() as f64;
        let weight = if inclusive {
            (rank * total).ceil() as u64
        } else {
            (rank * total) as u64
        };
        let idx = if inclusive {
            self.cumulative.partition_point(|&w| w < weight)
        } else {
            self.cumulative.partition_point(|&w| w <= weight)
        };
        self.items[idx.min(self.items.len() - 1)].clone()
    }

    pub fn cdf(&self, split_points: &[T], inclusive: bool) -> Vec<f64> {
        check_split_points(split_points);
        let mut ranks: Vec<f64> = split_points
            .iter()
            .map(|item| self.rank(item, inclusive))
            .collect();
        ranks.push(1.0);
        ranks
    }
}

fn check_split_points<T: KllItem>(split_points: &[T]) {
    for item in split_points {
        assert!(!T::is_nan(item), "split_points must not contain NaN values");
    }
    for pair in split_points.windows(2) {
        assert!(
            T::cmp(&pair[0], &pair[1]) == Ordering::Less,
            "split_points must be unique and monotonically increasing"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_follow_levels() {
        let view = SortedView::build(&[vec![5i64, 1], vec![3]]);
        // items 1 (w1), 3 (w2), 5 (w1)
        assert_eq!(view.rank(&3, false), 0.25);
        assert_eq!(view.rank(&3, true), 0.75);
        assert_eq!(view.quantile(0.5, true), 3);
        assert_eq!(view.quantile(0.9, true), 5);
        assert_eq!(view.cdf(&[2, 4], true), vec![0.25, 0.75, 1.0]);
    }

    #[test]
    #[should_panic(expected = "monotonically increasing")]
    fn test_unsorted_split_points() {
        let view = SortedView::build(&[vec![1i64, 2, 3]]);
        view.cdf(&[3, 2], true);
    }
}
