//! Categorical histograms with an underflow series.
//!
//! Bins whose count does not exceed a minimum are split off into separate
//! underflow vectors so that rare outcomes can be plotted or reported apart.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Counts per distinct value, split at a minimum count.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Histogram<T> {
    /// Counts of the main bins.
    pub weights: Vec<usize>,
    /// Values of the main bins.
    pub bins: Vec<T>,
    /// Counts of the bins at or below the minimum.
    pub underflow_weights: Vec<usize>,
    /// Values of the bins at or below the minimum.
    pub underflow_bins: Vec<T>,
}

impl<T> Default for Histogram<T> {
    fn default() -> Self {
        Self {
            weights: Vec::new(),
            bins: Vec::new(),
            underflow_weights: Vec::new(),
            underflow_bins: Vec::new(),
        }
    }
}

impl<T> Histogram<T> {
    /// Sum of all counts, main and underflow.
    #[must_use]
    pub fn total(&self) -> usize {
        self.weights.iter().sum::<usize>() + self.underflow_weights.iter().sum::<usize>()
    }

    /// Returns true if there are no bins at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty() && self.underflow_bins.is_empty()
    }

    /// Iterates over `(value, count)` of the main bins.
    pub fn iter(&self) -> impl Iterator<Item = (&T, usize)> {
        self.bins.iter().zip(self.weights.iter().copied())
    }

    /// Iterates over `(value, count)` of the underflow bins.
    pub fn iter_underflow(&self) -> impl Iterator<Item = (&T, usize)> {
        self.underflow_bins
            .iter()
            .zip(self.underflow_weights.iter().copied())
    }

    fn push(&mut self, value: T, count: usize, min_count: Option<usize>) {
        if min_count.is_none_or(|min| count > min) {
            self.bins.push(value);
            self.weights.push(count);
        } else {
            self.underflow_bins.push(value);
            self.underflow_weights.push(count);
        }
    }
}

/// Counts occurrences of each of `unique_values` in `all_values`.
///
/// Bins keep the order of `unique_values`. A bin goes to the main series if
/// its count is greater than `min_count` (all bins when `None`), else to the
/// underflow series.
#[must_use]
pub fn create_histogram<T>(unique_values: &[T], all_values: &[T], min_count: Option<usize>) -> Histogram<T>
where
    T: PartialEq + Clone,
{
    let mut histogram = Histogram::default();
    for bin in unique_values {
        let count = all_values.iter().filter(|&value| value == bin).count();
        histogram.push(bin.clone(), count, min_count);
    }
    histogram
}

/// Histogram of `values` over their distinct values in ascending order.
///
/// Equivalent to [`create_histogram`] with the sorted distinct values.
#[must_use]
pub fn histogram<T>(values: &[T], min_count: Option<usize>) -> Histogram<T>
where
    T: Ord + Clone,
{
    let mut counts: BTreeMap<&T, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut histogram = Histogram::default();
    for (value, count) in counts {
        histogram.push(value.clone(), count, min_count);
    }
    histogram
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_histogram_keeps_unique_order() {
        let values = ["Gd158", "Gd156", "Gd158", "H2", "Gd158", "Gd156"];
        let h = create_histogram(&["H2", "Gd156", "Gd158", "C13"], &values, None);
        assert_eq!(h.bins, vec!["H2", "Gd156", "Gd158", "C13"]);
        assert_eq!(h.weights, vec![1, 2, 3, 0]);
        assert!(h.underflow_bins.is_empty());
        assert_eq!(h.total(), 6);
    }

    #[test]
    fn test_min_count_splits_underflow() {
        let values = ["Gd158", "Gd156", "Gd158", "H2", "Gd158", "Gd156"];
        let h = histogram(&values, Some(1));
        assert_eq!(h.bins, vec!["Gd156", "Gd158"]);
        assert_eq!(h.weights, vec![2, 3]);
        assert_eq!(h.underflow_bins, vec!["H2"]);
        assert_eq!(h.underflow_weights, vec![1]);
    }

    #[test]
    fn test_histogram_matches_create_histogram() {
        let values = vec![3, 1, 2, 3, 3, 1];
        let direct = histogram(&values, Some(0));
        let explicit = create_histogram(&[1, 2, 3], &values, Some(0));
        assert_eq!(direct, explicit);
        assert_eq!(direct.iter().collect::<Vec<_>>(), vec![(&1, 2), (&2, 1), (&3, 3)]);
    }

    #[test]
    fn test_empty_input() {
        let h: Histogram<String> = histogram(&[], None);
        assert!(h.is_empty());
        assert_eq!(h.total(), 0);
    }
}
