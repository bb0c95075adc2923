//! Per-category event counts.

use std::collections::btree_map::{self, BTreeMap};

/// Whether an increment created the category or bumped an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Increment {
    /// First event seen for this label.
    FirstSeen,
    /// Label already had a count.
    Existing,
}

/// Running count per category label.
///
/// Labels are compared by exact, case-sensitive equality. Iteration is in
/// lexicographic label order so snapshots render deterministically. The
/// sum of all counts is tracked alongside the map and always equals the
/// number of increments since the last [`clear`](Self::clear).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryTally {
    counts: BTreeMap<String, u64>,
    total: u64,
}

impl CategoryTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one event for `label`. Any string is a valid label, including
    /// the empty one.
    pub fn increment(&mut self, label: &str) -> Increment {
        let outcome = match self.counts.get_mut(label) {
            Some(count) => {
                *count += 1;
                Increment::Existing
            }
            None => {
                self.counts.insert(label.to_string(), 1);
                Increment::FirstSeen
            }
        };
        self.total += 1;
        outcome
    }

    /// Count for a label, zero if never seen.
    pub fn get(&self, label: &str) -> u64 {
        self.counts.get(label).copied().unwrap_or(0)
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of distinct labels.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Labels and counts in label order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, u64> {
        self.counts.iter()
    }

    pub fn clear(&mut self) {
        self.counts.clear();
        self.total = 0;
    }
}

impl<'a> IntoIterator for &'a CategoryTally {
    type Item = (&'a String, &'a u64);
    type IntoIter = btree_map::Iter<'a, String, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_seen_then_existing() {
        let mut tally = CategoryTally::new();
        assert_eq!(tally.increment("found"), Increment::FirstSeen);
        assert_eq!(tally.increment("found"), Increment::Existing);
        assert_eq!(tally.increment("Found"), Increment::FirstSeen);
        assert_eq!(tally.get("found"), 2);
        assert_eq!(tally.get("Found"), 1);
        assert_eq!(tally.get("saw"), 0);
    }

    #[test]
    fn test_total_matches_sum() {
        let mut tally = CategoryTally::new();
        for label in ["b", "a", "c", "a", "b", "a"] {
            tally.increment(label);
        }
        let sum: u64 = tally.iter().map(|(_, c)| *c).sum();
        assert_eq!(tally.total(), 6);
        assert_eq!(sum, tally.total());
    }

    #[test]
    fn test_iteration_is_label_ordered() {
        let mut tally = CategoryTally::new();
        for label in ["shared", "found", "loved"] {
            tally.increment(label);
        }
        let labels: Vec<&str> = tally.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["found", "loved", "shared"]);
    }

    #[test]
    fn test_empty_label_is_counted() {
        let mut tally = CategoryTally::new();
        assert_eq!(tally.increment(""), Increment::FirstSeen);
        assert_eq!(tally.increment(""), Increment::Existing);
        assert_eq!(tally.get(""), 2);
        assert_eq!(tally.total(), 2);
    }

    #[test]
    fn test_clear() {
        let mut tally = CategoryTally::new();
        tally.increment("a");
        tally.clear();
        assert!(tally.is_empty());
        assert_eq!(tally.total(), 0);
    }
}
