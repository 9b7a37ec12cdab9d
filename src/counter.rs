//! Ranked counters: string keys mapped to play counts or money.
//!
//! Every statistic the platform keeps (top songs, top fans, premium history,
//! per-song profit) is a [`RankedCounter`]. The counter itself is an unordered
//! map; ordering is computed on every projection so that interleaved updates
//! can never leave a stale ranking behind.
//!
//! ## Canonical order
//!
//! ```text
//! count descending, then key ascending
//! ```
//!
//! Ties on count are always broken lexicographically, which makes every
//! projection reproducible regardless of insertion order.
//!
//! ## Examples
//!
//! ```
//! use encore::counter::RankedCounter;
//!
//! let mut songs = RankedCounter::new();
//! songs.increment("Yellow");
//! songs.increment("Clocks");
//! songs.increment("Yellow");
//!
//! let top = songs.top_n(5);
//! assert_eq!(top.keys(), vec!["Yellow", "Clocks"]);
//! ```

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::ops::Add;

/// Values a [`RankedCounter`] can accumulate.
///
/// Implemented for `u64` (play counts) and `f64` (money).
pub trait Count: Copy + Default + PartialOrd + Add<Output = Self> + std::fmt::Debug {}

impl Count for u64 {}
impl Count for f64 {}

/// Canonical ordering of two counter entries: count desc, key asc.
///
/// Incomparable values (NaN money) are treated as equal counts, which falls
/// through to the key tie-break.
#[must_use]
pub fn canonical_order<V: PartialOrd>(a: (&str, V), b: (&str, V)) -> Ordering {
    b.1.partial_cmp(&a.1)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.0.cmp(b.0))
}

/// Mapping from key to a non-negative count with a canonical ranking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedCounter<V = u64> {
    counts: HashMap<String, V>,
}

impl<V: Count> RankedCounter<V> {
    #[must_use]
    pub fn new() -> Self {
        Self { counts: HashMap::new() }
    }

    /// Adds `amount` to `key`, inserting it if absent.
    pub fn add(&mut self, key: &str, amount: V) {
        match self.counts.get_mut(key) {
            Some(count) => *count = *count + amount,
            None => {
                self.counts.insert(key.to_string(), amount);
            }
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<V> {
        self.counts.get(key).copied()
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.counts.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    #[must_use]
    pub fn total(&self) -> V {
        self.counts.values().fold(V::default(), |acc, &v| acc + v)
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }

    /// Entries in arbitrary order. Use [`ranked`](Self::ranked) for anything
    /// that is shown or compared.
    pub fn iter(&self) -> impl Iterator<Item = (&str, V)> {
        self.counts.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// All entries under canonical order, recomputed from current contents.
    #[must_use]
    pub fn ranked(&self) -> Ranked<V> {
        let mut entries: Vec<(String, V)> = self
            .counts
            .iter()
            .map(|(k, &v)| (k.clone(), v))
            .collect();
        entries.sort_by(|a, b| canonical_order((a.0.as_str(), a.1), (b.0.as_str(), b.1)));
        Ranked(entries)
    }

    /// The first `n` entries under canonical order (fewer if the counter is smaller).
    #[must_use]
    pub fn top_n(&self, n: usize) -> Ranked<V> {
        let mut ranked = self.ranked();
        ranked.0.truncate(n);
        ranked
    }

    /// The highest ranked entry, if any.
    #[must_use]
    pub fn leader(&self) -> Option<(&str, V)> {
        self.iter().min_by(|a, b| canonical_order(*a, *b))
    }
}

impl RankedCounter<u64> {
    /// Counts one more occurrence of `key`.
    pub fn increment(&mut self, key: &str) {
        self.add(key, 1);
    }
}

impl<V: Count, K: AsRef<str>> FromIterator<K> for RankedCounter<V>
where
    V: From<u8>,
{
    /// Builds a counter where each yielded key counts once.
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut counter = Self::new();
        for key in iter {
            counter.add(key.as_ref(), V::from(1));
        }
        counter
    }
}

/// A derived, canonically ordered snapshot of a [`RankedCounter`].
///
/// Serializes as a JSON object whose keys keep the ranked order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ranked<V>(pub Vec<(String, V)>);

impl<V: Copy> Ranked<V> {
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.0.iter().map(|(k, _)| k.as_str()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, V)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<V: Serialize> Serialize for Ranked<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_inserts_then_counts() {
        let mut counter = RankedCounter::new();
        counter.increment("a");
        counter.increment("a");
        counter.increment("b");

        assert_eq!(counter.get("a"), Some(2));
        assert_eq!(counter.get("b"), Some(1));
        assert_eq!(counter.get("c"), None);
        assert_eq!(counter.total(), 3);
    }

    #[test]
    fn test_equal_counts_sorted_by_key_for_any_insertion_order() {
        let orders = [
            ["delta", "alpha", "charlie", "bravo"],
            ["bravo", "charlie", "alpha", "delta"],
            ["alpha", "bravo", "charlie", "delta"],
        ];

        for order in orders {
            let mut counter = RankedCounter::new();
            for key in order {
                counter.increment(key);
            }
            assert_eq!(
                counter.ranked().keys(),
                vec!["alpha", "bravo", "charlie", "delta"]
            );
        }
    }

    #[test]
    fn test_count_desc_beats_key_asc() {
        let mut counter = RankedCounter::new();
        counter.increment("zebra");
        counter.increment("zebra");
        counter.increment("apple");

        assert_eq!(counter.ranked().keys(), vec!["zebra", "apple"]);
    }

    #[test]
    fn test_top_n_recomputes_after_updates() {
        let mut counter = RankedCounter::new();
        counter.increment("x");
        counter.increment("y");
        assert_eq!(counter.top_n(1).keys(), vec!["x"]);

        counter.increment("y");
        assert_eq!(counter.top_n(1).keys(), vec!["y"]);
    }

    #[test]
    fn test_top_n_smaller_than_map() {
        let counter: RankedCounter = ["a", "b"].into_iter().collect();
        assert_eq!(counter.top_n(5).len(), 2);
        assert!(counter.top_n(0).is_empty());
    }

    #[test]
    fn test_replay_in_any_order_gives_same_counter() {
        let keys = ["a", "b", "a", "c", "b", "a"];
        let forward: RankedCounter = keys.iter().collect();
        let backward: RankedCounter = keys.iter().rev().collect();

        assert_eq!(forward, backward);
        assert_eq!(forward.ranked(), backward.ranked());
    }

    #[test]
    fn test_money_counter_leader_tie_breaks_by_name() {
        let mut profit: RankedCounter<f64> = RankedCounter::new();
        profit.add("b-side", 10.5);
        profit.add("a-side", 10.5);
        profit.add("filler", 1.0);

        assert_eq!(profit.leader(), Some(("a-side", 10.5)));
        assert!((profit.total() - 22.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ranked_serializes_in_rank_order() {
        let mut counter = RankedCounter::new();
        counter.increment("b");
        counter.increment("a");
        counter.increment("b");

        let json = serde_json::to_string(&counter.ranked()).unwrap();
        assert_eq!(json, r#"{"b":2,"a":1}"#);
    }
}
