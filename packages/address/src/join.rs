//! Two-tier address join with an explicit fallback.
//!
//! A [`JoinTable`] maps normalized addresses to values. Lookups try the
//! exact key, then its [`alternate_form`], then return the caller's
//! fallback. Lookups never fail and never return "nothing".

use std::collections::BTreeMap;
use std::fmt;

use crate::alternate::alternate_form;

/// Which tier of the join resolved a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    /// The normalized address was a key of the table.
    Exact,
    /// The alternate form of the address was a key of the table.
    Alternate,
    /// Neither form matched; the fallback value was returned.
    Fallback,
}

/// Result of a lookup: the bound value and how it was found.
#[derive(Debug, Clone, Copy)]
pub struct JoinOutcome<'a, V> {
    /// The value bound to the address.
    pub value: &'a V,
    /// The tier that produced `value`.
    pub tier: MatchTier,
}

/// Lookup table keyed by normalized address.
///
/// When the same key is inserted more than once the first value wins,
/// so lookups follow input row order. Later duplicates are counted (see
/// [`JoinTable::duplicate_keys`]) but otherwise ignored.
#[derive(Debug, Clone)]
pub struct JoinTable<V> {
    entries: BTreeMap<String, V>,
    rows: usize,
    duplicate_keys: usize,
}

impl<V> Default for JoinTable<V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            rows: 0,
            duplicate_keys: 0,
        }
    }
}

impl<V> JoinTable<V> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a row. Ignored (but counted) if `key` is already present.
    pub fn insert(&mut self, key: String, value: V) {
        self.rows += 1;
        if self.entries.contains_key(&key) {
            self.duplicate_keys += 1;
            return;
        }
        self.entries.insert(key, value);
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of rows inserted, duplicates included.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of rows whose key had already been inserted.
    #[must_use]
    pub const fn duplicate_keys(&self) -> usize {
        self.duplicate_keys
    }

    /// Exact-key access without the alternate-form tier.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    /// Resolves `address`, reporting which tier matched.
    #[must_use]
    pub fn resolve<'a>(&'a self, address: &str, fallback: &'a V) -> JoinOutcome<'a, V> {
        if let Some(value) = self.entries.get(address) {
            return JoinOutcome {
                value,
                tier: MatchTier::Exact,
            };
        }

        if let Some(value) = self.entries.get(&alternate_form(address)) {
            return JoinOutcome {
                value,
                tier: MatchTier::Alternate,
            };
        }

        JoinOutcome {
            value: fallback,
            tier: MatchTier::Fallback,
        }
    }

    /// Returns the value bound to `address`, or `fallback`.
    #[must_use]
    pub fn lookup<'a>(&'a self, address: &str, fallback: &'a V) -> &'a V {
        self.resolve(address, fallback).value
    }
}

impl<V> FromIterator<(String, V)> for JoinTable<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (key, value) in iter {
            table.insert(key, value);
        }
        table
    }
}

/// Running per-tier counts of join outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinStats {
    /// Lookups resolved by the exact key.
    pub exact: u64,
    /// Lookups resolved by the alternate form.
    pub alternate: u64,
    /// Lookups that fell back to the default value.
    pub fallback: u64,
}

impl JoinStats {
    /// Counts one outcome.
    pub const fn record(&mut self, tier: MatchTier) {
        match tier {
            MatchTier::Exact => self.exact += 1,
            MatchTier::Alternate => self.alternate += 1,
            MatchTier::Fallback => self.fallback += 1,
        }
    }

    /// Total number of lookups recorded.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.exact + self.alternate + self.fallback
    }
}

impl fmt::Display for JoinStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} exact, {} alternate form, {} fallback (of {})",
            self.exact,
            self.alternate,
            self.fallback,
            self.total()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> JoinTable<u32> {
        [
            ("Riia tn 15".to_string(), 1),
            ("Tähe 10".to_string(), 2),
            ("Tähe 10".to_string(), 99),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn matches_exact_key() {
        let outcome = table().resolve("Tähe 10", &0).tier;
        assert_eq!(outcome, MatchTier::Exact);
    }

    #[test]
    fn first_duplicate_wins() {
        let table = table();
        assert_eq!(*table.lookup("Tähe 10", &0), 2);
        assert_eq!(table.duplicate_keys(), 1);
        assert_eq!(table.rows(), 3);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn matches_alternate_form() {
        let table = table();
        let outcome = table.resolve("Riia 15", &0);
        assert_eq!(*outcome.value, 1);
        assert_eq!(outcome.tier, MatchTier::Alternate);
    }

    #[test]
    fn matches_alternate_form_in_reverse() {
        let table: JoinTable<u32> = [("Tähe 10".to_string(), 7)].into_iter().collect();
        assert_eq!(*table.lookup("Tähe tn 10", &0), 7);
    }

    #[test]
    fn returns_fallback_when_nothing_matches() {
        let table = table();
        let outcome = table.resolve("Kalda tee 5", &42);
        assert_eq!(*outcome.value, 42);
        assert_eq!(outcome.tier, MatchTier::Fallback);
    }

    #[test]
    fn lookups_are_deterministic() {
        let table = table();
        let first = *table.lookup("Riia 15", &0);
        for _ in 0..10 {
            assert_eq!(*table.lookup("Riia 15", &0), first);
        }
    }

    #[test]
    fn empty_table_always_falls_back() {
        let table: JoinTable<u32> = JoinTable::new();
        assert!(table.is_empty());
        assert_eq!(*table.lookup("Riia 15", &5), 5);
    }

    #[test]
    fn counts_tiers() {
        let mut stats = JoinStats::default();
        stats.record(MatchTier::Exact);
        stats.record(MatchTier::Exact);
        stats.record(MatchTier::Alternate);
        stats.record(MatchTier::Fallback);
        assert_eq!(stats.total(), 4);
        assert_eq!(
            stats.to_string(),
            "2 exact, 1 alternate form, 1 fallback (of 4)"
        );
    }
}
