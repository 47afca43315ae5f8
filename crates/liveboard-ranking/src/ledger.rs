//! Engagement ledger: cumulative like score per participant for the current
//! upstream session.
//!
//! Pure in-memory state. The ledger never emits events; the caller decides
//! what to broadcast after a mutation.

use std::collections::HashMap;

use serde::Serialize;

/// One participant's running total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub identity: String,
    pub display_name: String,
    pub score: u64,
    /// Ledger-local insertion order, used to break score ties.
    pub first_seen: u64,
}

#[derive(Debug, Default)]
pub struct Ledger {
    records: HashMap<String, Record>,
    next_seq: u64,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to `identity`'s score, creating the record on first sight.
    ///
    /// The display name is overwritten on every increment (last seen wins).
    /// A zero amount is ignored so that every stored record has a positive
    /// score.
    pub fn apply_increment(&mut self, identity: &str, display_name: &str, amount: u64) {
        if amount == 0 {
            return;
        }

        if let Some(record) = self.records.get_mut(identity) {
            record.score = record.score.saturating_add(amount);
            if record.display_name != display_name {
                record.display_name = display_name.to_string();
            }
            return;
        }

        let first_seen = self.next_seq;
        self.next_seq += 1;
        self.records.insert(
            identity.to_string(),
            Record {
                identity: identity.to_string(),
                display_name: display_name.to_string(),
                score: amount,
                first_seen,
            },
        );
    }

    /// Every record at the time of the call, in no particular order.
    pub fn all_records(&self) -> impl Iterator<Item = &Record> + '_ {
        self.records.values()
    }

    pub fn score_of(&self, identity: &str) -> Option<u64> {
        self.records.get(identity).map(|r| r.score)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every record. Tie-break order restarts from zero as well.
    pub fn clear(&mut self) {
        self.records.clear();
        self.next_seq = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_increment_creates_record() {
        let mut ledger = Ledger::new();
        ledger.apply_increment("alice", "Alice", 4);

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.score_of("alice"), Some(4));
    }

    #[test]
    fn score_is_sum_of_amounts_across_interleaving() {
        let mut ledger = Ledger::new();
        let ops = [("a", 3), ("b", 1), ("a", 7), ("c", 2), ("b", 9), ("a", 1)];
        for (id, amount) in ops {
            ledger.apply_increment(id, id, amount);
        }

        assert_eq!(ledger.score_of("a"), Some(11));
        assert_eq!(ledger.score_of("b"), Some(10));
        assert_eq!(ledger.score_of("c"), Some(2));
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn display_name_is_last_seen() {
        let mut ledger = Ledger::new();
        ledger.apply_increment("alice", "Alice", 1);
        ledger.apply_increment("alice", "Alice 🌸", 1);

        let record = ledger.all_records().next().unwrap();
        assert_eq!(record.display_name, "Alice 🌸");
        assert_eq!(record.score, 2);
        assert_eq!(record.first_seen, 0);
    }

    #[test]
    fn zero_amount_is_ignored() {
        let mut ledger = Ledger::new();
        ledger.apply_increment("ghost", "Ghost", 0);
        assert!(ledger.is_empty());

        ledger.apply_increment("alice", "Alice", 2);
        ledger.apply_increment("alice", "Renamed", 0);
        assert_eq!(ledger.score_of("alice"), Some(2));
    }

    #[test]
    fn clear_empties_and_resets_order() {
        let mut ledger = Ledger::new();
        ledger.apply_increment("a", "A", 1);
        ledger.apply_increment("b", "B", 1);
        ledger.clear();
        assert!(ledger.is_empty());

        ledger.apply_increment("b", "B", 1);
        assert_eq!(ledger.all_records().next().unwrap().first_seen, 0);
    }
}
