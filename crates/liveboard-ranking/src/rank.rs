use std::cmp::Ordering;

use serde::Serialize;

use crate::ledger::{Ledger, Record};

/// One position in a published ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankEntry {
    pub identity: String,
    pub display_name: String,
    pub score: u64,
}

impl From<&Record> for RankEntry {
    fn from(r: &Record) -> Self {
        Self {
            identity: r.identity.clone(),
            display_name: r.display_name.clone(),
            score: r.score,
        }
    }
}

/// Top `k` records by score, highest first. Equal scores keep first-seen order.
pub fn compute_top_k(ledger: &Ledger, k: usize) -> Vec<RankEntry> {
    let mut records: Vec<&Record> = ledger.all_records().collect();
    records.sort_by(|a, b| rank_order(a, b));
    records.into_iter().take(k).map(RankEntry::from).collect()
}

fn rank_order(a: &Record, b: &Record) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| a.first_seen.cmp(&b.first_seen))
}

/// Positional comparison: a different length, or any slot with a different
/// identity or score, counts as a change. Display-name edits alone do not.
pub fn has_changed(previous: &[RankEntry], current: &[RankEntry]) -> bool {
    previous.len() != current.len()
        || previous
            .iter()
            .zip(current)
            .any(|(p, c)| p.identity != c.identity || p.score != c.score)
}

/// Tracks the current ranking and decides when a new one is due.
///
/// The ranking is always kept current, but it is only announced once the
/// podium is full (`k` distinct participants). Until then `evaluate` returns
/// `None` while `snapshot` still reflects the partial standings, so a session
/// with fewer than `k` scoring participants never announces a ranking.
#[derive(Debug)]
pub struct RankDetector {
    k: usize,
    current: Vec<RankEntry>,
}

impl RankDetector {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            current: Vec::with_capacity(k),
        }
    }

    /// Recompute from `ledger`. Returns the new ranking when it differs from
    /// the previous one and the podium is full; `None` otherwise.
    pub fn evaluate(&mut self, ledger: &Ledger) -> Option<&[RankEntry]> {
        let current = compute_top_k(ledger, self.k);
        if !has_changed(&self.current, &current) {
            return None;
        }
        self.current = current;
        (self.current.len() == self.k).then_some(self.current.as_slice())
    }

    pub fn snapshot(&self) -> &[RankEntry] {
        &self.current
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn reset(&mut self) {
        self.current.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_of(entries: &[(&str, u64)]) -> Ledger {
        let mut ledger = Ledger::new();
        for (id, score) in entries {
            ledger.apply_increment(id, id, *score);
        }
        ledger
    }

    fn ids(entries: &[RankEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.identity.as_str()).collect()
    }

    #[test]
    fn top_three_orders_by_score_then_first_seen() {
        let ledger = ledger_of(&[("A", 5), ("B", 9), ("C", 2), ("D", 9)]);
        let top = compute_top_k(&ledger, 3);

        assert_eq!(ids(&top), vec!["B", "D", "A"]);
        assert_eq!(top[0].score, 9);
        assert_eq!(top[2].score, 5);
    }

    #[test]
    fn length_is_capped_by_distinct_identities() {
        let ledger = ledger_of(&[("A", 1), ("B", 2)]);
        assert_eq!(compute_top_k(&ledger, 3).len(), 2);
        assert!(compute_top_k(&Ledger::new(), 3).is_empty());
    }

    #[test]
    fn unchanged_when_evaluated_twice_without_mutation() {
        let ledger = ledger_of(&[("A", 5), ("B", 9), ("C", 2)]);
        let mut detector = RankDetector::new(3);

        assert!(detector.evaluate(&ledger).is_some());
        assert!(detector.evaluate(&ledger).is_none());

        let a = compute_top_k(&ledger, 3);
        let b = compute_top_k(&ledger, 3);
        assert!(!has_changed(&a, &b));
    }

    #[test]
    fn changed_when_fourth_identity_overtakes_third() {
        let mut ledger = ledger_of(&[("A", 5), ("B", 9), ("C", 2)]);
        let before = compute_top_k(&ledger, 3);

        ledger.apply_increment("D", "D", 3);
        let after = compute_top_k(&ledger, 3);

        assert!(has_changed(&before, &after));
        assert_eq!(ids(&after), vec!["B", "A", "D"]);
    }

    #[test]
    fn reorder_with_same_members_is_a_change() {
        let entry = |id: &str| RankEntry {
            identity: id.into(),
            display_name: id.into(),
            score: 5,
        };
        let before = vec![entry("A"), entry("B")];
        let after = vec![before[1].clone(), before[0].clone()];
        assert!(has_changed(&before, &after));
    }

    #[test]
    fn score_bump_outside_top_k_is_not_a_change() {
        let mut ledger = ledger_of(&[("A", 50), ("B", 40), ("C", 30), ("D", 1)]);
        let mut detector = RankDetector::new(3);
        detector.evaluate(&ledger);

        ledger.apply_increment("D", "D", 5);
        assert!(detector.evaluate(&ledger).is_none());
    }

    #[test]
    fn display_name_change_alone_is_not_a_change() {
        let before = compute_top_k(&ledger_of(&[("A", 5), ("B", 4)]), 2);
        let mut after = before.clone();
        after[1].display_name = "Bee".into();
        assert!(!has_changed(&before, &after));
    }

    #[test]
    fn rename_outside_the_podium_updates_the_ledger_only() {
        let mut ledger = ledger_of(&[("A", 5), ("B", 4), ("C", 1)]);
        let mut detector = RankDetector::new(2);
        assert!(detector.evaluate(&ledger).is_some());

        ledger.apply_increment("C", "Renamed", 1);
        let renamed = ledger.all_records().find(|r| r.identity == "C");
        assert_eq!(renamed.map(|r| r.display_name.as_str()), Some("Renamed"));
        assert!(detector.evaluate(&ledger).is_none());
    }

    #[test]
    fn zero_increment_leaves_the_record_untouched() {
        let mut ledger = ledger_of(&[("A", 5)]);
        ledger.apply_increment("A", "Renamed", 0);
        let record = ledger.all_records().next();
        assert_eq!(record.map(|r| (r.display_name.as_str(), r.score)), Some(("A", 5)));
    }

    #[test]
    fn reset_forces_next_ranking_to_publish() {
        let ledger = ledger_of(&[("A", 5), ("B", 4), ("C", 3)]);
        let mut detector = RankDetector::new(3);
        detector.evaluate(&ledger);
        detector.reset();

        assert!(detector.snapshot().is_empty());
        assert!(detector.evaluate(&ledger).is_some());
    }

    #[test]
    fn partial_podium_is_tracked_but_not_announced() {
        let mut ledger = Ledger::new();
        let mut detector = RankDetector::new(3);

        ledger.apply_increment("alice", "Alice", 10);
        assert!(detector.evaluate(&ledger).is_none());
        ledger.apply_increment("bob", "Bob", 15);
        assert!(detector.evaluate(&ledger).is_none());
        assert_eq!(ids(detector.snapshot()), vec!["bob", "alice"]);

        ledger.apply_increment("carol", "Carol", 5);
        let top = detector.evaluate(&ledger).map(<[RankEntry]>::to_vec);
        assert_eq!(top.as_deref().map(ids), Some(vec!["bob", "alice", "carol"]));
    }
}
