pub mod ledger;
pub mod rank;

pub use ledger::{Ledger, Record};
pub use rank::{compute_top_k, has_changed, RankDetector, RankEntry};
