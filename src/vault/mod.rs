//! Vaults: classification, orchestration and summaries
//!
//! Content is routed into one of six fixed vaults:
//!
//! | Vault       | Holds                                   |
//! |-------------|-----------------------------------------|
//! | strategic   | decisions, goals, priorities            |
//! | technical   | architecture, code, infrastructure      |
//! | creative    | ideas, design, writing                  |
//! | operational | process, releases, day-to-day work      |
//! | wisdom      | lessons learned, principles             |
//! | horizon     | append-only ledger, never auto-selected |

pub mod classifier;
pub mod manager;
pub mod summary;
pub mod types;

pub use classifier::{guardians_for, KeywordRule, VaultClassifier, VaultScore};
pub use manager::VaultManager;
pub use summary::SyncReport;
pub use types::{
    Classification, Confidence, Entry, Guardian, RecallQuery, RememberRequest, SearchHit, SortBy,
    SystemStats, TagCount, VaultCategory, VaultStats, DEFAULT_RECALL_LIMIT,
};
