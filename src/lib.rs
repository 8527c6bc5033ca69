//! Vaultkeeper - Typed Semantic Memory Store
//!
//! Vaultkeeper is a local-first store that classifies free-text notes into
//! named vaults, keeps them durably on disk and recalls them by keyword
//! relevance. One vault, `horizon`, is an append-only ledger whose entries
//! can never be changed or removed.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     vaultkeeper CLI                           │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │
//! ┌──────────────────────────────▼───────────────────────────────┐
//! │                      Vault Manager                            │
//! │  - Validate and route writes                                  │
//! │  - Enforce per-vault capacity and horizon immutability        │
//! │  - Merge, filter and sort recall results                      │
//! └───────┬──────────────────────┬───────────────────────┬───────┘
//!         │                      │                       │
//! ┌───────▼────────┐   ┌─────────▼──────────┐   ┌────────▼────────┐
//! │   Classifier   │   │   Storage Backend  │   │ Horizon Ledger  │
//! │  keyword rules │   │  vaults/*.json     │   │  ledger.jsonl   │
//! │  owner routing │   │  atomic rewrites   │   │  append + fsync │
//! └────────────────┘   └────────────────────┘   └─────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vaultkeeper::{RecallQuery, RememberRequest, VaultConfig, VaultManager};
//!
//! # async fn demo() -> vaultkeeper::Result<()> {
//! let manager = VaultManager::open(VaultConfig::default()).await?;
//! manager
//!     .remember(RememberRequest::new("Migrate the database to the new schema"))
//!     .await?;
//! let hits = manager.recall(RecallQuery::new("database")).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`vault`]: Vault types, classifier, manager and summary sync
//! - [`storage`]: Backend trait and the JSON file backend
//! - [`horizon`]: Append-only ledger and dataset export
//! - [`config`]: Configuration management
//! - [`error`]: Error types

pub mod config;
pub mod error;
pub mod horizon;
pub mod storage;
pub mod vault;

pub use config::VaultConfig;
pub use error::{Error, Result};
pub use horizon::{ExportSummary, HistoricalEntry, HorizonLedger};
pub use storage::{FileBackend, VaultBackend};
pub use vault::{
    Classification, Confidence, Entry, Guardian, RecallQuery, RememberRequest, SearchHit, SortBy,
    SystemStats, VaultCategory, VaultClassifier, VaultManager, VaultStats,
};
