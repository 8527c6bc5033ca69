//! Durable storage for the five general vaults
//!
//! ## Architecture
//!
//! ```text
//! VaultManager ──▶ dyn VaultBackend ──▶ FileBackend
//!                                        ├── vaults/strategic.json
//!                                        ├── vaults/technical.json
//!                                        ├── vaults/creative.json
//!                                        ├── vaults/operational.json
//!                                        └── vaults/wisdom.json
//! ```
//!
//! The horizon vault is never resident here; it belongs to the ledger.

pub mod file;
pub mod search;

pub use file::FileBackend;
pub use search::QueryMatcher;

use crate::error::Result;
use crate::vault::{Entry, SearchHit, VaultCategory, VaultStats};
use async_trait::async_trait;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Pluggable persistence interface for general-vault entries.
///
/// Every mutating call must be durable before it returns.
#[async_trait]
pub trait VaultBackend: Send + Sync {
    /// Insert or overwrite an entry by id.
    async fn store(&self, entry: Entry) -> Result<()>;

    /// Look up an entry in any vault, live or expired.
    async fn get(&self, id: &str) -> Option<Entry>;

    /// Physically delete an entry. Returns whether anything was removed.
    async fn remove(&self, id: &str) -> Result<bool>;

    /// Which vault currently holds `id`.
    async fn find_vault(&self, id: &str) -> Option<VaultCategory>;

    /// Lexically ranked live entries, best first.
    async fn search(
        &self,
        query: &str,
        vault: Option<VaultCategory>,
        limit: usize,
    ) -> Vec<SearchHit>;

    /// Live entries, newest first.
    async fn list(&self, vault: Option<VaultCategory>, limit: usize) -> Vec<Entry>;

    /// Number of live entries.
    async fn count(&self, vault: Option<VaultCategory>) -> usize;

    /// Empty one vault, or every general vault when `None`.
    ///
    /// Each vault is cleared atomically on its own. When clearing several,
    /// the first failure is returned and vaults cleared before it stay empty.
    async fn clear(&self, vault: Option<VaultCategory>) -> Result<()>;

    /// Statistics over a vault's live entries.
    async fn stats(&self, vault: VaultCategory) -> VaultStats;
}

/// Replace `path` with `bytes` without ever exposing a partial file.
///
/// Data is written and fsynced to a sibling `.tmp` file, then renamed over
/// the target. A crash before the rename leaves the previous file intact.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp_path = path.with_extension("tmp");
    {
        let mut file = tokio::fs::File::create(&tmp_path).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
    }
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(e.into());
    }
    Ok(())
}
