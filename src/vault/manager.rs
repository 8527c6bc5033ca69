//! Vault manager: the single entry point for reads and writes
//!
//! Routes writes to the file backend or the horizon ledger, enforces
//! per-vault capacity and horizon immutability, and merges results from
//! both stores on reads.

use super::classifier::VaultClassifier;
use super::types::*;
use crate::config::VaultConfig;
use crate::error::{Error, Result};
use crate::horizon::{HistoricalEntry, HorizonLedger};
use crate::storage::{FileBackend, VaultBackend};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Recall over-fetches this many times the limit before filtering
const RECALL_OVERFETCH: usize = 3;

/// Context recorded on ledger entries written through `remember`
const REMEMBER_CONTEXT: &str = "remember";

/// Orchestrates classification, storage and the horizon ledger
pub struct VaultManager {
    config: VaultConfig,
    backend: Arc<dyn VaultBackend>,
    ledger: HorizonLedger,
    classifier: VaultClassifier,
    /// Serializes the capacity check and write for each vault
    write_locks: BTreeMap<VaultCategory, Mutex<()>>,
}

impl VaultManager {
    /// Open the file backend and ledger under `config.storage.root`
    pub async fn open(config: VaultConfig) -> Result<Self> {
        config.validate()?;
        let backend = FileBackend::open(config.storage.root.clone()).await?;
        Self::with_backend(config, Arc::new(backend)).await
    }

    /// Build a manager over any backend; the ledger still lives under
    /// `config.storage.root`
    pub async fn with_backend(config: VaultConfig, backend: Arc<dyn VaultBackend>) -> Result<Self> {
        config.validate()?;
        let ledger = HorizonLedger::open(&config.storage.root).await?;
        let classifier = VaultClassifier::from_config(&config.classifier);
        let write_locks = VaultCategory::ALL
            .into_iter()
            .map(|vault| (vault, Mutex::new(())))
            .collect();

        tracing::info!("Vaults opened at {}", config.storage.root.display());

        Ok(Self {
            config,
            backend,
            ledger,
            classifier,
            write_locks,
        })
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Storage root
    pub fn root(&self) -> &Path {
        &self.config.storage.root
    }

    /// Read access to the horizon ledger. Writes go through `remember` or
    /// `append_horizon`.
    pub fn horizon(&self) -> &HorizonLedger {
        &self.ledger
    }

    /// Store new content and return the created entry
    pub async fn remember(&self, req: RememberRequest) -> Result<Entry> {
        let content = req.content.trim().to_string();
        if content.is_empty() {
            return Err(Error::Validation("cannot remember empty content".to_string()));
        }

        let vault = self.resolve_vault(&content, req.vault, req.guardian);
        let confidence = req
            .confidence
            .unwrap_or(self.config.vaults.default_confidence);

        if vault.is_horizon() {
            return self.remember_horizon(content, req, confidence).await;
        }

        let now = now_millis();
        let entry = Entry {
            id: format!("mem-{}", uuid::Uuid::new_v4()),
            content,
            vault,
            tags: req.tags,
            confidence,
            guardian: req.guardian,
            metadata: req.metadata,
            created_at: now,
            updated_at: now,
            expires_at: req
                .ttl_seconds
                .filter(|ttl| *ttl != 0)
                .map(|ttl| now.saturating_add(ttl.saturating_mul(1000))),
            source: req.source,
        };

        let _guard = self.lock_for(vault).lock().await;
        self.check_capacity(vault, self.backend.count(Some(vault)).await)?;
        self.backend.store(entry.clone()).await?;

        tracing::debug!("Remembered {} in {} vault", entry.id, vault);
        Ok(entry)
    }

    async fn remember_horizon(
        &self,
        content: String,
        req: RememberRequest,
        confidence: Confidence,
    ) -> Result<Entry> {
        if req.ttl_seconds.is_some() {
            tracing::debug!("Ignoring ttl for horizon entry; ledger entries never expire");
        }
        let context = req.source.as_deref().unwrap_or(REMEMBER_CONTEXT);
        let record = HistoricalEntry::new(
            content,
            context,
            self.horizon_author(req.guardian),
            req.guardian.is_some(),
            req.tags,
        )
        .confidence(confidence)
        .metadata(req.metadata);

        let record = self.append_ledger(record).await?;
        let entry = record.to_entry(confidence);
        tracing::debug!("Remembered {} in horizon ledger", entry.id);
        Ok(entry)
    }

    /// Append straight to the horizon ledger.
    ///
    /// The author is the guardian's name, or `vaults.horizon_author` when no
    /// guardian is given. Subject to the same capacity limit as `remember`.
    pub async fn append_horizon(
        &self,
        content: &str,
        context: &str,
        guardian: Option<Guardian>,
        tags: Vec<String>,
    ) -> Result<HistoricalEntry> {
        let record = HistoricalEntry::new(
            content,
            context,
            self.horizon_author(guardian),
            guardian.is_some(),
            tags,
        );
        self.append_ledger(record).await
    }

    fn horizon_author(&self, guardian: Option<Guardian>) -> String {
        guardian
            .map(|g| g.name().to_string())
            .unwrap_or_else(|| self.config.vaults.horizon_author.clone())
    }

    async fn append_ledger(&self, record: HistoricalEntry) -> Result<HistoricalEntry> {
        let _guard = self.lock_for(VaultCategory::Horizon).lock().await;
        self.check_capacity(VaultCategory::Horizon, self.ledger.count().await)?;
        self.ledger.append_record(record).await
    }

    fn resolve_vault(
        &self,
        content: &str,
        explicit: Option<VaultCategory>,
        guardian: Option<Guardian>,
    ) -> VaultCategory {
        if let Some(vault) = explicit {
            return vault;
        }
        if !self.config.vaults.enable_auto_classification {
            return VaultCategory::Operational;
        }
        let classification = self.classifier.classify(content, guardian);
        tracing::debug!(
            "Classified into {} ({:.2}): {}",
            classification.vault,
            classification.confidence,
            classification.reasoning
        );
        classification.vault
    }

    fn check_capacity(&self, vault: VaultCategory, live: usize) -> Result<()> {
        let capacity = self.config.vaults.max_entries_per_vault;
        if live >= capacity {
            return Err(Error::Capacity { vault, capacity });
        }
        Ok(())
    }

    fn lock_for(&self, vault: VaultCategory) -> &Mutex<()> {
        &self.write_locks[&vault]
    }

    /// Search live entries, horizon included when no vault filter is set
    pub async fn recall(&self, query: RecallQuery) -> Result<Vec<SearchHit>> {
        if query.query.trim().is_empty() {
            return Err(Error::Validation("recall query cannot be empty".to_string()));
        }

        let fetch = query.limit.saturating_mul(RECALL_OVERFETCH);
        let mut hits = match query.vault {
            Some(VaultCategory::Horizon) => Vec::new(),
            vault => self.backend.search(&query.query, vault, fetch).await,
        };

        if query.vault.map_or(true, VaultCategory::is_horizon) {
            let confidence = self.config.vaults.default_confidence;
            hits.extend(
                self.ledger
                    .search(&query.query, fetch)
                    .await
                    .into_iter()
                    .map(|(record, score)| SearchHit {
                        entry: record.to_entry(confidence),
                        score,
                    }),
            );
        }

        hits.retain(|hit| {
            let entry = &hit.entry;
            query.guardian.map_or(true, |g| entry.guardian == Some(g))
                && query.tags.iter().all(|t| entry.tags.contains(t))
                && query
                    .min_confidence
                    .map_or(true, |min| entry.confidence.weight() >= min.weight())
        });

        match query.sort_by {
            SortBy::Relevance => hits.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            }),
            SortBy::Recency => hits.sort_by(|a, b| b.entry.created_at.cmp(&a.entry.created_at)),
            SortBy::Confidence => hits.sort_by(|a, b| {
                b.entry
                    .confidence
                    .weight()
                    .partial_cmp(&a.entry.confidence.weight())
                    .unwrap_or(std::cmp::Ordering::Equal)
            }),
        }

        hits.truncate(query.limit);
        Ok(hits)
    }

    /// Most recent live entries, newest first
    pub async fn recent(&self, vault: Option<VaultCategory>, limit: usize) -> Vec<Entry> {
        match vault {
            Some(VaultCategory::Horizon) => self.horizon_recent(limit).await,
            Some(vault) => self.backend.list(Some(vault), limit).await,
            None => {
                let mut entries = self.backend.list(None, limit).await;
                entries.extend(self.horizon_recent(limit).await);
                entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                entries.truncate(limit);
                entries
            }
        }
    }

    async fn horizon_recent(&self, limit: usize) -> Vec<Entry> {
        let confidence = self.config.vaults.default_confidence;
        self.ledger
            .recent(limit)
            .await
            .iter()
            .map(|record| record.to_entry(confidence))
            .collect()
    }

    /// Look up a single entry by id
    pub async fn get(&self, id: &str) -> Option<Entry> {
        if let Some(record) = self.ledger.get(id).await {
            return Some(record.to_entry(self.config.vaults.default_confidence));
        }
        self.backend.get(id).await
    }

    /// Physically remove an entry. Horizon entries are refused.
    pub async fn forget(&self, id: &str) -> Result<bool> {
        if self.ledger.contains(id).await {
            return Err(Error::ImmutableEntry(id.to_string()));
        }
        let removed = self.backend.remove(id).await?;
        if removed {
            tracing::debug!("Forgot {}", id);
        }
        Ok(removed)
    }

    /// Statistics for all six vaults plus totals
    pub async fn stats(&self) -> SystemStats {
        let mut vaults = Vec::with_capacity(VaultCategory::ALL.len());
        for vault in VaultCategory::GENERAL {
            vaults.push(self.backend.stats(vault).await);
        }
        let horizon = self.ledger.stats().await;
        let horizon_count = horizon.count;
        vaults.push(horizon);

        SystemStats {
            total_entries: vaults.iter().map(|v| v.count).sum(),
            vaults,
            horizon_count,
            storage_root: self.config.storage.root.clone(),
        }
    }

    /// Dry-run classification, identical to what `remember` would decide
    pub fn classify(&self, content: &str, guardian: Option<Guardian>) -> Classification {
        self.classifier.classify(content, guardian)
    }

    /// Empty one general vault or all of them. Horizon is refused.
    ///
    /// Each vault is cleared on its own, under its own write lock. With
    /// `None` the vaults are cleared in order and the first failure is
    /// returned; vaults cleared before it stay empty and the rest are left
    /// untouched.
    pub async fn clear(&self, vault: Option<VaultCategory>) -> Result<()> {
        match vault {
            Some(v) if v.is_horizon() => Err(Error::ImmutableVault(v)),
            Some(v) => {
                let _guard = self.lock_for(v).lock().await;
                self.backend.clear(Some(v)).await
            }
            None => {
                for v in VaultCategory::GENERAL {
                    let _guard = self.lock_for(v).lock().await;
                    self.backend.clear(Some(v)).await?;
                }
                Ok(())
            }
        }
    }

    /// Live entry count; `None` covers every vault including horizon
    pub async fn count(&self, vault: Option<VaultCategory>) -> usize {
        match vault {
            Some(VaultCategory::Horizon) => self.ledger.count().await,
            Some(v) => self.backend.count(Some(v)).await,
            None => self.backend.count(None).await + self.ledger.count().await,
        }
    }

    /// Entries owned by `guardian`, newest first
    pub async fn by_guardian(&self, guardian: Guardian, limit: usize) -> Vec<Entry> {
        let mut owned: Vec<Entry> = self
            .recent(None, usize::MAX)
            .await
            .into_iter()
            .filter(|e| e.guardian == Some(guardian))
            .collect();
        owned.truncate(limit);
        owned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn manager(dir: &TempDir) -> VaultManager {
        VaultManager::open(VaultConfig::with_root(dir.path()))
            .await
            .unwrap()
    }

    async fn manager_with_capacity(dir: &TempDir, capacity: usize) -> VaultManager {
        let mut config = VaultConfig::with_root(dir.path());
        config.vaults.max_entries_per_vault = capacity;
        VaultManager::open(config).await.unwrap()
    }

    #[tokio::test]
    async fn test_remember_explicit_vault() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir).await;

        let entry = mgr
            .remember(
                RememberRequest::new("  Use ring buffers for logs  ")
                    .vault(VaultCategory::Wisdom)
                    .tag("perf"),
            )
            .await
            .unwrap();

        assert!(entry.id.starts_with("mem-"));
        assert_eq!(entry.content, "Use ring buffers for logs");
        assert_eq!(entry.vault, VaultCategory::Wisdom);
        assert_eq!(entry.confidence, Confidence::Medium);
        assert_eq!(entry.created_at, entry.updated_at);
        assert!(entry.expires_at.is_none());
        assert_eq!(mgr.count(Some(VaultCategory::Wisdom)).await, 1);
    }

    #[tokio::test]
    async fn test_empty_content_rejected() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir).await;

        let err = mgr.remember(RememberRequest::new("   ")).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(mgr.count(None).await, 0);
    }

    #[tokio::test]
    async fn test_decision_scenario_routes_technical() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir).await;
        let content = "Decision: migrate database to a new schema";

        let entry = mgr.remember(RememberRequest::new(content)).await.unwrap();
        assert_eq!(entry.vault, VaultCategory::Technical);

        let classification = mgr.classify(content, None);
        assert_eq!(classification.vault, VaultCategory::Technical);
        assert!(classification.confidence > 0.0);

        let scores = VaultClassifier::new().scores(content);
        let score = |v: VaultCategory| scores.iter().find(|s| s.vault == v).unwrap().score;
        assert!(score(VaultCategory::Technical) > score(VaultCategory::Strategic));
    }

    #[tokio::test]
    async fn test_guardian_routes_to_home_vault() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir).await;

        let entry = mgr
            .remember(RememberRequest::new("database migration plan").guardian(Guardian::Leyla))
            .await
            .unwrap();
        assert_eq!(entry.vault, VaultCategory::Creative);
        assert_eq!(entry.guardian, Some(Guardian::Leyla));
    }

    #[tokio::test]
    async fn test_auto_classification_disabled_uses_operational() {
        let dir = TempDir::new().unwrap();
        let mut config = VaultConfig::with_root(dir.path());
        config.vaults.enable_auto_classification = false;
        let mgr = VaultManager::open(config).await.unwrap();

        let entry = mgr
            .remember(RememberRequest::new("refactor the database schema"))
            .await
            .unwrap();
        assert_eq!(entry.vault, VaultCategory::Operational);
    }

    #[tokio::test]
    async fn test_capacity_enforced() {
        let dir = TempDir::new().unwrap();
        let mgr = manager_with_capacity(&dir, 2).await;

        for i in 0..2 {
            mgr.remember(RememberRequest::new(format!("note {i}")).vault(VaultCategory::Technical))
                .await
                .unwrap();
        }
        let err = mgr
            .remember(RememberRequest::new("one more").vault(VaultCategory::Technical))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Capacity {
                vault: VaultCategory::Technical,
                capacity: 2
            }
        ));
        assert_eq!(mgr.count(Some(VaultCategory::Technical)).await, 2);

        // Other vaults are unaffected
        mgr.remember(RememberRequest::new("fine").vault(VaultCategory::Wisdom))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_expired_entries_free_capacity() {
        let dir = TempDir::new().unwrap();
        let mgr = manager_with_capacity(&dir, 1).await;

        mgr.remember(
            RememberRequest::new("stale")
                .vault(VaultCategory::Technical)
                .ttl_seconds(-1),
        )
        .await
        .unwrap();
        mgr.remember(RememberRequest::new("fresh").vault(VaultCategory::Technical))
            .await
            .unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_remember_respects_capacity() {
        let dir = TempDir::new().unwrap();
        let mgr = Arc::new(manager_with_capacity(&dir, 5).await);

        let mut handles = Vec::new();
        for i in 0..20 {
            let mgr = Arc::clone(&mgr);
            handles.push(tokio::spawn(async move {
                mgr.remember(
                    RememberRequest::new(format!("concurrent {i}")).vault(VaultCategory::Operational),
                )
                .await
            }));
        }

        let mut stored = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => stored += 1,
                Err(e) => assert!(matches!(e, Error::Capacity { .. })),
            }
        }
        assert_eq!(stored, 5);
        assert_eq!(mgr.count(Some(VaultCategory::Operational)).await, 5);
    }

    #[tokio::test]
    async fn test_expired_entry_hidden_but_forgettable() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir).await;

        let entry = mgr
            .remember(
                RememberRequest::new("temporary deploy window")
                    .vault(VaultCategory::Operational)
                    .ttl_seconds(-1),
            )
            .await
            .unwrap();
        assert!(entry.expires_at.unwrap() < now_millis());

        assert!(mgr.recall(RecallQuery::new("deploy")).await.unwrap().is_empty());
        assert!(mgr.recent(Some(VaultCategory::Operational), 10).await.is_empty());
        assert_eq!(mgr.count(Some(VaultCategory::Operational)).await, 0);
        let stats = mgr.stats().await;
        assert_eq!(stats.vaults[3].vault, VaultCategory::Operational);
        assert_eq!(stats.vaults[3].count, 0);

        assert!(mgr.forget(&entry.id).await.unwrap());
        assert!(!mgr.forget(&entry.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_round_trip_every_vault() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir).await;

        for vault in VaultCategory::ALL {
            let content = format!("zephyr marker for {vault}");
            let entry = mgr
                .remember(RememberRequest::new(&content).vault(vault))
                .await
                .unwrap();
            assert_eq!(entry.vault, vault);

            let hits = mgr
                .recall(RecallQuery::new(format!("zephyr {vault}")).vault(vault))
                .await
                .unwrap();
            assert!(
                hits.iter().any(|h| h.entry.id == entry.id && h.entry.content == content),
                "entry not recalled from {vault}"
            );
        }

        let all = mgr.recall(RecallQuery::new("zephyr")).await.unwrap();
        assert_eq!(all.len(), 6);
    }

    #[tokio::test]
    async fn test_horizon_is_immutable() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir).await;

        let entry = mgr
            .remember(RememberRequest::new("a shared future").guardian(Guardian::Lyria))
            .await
            .unwrap();
        assert_eq!(entry.vault, VaultCategory::Horizon);
        assert!(entry.id.starts_with("hzn-"));
        assert_eq!(mgr.horizon().count().await, 1);

        let err = mgr.forget(&entry.id).await.unwrap_err();
        assert!(matches!(err, Error::ImmutableEntry(_)));
        let err = mgr.clear(Some(VaultCategory::Horizon)).await.unwrap_err();
        assert!(matches!(err, Error::ImmutableVault(VaultCategory::Horizon)));

        mgr.clear(None).await.unwrap();
        assert_eq!(mgr.horizon().count().await, 1);
        assert_eq!(mgr.count(Some(VaultCategory::Horizon)).await, 1);
    }

    #[tokio::test]
    async fn test_horizon_mirror_author_and_context() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir).await;

        mgr.remember(
            RememberRequest::new("guardian wish")
                .guardian(Guardian::Lyria)
                .tag("hope"),
        )
        .await
        .unwrap();
        mgr.remember(
            RememberRequest::new("plain wish")
                .vault(VaultCategory::Horizon)
                .source("journal")
                .ttl_seconds(60),
        )
        .await
        .unwrap();

        let records = mgr.horizon().all().await;
        assert_eq!(records[0].author, "Lyria");
        assert!(records[0].co_authored);
        assert_eq!(records[0].context, "remember");
        assert_eq!(records[0].tags, vec!["hope"]);
        assert_eq!(records[1].author, "vaultkeeper");
        assert!(!records[1].co_authored);
        assert_eq!(records[1].context, "journal");

        let recent = mgr.recent(Some(VaultCategory::Horizon), 10).await;
        assert_eq!(recent.len(), 2);
        assert!(recent.iter().all(|e| e.expires_at.is_none()));
    }

    #[tokio::test]
    async fn test_recall_filters_and_sorting() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir).await;

        mgr.remember(
            RememberRequest::new("cache invalidation strategy")
                .vault(VaultCategory::Technical)
                .tags(["cache", "design"])
                .confidence(Confidence::Low),
        )
        .await
        .unwrap();
        mgr.remember(
            RememberRequest::new("cache warmup")
                .vault(VaultCategory::Technical)
                .tag("cache")
                .guardian(Guardian::Draconia)
                .confidence(Confidence::Verified),
        )
        .await
        .unwrap();

        let by_tags = mgr
            .recall(RecallQuery::new("cache").tag("cache").tag("design"))
            .await
            .unwrap();
        assert_eq!(by_tags.len(), 1);
        assert_eq!(by_tags[0].entry.content, "cache invalidation strategy");

        let by_guardian = mgr
            .recall(RecallQuery::new("cache").guardian(Guardian::Draconia))
            .await
            .unwrap();
        assert_eq!(by_guardian.len(), 1);

        let confident = mgr
            .recall(RecallQuery::new("cache").min_confidence(Confidence::High))
            .await
            .unwrap();
        assert_eq!(confident.len(), 1);
        assert_eq!(confident[0].entry.confidence, Confidence::Verified);

        let sorted = mgr
            .recall(RecallQuery::new("cache").sort_by(SortBy::Confidence))
            .await
            .unwrap();
        assert_eq!(sorted[0].entry.confidence, Confidence::Verified);

        let recent = mgr
            .recall(RecallQuery::new("cache").sort_by(SortBy::Recency))
            .await
            .unwrap();
        assert!(recent[0].entry.created_at >= recent[1].entry.created_at);

        let limited = mgr.recall(RecallQuery::new("cache").limit(1)).await.unwrap();
        assert_eq!(limited.len(), 1);

        let err = mgr.recall(RecallQuery::new("  ")).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_stats_idempotent_and_complete() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir).await;

        mgr.remember(RememberRequest::new("one").vault(VaultCategory::Strategic))
            .await
            .unwrap();
        mgr.remember(RememberRequest::new("two").vault(VaultCategory::Horizon))
            .await
            .unwrap();

        let first = mgr.stats().await;
        let second = mgr.stats().await;
        assert_eq!(first, second);

        assert_eq!(first.vaults.len(), 6);
        let order: Vec<VaultCategory> = first.vaults.iter().map(|v| v.vault).collect();
        assert_eq!(order, VaultCategory::ALL.to_vec());
        assert_eq!(first.total_entries, 2);
        assert_eq!(first.horizon_count, 1);
        assert_eq!(first.vaults[5].count, 1);
        assert_eq!(first.storage_root, dir.path());
        assert_eq!(mgr.count(None).await, 2);
    }

    #[tokio::test]
    async fn test_recent_and_by_guardian() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir).await;

        mgr.remember(RememberRequest::new("first").guardian(Guardian::Ino))
            .await
            .unwrap();
        mgr.remember(RememberRequest::new("second").guardian(Guardian::Shinkami))
            .await
            .unwrap();
        mgr.remember(RememberRequest::new("third").guardian(Guardian::Ino))
            .await
            .unwrap();

        let owned = mgr.by_guardian(Guardian::Ino, 10).await;
        assert_eq!(owned.len(), 2);
        assert!(owned.iter().all(|e| e.vault == VaultCategory::Operational));
        assert_eq!(mgr.by_guardian(Guardian::Ino, 1).await.len(), 1);

        assert_eq!(mgr.recent(None, 2).await.len(), 2);
    }

    #[tokio::test]
    async fn test_reopen_preserves_state() {
        let dir = TempDir::new().unwrap();
        let id = {
            let mgr = manager(&dir).await;
            mgr.remember(RememberRequest::new("durable").vault(VaultCategory::Creative))
                .await
                .unwrap()
                .id
        };

        let mgr = manager(&dir).await;
        assert_eq!(mgr.get(&id).await.unwrap().content, "durable");
        assert!(mgr.forget(&id).await.unwrap());
        assert!(mgr.get(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_horizon_capacity_applies_to_every_write_path() {
        let dir = TempDir::new().unwrap();
        let mgr = manager_with_capacity(&dir, 1).await;

        mgr.remember(RememberRequest::new("first wish").vault(VaultCategory::Horizon))
            .await
            .unwrap();

        let err = mgr
            .remember(RememberRequest::new("second wish").vault(VaultCategory::Horizon))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Capacity {
                vault: VaultCategory::Horizon,
                capacity: 1
            }
        ));

        let err = mgr
            .append_horizon("third wish", "cli", None, vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Capacity { .. }));
        assert_eq!(mgr.horizon().count().await, 1);
    }

    #[tokio::test]
    async fn test_append_horizon_author() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir).await;

        let guided = mgr
            .append_horizon("tools for all", "cli", Some(Guardian::Lyria), vec!["hope".into()])
            .await
            .unwrap();
        assert_eq!(guided.author, "Lyria");
        assert!(guided.co_authored);

        let plain = mgr.append_horizon("quiet wish", "cli", None, vec![]).await.unwrap();
        assert_eq!(plain.author, "vaultkeeper");
        assert!(!plain.co_authored);
        assert_eq!(mgr.count(Some(VaultCategory::Horizon)).await, 2);
    }

    #[tokio::test]
    async fn test_horizon_write_matches_later_reads() {
        let dir = TempDir::new().unwrap();
        let id = {
            let mgr = manager(&dir).await;
            let written = mgr
                .remember(
                    RememberRequest::new("a verified future")
                        .vault(VaultCategory::Horizon)
                        .confidence(Confidence::Verified)
                        .metadata("k", serde_json::json!("v")),
                )
                .await
                .unwrap();
            assert_eq!(mgr.get(&written.id).await.unwrap(), written);
            written.id
        };

        let mgr = manager(&dir).await;
        let read = mgr.get(&id).await.unwrap();
        assert_eq!(read.confidence, Confidence::Verified);
        assert_eq!(read.metadata["k"], "v");
        assert_eq!(read.source.as_deref(), Some("remember"));

        let hits = mgr
            .recall(RecallQuery::new("verified future").min_confidence(Confidence::High))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entry.id, id);
    }

    #[tokio::test]
    async fn test_recall_ranks_content_above_tags() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir).await;

        mgr.remember(
            RememberRequest::new("unrelated sketch")
                .vault(VaultCategory::Creative)
                .tag("database"),
        )
        .await
        .unwrap();
        let content = mgr
            .remember(RememberRequest::new("the database layer").vault(VaultCategory::Technical))
            .await
            .unwrap();

        let hits = mgr.recall(RecallQuery::new("database")).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].entry.id, content.id);
    }

    #[tokio::test]
    async fn test_clear_all_keeps_earlier_vaults_cleared_on_failure() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir).await;
        mgr.remember(RememberRequest::new("plan").vault(VaultCategory::Strategic))
            .await
            .unwrap();
        mgr.remember(RememberRequest::new("lesson").vault(VaultCategory::Wisdom))
            .await
            .unwrap();

        let target = dir.path().join("vaults/wisdom.json");
        std::fs::remove_file(&target).unwrap();
        std::fs::create_dir_all(target.join("blocker")).unwrap();

        assert!(mgr.clear(None).await.is_err());
        assert_eq!(mgr.count(Some(VaultCategory::Strategic)).await, 0);
        assert_eq!(mgr.count(Some(VaultCategory::Wisdom)).await, 1);
    }

    #[tokio::test]
    async fn test_open_survives_damaged_ledger() {
        let dir = TempDir::new().unwrap();
        {
            let mgr = manager(&dir).await;
            mgr.remember(RememberRequest::new("lesson kept").vault(VaultCategory::Wisdom))
                .await
                .unwrap();
        }
        let ledger = dir.path().join("horizon/ledger.jsonl");
        std::fs::write(&ledger, b"\xff\xfe not a record\n").unwrap();

        let mgr = manager(&dir).await;
        assert_eq!(mgr.count(Some(VaultCategory::Horizon)).await, 0);
        assert_eq!(mgr.count(Some(VaultCategory::Wisdom)).await, 1);

        mgr.append_horizon("fresh start", "cli", None, vec![]).await.unwrap();
        let reopened = manager(&dir).await;
        assert_eq!(reopened.horizon().count().await, 1);
    }
}
