//! JSON file backend, one file per general vault
//!
//! Each vault keeps its working set in memory behind its own lock and is
//! rewritten whole on every mutation. Vaults never share a lock.

use super::search::{rank, QueryMatcher};
use super::{write_atomic, VaultBackend};
use crate::error::{Error, Result};
use crate::vault::types::{now_millis, top_tags};
use crate::vault::{Entry, SearchHit, VaultCategory, VaultStats};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// On-disk shape of a vault file
#[derive(Debug, Default, Deserialize)]
struct StorageData {
    #[serde(default)]
    entries: BTreeMap<String, Entry>,
}

#[derive(Serialize)]
struct StorageDataRef<'a> {
    entries: &'a BTreeMap<String, Entry>,
}

struct VaultSlot {
    vault: VaultCategory,
    path: PathBuf,
    entries: RwLock<BTreeMap<String, Entry>>,
}

/// File-backed storage for the five general vaults
pub struct FileBackend {
    root: PathBuf,
    slots: Vec<VaultSlot>,
}

impl FileBackend {
    /// Open (or create) the store under `<root>/vaults/`.
    ///
    /// An unreadable or corrupt vault file is logged and that vault starts
    /// empty; the other vaults load normally.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let dir = root.join("vaults");
        tokio::fs::create_dir_all(&dir).await?;

        let mut slots = Vec::with_capacity(VaultCategory::GENERAL.len());
        for vault in VaultCategory::GENERAL {
            let path = dir.join(format!("{}.json", vault));
            let entries = Self::load_vault(&path).await;
            tracing::debug!("Loaded {} entries into {} vault", entries.len(), vault);
            slots.push(VaultSlot {
                vault,
                path,
                entries: RwLock::new(entries),
            });
        }

        Ok(Self { root, slots })
    }

    /// Storage root this backend was opened with
    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn load_vault(path: &Path) -> BTreeMap<String, Entry> {
        let data = match tokio::fs::read_to_string(path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                tracing::warn!("Failed to read vault file {}: {}", path.display(), e);
                return BTreeMap::new();
            }
        };
        match serde_json::from_str::<StorageData>(&data) {
            Ok(stored) => stored.entries,
            Err(e) => {
                tracing::warn!(
                    "Corrupt vault file {}, starting empty: {}",
                    path.display(),
                    e
                );
                BTreeMap::new()
            }
        }
    }

    async fn persist(slot: &VaultSlot, entries: &BTreeMap<String, Entry>) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(&StorageDataRef { entries })?;
        write_atomic(&slot.path, &bytes).await?;
        tracing::debug!("Persisted {} entries to {}", entries.len(), slot.path.display());
        Ok(())
    }

    fn slot(&self, vault: VaultCategory) -> Result<&VaultSlot> {
        self.slots
            .iter()
            .find(|s| s.vault == vault)
            .ok_or(Error::ImmutableVault(vault))
    }

    fn slots_for(&self, vault: Option<VaultCategory>) -> impl Iterator<Item = &VaultSlot> {
        self.slots
            .iter()
            .filter(move |s| vault.map_or(true, |v| s.vault == v))
    }
}

#[async_trait]
impl VaultBackend for FileBackend {
    async fn store(&self, entry: Entry) -> Result<()> {
        let slot = self.slot(entry.vault)?;
        let mut entries = slot.entries.write().await;

        let id = entry.id.clone();
        let previous = entries.insert(id.clone(), entry);
        if let Err(e) = Self::persist(slot, &entries).await {
            match previous {
                Some(old) => entries.insert(id, old),
                None => entries.remove(&id),
            };
            return Err(e);
        }
        Ok(())
    }

    async fn get(&self, id: &str) -> Option<Entry> {
        for slot in &self.slots {
            if let Some(entry) = slot.entries.read().await.get(id) {
                return Some(entry.clone());
            }
        }
        None
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        for slot in &self.slots {
            let mut entries = slot.entries.write().await;
            if let Some(old) = entries.remove(id) {
                if let Err(e) = Self::persist(slot, &entries).await {
                    entries.insert(id.to_string(), old);
                    return Err(e);
                }
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn find_vault(&self, id: &str) -> Option<VaultCategory> {
        for slot in &self.slots {
            if slot.entries.read().await.contains_key(id) {
                return Some(slot.vault);
            }
        }
        None
    }

    async fn search(
        &self,
        query: &str,
        vault: Option<VaultCategory>,
        limit: usize,
    ) -> Vec<SearchHit> {
        let matcher = QueryMatcher::new(query);
        if matcher.is_empty() {
            return Vec::new();
        }

        let now = now_millis();
        let mut scored = Vec::new();
        for slot in self.slots_for(vault) {
            let entries = slot.entries.read().await;
            for entry in entries.values().filter(|e| e.is_live_at(now)) {
                let score = matcher.score_with_tags(&entry.content, &entry.tags);
                if score > 0.0 {
                    scored.push((entry.clone(), score));
                }
            }
        }

        rank(&mut scored);
        scored
            .into_iter()
            .take(limit)
            .map(|(entry, score)| SearchHit { entry, score })
            .collect()
    }

    async fn list(&self, vault: Option<VaultCategory>, limit: usize) -> Vec<Entry> {
        let now = now_millis();
        let mut live = Vec::new();
        for slot in self.slots_for(vault) {
            let entries = slot.entries.read().await;
            live.extend(entries.values().filter(|e| e.is_live_at(now)).cloned());
        }
        live.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        live.truncate(limit);
        live
    }

    async fn count(&self, vault: Option<VaultCategory>) -> usize {
        let now = now_millis();
        let mut total = 0;
        for slot in self.slots_for(vault) {
            total += slot
                .entries
                .read()
                .await
                .values()
                .filter(|e| e.is_live_at(now))
                .count();
        }
        total
    }

    async fn clear(&self, vault: Option<VaultCategory>) -> Result<()> {
        if let Some(v) = vault.filter(|v| v.is_horizon()) {
            return Err(Error::ImmutableVault(v));
        }
        for slot in self.slots_for(vault) {
            let mut entries = slot.entries.write().await;
            let previous = std::mem::take(&mut *entries);
            if let Err(e) = Self::persist(slot, &entries).await {
                *entries = previous;
                return Err(e);
            }
            tracing::info!("Cleared {} vault ({} entries)", slot.vault, previous.len());
        }
        Ok(())
    }

    async fn stats(&self, vault: VaultCategory) -> VaultStats {
        let Ok(slot) = self.slot(vault) else {
            return VaultStats::empty(vault);
        };

        let now = now_millis();
        let entries = slot.entries.read().await;
        let mut stats = VaultStats::empty(vault);
        let mut tag_counts: HashMap<String, usize> = HashMap::new();

        for entry in entries.values().filter(|e| e.is_live_at(now)) {
            stats.count += 1;
            for tag in &entry.tags {
                *tag_counts.entry(tag.clone()).or_insert(0) += 1;
            }
            if let Some(guardian) = entry.guardian {
                *stats.guardian_distribution.entry(guardian).or_insert(0) += 1;
            }
            stats.oldest_entry = Some(
                stats
                    .oldest_entry
                    .map_or(entry.created_at, |t| t.min(entry.created_at)),
            );
            stats.newest_entry = Some(
                stats
                    .newest_entry
                    .map_or(entry.created_at, |t| t.max(entry.created_at)),
            );
        }

        stats.top_tags = top_tags(tag_counts);
        stats
    }
}
