//! Append-only JSONL ledger backing the horizon vault

use super::export::{write_dataset_docs, write_month_files, ExportSummary};
use super::HistoricalEntry;
use crate::error::{Error, Result};
use crate::storage::search::{rank, QueryMatcher};
use crate::storage::write_atomic;
use crate::vault::types::top_tags;
use crate::vault::{VaultCategory, VaultStats};
use chrono::Utc;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::RwLock;

/// Summary written next to the ledger after every append
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LedgerIndex<'a> {
    total_entries: usize,
    last_updated: String,
    tag_counts: &'a BTreeMap<String, usize>,
}

/// The horizon ledger.
///
/// The in-memory copy mirrors the file; appends hold the write lock for
/// the duration of the file write, so they are serialized.
pub struct HorizonLedger {
    ledger_path: PathBuf,
    index_path: PathBuf,
    entries: RwLock<Vec<HistoricalEntry>>,
}

impl HorizonLedger {
    /// Open (or create) the ledger under `<root>/horizon/`
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let dir = root.as_ref().join("horizon");
        tokio::fs::create_dir_all(&dir).await?;

        let ledger_path = dir.join("ledger.jsonl");
        let entries = match read_ledger(&ledger_path).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    "Failed to read {}, starting the horizon vault empty: {}",
                    ledger_path.display(),
                    e
                );
                Vec::new()
            }
        };
        tracing::debug!("Loaded {} horizon entries", entries.len());

        Ok(Self {
            ledger_path,
            index_path: dir.join("index.json"),
            entries: RwLock::new(entries),
        })
    }

    /// Path of the JSONL ledger file
    pub fn path(&self) -> &Path {
        &self.ledger_path
    }

    /// Append a record. The line is fsynced before this returns.
    ///
    /// Content and context are trimmed. A previous crash may have left an
    /// unterminated line at the end of the file; it is closed off first so
    /// the new record starts on its own line. If the write or fsync fails
    /// the file is cut back to its previous length and memory is untouched.
    pub(crate) async fn append_record(
        &self,
        mut entry: HistoricalEntry,
    ) -> Result<HistoricalEntry> {
        entry.content = entry.content.trim().to_string();
        if entry.content.is_empty() {
            return Err(Error::Validation(
                "horizon entry content cannot be empty".to_string(),
            ));
        }
        entry.context = entry.context.trim().to_string();

        let mut entries = self.entries.write().await;

        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.ledger_path)
            .await?;
        let len = file.metadata().await?.len();
        if len > 0 && !ends_with_newline(&mut file, len).await? {
            tracing::warn!(
                "Unterminated line at the end of {}; closing it before appending",
                self.ledger_path.display()
            );
            line.insert(0, '\n');
        }

        if let Err(e) = write_line(&mut file, line.as_bytes()).await {
            if let Err(trunc) = file.set_len(len).await {
                tracing::warn!(
                    "Failed to cut {} back after a failed append: {}",
                    self.ledger_path.display(),
                    trunc
                );
            }
            return Err(e.into());
        }

        entries.push(entry.clone());
        tracing::info!("Appended {} to horizon ledger (author: {})", entry.id, entry.author);

        // The entry is already durable; a stale index is only logged
        if let Err(e) = self.write_index(&entries).await {
            tracing::warn!("Failed to refresh horizon index: {}", e);
        }

        Ok(entry)
    }

    async fn write_index(&self, entries: &[HistoricalEntry]) -> Result<()> {
        let tag_counts: BTreeMap<String, usize> = count_tags(entries).into_iter().collect();
        let index = LedgerIndex {
            total_entries: entries.len(),
            last_updated: Utc::now().to_rfc3339(),
            tag_counts: &tag_counts,
        };
        write_atomic(&self.index_path, &serde_json::to_vec_pretty(&index)?).await
    }

    /// Most recent entries, newest first
    pub async fn recent(&self, limit: usize) -> Vec<HistoricalEntry> {
        self.entries
            .read()
            .await
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    /// Full history, oldest first
    pub async fn all(&self) -> Vec<HistoricalEntry> {
        self.entries.read().await.clone()
    }

    /// Total entries ever appended
    pub async fn count(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether `id` belongs to the ledger
    pub async fn contains(&self, id: &str) -> bool {
        self.entries.read().await.iter().any(|e| e.id == id)
    }

    pub async fn get(&self, id: &str) -> Option<HistoricalEntry> {
        self.entries.read().await.iter().find(|e| e.id == id).cloned()
    }

    /// Lexical search over content, context and tags, best first
    pub async fn search(&self, query: &str, limit: usize) -> Vec<(HistoricalEntry, f64)> {
        let matcher = QueryMatcher::new(query);
        if matcher.is_empty() {
            return Vec::new();
        }

        let entries = self.entries.read().await;
        let mut scored: Vec<(HistoricalEntry, f64)> = entries
            .iter()
            .filter_map(|e| {
                let haystack = format!("{} {}", e.content, e.context);
                let score = matcher.score_with_tags(&haystack, &e.tags);
                (score > 0.0).then(|| (e.clone(), score))
            })
            .collect();

        rank(&mut scored);
        scored.truncate(limit);
        scored
    }

    /// Tag frequencies across the whole ledger
    pub async fn tag_counts(&self) -> HashMap<String, usize> {
        count_tags(&self.entries.read().await)
    }

    /// Entries written by `author`, oldest first
    pub async fn by_author(&self, author: &str) -> Vec<HistoricalEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| e.author == author)
            .cloned()
            .collect()
    }

    /// Statistics for the horizon vault
    pub async fn stats(&self) -> VaultStats {
        let entries = self.entries.read().await;
        let mut stats = VaultStats::empty(VaultCategory::Horizon);
        stats.count = entries.len();
        stats.top_tags = top_tags(count_tags(&entries));
        for entry in entries.iter() {
            if let Ok(guardian) = entry.author.parse() {
                *stats.guardian_distribution.entry(guardian).or_insert(0) += 1;
            }
        }
        stats.oldest_entry = entries.iter().map(|e| e.created_at.timestamp_millis()).min();
        stats.newest_entry = entries.iter().map(|e| e.created_at.timestamp_millis()).max();
        stats
    }

    /// Export the full dataset: month files, `schema.json` and `README.md`.
    ///
    /// Reads the durable ledger file and only creates files under `target`.
    pub async fn export(&self, target: impl AsRef<Path>) -> Result<ExportSummary> {
        let target = target.as_ref();
        let entries = self.durable_entries().await?;
        tokio::fs::create_dir_all(target).await?;

        write_dataset_docs(target, &entries).await?;
        let files = write_month_files(target, &entries).await?;

        tracing::info!(
            "Exported {} horizon entries into {} month files at {}",
            entries.len(),
            files,
            target.display()
        );
        Ok(ExportSummary {
            entries: entries.len(),
            files,
        })
    }

    /// Export only the month files, the layout used for contributions
    pub async fn export_entries(&self, target: impl AsRef<Path>) -> Result<ExportSummary> {
        let target = target.as_ref();
        let entries = self.durable_entries().await?;
        tokio::fs::create_dir_all(target).await?;

        let files = write_month_files(target, &entries).await?;
        Ok(ExportSummary {
            entries: entries.len(),
            files,
        })
    }

    async fn durable_entries(&self) -> Result<Vec<HistoricalEntry>> {
        // Hold the read lock so no append lands mid-read
        let _guard = self.entries.read().await;
        read_ledger(&self.ledger_path).await
    }
}

async fn ends_with_newline(file: &mut tokio::fs::File, len: u64) -> std::io::Result<bool> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1)).await?;
    file.read_exact(&mut last).await?;
    Ok(last[0] == b'\n')
}

async fn write_line(file: &mut tokio::fs::File, line: &[u8]) -> std::io::Result<()> {
    file.write_all(line).await?;
    file.sync_all().await
}

/// Read every parseable line. Lines that are not UTF-8 or not a valid
/// record are skipped with a warning.
async fn read_ledger(path: &Path) -> Result<Vec<HistoricalEntry>> {
    let data = match tokio::fs::read(path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut entries = Vec::new();
    for (n, raw) in data.split(|b| *b == b'\n').enumerate() {
        let line = match std::str::from_utf8(raw) {
            Ok(line) => line.trim(),
            Err(e) => {
                tracing::warn!(
                    "Skipping non-UTF-8 horizon line {} in {}: {}",
                    n + 1,
                    path.display(),
                    e
                );
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<HistoricalEntry>(line) {
            Ok(entry) => entries.push(entry),
            Err(e) => tracing::warn!(
                "Skipping malformed horizon line {} in {}: {}",
                n + 1,
                path.display(),
                e
            ),
        }
    }
    Ok(entries)
}

fn count_tags(entries: &[HistoricalEntry]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for tag in entries.iter().flat_map(|e| e.tags.iter()) {
        *counts.entry(tag.clone()).or_insert(0) += 1;
    }
    counts
}
