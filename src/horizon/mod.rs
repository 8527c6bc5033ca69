//! Horizon: the append-only historical ledger
//!
//! The ledger owns the `horizon` vault. Entries are appended to
//! `<root>/horizon/ledger.jsonl` one JSON object per line and are never
//! updated or deleted; the interface simply has no way to do either.
//!
//! ```text
//! <root>/horizon/
//! ├── ledger.jsonl   one HistoricalEntry per line, oldest first
//! └── index.json     totalEntries, lastUpdated, tagCounts
//! ```

pub mod export;
pub mod ledger;

pub use export::ExportSummary;
pub use ledger::HorizonLedger;

use crate::vault::{Confidence, Entry, VaultCategory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An immutable ledger record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalEntry {
    /// `hzn-<uuid>`; never collides with general vault ids
    pub id: String,
    /// Older ledgers call this field `wish`
    #[serde(alias = "wish")]
    pub content: String,
    /// What prompted the entry
    #[serde(default)]
    pub context: String,
    pub author: String,
    #[serde(default)]
    pub co_authored: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Trust rating given at write time; older lines carry none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
    /// RFC 3339, UTC
    pub created_at: DateTime<Utc>,
}

impl HistoricalEntry {
    /// A new record stamped with a fresh `hzn-` id and the current time
    pub fn new(
        content: impl Into<String>,
        context: impl Into<String>,
        author: impl Into<String>,
        co_authored: bool,
        tags: Vec<String>,
    ) -> Self {
        Self {
            id: format!("hzn-{}", uuid::Uuid::new_v4()),
            content: content.into(),
            context: context.into(),
            author: author.into(),
            co_authored,
            tags,
            confidence: None,
            metadata: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    pub fn confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Creation month as `YYYY-MM`, the export partition key
    pub fn month(&self) -> String {
        self.created_at.format("%Y-%m").to_string()
    }

    /// View the record as a horizon vault entry.
    ///
    /// The author becomes the guardian when it names one; the context is
    /// carried as the entry source. `default_confidence` applies only to
    /// records written without one. The stored metadata is kept, with
    /// `author` and `coAuthored` added unless it already has them.
    pub fn to_entry(&self, default_confidence: Confidence) -> Entry {
        let created_at = self.created_at.timestamp_millis();
        let mut metadata = self.metadata.clone();
        metadata
            .entry("author".to_string())
            .or_insert_with(|| serde_json::Value::String(self.author.clone()));
        metadata
            .entry("coAuthored".to_string())
            .or_insert(serde_json::Value::Bool(self.co_authored));

        Entry {
            id: self.id.clone(),
            content: self.content.clone(),
            vault: VaultCategory::Horizon,
            tags: self.tags.clone(),
            confidence: self.confidence.unwrap_or(default_confidence),
            guardian: self.author.parse().ok(),
            metadata,
            created_at,
            updated_at: created_at,
            expires_at: None,
            source: (!self.context.is_empty()).then(|| self.context.clone()),
        }
    }
}
