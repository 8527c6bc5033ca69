//! Vault domain types
//!
//! Entries are serialized camelCase so the per-vault JSON files stay
//! readable by other tooling that consumes the same layout.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// One of the six fixed vault categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VaultCategory {
    Strategic,
    Technical,
    Creative,
    Operational,
    Wisdom,
    Horizon,
}

impl VaultCategory {
    /// Every vault, in canonical order.
    pub const ALL: [VaultCategory; 6] = [
        VaultCategory::Strategic,
        VaultCategory::Technical,
        VaultCategory::Creative,
        VaultCategory::Operational,
        VaultCategory::Wisdom,
        VaultCategory::Horizon,
    ];

    /// The five vaults managed by the storage backend (everything but horizon).
    pub const GENERAL: [VaultCategory; 5] = [
        VaultCategory::Strategic,
        VaultCategory::Technical,
        VaultCategory::Creative,
        VaultCategory::Operational,
        VaultCategory::Wisdom,
    ];

    /// Lower-case name, also used as the on-disk file stem.
    pub fn as_str(self) -> &'static str {
        match self {
            VaultCategory::Strategic => "strategic",
            VaultCategory::Technical => "technical",
            VaultCategory::Creative => "creative",
            VaultCategory::Operational => "operational",
            VaultCategory::Wisdom => "wisdom",
            VaultCategory::Horizon => "horizon",
        }
    }

    /// Whether this vault is the append-only ledger vault.
    pub fn is_horizon(self) -> bool {
        self == VaultCategory::Horizon
    }
}

impl fmt::Display for VaultCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VaultCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strategic" => Ok(VaultCategory::Strategic),
            "technical" => Ok(VaultCategory::Technical),
            "creative" => Ok(VaultCategory::Creative),
            "operational" => Ok(VaultCategory::Operational),
            "wisdom" => Ok(VaultCategory::Wisdom),
            "horizon" => Ok(VaultCategory::Horizon),
            other => Err(format!(
                "invalid vault '{other}' (expected strategic|technical|creative|operational|wisdom|horizon)"
            )),
        }
    }
}

/// Caller-supplied trust rating for an entry's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    #[default]
    Medium,
    High,
    Verified,
}

impl Confidence {
    /// Numeric weight used for filtering and sorting.
    pub fn weight(self) -> f64 {
        match self {
            Confidence::Low => 0.25,
            Confidence::Medium => 0.5,
            Confidence::High => 0.75,
            Confidence::Verified => 1.0,
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Low => write!(f, "low"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::High => write!(f, "high"),
            Confidence::Verified => write!(f, "verified"),
        }
    }
}

impl FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Confidence::Low),
            "medium" => Ok(Confidence::Medium),
            "high" => Ok(Confidence::High),
            "verified" => Ok(Confidence::Verified),
            other => Err(format!(
                "invalid confidence '{other}' (expected low|medium|high|verified)"
            )),
        }
    }
}

/// Owner tag: one of ten fixed author namespaces.
///
/// A guardian pins classification to its home vault. Lyria is the only
/// guardian whose home is the horizon ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Guardian {
    Lyssandria,
    Leyla,
    Draconia,
    Maylinn,
    Alera,
    Lyria,
    Aiyami,
    Elara,
    Ino,
    Shinkami,
}

impl Guardian {
    pub const ALL: [Guardian; 10] = [
        Guardian::Lyssandria,
        Guardian::Leyla,
        Guardian::Draconia,
        Guardian::Maylinn,
        Guardian::Alera,
        Guardian::Lyria,
        Guardian::Aiyami,
        Guardian::Elara,
        Guardian::Ino,
        Guardian::Shinkami,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Guardian::Lyssandria => "Lyssandria",
            Guardian::Leyla => "Leyla",
            Guardian::Draconia => "Draconia",
            Guardian::Maylinn => "Maylinn",
            Guardian::Alera => "Alera",
            Guardian::Lyria => "Lyria",
            Guardian::Aiyami => "Aiyami",
            Guardian::Elara => "Elara",
            Guardian::Ino => "Ino",
            Guardian::Shinkami => "Shinkami",
        }
    }

    /// Vault that content owned by this guardian is routed to.
    pub fn home_vault(self) -> VaultCategory {
        match self {
            Guardian::Shinkami => VaultCategory::Strategic,
            Guardian::Lyssandria | Guardian::Draconia => VaultCategory::Technical,
            Guardian::Leyla | Guardian::Maylinn => VaultCategory::Creative,
            Guardian::Alera | Guardian::Ino => VaultCategory::Operational,
            Guardian::Aiyami | Guardian::Elara => VaultCategory::Wisdom,
            Guardian::Lyria => VaultCategory::Horizon,
        }
    }

    /// Display label of the gate this guardian keeps.
    pub fn gate(self) -> &'static str {
        match self {
            Guardian::Lyssandria => "Foundation",
            Guardian::Leyla => "Flow",
            Guardian::Draconia => "Fire",
            Guardian::Maylinn => "Heart",
            Guardian::Alera => "Voice",
            Guardian::Lyria => "Sight",
            Guardian::Aiyami => "Crown",
            Guardian::Elara => "Shift",
            Guardian::Ino => "Unity",
            Guardian::Shinkami => "Source",
        }
    }
}

impl fmt::Display for Guardian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Guardian {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Guardian::ALL
            .into_iter()
            .find(|g| g.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown guardian '{wanted}'"))
    }
}

/// A stored, classified unit of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Globally unique, never reused
    pub id: String,
    /// Trimmed, non-empty body
    pub content: String,
    /// Fixed at creation
    pub vault: VaultCategory,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guardian: Option<Guardian>,
    /// Caller-defined annotations, opaque to the store
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Epoch milliseconds
    pub created_at: i64,
    /// Epoch milliseconds
    pub updated_at: i64,
    /// Epoch milliseconds; once passed the entry is excluded from reads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Entry {
    /// Whether the entry is still visible at `now` (epoch ms).
    pub fn is_live_at(&self, now: i64) -> bool {
        self.expires_at.map_or(true, |at| at >= now)
    }

    pub fn is_live(&self) -> bool {
        self.is_live_at(now_millis())
    }
}

/// Input to `VaultManager::remember`.
#[derive(Debug, Clone, Default)]
pub struct RememberRequest {
    pub content: String,
    /// Explicit vault; skips classification
    pub vault: Option<VaultCategory>,
    pub tags: Vec<String>,
    pub confidence: Option<Confidence>,
    pub guardian: Option<Guardian>,
    pub metadata: HashMap<String, serde_json::Value>,
    /// Relative expiry; negative values produce an already-expired entry
    pub ttl_seconds: Option<i64>,
    pub source: Option<String>,
}

impl RememberRequest {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn vault(mut self, vault: VaultCategory) -> Self {
        self.vault = Some(vault);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn guardian(mut self, guardian: Guardian) -> Self {
        self.guardian = Some(guardian);
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn ttl_seconds(mut self, ttl: i64) -> Self {
        self.ttl_seconds = Some(ttl);
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Ordering applied to recall results after filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Search score order
    #[default]
    Relevance,
    /// `created_at` descending
    Recency,
    /// Confidence weight descending
    Confidence,
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "relevance" => Ok(SortBy::Relevance),
            "recency" => Ok(SortBy::Recency),
            "confidence" => Ok(SortBy::Confidence),
            other => Err(format!(
                "invalid sort '{other}' (expected relevance|recency|confidence)"
            )),
        }
    }
}

/// Default number of recall results.
pub const DEFAULT_RECALL_LIMIT: usize = 20;

/// Input to `VaultManager::recall`.
#[derive(Debug, Clone)]
pub struct RecallQuery {
    pub query: String,
    pub vault: Option<VaultCategory>,
    pub guardian: Option<Guardian>,
    /// Entry must carry every one of these tags
    pub tags: Vec<String>,
    pub min_confidence: Option<Confidence>,
    pub limit: usize,
    pub sort_by: SortBy,
}

impl RecallQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            vault: None,
            guardian: None,
            tags: Vec::new(),
            min_confidence: None,
            limit: DEFAULT_RECALL_LIMIT,
            sort_by: SortBy::Relevance,
        }
    }

    pub fn vault(mut self, vault: VaultCategory) -> Self {
        self.vault = Some(vault);
        self
    }

    pub fn guardian(mut self, guardian: Guardian) -> Self {
        self.guardian = Some(guardian);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn min_confidence(mut self, confidence: Confidence) -> Self {
        self.min_confidence = Some(confidence);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn sort_by(mut self, sort_by: SortBy) -> Self {
        self.sort_by = sort_by;
        self
    }
}

/// A scored search result.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub entry: Entry,
    /// Normalized relevance in [0, 1]
    pub score: f64,
}

/// Outcome of classifying a piece of text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub vault: VaultCategory,
    /// Certainty of the vault assignment, in [0, 1]
    pub confidence: f64,
    pub reasoning: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternate_vault: Option<VaultCategory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// Per-vault statistics over live entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultStats {
    pub vault: VaultCategory,
    pub count: usize,
    /// At most ten tags, most frequent first
    pub top_tags: Vec<TagCount>,
    pub guardian_distribution: BTreeMap<Guardian, usize>,
    pub oldest_entry: Option<i64>,
    pub newest_entry: Option<i64>,
}

impl VaultStats {
    pub fn empty(vault: VaultCategory) -> Self {
        Self {
            vault,
            count: 0,
            top_tags: Vec::new(),
            guardian_distribution: BTreeMap::new(),
            oldest_entry: None,
            newest_entry: None,
        }
    }
}

/// Maximum number of tags reported per vault.
pub const TOP_TAGS: usize = 10;

/// Rank tag frequencies: count descending, then tag name ascending.
pub fn top_tags(counts: HashMap<String, usize>) -> Vec<TagCount> {
    let mut ranked: Vec<TagCount> = counts
        .into_iter()
        .map(|(tag, count)| TagCount { tag, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    ranked.truncate(TOP_TAGS);
    ranked
}

/// Aggregated statistics across all six vaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStats {
    pub total_entries: usize,
    /// One element per vault, canonical order, horizon last
    pub vaults: Vec<VaultStats>,
    pub horizon_count: usize,
    pub storage_root: PathBuf,
}

/// Current time in Unix milliseconds
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
