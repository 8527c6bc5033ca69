//! Dataset export for the horizon ledger
//!
//! Layout written under the target directory:
//!
//! ```text
//! <target>/
//! ├── schema.json
//! ├── README.md
//! └── entries/
//!     └── 2025-03/
//!         └── 2025-03.jsonl
//! ```

use super::HistoricalEntry;
use crate::error::Result;
use crate::storage::write_atomic;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Outcome of an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    /// Entries written
    pub entries: usize,
    /// Month data files written
    pub files: usize,
}

/// Write one JSONL file per creation month. Returns the number of files.
pub(crate) async fn write_month_files(target: &Path, entries: &[HistoricalEntry]) -> Result<usize> {
    let mut by_month: BTreeMap<String, Vec<&HistoricalEntry>> = BTreeMap::new();
    for entry in entries {
        by_month.entry(entry.month()).or_default().push(entry);
    }

    for (month, month_entries) in &by_month {
        let dir = target.join("entries").join(month);
        tokio::fs::create_dir_all(&dir).await?;

        let mut body = String::new();
        for entry in month_entries {
            body.push_str(&serde_json::to_string(entry)?);
            body.push('\n');
        }
        write_atomic(&dir.join(format!("{}.jsonl", month)), body.as_bytes()).await?;
        tracing::debug!("Exported {} entries for {}", month_entries.len(), month);
    }

    Ok(by_month.len())
}

/// Write `schema.json` and `README.md` describing the dataset
pub(crate) async fn write_dataset_docs(target: &Path, entries: &[HistoricalEntry]) -> Result<()> {
    let schema = schema_document(entries);
    write_atomic(
        &target.join("schema.json"),
        serde_json::to_string_pretty(&schema)?.as_bytes(),
    )
    .await?;
    write_atomic(&target.join("README.md"), readme(entries.len()).as_bytes()).await?;
    Ok(())
}

fn schema_document(entries: &[HistoricalEntry]) -> serde_json::Value {
    let date_range = match (entries.first(), entries.last()) {
        (Some(first), Some(last)) => serde_json::json!({
            "from": first.created_at.to_rfc3339(),
            "to": last.created_at.to_rfc3339()
        }),
        _ => serde_json::Value::Null,
    };

    serde_json::json!({
        "name": "Horizon Dataset",
        "version": "1.0.0",
        "description": "Append-only ledger of intentions recorded through vaultkeeper",
        "license": "CC-BY-SA-4.0",
        "fields": {
            "id": "Unique identifier",
            "content": "The recorded intention",
            "context": "What prompted the entry",
            "author": "Human or AI author identifier",
            "coAuthored": "Whether this was human-AI co-written",
            "tags": "Categorization tags",
            "confidence": "Optional trust rating: low, medium, high or verified",
            "metadata": "Optional caller-supplied key/value pairs",
            "createdAt": "RFC 3339 timestamp (UTC)"
        },
        "totalEntries": entries.len(),
        "dateRange": date_range,
        "exportedAt": chrono::Utc::now().to_rfc3339()
    })
}

fn readme(total: usize) -> String {
    format!(
        "# Horizon Dataset\n\
         \n\
         This dataset contains **{total}** entries from an append-only horizon ledger.\n\
         \n\
         ## Format\n\
         \n\
         Each directory under `entries/` is a creation month (`YYYY-MM`) holding one\n\
         `.jsonl` file with that month's entries, one JSON object per line, oldest first.\n\
         See `schema.json` for field definitions.\n\
         \n\
         ## Contributing\n\
         \n\
         Month files are append-only and merge cleanly. Add your lines to the matching\n\
         month file, or run `vaultkeeper horizon share <dir>` to produce them.\n\
         \n\
         ## License\n\
         \n\
         CC-BY-SA 4.0\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn at(id: &str, year: i32, month: u32, day: u32) -> HistoricalEntry {
        HistoricalEntry {
            id: id.to_string(),
            content: format!("wish {id}"),
            context: String::new(),
            author: "tester".to_string(),
            co_authored: false,
            tags: Vec::new(),
            confidence: None,
            metadata: Default::default(),
            created_at: Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_month_partitioning() {
        let dir = TempDir::new().unwrap();
        let entries = vec![
            at("a", 2025, 1, 5),
            at("b", 2025, 1, 20),
            at("c", 2025, 2, 1),
        ];

        let files = write_month_files(dir.path(), &entries).await.unwrap();
        assert_eq!(files, 2);

        let jan = std::fs::read_to_string(dir.path().join("entries/2025-01/2025-01.jsonl")).unwrap();
        let lines: Vec<&str> = jan.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: HistoricalEntry = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.id, "a");

        assert!(dir.path().join("entries/2025-02/2025-02.jsonl").exists());
    }

    #[tokio::test]
    async fn test_dataset_docs() {
        let dir = TempDir::new().unwrap();
        let entries = vec![at("a", 2025, 1, 5), at("b", 2025, 4, 1)];
        write_dataset_docs(dir.path(), &entries).await.unwrap();

        let schema: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("schema.json")).unwrap())
                .unwrap();
        assert_eq!(schema["totalEntries"], 2);
        assert!(schema["dateRange"]["from"].as_str().unwrap().starts_with("2025-01-05"));

        let readme = std::fs::read_to_string(dir.path().join("README.md")).unwrap();
        assert!(readme.contains("**2** entries"));
    }

    #[test]
    fn test_empty_schema_has_no_range() {
        let schema = schema_document(&[]);
        assert!(schema["dateRange"].is_null());
        assert_eq!(schema["totalEntries"], 0);
    }
}
