//! Markdown summary of vault state, written to `<root>/MEMORY.md`

use super::manager::VaultManager;
use super::types::{Entry, SystemStats, VaultCategory};
use crate::error::Result;
use crate::storage::write_atomic;
use chrono::{DateTime, TimeZone, Utc};
use std::path::PathBuf;

/// Recent entries listed per non-empty vault
pub const RECENT_PER_VAULT: usize = 3;

/// Entry content longer than this is shortened in the summary
const CONTENT_PREVIEW_CHARS: usize = 120;

/// Result of a summary sync
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub path: PathBuf,
    pub lines: usize,
    pub total_entries: usize,
}

/// Shorten `s` to at most `max` characters, marking the cut with `...`
pub fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

/// Render the summary document
pub fn render(
    stats: &SystemStats,
    recent: &[(VaultCategory, Vec<Entry>)],
    generated: DateTime<Utc>,
) -> String {
    let mut lines = vec![
        "# Vault Memory Summary".to_string(),
        String::new(),
        format!("> Generated: {}", generated.to_rfc3339()),
        String::new(),
        "## Vault Overview".to_string(),
        String::new(),
        "| Vault | Entries |".to_string(),
        "|-------|---------|".to_string(),
    ];
    for vault in &stats.vaults {
        lines.push(format!("| {} | {} |", vault.vault, vault.count));
    }
    lines.push(String::new());
    lines.push(format!("**Total entries:** {}", stats.total_entries));
    lines.push(String::new());

    for (vault, entries) in recent.iter().filter(|(_, e)| !e.is_empty()) {
        lines.push(format!("## Recent: {}", vault));
        lines.push(String::new());
        for entry in entries {
            let date = Utc
                .timestamp_millis_opt(entry.created_at)
                .single()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "unknown".to_string());
            let owner = entry
                .guardian
                .map(|g| format!(" *({})*", g))
                .unwrap_or_default();
            lines.push(format!(
                "- **{}**{}: {}",
                date,
                owner,
                truncate(&entry.content, CONTENT_PREVIEW_CHARS)
            ));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Render the current state and write it atomically to `<root>/MEMORY.md`
pub async fn sync(manager: &VaultManager) -> Result<SyncReport> {
    let stats = manager.stats().await;

    let mut recent = Vec::new();
    for vault in stats.vaults.iter().filter(|v| v.count > 0) {
        recent.push((
            vault.vault,
            manager.recent(Some(vault.vault), RECENT_PER_VAULT).await,
        ));
    }

    let document = render(&stats, &recent, Utc::now());
    tokio::fs::create_dir_all(manager.root()).await?;
    let path = manager.root().join("MEMORY.md");
    write_atomic(&path, document.as_bytes()).await?;

    let report = SyncReport {
        path,
        lines: document.lines().count(),
        total_entries: stats.total_entries,
    };
    tracing::info!(
        "Synced summary to {} ({} lines)",
        report.path.display(),
        report.lines
    );
    Ok(report)
}
