//! Vaultkeeper - Typed Semantic Memory Store
//!
//! Command-line front end: remember, recall and inspect vault contents.

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use clap::{Args, Parser, Subcommand};
use console::{style, StyledObject};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vaultkeeper::{
    vault::{guardians_for, summary},
    Confidence, Guardian, RecallQuery, RememberRequest, SortBy, VaultCategory, VaultConfig,
    VaultManager,
};

#[derive(Parser)]
#[command(name = "vaultkeeper")]
#[command(version)]
#[command(about = "Typed semantic memory store with an append-only horizon ledger")]
struct Cli {
    /// Storage root (overrides storage.root from the config file)
    #[arg(long, env = "VAULTKEEPER_PATH", global = true)]
    path: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, env = "VAULTKEEPER_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Remember something (auto-classified unless --vault is given)
    Remember(RememberArgs),

    /// Search across vaults
    Recall {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Restrict to one vault
        #[arg(long)]
        vault: Option<VaultCategory>,

        /// Only entries owned by this guardian
        #[arg(long)]
        guardian: Option<Guardian>,

        /// Entries must carry all of these tags (comma separated)
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,

        /// Minimum confidence: low, medium, high, verified
        #[arg(long)]
        min_confidence: Option<Confidence>,

        /// Maximum results
        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Sort order: relevance, recency, confidence
        #[arg(long, default_value = "relevance")]
        sort: SortBy,
    },

    /// Show recent memories
    Recent {
        #[arg(long)]
        vault: Option<VaultCategory>,

        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Show statistics for all vaults
    Stats,

    /// Work with the append-only horizon ledger
    Horizon {
        #[command(subcommand)]
        action: HorizonCommand,
    },

    /// Act as a guardian
    As {
        guardian: Guardian,

        #[command(subcommand)]
        action: AsCommand,
    },

    /// Classify content without storing it
    Classify {
        #[arg(required = true, num_args = 1..)]
        content: Vec<String>,

        #[arg(long)]
        guardian: Option<Guardian>,
    },

    /// Write a MEMORY.md summary under the storage root
    Sync,

    /// Remove an entry by id (horizon entries are permanent)
    Forget { id: String },

    /// List the guardians, their gates and memory counts
    Guardians,
}

#[derive(Args)]
struct RememberArgs {
    #[arg(required = true, num_args = 1..)]
    content: Vec<String>,

    /// Force a vault: strategic, technical, creative, operational, wisdom, horizon
    #[arg(long)]
    vault: Option<VaultCategory>,

    /// Owning guardian; routes to its home vault when --vault is absent
    #[arg(long)]
    guardian: Option<Guardian>,

    /// Tags (comma separated)
    #[arg(long, value_delimiter = ',')]
    tags: Vec<String>,

    #[arg(long)]
    confidence: Option<Confidence>,

    /// Expire after this many seconds
    #[arg(long, allow_negative_numbers = true)]
    ttl: Option<i64>,

    /// Provenance label
    #[arg(long)]
    source: Option<String>,
}

#[derive(Subcommand)]
enum HorizonCommand {
    /// Append a permanent entry
    Append {
        #[arg(required = true, num_args = 1..)]
        wish: Vec<String>,

        /// What prompted this entry
        #[arg(long, default_value = "cli")]
        context: String,

        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,

        /// Record a guardian as co-author
        #[arg(long)]
        guardian: Option<Guardian>,
    },

    /// Show recent entries
    Read {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Export the full dataset (month files, schema.json, README.md)
    Export {
        #[arg(default_value = "./horizon-dataset")]
        path: PathBuf,
    },

    /// Export month files in contribution layout
    Share {
        #[arg(default_value = "./horizon-contributions")]
        path: PathBuf,
    },
}

#[derive(Subcommand)]
enum AsCommand {
    /// Remember something owned by the guardian
    Remember {
        #[arg(required = true, num_args = 1..)]
        content: Vec<String>,

        #[arg(long)]
        vault: Option<VaultCategory>,

        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("vaultkeeper={}", log_level).into());
    let registry = tracing_subscriber::registry().with(filter);
    if cli.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", style("Error:").red().bold().for_stderr(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_ref(), cli.path)?;

    // Dry-run classification never touches storage
    let command = match cli.command {
        Commands::Classify { content, guardian } => {
            let classifier = vaultkeeper::VaultClassifier::from_config(&config.classifier);
            print_classification(&classifier.classify(&content.join(" "), guardian));
            return Ok(());
        }
        command => command,
    };

    let manager = VaultManager::open(config)
        .await
        .context("failed to open vault storage")?;

    match command {
        Commands::Remember(args) => {
            let mut req = RememberRequest::new(args.content.join(" ")).tags(args.tags);
            req.vault = args.vault;
            req.guardian = args.guardian;
            req.confidence = args.confidence;
            req.ttl_seconds = args.ttl;
            req.source = args.source;
            let entry = manager.remember(req).await?;
            print_remembered(&entry);
        }
        Commands::Recall {
            query,
            vault,
            guardian,
            tags,
            min_confidence,
            limit,
            sort,
        } => {
            let text = query.join(" ");
            let mut recall = RecallQuery::new(&text).limit(limit).sort_by(sort);
            recall.vault = vault;
            recall.guardian = guardian;
            recall.tags = tags;
            recall.min_confidence = min_confidence;
            run_recall(&manager, recall, &text).await?;
        }
        Commands::Recent { vault, limit } => run_recent(&manager, vault, limit).await,
        Commands::Stats => run_stats(&manager).await,
        Commands::Horizon { action } => run_horizon(&manager, action).await?,
        Commands::As { guardian, action } => match action {
            AsCommand::Remember {
                content,
                vault,
                tags,
            } => {
                let mut req = RememberRequest::new(content.join(" "))
                    .guardian(guardian)
                    .tags(tags);
                req.vault = vault;
                let entry = manager.remember(req).await?;
                print_remembered(&entry);
            }
        },
        Commands::Sync => {
            let report = summary::sync(&manager).await?;
            println!(
                "{} MEMORY.md synced: {} lines, {} entries",
                style("✓").green().bold(),
                report.lines,
                report.total_entries
            );
            println!("  {}", style(format!("Output: {}", report.path.display())).dim());
        }
        Commands::Forget { id } => {
            if manager.forget(&id).await? {
                println!("{} Forgot {}", style("✓").green().bold(), style(&id).dim());
            } else {
                println!("  {} No entry with id {}", style("i").blue().bold(), id);
            }
        }
        Commands::Guardians => run_guardians(&manager).await,
        Commands::Classify { .. } => {}
    }

    Ok(())
}

fn load_config(config_path: Option<&PathBuf>, root: Option<PathBuf>) -> Result<VaultConfig> {
    let mut config = match config_path {
        Some(path) => VaultConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => match VaultConfig::default_path().filter(|p| p.exists()) {
            Some(path) => VaultConfig::load(&path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => VaultConfig::default(),
        },
    };
    if let Some(root) = root {
        config.storage.root = root;
    }
    Ok(config)
}

fn vault_label(vault: VaultCategory) -> StyledObject<String> {
    paint(vault, vault.to_string())
}

/// Style `text` in the vault's color
fn paint(vault: VaultCategory, text: String) -> StyledObject<String> {
    let label = style(text).bold();
    match vault {
        VaultCategory::Strategic => label.yellow(),
        VaultCategory::Technical => label.cyan(),
        VaultCategory::Creative => label.magenta(),
        VaultCategory::Operational => label.blue(),
        VaultCategory::Wisdom => label.green(),
        VaultCategory::Horizon => label.white(),
    }
}

fn format_date(millis: i64) -> String {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn print_remembered(entry: &vaultkeeper::Entry) {
    println!(
        "{} Remembered in {}",
        style("✓").green().bold(),
        vault_label(entry.vault)
    );
    if let Some(guardian) = entry.guardian {
        println!("  {}", style(format!("Guardian: {}", guardian)).dim());
    }
    println!("  {}", style(format!("ID: {}", entry.id)).dim());
    println!("  {}", style(summary::truncate(&entry.content, 60)).dim());
}

fn print_classification(result: &vaultkeeper::Classification) {
    println!();
    println!("Classification: {}", vault_label(result.vault));
    println!(
        "{}",
        style(format!("Confidence:     {:.0}%", result.confidence * 100.0)).dim()
    );
    println!("{}", style(format!("Reasoning:      {}", result.reasoning)).dim());
    if let Some(alternate) = result.alternate_vault {
        println!("{}", style(format!("Alternative:    {}", alternate)).dim());
    }
    println!();
}

async fn run_recall(manager: &VaultManager, query: RecallQuery, text: &str) -> Result<()> {
    let hits = manager.recall(query).await?;
    if hits.is_empty() {
        println!("{}{}", style("No memories found for: ").dim(), text);
        return Ok(());
    }

    println!();
    println!(
        "{}",
        style(format!("{} memories for \"{}\":", hits.len(), text)).bold()
    );
    println!();
    for hit in &hits {
        let owner = hit
            .entry
            .guardian
            .map(|g| format!(" ({})", g))
            .unwrap_or_default();
        println!(
            "{}{} {}",
            vault_label(hit.entry.vault),
            style(owner).dim(),
            style(format!("{:.0}%", hit.score * 100.0)).dim()
        );
        println!("  {}", summary::truncate(&hit.entry.content, 100));
        println!("  {}", style(&hit.entry.id).dim());
        println!();
    }
    Ok(())
}

async fn run_recent(manager: &VaultManager, vault: Option<VaultCategory>, limit: usize) {
    let entries = manager.recent(vault, limit).await;
    if entries.is_empty() {
        println!("{}", style("No recent memories.").dim());
        return;
    }

    println!();
    println!("{}", style("Recent memories:").bold());
    println!();
    for entry in &entries {
        let owner = entry
            .guardian
            .map(|g| format!(" • {}", g))
            .unwrap_or_default();
        println!(
            "{} {}{}",
            vault_label(entry.vault),
            style(format_date(entry.created_at)).dim(),
            style(owner).dim()
        );
        println!("  {}", summary::truncate(&entry.content, 100));
        println!();
    }
}

async fn run_stats(manager: &VaultManager) {
    let stats = manager.stats().await;

    println!();
    println!("{}", style("Vault Statistics").bold());
    println!();
    println!("  Total entries:    {}", style(stats.total_entries).yellow().bold());
    println!("  Horizon entries:  {}", style(stats.horizon_count).cyan());
    println!("  Storage root:     {}", style(stats.storage_root.display()).dim());
    println!();

    for vault in &stats.vaults {
        let count = if vault.count > 0 {
            style(vault.count.to_string()).bold()
        } else {
            style("0".to_string()).dim()
        };
        let tags: Vec<&str> = vault.top_tags.iter().take(3).map(|t| t.tag.as_str()).collect();
        let tag_note = if tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", tags.join(", "))
        };
        println!(
            "  {} {} entries{}",
            paint(vault.vault, format!("{:<12}", vault.vault.as_str())),
            count,
            style(tag_note).dim()
        );
    }
    println!();
}

async fn run_horizon(manager: &VaultManager, action: HorizonCommand) -> Result<()> {
    let ledger = manager.horizon();
    match action {
        HorizonCommand::Append {
            wish,
            context,
            tags,
            guardian,
        } => {
            let content = wish.join(" ");
            let entry = manager
                .append_horizon(&content, &context, guardian, tags)
                .await?;
            println!(
                "{} Appended to the horizon ledger (permanent)",
                style("✦").cyan().bold()
            );
            println!("  {}", style(format!("ID: {}", entry.id)).dim());
            println!("  \"{}\"", summary::truncate(&entry.content, 80));
        }
        HorizonCommand::Read { limit } => {
            let entries = ledger.recent(limit).await;
            println!();
            println!("{}", style("Horizon ledger").bold());
            println!();
            for entry in &entries {
                println!("{}", style(format!("\"{}\"", entry.content)).cyan());
                println!(
                    "  {}",
                    style(format!(
                        "{} - {} ({})",
                        entry.context,
                        entry.created_at.format("%Y-%m-%d"),
                        entry.author
                    ))
                    .dim()
                );
                println!();
            }
            println!(
                "{}",
                style(format!("Total: {} entries in the horizon ledger", ledger.count().await))
                    .dim()
            );
        }
        HorizonCommand::Export { path } => {
            let result = ledger.export(&path).await?;
            println!(
                "{} Exported {} horizon entries to {}/",
                style("✓").green().bold(),
                result.entries,
                path.display()
            );
            println!("  {}", style(format!("{} month files created", result.files)).dim());
        }
        HorizonCommand::Share { path } => {
            if ledger.count().await == 0 {
                println!("{}", style("No horizon entries to share yet. Add some first:").dim());
                println!(
                    "{}",
                    style("  vaultkeeper horizon append \"your wish\" --context \"why\"").dim()
                );
                return Ok(());
            }
            let result = ledger.export_entries(&path).await?;
            println!(
                "{} Exported {} entries to {}/",
                style("✦").cyan().bold(),
                result.entries,
                path.display()
            );
            println!();
            println!("{}", style("To contribute to a shared dataset:").bold());
            println!("  1. Fork the dataset repository");
            println!(
                "  2. Copy your {} contents into it",
                style(format!("{}/entries/", path.display())).dim()
            );
            println!("  3. Open a pull request");
            println!();
        }
    }
    Ok(())
}

async fn run_guardians(manager: &VaultManager) {
    let stats = manager.stats().await;
    let mut counts: BTreeMap<Guardian, usize> = BTreeMap::new();
    for vault in &stats.vaults {
        for (guardian, count) in &vault.guardian_distribution {
            *counts.entry(*guardian).or_insert(0) += count;
        }
    }

    println!();
    println!("{}", style("Guardians").bold());
    println!();
    for guardian in Guardian::ALL {
        let count = counts.get(&guardian).copied().unwrap_or(0);
        let marker = if count > 0 {
            style("★").yellow()
        } else {
            style("☆").dim()
        };
        let home = guardian.home_vault();
        let peers = guardians_for(home).len();
        println!(
            "  {} {} {} {:<12} {} memories{}",
            marker,
            style(format!("{:<12}", guardian.name())).bold(),
            style(format!("{:<12}", guardian.gate())).dim(),
            home.as_str(),
            count,
            if peers > 1 {
                style(format!(" (shares {} with {} other)", home, peers - 1)).dim().to_string()
            } else {
                String::new()
            }
        );
    }
    println!();
}
