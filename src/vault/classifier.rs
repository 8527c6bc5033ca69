//! Vault classifier for routing free text to a vault
//!
//! Scoring is lexical: the content is lower-cased and split on whitespace,
//! and every token earns one point per vault keyword it *contains*. The
//! horizon vault has no keyword list and is only reachable through an
//! explicit vault or its guardian.

use crate::config::ClassifierConfig;
use crate::vault::types::{Classification, Guardian, VaultCategory};

/// Runner-up must score at least this fraction of the winner to be reported.
pub const DEFAULT_ALTERNATE_MARGIN: f64 = 0.5;

/// Keyword list for one general vault
#[derive(Debug, Clone)]
pub struct KeywordRule {
    pub vault: VaultCategory,
    pub keywords: Vec<String>,
}

impl KeywordRule {
    pub fn new(vault: VaultCategory, keywords: &[&str]) -> Self {
        Self {
            vault,
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }
}

/// Built-in vocabulary for the five general vaults
pub fn default_keyword_rules() -> Vec<KeywordRule> {
    vec![
        KeywordRule::new(
            VaultCategory::Strategic,
            &[
                "decision", "strategy", "plan", "goal", "priority", "roadmap", "orchestrate",
                "coordinate", "vision", "objective", "direction", "architecture", "tradeoff",
                "risk", "milestone",
            ],
        ),
        KeywordRule::new(
            VaultCategory::Technical,
            &[
                "code", "api", "bug", "fix", "deploy", "build", "test", "database", "schema",
                "query", "server", "endpoint", "function", "module", "config", "script",
                "performance", "refactor", "migration", "debug",
            ],
        ),
        KeywordRule::new(
            VaultCategory::Creative,
            &[
                "design", "story", "art", "music", "lore", "narrative", "theme", "color", "style",
                "brand", "voice", "tone", "aesthetic", "inspire", "flow", "emotion", "create",
                "compose", "craft",
            ],
        ),
        KeywordRule::new(
            VaultCategory::Operational,
            &[
                "process", "workflow", "standard", "convention", "pipeline", "ci", "deploy",
                "monitor", "log", "metric", "sla", "incident", "runbook", "schedule",
                "integration", "release", "documentation",
            ],
        ),
        KeywordRule::new(
            VaultCategory::Wisdom,
            &[
                "learn", "insight", "pattern", "lesson", "retrospective", "reflect", "understand",
                "philosophy", "principle", "growth", "evolution", "knowledge", "teaching",
                "mentor", "transform",
            ],
        ),
    ]
}

/// Aggregate lexical score of one vault
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultScore {
    pub vault: VaultCategory,
    pub score: usize,
    /// Distinct keywords that contributed, in first-hit order
    pub matched: Vec<String>,
}

/// Keyword classifier shared by `remember` and the dry-run `classify`.
#[derive(Debug, Clone)]
pub struct VaultClassifier {
    rules: Vec<KeywordRule>,
    alternate_margin: f64,
}

impl VaultClassifier {
    /// Classifier with the built-in vocabulary
    pub fn new() -> Self {
        Self::with_rules(default_keyword_rules(), DEFAULT_ALTERNATE_MARGIN)
    }

    /// Classifier with custom rules. Rules targeting horizon are discarded.
    pub fn with_rules(rules: Vec<KeywordRule>, alternate_margin: f64) -> Self {
        let rules = rules
            .into_iter()
            .filter(|rule| {
                if rule.vault.is_horizon() {
                    tracing::warn!("Ignoring keyword rule for horizon vault; horizon is never chosen lexically");
                    false
                } else {
                    true
                }
            })
            .collect();
        Self {
            rules,
            alternate_margin: alternate_margin.clamp(0.0, 1.0),
        }
    }

    /// Built-in vocabulary extended with the configured extra keywords
    pub fn from_config(config: &ClassifierConfig) -> Self {
        let mut rules = default_keyword_rules();
        for (name, keywords) in &config.extra_keywords {
            let vault = match name.parse::<VaultCategory>() {
                Ok(vault) => vault,
                Err(e) => {
                    tracing::warn!("Skipping extra keywords: {}", e);
                    continue;
                }
            };
            rules.push(KeywordRule {
                vault,
                keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            });
        }
        Self::with_rules(rules, config.alternate_margin)
    }

    /// Per-vault scores for the five general vaults, canonical order.
    pub fn scores(&self, content: &str) -> Vec<VaultScore> {
        let lower = content.to_lowercase();
        let tokens: Vec<&str> = lower.split_whitespace().collect();
        self.score_tokens(&tokens)
    }

    /// Classify content, optionally routed by its owning guardian.
    pub fn classify(&self, content: &str, guardian: Option<Guardian>) -> Classification {
        if let Some(guardian) = guardian {
            return Classification {
                vault: guardian.home_vault(),
                confidence: 1.0,
                reasoning: "routed by owner".to_string(),
                alternate_vault: None,
            };
        }

        let lower = content.to_lowercase();
        let tokens: Vec<&str> = lower.split_whitespace().collect();
        let scores = self.score_tokens(&tokens);
        let token_count = tokens.len().max(1) as f64;

        let top = scores.iter().map(|s| s.score).max().unwrap_or(0);
        if top == 0 {
            return Classification {
                vault: VaultCategory::Operational,
                confidence: 0.0,
                reasoning: "no domain vocabulary matched; defaulting to operational".to_string(),
                alternate_vault: None,
            };
        }

        let leaders: Vec<&VaultScore> = scores.iter().filter(|s| s.score == top).collect();
        if leaders.len() > 1 {
            let operational = scores
                .iter()
                .find(|s| s.vault == VaultCategory::Operational)
                .map_or(0, |s| s.score);
            let names: Vec<&str> = leaders.iter().map(|s| s.vault.as_str()).collect();
            return Classification {
                vault: VaultCategory::Operational,
                confidence: (operational as f64 / token_count).clamp(0.0, 1.0),
                reasoning: format!(
                    "tie between {} ({} hits each); defaulting to operational",
                    names.join(", "),
                    top
                ),
                alternate_vault: leaders
                    .iter()
                    .map(|s| s.vault)
                    .find(|v| *v != VaultCategory::Operational),
            };
        }

        let winner = leaders[0];
        let runner_up = scores
            .iter()
            .filter(|s| s.vault != winner.vault && s.score > 0)
            .fold(None::<&VaultScore>, |best, s| match best {
                Some(b) if b.score >= s.score => Some(b),
                _ => Some(s),
            });
        let alternate =
            runner_up.filter(|s| s.score as f64 >= self.alternate_margin * top as f64);

        let mut reasoning = format!(
            "matched {} vocabulary ({})",
            winner.vault,
            winner.matched.join(", ")
        );
        if let Some(alt) = alternate {
            reasoning.push_str(&format!("; {} also scored {}", alt.vault, alt.score));
        }

        Classification {
            vault: winner.vault,
            confidence: (top as f64 / token_count).clamp(0.0, 1.0),
            reasoning,
            alternate_vault: alternate.map(|s| s.vault),
        }
    }

    fn score_tokens(&self, tokens: &[&str]) -> Vec<VaultScore> {
        VaultCategory::GENERAL
            .into_iter()
            .map(|vault| {
                let mut score = 0;
                let mut matched: Vec<String> = Vec::new();
                for rule in self.rules.iter().filter(|r| r.vault == vault) {
                    for keyword in &rule.keywords {
                        let hits = tokens.iter().filter(|t| t.contains(keyword.as_str())).count();
                        if hits > 0 {
                            score += hits;
                            if !matched.contains(keyword) {
                                matched.push(keyword.clone());
                            }
                        }
                    }
                }
                VaultScore {
                    vault,
                    score,
                    matched,
                }
            })
            .collect()
    }
}

impl Default for VaultClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Guardians whose home is the given vault
pub fn guardians_for(vault: VaultCategory) -> Vec<Guardian> {
    Guardian::ALL
        .into_iter()
        .filter(|g| g.home_vault() == vault)
        .collect()
}
