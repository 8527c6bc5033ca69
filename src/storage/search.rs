//! Lexical relevance scoring shared by the vault backend and the ledger

use regex::Regex;

/// Extra credit for a token that matches on word boundaries.
const WORD_BOUNDARY_BONUS: f64 = 0.5;

/// Credit a token earns when it is found only in the tags. Kept below the
/// weakest content hit so content matches always rank first.
const TAG_WEIGHT: f64 = 0.5;

/// Compiled query: lower-cased tokens longer than one character, each with
/// a word-boundary matcher.
pub struct QueryMatcher {
    tokens: Vec<(String, Option<Regex>)>,
}

impl QueryMatcher {
    pub fn new(query: &str) -> Self {
        let tokens = query
            .to_lowercase()
            .split_whitespace()
            .filter(|t| t.chars().count() > 1)
            .map(|t| {
                let boundary = Regex::new(&format!(r"\b{}\b", regex::escape(t))).ok();
                (t.to_string(), boundary)
            })
            .collect();
        Self { tokens }
    }

    /// Whether the query has any usable tokens
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Score a haystack in [0, 1]. Zero means no token was found.
    pub fn score(&self, haystack: &str) -> f64 {
        self.score_with_tags(haystack, &[])
    }

    /// Score content plus its tags in [0, 1].
    ///
    /// A token found in the content earns full credit. A token found only
    /// in the tags earns `TAG_WEIGHT` of it, so any content hit outranks a
    /// tag-only hit for the same token.
    pub fn score_with_tags(&self, content: &str, tags: &[String]) -> f64 {
        if self.tokens.is_empty() {
            return 0.0;
        }
        let content = content.to_lowercase();
        let tags = tags.join(" ").to_lowercase();
        let mut raw = 0.0;
        for token in &self.tokens {
            let in_content = token_credit(token, &content);
            raw += if in_content > 0.0 {
                in_content
            } else {
                token_credit(token, &tags) * TAG_WEIGHT
            };
        }
        let max = self.tokens.len() as f64 * (1.0 + WORD_BOUNDARY_BONUS);
        (raw / max).clamp(0.0, 1.0)
    }
}

fn token_credit((token, boundary): &(String, Option<Regex>), haystack: &str) -> f64 {
    if !haystack.contains(token.as_str()) {
        return 0.0;
    }
    if boundary.as_ref().is_some_and(|re| re.is_match(haystack)) {
        1.0 + WORD_BOUNDARY_BONUS
    } else {
        1.0
    }
}

/// Sort scored items by descending score, keeping insertion order on ties.
pub fn rank<T>(items: &mut [(T, f64)]) {
    items.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_tokens_discarded() {
        let matcher = QueryMatcher::new("a b  c");
        assert!(matcher.is_empty());
        assert_eq!(matcher.score("a b c"), 0.0);
    }

    #[test]
    fn test_whole_word_scores_full() {
        let matcher = QueryMatcher::new("storage");
        assert_eq!(matcher.score("We chose file storage today"), 1.0);
    }

    #[test]
    fn test_partial_word_scores_less() {
        let matcher = QueryMatcher::new("stor");
        let score = matcher.score("We chose file storage today");
        assert!((score - 1.0 / 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_missing_tokens_reduce_score() {
        let matcher = QueryMatcher::new("storage decision");
        let score = matcher.score("storage only");
        assert!((score - 0.5).abs() < 1e-9);
        assert_eq!(matcher.score("nothing relevant"), 0.0);
    }

    #[test]
    fn test_case_insensitive() {
        let matcher = QueryMatcher::new("DATABASE");
        assert_eq!(matcher.score("the Database layer"), 1.0);
    }

    #[test]
    fn test_tags_are_searched() {
        let matcher = QueryMatcher::new("infra");
        let score = matcher.score_with_tags("unrelated body", &["infra".to_string()]);
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_content_hit_beats_tag_hit() {
        let matcher = QueryMatcher::new("database");
        let tagged = matcher.score_with_tags("unrelated sketch", &["database".to_string()]);
        let partial = matcher.score_with_tags("databases everywhere", &[]);
        let exact = matcher.score_with_tags("the database layer", &["database".to_string()]);
        assert!(tagged > 0.0);
        assert!(partial > tagged);
        assert_eq!(exact, 1.0);
    }

    #[test]
    fn test_rank_descending() {
        let mut items = vec![("a", 0.2), ("b", 0.9), ("c", 0.5)];
        rank(&mut items);
        let order: Vec<&str> = items.iter().map(|(k, _)| *k).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
    }
}
