//! Answer checker: decides whether a full-solution guess is correct, via a
//! single-shot reasoning-service prompt when configured, else via token
//! overlap against the solution.

use crate::llm::ReasoningProvider;
use std::collections::HashSet;
use std::sync::Arc;

/// Strict yes/no prompt for guess verification
const ANSWER_CHECK_PROMPT: &str = "\
Decide whether the player's guess is correct. Reply with exactly 'yes' or \
'no', nothing else.

Correct solution: {solution}
Player's guess: {guess}

Criteria:
- The guess captures the solution's core facts and key details, even if \
worded differently -> 'yes'
- The guess only has the right direction but misses key details -> 'no'
- The guess is substantially wrong -> 'no'

Reply 'yes' or 'no' only.";

/// Connective words excluded from the solution's meaningful-token set.
/// Shared with the judge's no-provider fallback.
pub(crate) const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "so", "then", "because", "is", "was", "are", "were",
    "be", "been", "of", "to", "in", "on", "at", "by", "with", "for", "from", "that", "this",
    "these", "those", "it", "its", "he", "she", "his", "her", "they", "them", "their", "had",
    "has", "have", "not", "out", "into", "would", "what", "who", "why", "how",
];

/// Minimum fraction of meaningful solution tokens that must appear in the
/// guess for the fallback to call it correct
const MATCH_THRESHOLD: f64 = 0.5;

pub struct AnswerChecker {
    provider: Option<Arc<dyn ReasoningProvider>>,
}

impl AnswerChecker {
    pub fn new(provider: Option<Arc<dyn ReasoningProvider>>) -> Self {
        Self { provider }
    }

    /// Verdict on a full-solution guess. A reasoning-service failure falls
    /// back to the overlap heuristic instead of propagating.
    pub async fn check(&self, guess: &str, solution: &str, session_key: &str) -> bool {
        let Some(provider) = &self.provider else {
            return fallback_check(guess, solution);
        };

        let prompt = ANSWER_CHECK_PROMPT
            .replace("{solution}", solution)
            .replace("{guess}", guess);

        match provider.complete(&prompt, session_key, &[]).await {
            Ok(reply) => {
                tracing::debug!("Answer check reply: '{}'", reply);
                reply.to_lowercase().contains("yes")
            }
            Err(e) => {
                tracing::error!("Answer check via reasoning service failed: {}", e);
                fallback_check(guess, solution)
            }
        }
    }
}

/// Token-overlap fallback: the fraction of the solution's meaningful tokens
/// that appear in the guess must reach the threshold. A solution with no
/// meaningful tokens gives no basis for a match and is never correct.
fn fallback_check(guess: &str, solution: &str) -> bool {
    let guess = guess.to_lowercase();
    let solution = solution.to_lowercase();

    let meaningful: HashSet<&str> = solution
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() > 1 && !STOP_WORDS.contains(token))
        .collect();

    if meaningful.is_empty() {
        return false;
    }

    let matched = meaningful
        .iter()
        .filter(|token| guess.contains(**token))
        .count();

    matched as f64 / meaningful.len() as f64 >= MATCH_THRESHOLD
}
