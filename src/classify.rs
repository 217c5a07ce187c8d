//! Guess-vs-question classification policy.
//!
//! Decides whether a submission is an attempted full solution or a yes/no
//! clarifying question. The heuristic is approximate and intentionally kept
//! in its own module so the marker lists and thresholds can be revised
//! without touching the turn engine.

/// Phrases that assert a solution outright
const ASSERTIVE_MARKERS: &[&str] = &[
    "the answer is",
    "the truth is",
    "because",
    "the reason is",
    "i think",
    "i believe",
    "it must be",
    "it has to be",
    "definitely",
];

/// Causal/outcome phrasing that signals a reconstruction of events
const CAUSAL_MARKERS: &[&str] = &["caused", "resulted", "led to", "happened", "the fact is"];

/// Action words common in full-solution statements
const ACTION_MARKERS: &[&str] = &["died", "killed", "harmed", "hurt", "did", "happened"];

/// Length threshold (chars) above which causal phrasing reads as a guess
const CAUSAL_LENGTH_THRESHOLD: usize = 25;

/// Length threshold (chars) for the copula + action rule
const COPULA_LENGTH_THRESHOLD: usize = 15;

/// Classify a submission. Any matching rule means "guess".
pub fn looks_like_guess(text: &str) -> bool {
    let lowered = text.to_lowercase();
    let length = lowered.chars().count();

    if contains_any(&lowered, ASSERTIVE_MARKERS) {
        return true;
    }

    if length > CAUSAL_LENGTH_THRESHOLD && contains_any(&lowered, CAUSAL_MARKERS) {
        return true;
    }

    // A declarative copula plus an action word in a longer sentence reads
    // like a statement of the solution rather than a question.
    let has_copula = lowered.contains(" is ") || lowered.contains(" was ");
    has_copula && length > COPULA_LENGTH_THRESHOLD && contains_any(&lowered, ACTION_MARKERS)
}

fn contains_any(text: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| text.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assertive_marker_is_guess() {
        assert!(looks_like_guess("The answer is that he was blind"));
        assert!(looks_like_guess("he jumped because he felt guilty"));
        assert!(looks_like_guess("I think it's the husband's flesh"));
    }

    #[test]
    fn test_long_causal_statement_is_guess() {
        assert!(looks_like_guess(
            "his negligence with the lamp caused the ships to wreck on the rocks"
        ));
    }

    #[test]
    fn test_copula_with_action_is_guess() {
        assert!(looks_like_guess("the keeper is why everyone died at sea"));
    }

    #[test]
    fn test_short_questions_are_not_guesses() {
        assert!(!looks_like_guess("is he alive"));
        assert!(!looks_like_guess("was it dark outside"));
        assert!(!looks_like_guess("does the location matter"));
        assert!(!looks_like_guess("is he the lighthouse keeper"));
    }

    #[test]
    fn test_long_question_without_markers_is_not_guess() {
        assert!(!looks_like_guess(
            "could the people on the boat see the light from where they were standing"
        ));
    }
}
