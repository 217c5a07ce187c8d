//! Judge adapter: turns a clarifying question into one of the six fixed
//! answer labels, via the reasoning service when configured, else via a
//! keyword fallback.

use crate::llm::{LlmResult, ReasoningProvider};
use crate::types::{ChatTurn, JudgeLabel, QuestionRecord};
use std::sync::Arc;

/// System framing handed to the reasoning service when a session starts.
/// Embeds the current story and solution plus the strict output vocabulary.
const JUDGE_SYSTEM_PROMPT: &str = "\
You are the host of a lateral-thinking puzzle game. You already know the full \
solution. Players will ask you questions, and you must answer under strict rules.

Rules (follow exactly):
1. Reply with exactly one of: 'yes', 'no', 'unrelated', 'ask again', \
'very close', 'partially correct'
2. Never add explanations or any other content
3. Never ask questions yourself
4. Never reveal any detail of the solution

How to answer:
- The answer to the player's question is affirmative -> 'yes'
- The answer is negative -> 'no'
- The question has nothing to do with the core of the story -> 'unrelated'
- The question is unclear or impossible to understand -> 'ask again'
- The player has guessed an important key fact but not the full solution -> \
'very close'

Current story: {story}
Solution: {solution}";

/// Classifies clarifying questions against the current puzzle.
pub struct JudgeAdapter {
    provider: Option<Arc<dyn ReasoningProvider>>,
}

impl JudgeAdapter {
    pub fn new(provider: Option<Arc<dyn ReasoningProvider>>) -> Self {
        Self { provider }
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// The system-framing turn binding a conversation context to `record`.
    /// Present only when a reasoning service is configured.
    pub fn system_framing(&self, record: &QuestionRecord) -> Option<ChatTurn> {
        self.provider.as_ref()?;
        Some(ChatTurn::system(
            JUDGE_SYSTEM_PROMPT
                .replace("{story}", &record.story)
                .replace("{solution}", &record.solution),
        ))
    }

    /// Judge a clarifying question. With a provider, the question is appended
    /// to `context` as a user turn and the normalized label is appended back
    /// as an assistant turn. Without one, a deterministic keyword fallback is
    /// used and the context is left untouched.
    ///
    /// A provider failure is returned to the caller; the context keeps the
    /// user turn so a retried question carries the full history.
    pub async fn judge(
        &self,
        question: &str,
        context: &mut Vec<ChatTurn>,
        solution: &str,
        session_key: &str,
    ) -> LlmResult<JudgeLabel> {
        let Some(provider) = &self.provider else {
            return Ok(fallback_judge(question, solution));
        };

        context.push(ChatTurn::user(question));
        let raw = provider.complete("", session_key, context).await?;
        let label = normalize(&raw);
        context.push(ChatTurn::assistant(label.as_str()));

        Ok(label)
    }
}

/// Normalize a raw service reply into the closed vocabulary. Total: any
/// input maps to a label, defaulting to `AskAgain`.
pub fn normalize(raw: &str) -> JudgeLabel {
    let lowered = raw.trim().to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let has_word = |w: &str| words.iter().any(|candidate| *candidate == w);

    // Exact vocabulary terms, in fixed priority order
    if has_word("yes") {
        return JudgeLabel::Yes;
    }
    if has_word("no") {
        return JudgeLabel::No;
    }
    if has_word("unrelated") {
        return JudgeLabel::Unrelated;
    }
    if lowered.contains("ask again") {
        return JudgeLabel::AskAgain;
    }
    if lowered.contains("very close") {
        return JudgeLabel::VeryClose;
    }
    if lowered.contains("partially correct") {
        return JudgeLabel::PartiallyCorrect;
    }

    // Directional markers when no exact term is present. Negatives first.
    if has_word("wrong") || has_word("incorrect") || has_word("not") || has_word("nope") {
        return JudgeLabel::No;
    }
    if has_word("correct") || has_word("right") || has_word("yeah") || has_word("yep") {
        return JudgeLabel::Yes;
    }
    if has_word("irrelevant") || lowered.contains("nothing to do") {
        return JudgeLabel::Unrelated;
    }

    tracing::warn!("Unrecognized judge reply, asking for a rephrase: '{}'", raw);
    JudgeLabel::AskAgain
}

/// Keyword fallback when no reasoning service is available: `yes` iff any
/// meaningful solution token appears verbatim in the question. Stop words
/// and single-character tokens are excluded, same filter as the answer
/// checker, so "was it cold" doesn't match every solution containing "was".
/// Best-effort only, not semantically grounded.
fn fallback_judge(question: &str, solution: &str) -> JudgeLabel {
    let question = question.to_lowercase();
    let matched = solution
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() > 1 && !crate::checker::STOP_WORDS.contains(token))
        .any(|token| question.contains(token));

    if matched {
        JudgeLabel::Yes
    } else {
        JudgeLabel::No
    }
}
