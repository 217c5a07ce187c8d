//! Puzzle authoring: ask the reasoning service to draft a brand-new puzzle
//! and parse its reply into a story/solution pair. Fail-closed: anything
//! that doesn't match the requested layout is discarded.

use crate::llm::{LlmResult, ReasoningProvider};

const AUTHOR_PROMPT: &str = "\
Write a brand-new lateral-thinking puzzle ('turtle soup' style).

Requirements:
- The story is a short, strange scenario of 2-4 sentences that invites \
yes/no questions.
- The solution explains the whole scenario in 2-5 sentences.
- Do not reuse well-known puzzles.

Reply in exactly this layout, nothing before or after:
Story: <the story>
Solution: <the solution>";

/// Draft one puzzle. `Ok(None)` means the service answered but the reply
/// didn't follow the layout.
pub async fn author_puzzle(
    provider: &dyn ReasoningProvider,
    session_key: &str,
) -> LlmResult<Option<(String, String)>> {
    let reply = provider.complete(AUTHOR_PROMPT, session_key, &[]).await?;
    Ok(parse_authored(&reply))
}

/// Extract the story and solution from a `Story:`/`Solution:` layout. Both
/// sections must be present, in order, and non-empty.
fn parse_authored(reply: &str) -> Option<(String, String)> {
    let story_start = reply.find("Story:")?;
    let solution_start = reply[story_start..].find("Solution:")? + story_start;

    let story = reply[story_start + "Story:".len()..solution_start].trim();
    let solution = reply[solution_start + "Solution:".len()..].trim();

    if story.is_empty() || solution.is_empty() {
        return None;
    }
    Some((story.to_string(), solution.to_string()))
}
