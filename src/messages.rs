//! Response text rendering. The engine decides *what* happened; everything
//! the player actually reads is built here.

use crate::types::{JudgeLabel, QuestionRecord};
use std::time::Duration;

fn tag_line(record: &QuestionRecord) -> String {
    if record.tags.is_empty() {
        String::new()
    } else {
        format!("Tags: {}\n", record.tags.join(", "))
    }
}

fn heading(record: &QuestionRecord) -> String {
    let mut text = format!("Puzzle #{}", record.id);
    if let Some(title) = &record.title {
        text.push_str(&format!(" - {}", title));
    }
    text
}

pub fn rules_preamble(max_questions: u32, timeout: Duration) -> String {
    format!(
        "Lateral-thinking puzzle\n\n\
         How to play:\n\
         1. You get a strange little story.\n\
         2. Ask questions answerable with yes, no or unrelated: `ask <question>`.\n\
         3. Work out what really happened.\n\
         4. You have {} questions and {} seconds of thinking time.\n\n\
         Start deducing!",
        max_questions,
        timeout.as_secs()
    )
}

pub fn intro(record: &QuestionRecord, max_questions: u32) -> String {
    format!(
        "{} {}\n\n{}\n\nUse `ask <your question>` to investigate.\nQuestions remaining: {}",
        heading(record),
        record.difficulty_stars(),
        record.story,
        max_questions
    )
}

pub fn already_in_progress() -> String {
    "You already have a puzzle in progress. Keep asking questions, or send `end` to stop."
        .to_string()
}

pub fn no_active_session() -> String {
    "No puzzle is in progress. Send `start` to begin one.".to_string()
}

pub fn record_not_found(id: &str) -> String {
    format!("No puzzle with id {} exists. Use `list` to browse the bank.", id)
}

pub fn empty_question_usage() -> String {
    "Your question is empty.\n\nUse `ask <your question>`, e.g. `ask did he do it on purpose?`"
        .to_string()
}

pub fn round_result(count: u32, question: &str, label: JudgeLabel, remaining: u32) -> String {
    format!(
        "Question {}\n> {}\nAnswer: {}\nRemaining: {}",
        count, question, label, remaining
    )
}

pub fn correct_summary(record: &QuestionRecord, count: u32) -> String {
    format!(
        "Correct!\n\nThe full solution:\n{}\n\nYou found the truth in {} questions.\n{}\
         Send `start` for a new puzzle.",
        record.solution,
        count,
        tag_line(record)
    )
}

pub fn out_of_questions_summary(record: &QuestionRecord, max_questions: u32) -> String {
    format!(
        "Game over - all {} questions used.\n\nThe solution was:\n{}\n\n{}\
         Send `start` for a new puzzle.",
        max_questions,
        record.solution,
        tag_line(record)
    )
}

pub fn timeout_summary(record: &QuestionRecord) -> String {
    format!(
        "Time's up!\n\nThe solution was:\n{}\n\nSend `start` for a new puzzle.",
        record.solution
    )
}

pub fn ended_summary(record: &QuestionRecord, count: u32) -> String {
    format!(
        "Game ended.\n\nThe solution was:\n{}\n\n{}\
         You asked {} questions. Send `start` for a new puzzle.",
        record.solution,
        tag_line(record),
        count
    )
}

pub fn force_ended() -> String {
    "Puzzle aborted. Send `start` for a new one.".to_string()
}

pub fn reveal(record: &QuestionRecord, count: u32) -> String {
    format!(
        "Solution reveal\n\n{}\n\nStory: {}\n\nFull solution:\n{}\n\n\
         You have asked {} questions so far. The game continues; send `end` to stop.",
        heading(record),
        record.story,
        record.solution,
        count
    )
}

pub fn changed(record: &QuestionRecord, max_questions: u32) -> String {
    format!(
        "Puzzle swapped!\n\n{} {}\n\n{}\n\nYour question count is reset: {} questions available.",
        heading(record),
        record.difficulty_stars(),
        record.story,
        max_questions
    )
}

pub fn change_failed() -> String {
    "Sorry, couldn't find a different puzzle to switch to. The current one stays.".to_string()
}

pub fn service_unavailable() -> String {
    "The reasoning service is not responding right now. Try again, or send `abort` to restart."
        .to_string()
}

pub fn unexpected_failure() -> String {
    "Something went wrong and the game was ended. Send `start` to begin again.".to_string()
}

pub fn admin_denied() -> String {
    "Only an admin may do that.".to_string()
}

pub fn admin_none_active() -> String {
    "There are no active puzzle sessions.".to_string()
}

pub fn admin_report(count: usize) -> String {
    format!("Done. Terminated {} active puzzle session(s).", count)
}

pub fn bank_list(records: &[QuestionRecord], page: usize, per_page: usize) -> String {
    let total_pages = records.len().div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * per_page;
    let end = (start + per_page).min(records.len());

    let mut text = format!("Puzzle bank (page {}/{})\n\n", page, total_pages);
    for record in &records[start..end] {
        text.push_str(&format!("{} {}\n", heading(record), record.difficulty_stars()));
        let preview: String = record.story.chars().take(60).collect();
        if record.story.chars().count() > 60 {
            text.push_str(&format!("{}...\n\n", preview));
        } else {
            text.push_str(&format!("{}\n\n", preview));
        }
    }
    text.push_str("Use `start <id>` to play a specific puzzle.");
    if total_pages > 1 {
        text.push_str("\nUse `list <page>` for more.");
    }
    text
}

pub fn detail_usage() -> String {
    "Specify a puzzle id, e.g. `detail 001`.".to_string()
}

pub fn bank_detail(record: &QuestionRecord) -> String {
    format!(
        "{}\nDifficulty: {}\n\n{}\n\nUse `start {}` to take it on.",
        heading(record),
        record.difficulty_stars(),
        record.story,
        record.id
    )
}

pub fn authored_preview(story: &str, solution: &str) -> String {
    format!(
        "Freshly authored puzzle (preview only, not added to the bank):\n\n\
         Story:\n{}\n\nSolution:\n{}",
        story, solution
    )
}

pub fn authoring_failed() -> String {
    "Couldn't author a usable puzzle this time. Try again.".to_string()
}

pub fn authoring_unavailable() -> String {
    "Puzzle authoring needs a reasoning service, and none is configured.".to_string()
}

pub fn help(max_questions: u32, timeout: Duration) -> String {
    format!(
        "Lateral-thinking puzzle - commands\n\n\
         Game:\n\
         - `start` - begin a random puzzle\n\
         - `start <id>` - begin a specific puzzle\n\
         - `ask <question>` - ask a yes/no question (or state your solution)\n\
         - `end` - stop and see the solution\n\
         - `abort` - stop immediately, no summary\n\
         - `reveal` - peek at the solution without ending the game\n\
         - `swap` - switch to a different puzzle, question count reset\n\n\
         Bank:\n\
         - `list [page]` - browse available puzzles\n\
         - `detail <id>` - show a puzzle's story without starting\n\
         - `author` - have the reasoning service draft a brand new puzzle\n\n\
         Each game allows {} questions and {} seconds of inactivity.",
        max_questions,
        timeout.as_secs()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::QuestionBank;

    #[test]
    fn test_round_result_contains_all_parts() {
        let text = round_result(3, "is he alive", JudgeLabel::No, 37);
        assert!(text.contains("Question 3"));
        assert!(text.contains("is he alive"));
        assert!(text.contains("Answer: no"));
        assert!(text.contains("Remaining: 37"));
    }

    #[test]
    fn test_intro_shows_difficulty_stars() {
        let bank = QuestionBank::builtin();
        let record = &bank.records()[0];
        let text = intro(record, 40);
        assert!(text.contains("Puzzle #001"));
        assert!(text.contains("★★★"));
        assert!(text.contains(&record.story));
        assert!(!text.contains(&record.solution));
    }

    #[test]
    fn test_summaries_include_solution() {
        let bank = QuestionBank::builtin();
        let record = &bank.records()[0];
        for text in [
            correct_summary(record, 5),
            out_of_questions_summary(record, 40),
            timeout_summary(record),
            ended_summary(record, 2),
            reveal(record, 1),
        ] {
            assert!(text.contains(&record.solution));
        }
    }

    #[test]
    fn test_bank_list_pagination() {
        let bank = QuestionBank::builtin();
        let text = bank_list(bank.records(), 1, 10);
        assert!(text.contains("page 1/1"));
        assert!(text.contains("Puzzle #001"));
        assert!(text.contains("Puzzle #002"));

        // Out-of-range page clamps instead of panicking
        let text = bank_list(bank.records(), 99, 1);
        assert!(text.contains("page 2/2"));
    }
}
