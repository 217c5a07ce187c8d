use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Identity scoping one game: the group id when the message comes from a
/// group, else the sender id. Exactly one session exists per key.
pub type SessionKey = String;

/// Derive the session key from a sender and an optional group.
pub fn session_key(sender_id: &str, group_id: Option<&str>) -> SessionKey {
    group_id.unwrap_or(sender_id).to_string()
}

/// One puzzle entry: a puzzling story plus its hidden solution.
/// Loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionRecord {
    /// Canonical zero-padded id, e.g. "001"
    pub id: String,
    pub title: Option<String>,
    /// 1-5, rendered as difficulty stars
    pub difficulty: u8,
    pub tags: Vec<String>,
    pub story: String,
    pub solution: String,
}

impl QuestionRecord {
    /// Zero-pad an id to the canonical width used throughout the bank.
    pub fn canonical_id(raw: &str) -> String {
        format!("{:0>3}", raw.trim())
    }

    pub fn difficulty_stars(&self) -> String {
        "★".repeat(self.difficulty as usize)
    }
}

/// The closed answer vocabulary a clarifying question can receive.
/// The judge never returns free text, only one of these.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum JudgeLabel {
    Yes,
    No,
    Unrelated,
    AskAgain,
    VeryClose,
    PartiallyCorrect,
}

impl JudgeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            JudgeLabel::Yes => "yes",
            JudgeLabel::No => "no",
            JudgeLabel::Unrelated => "unrelated",
            JudgeLabel::AskAgain => "ask again",
            JudgeLabel::VeryClose => "very close",
            JudgeLabel::PartiallyCorrect => "partially correct",
        }
    }
}

impl std::fmt::Display for JudgeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One role-tagged turn of the per-session conversation context.
/// Only the reasoning-service adapter reads this.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Engine-level configuration with the documented defaults.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Inactivity timeout per session
    pub session_timeout: Duration,
    /// Question budget per puzzle
    pub max_questions: u32,
    /// Path to the puzzle bank file
    pub bank_file: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            session_timeout: Duration::from_secs(1000),
            max_questions: 40,
            bank_file: "puzzles.txt".to_string(),
        }
    }
}

impl GameConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let session_timeout = std::env::var("SOUP_SESSION_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.session_timeout);

        let max_questions = std::env::var("SOUP_MAX_QUESTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_questions);

        let bank_file = std::env::var("SOUP_BANK_FILE")
            .ok()
            .and_then(|p| {
                let trimmed = p.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .unwrap_or(defaults.bank_file);

        Self {
            session_timeout,
            max_questions,
            bank_file,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_canonical_id_pads_to_three() {
        assert_eq!(QuestionRecord::canonical_id("1"), "001");
        assert_eq!(QuestionRecord::canonical_id("42"), "042");
        assert_eq!(QuestionRecord::canonical_id("123"), "123");
        assert_eq!(QuestionRecord::canonical_id("1234"), "1234");
        assert_eq!(QuestionRecord::canonical_id(" 7 "), "007");
    }

    #[test]
    fn test_judge_label_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&JudgeLabel::AskAgain).unwrap(),
            "\"ask-again\""
        );
        assert_eq!(
            serde_json::to_string(&JudgeLabel::PartiallyCorrect).unwrap(),
            "\"partially-correct\""
        );
        let label: JudgeLabel = serde_json::from_str("\"very-close\"").unwrap();
        assert_eq!(label, JudgeLabel::VeryClose);
    }

    #[test]
    fn test_session_key_prefers_group() {
        assert_eq!(session_key("alice", Some("lobby")), "lobby");
        assert_eq!(session_key("alice", None), "alice");
    }

    #[test]
    #[serial]
    fn test_config_defaults() {
        std::env::remove_var("SOUP_SESSION_TIMEOUT");
        std::env::remove_var("SOUP_MAX_QUESTIONS");
        std::env::remove_var("SOUP_BANK_FILE");

        let config = GameConfig::from_env();
        assert_eq!(config.session_timeout, Duration::from_secs(1000));
        assert_eq!(config.max_questions, 40);
        assert_eq!(config.bank_file, "puzzles.txt");
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        std::env::set_var("SOUP_SESSION_TIMEOUT", "90");
        std::env::set_var("SOUP_MAX_QUESTIONS", "12");
        std::env::set_var("SOUP_BANK_FILE", "custom.txt");

        let config = GameConfig::from_env();
        assert_eq!(config.session_timeout, Duration::from_secs(90));
        assert_eq!(config.max_questions, 12);
        assert_eq!(config.bank_file, "custom.txt");

        std::env::remove_var("SOUP_SESSION_TIMEOUT");
        std::env::remove_var("SOUP_MAX_QUESTIONS");
        std::env::remove_var("SOUP_BANK_FILE");
    }
}
