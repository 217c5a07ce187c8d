use crate::llm::LlmError;

/// Errors that can occur while driving a game session
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("a game is already in progress for this session")]
    SessionConflict,

    #[error("reasoning service failed: {0}")]
    ReasoningService(#[from] LlmError),
}
