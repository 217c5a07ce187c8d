pub mod authoring;
pub mod bank;
pub mod checker;
pub mod classify;
pub mod engine;
pub mod error;
pub mod judge;
pub mod llm;
pub mod messages;
pub mod store;
pub mod types;
