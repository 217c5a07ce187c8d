//! Puzzle bank: loading, validation, lookup and random selection.
//!
//! The bank is parsed once at startup. Malformed records are dropped with a
//! warning rather than failing the load; a load that yields zero records is
//! replaced by a small built-in set so the game is never unusable.

use crate::types::QuestionRecord;
use rand::Rng;
use std::path::Path;

/// Line separating two records in the bank file
const RECORD_DELIMITER: &str = "---";

/// Bounded retry budget for `random_different_from`
const DIFFERENT_RECORD_ATTEMPTS: usize = 10;

pub struct QuestionBank {
    records: Vec<QuestionRecord>,
}

impl QuestionBank {
    /// Load the bank from a file, substituting the built-in default set when
    /// the file is missing, unreadable, or contains no valid records.
    pub fn load_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                tracing::error!(
                    "Failed to read puzzle bank {}: {}. Using built-in puzzles.",
                    path.display(),
                    e
                );
                Self::builtin()
            }
        }
    }

    /// Parse bank source text. Never fails: invalid records are skipped and
    /// an empty result falls back to the built-in set.
    pub fn parse(source: &str) -> Self {
        let mut records = Vec::new();
        let mut block = Vec::new();

        for line in source.lines().chain(std::iter::once(RECORD_DELIMITER)) {
            if line.trim() == RECORD_DELIMITER {
                if let Some(record) = Self::parse_block(&block) {
                    records.push(record);
                }
                block.clear();
            } else {
                block.push(line);
            }
        }

        if records.is_empty() {
            tracing::warn!("Puzzle bank source had no valid records. Using built-in puzzles.");
            return Self::builtin();
        }

        tracing::info!("Loaded {} puzzles", records.len());
        Self { records }
    }

    /// Parse one `key: value` block. Returns None (with a warning) for
    /// records missing a required key or carrying a non-integer difficulty.
    fn parse_block(lines: &[&str]) -> Option<QuestionRecord> {
        let mut id = None;
        let mut title = None;
        let mut difficulty = None;
        let mut tags = Vec::new();
        let mut story = None;
        let mut solution = None;

        let mut saw_content = false;
        for line in lines {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            saw_content = true;

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "id" => id = Some(QuestionRecord::canonical_id(value)),
                "title" => title = (!value.is_empty()).then(|| value.to_string()),
                "difficulty" => difficulty = Some(value.to_string()),
                "tags" => {
                    tags = value
                        .split(',')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(str::to_string)
                        .collect()
                }
                "story" => story = Some(value.to_string()),
                "solution" => solution = Some(value.to_string()),
                _ => {}
            }
        }

        if !saw_content {
            return None;
        }

        let (Some(id), Some(story), Some(solution)) = (id, story, solution) else {
            tracing::warn!("Dropping puzzle record missing id, story or solution");
            return None;
        };
        if story.is_empty() || solution.is_empty() {
            tracing::warn!("Dropping puzzle record {} with empty story or solution", id);
            return None;
        }

        let difficulty = match difficulty {
            None => 3,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) => n.clamp(1, 5) as u8,
                Err(_) => {
                    tracing::warn!(
                        "Dropping puzzle record {} with non-integer difficulty '{}'",
                        id,
                        raw
                    );
                    return None;
                }
            },
        };

        Some(QuestionRecord {
            id,
            title,
            difficulty,
            tags,
            story,
            solution,
        })
    }

    /// The built-in fallback set. Always at least two records.
    pub fn builtin() -> Self {
        Self {
            records: vec![
                QuestionRecord {
                    id: "001".to_string(),
                    title: Some("The Lighthouse Keeper".to_string()),
                    difficulty: 3,
                    tags: vec!["classic".to_string(), "guilt".to_string()],
                    story: "A man opens a door, sees what lies beyond it, and immediately \
                            jumps to his death. Why?"
                        .to_string(),
                    solution: "The man was a lighthouse keeper. He opened the lamp-room door \
                               and found the lighthouse lamp dark. Realizing his negligence \
                               had let ships wreck on the rocks, he jumped out of guilt."
                        .to_string(),
                },
                QuestionRecord {
                    id: "002".to_string(),
                    title: Some("Turtle Soup".to_string()),
                    difficulty: 4,
                    tags: vec!["classic".to_string(), "survival".to_string()],
                    story: "A woman orders turtle soup at a restaurant, takes one sip, and \
                            bursts into tears. Why?"
                        .to_string(),
                    solution: "She and her husband were once shipwrecked. He fed her what he \
                               called turtle soup so she would survive. Tasting real turtle \
                               soup now, she realizes the soup back then was made from her \
                               husband's flesh."
                        .to_string(),
                },
            ],
        }
    }

    /// Exact lookup by canonicalized id.
    pub fn by_id(&self, id: &str) -> Option<&QuestionRecord> {
        let canonical = QuestionRecord::canonical_id(id);
        self.records.iter().find(|r| r.id == canonical)
    }

    /// Uniform random selection. The bank is never empty after construction.
    pub fn random(&self) -> &QuestionRecord {
        let mut rng = rand::rng();
        &self.records[rng.random_range(0..self.records.len())]
    }

    /// Sample up to a bounded number of times for a record with a different
    /// id. Returns None when the budget is exhausted (bank size <= 1), which
    /// callers must treat as a recoverable "cannot change puzzle" condition.
    pub fn random_different_from(&self, current_id: &str) -> Option<&QuestionRecord> {
        for _ in 0..DIFFERENT_RECORD_ATTEMPTS {
            let candidate = self.random();
            if candidate.id != current_id {
                return Some(candidate);
            }
        }
        None
    }

    pub fn records(&self) -> &[QuestionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
