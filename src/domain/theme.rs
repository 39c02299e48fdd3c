//! Core value types for theme generation.

use serde::{Deserialize, Serialize};

/// Theme label of the fallback record returned when generation fails.
pub const MISS_THEME: &str = "ハズレ";

const MISS_HINT: &str = "空のカプセルが出てきちゃった！もう一度回そう";

/// A single conversation starter: a short topic label plus an opening hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeRecord {
    /// Short label for the conversation topic.
    pub theme: String,
    /// Opening question or nudge that helps someone start talking about it.
    pub hint: String,
}

impl ThemeRecord {
    /// The fallback record handed to the caller whenever generation cannot
    /// produce a valid, non-duplicate result within budget. Generation is a
    /// total function: this is its only failure mode.
    pub fn miss() -> Self {
        Self { theme: MISS_THEME.to_string(), hint: MISS_HINT.to_string() }
    }

    /// Whether this record is the fallback rather than a generated theme.
    pub fn is_miss(&self) -> bool {
        self.theme == MISS_THEME
    }
}

/// How a spin request is fulfilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationMode {
    /// Single theme-generation loop, keyword-biased or generic.
    #[default]
    Normal,
    /// Two-stage pipeline: resolve a concrete named entity for the keyword
    /// first, then generate a theme bound to that entity.
    Specific,
}

impl GenerationMode {
    /// Resolve the mode from raw request inputs.
    ///
    /// A missing keyword always forces normal mode, regardless of the
    /// specific flag: there is no category to narrow an entity from.
    pub fn resolve(keyword: Option<&str>, specific: bool) -> Self {
        match keyword {
            Some(_) if specific => GenerationMode::Specific,
            _ => GenerationMode::Normal,
        }
    }
}
