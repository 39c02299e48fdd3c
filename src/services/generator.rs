//! Theme generation orchestration.
//!
//! Drives one or two rounds of completion calls: an optional
//! entity-resolution stage that pins the keyword to a concrete named entity,
//! then a theme-generation stage. Applies retry and duplicate-avoidance
//! policy and updates the process-wide generation history. The public entry
//! point is total: every unrecoverable path collapses into the fallback
//! record, never an error.

use std::sync::{Mutex, MutexGuard};

use serde::Deserialize;

use crate::domain::{CompletionError, GenerationHistory, GenerationMode, ThemeRecord};
use crate::ports::{CompletionClient, CompletionRequest};
use crate::services::prompts;

/// Attempt budget for the normal (single-stage) path.
pub const NORMAL_MAX_ATTEMPTS: u32 = 3;
/// Attempt budget for entity resolution in specific mode.
pub const ENTITY_MAX_ATTEMPTS: u32 = 5;
/// Attempt budget for theme generation after an entity is resolved.
pub const THEME_MAX_ATTEMPTS: u32 = 3;

/// Sanity bound on entity answers: a name, not a sentence.
const ENTITY_MAX_CHARS: usize = 50;
/// Entity answers are names; tens of tokens is plenty.
const ENTITY_MAX_TOKENS: u32 = 40;
const THEME_MAX_TOKENS: u32 = 150;
const TEMPERATURE: f32 = 0.7;

const ENTITY_QUOTE_CHARS: &[char] = &['"', '\'', '`', '「', '」', '『', '』'];

/// Outcome of a single attempt inside a retry loop.
enum Attempt<T> {
    /// Candidate accepted; stop the loop.
    Accept(T),
    /// Attempt consumed; try again if budget remains.
    Retry,
    /// Terminal failure; stop the loop without a result.
    Abort,
}

/// Run up to `max_attempts` attempts, stopping early on accept or abort.
/// Shared by all three retry loops; the closures differ only in prompt
/// construction and acceptance predicate.
fn run_attempts<T>(max_attempts: u32, mut attempt: impl FnMut(u32) -> Attempt<T>) -> Option<T> {
    for n in 1..=max_attempts {
        match attempt(n) {
            Attempt::Accept(value) => return Some(value),
            Attempt::Retry => {}
            Attempt::Abort => return None,
        }
    }
    None
}

/// Classify a completion failure: auth errors abort the current call chain,
/// anything else consumes one attempt.
fn attempt_after_error<T>(
    stage: &str,
    attempt: u32,
    max_attempts: u32,
    error: &CompletionError,
) -> Attempt<T> {
    if error.is_retryable() {
        eprintln!("{stage} call failed (attempt {attempt}/{max_attempts}): {error}");
        Attempt::Retry
    } else {
        eprintln!("{stage} call failed with an auth error; giving up: {error}");
        Attempt::Abort
    }
}

/// The two-field object every theme prompt asks the model to return.
#[derive(Debug, Deserialize)]
struct ThemePayload {
    theme: String,
    hint: String,
}

/// Orchestrator for conversation-starter generation.
///
/// Owns the process-wide generation history behind a mutex so concurrent
/// callers cannot race past the duplicate checks.
pub struct ThemeGenerator<C> {
    client: C,
    history: Mutex<GenerationHistory>,
}

impl<C: CompletionClient> ThemeGenerator<C> {
    pub fn new(client: C) -> Self {
        Self { client, history: Mutex::new(GenerationHistory::new()) }
    }

    /// Produce one conversation starter.
    ///
    /// Total function: transport failures, unparseable responses, and
    /// exhausted duplicate-avoidance budgets all resolve to
    /// `ThemeRecord::miss()`. A blank keyword counts as absent and forces
    /// normal mode.
    pub fn generate(&self, keyword: Option<&str>, specific: bool) -> ThemeRecord {
        let keyword = keyword.map(str::trim).filter(|k| !k.is_empty());
        let mode = GenerationMode::resolve(keyword, specific);

        match (mode, keyword) {
            (GenerationMode::Specific, Some(keyword)) => self.generate_specific(keyword),
            (_, keyword) => self.generate_normal(keyword),
        }
    }

    fn generate_normal(&self, keyword: Option<&str>) -> ThemeRecord {
        run_attempts(NORMAL_MAX_ATTEMPTS, |attempt| {
            let seen = self.history().seen_themes();
            let prompt = prompts::build_theme_prompt(keyword, &seen);
            self.theme_attempt(&prompt, attempt, NORMAL_MAX_ATTEMPTS)
        })
        .unwrap_or_else(ThemeRecord::miss)
    }

    fn generate_specific(&self, keyword: &str) -> ThemeRecord {
        // Stage 1: pin the keyword to a concrete entity. Exhaustion here
        // skips stage 2 entirely.
        let Some(entity) = self.resolve_entity(keyword) else {
            return ThemeRecord::miss();
        };

        run_attempts(THEME_MAX_ATTEMPTS, |attempt| {
            let seen = self.history().seen_themes();
            let prompt = prompts::build_theme_from_entity_prompt(&entity, keyword, &seen);
            self.theme_attempt(&prompt, attempt, THEME_MAX_ATTEMPTS)
        })
        .unwrap_or_else(ThemeRecord::miss)
    }

    /// Entity-resolution loop. Accepted entities are recorded in history;
    /// a candidate equal to the most recently accepted one only bumps the
    /// duplicate streak, which eventually adds an avoidance clause to the
    /// prompt.
    fn resolve_entity(&self, keyword: &str) -> Option<String> {
        run_attempts(ENTITY_MAX_ATTEMPTS, |attempt| {
            let avoid = self.history().entity_to_avoid().map(String::from);
            let prompt = prompts::build_entity_prompt(keyword, avoid.as_deref());

            let raw = match self.client.complete(CompletionRequest {
                prompt,
                max_tokens: ENTITY_MAX_TOKENS,
                temperature: TEMPERATURE,
            }) {
                Ok(raw) => raw,
                Err(error) => {
                    return attempt_after_error("entity", attempt, ENTITY_MAX_ATTEMPTS, &error);
                }
            };

            let candidate = clean_entity(&raw);
            if candidate.is_empty() || candidate.chars().count() > ENTITY_MAX_CHARS {
                eprintln!(
                    "entity candidate rejected (attempt {attempt}/{ENTITY_MAX_ATTEMPTS}): {candidate:?}"
                );
                return Attempt::Retry;
            }

            let mut history = self.history();
            if history.last_entity() == Some(candidate.as_str()) {
                history.note_duplicate_entity();
                eprintln!(
                    "entity 「{candidate}」 repeated (attempt {attempt}/{ENTITY_MAX_ATTEMPTS})"
                );
                return Attempt::Retry;
            }

            history.accept_entity(&candidate);
            Attempt::Accept(candidate)
        })
    }

    /// One theme-generation attempt: call, unwrap an optional code fence,
    /// parse the two-field object, and check for duplicates. The duplicate
    /// check and the insert happen under one lock.
    fn theme_attempt(&self, prompt: &str, attempt: u32, max_attempts: u32) -> Attempt<ThemeRecord> {
        let raw = match self.client.complete(CompletionRequest {
            prompt: prompt.to_string(),
            max_tokens: THEME_MAX_TOKENS,
            temperature: TEMPERATURE,
        }) {
            Ok(raw) => raw,
            Err(error) => return attempt_after_error("theme", attempt, max_attempts, &error),
        };

        let payload: ThemePayload = match serde_json::from_str(strip_code_fence(&raw)) {
            Ok(payload) => payload,
            Err(error) => {
                eprintln!(
                    "theme response did not parse (attempt {attempt}/{max_attempts}): {error}"
                );
                return Attempt::Retry;
            }
        };

        let mut history = self.history();
        if !history.record_theme(&payload.theme) {
            eprintln!(
                "theme 「{}」 already generated, respinning (attempt {attempt}/{max_attempts})",
                payload.theme
            );
            return Attempt::Retry;
        }

        Attempt::Accept(ThemeRecord { theme: payload.theme, hint: payload.hint })
    }

    fn history(&self) -> MutexGuard<'_, GenerationHistory> {
        self.history.lock().expect("history lock poisoned")
    }
}

/// Strip an optional ```json fenced wrapper the model may emit around the
/// JSON object.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}

/// Trim an entity answer and drop surrounding quoting characters.
fn clean_entity(raw: &str) -> String {
    raw.trim().trim_matches(|ch| ENTITY_QUOTE_CHARS.contains(&ch)).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_code_fence_unwraps_json_fence() {
        let wrapped = "```json\n{\"theme\":\"a\",\"hint\":\"b\"}\n```";
        assert_eq!(strip_code_fence(wrapped), "{\"theme\":\"a\",\"hint\":\"b\"}");
    }

    #[test]
    fn strip_code_fence_unwraps_bare_fence() {
        let wrapped = "```\n{\"theme\":\"a\",\"hint\":\"b\"}\n```";
        assert_eq!(strip_code_fence(wrapped), "{\"theme\":\"a\",\"hint\":\"b\"}");
    }

    #[test]
    fn strip_code_fence_leaves_plain_json_alone() {
        let plain = "{\"theme\":\"a\",\"hint\":\"b\"}";
        assert_eq!(strip_code_fence(plain), plain);
    }

    #[test]
    fn clean_entity_strips_quotes_and_whitespace() {
        assert_eq!(clean_entity("  「孫悟空」 \n"), "孫悟空");
        assert_eq!(clean_entity("\"Son Goku\""), "Son Goku");
        assert_eq!(clean_entity("『ワンピース』"), "ワンピース");
    }

    #[test]
    fn run_attempts_stops_on_accept() {
        let mut calls = 0;
        let result = run_attempts(5, |_| {
            calls += 1;
            if calls == 2 { Attempt::Accept(calls) } else { Attempt::Retry }
        });
        assert_eq!(result, Some(2));
        assert_eq!(calls, 2);
    }

    #[test]
    fn run_attempts_stops_on_abort() {
        let mut calls = 0;
        let result: Option<()> = run_attempts(5, |_| {
            calls += 1;
            Attempt::Abort
        });
        assert_eq!(result, None);
        assert_eq!(calls, 1);
    }

    #[test]
    fn run_attempts_exhausts_the_budget_on_retry() {
        let mut calls = 0;
        let result: Option<()> = run_attempts(4, |_| {
            calls += 1;
            Attempt::Retry
        });
        assert_eq!(result, None);
        assert_eq!(calls, 4);
    }
}
