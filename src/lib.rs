//! gachatalk: conversation-starter roulette backed by a text-generation API.
//!
//! One spin produces a theme plus an opening hint, optionally biased toward
//! a keyword, optionally narrowed first to a concrete named entity related
//! to that keyword. Themes are deduplicated for the lifetime of the
//! `ThemeGenerator` holding the history.

pub mod domain;
pub mod ports;
pub mod services;

use domain::CompletionApiConfig;
pub use domain::{CompletionError, GenerationMode, ThemeRecord};
pub use ports::{CompletionClient, CompletionRequest};
use services::{HttpCompletionClient, ThemeGenerator};

/// One-shot spin for the CLI: build the HTTP client from the environment
/// and run a single generation against a fresh history.
///
/// Embedders that want duplicate suppression across spins should construct
/// a `ThemeGenerator` once and keep it alive instead.
pub fn spin(keyword: Option<&str>, specific: bool) -> Result<ThemeRecord, CompletionError> {
    let client = HttpCompletionClient::from_env(CompletionApiConfig::default())?;
    let generator = ThemeGenerator::new(client);
    Ok(generator.generate(keyword, specific))
}
