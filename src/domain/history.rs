//! Process-lifetime generation history.
//!
//! Tracks every theme handed out since startup plus a short memory of
//! recently resolved entities. Nothing here is persisted; the whole point is
//! in-process duplicate suppression for a single run of the service.

use std::collections::{HashSet, VecDeque};

/// How many resolved entities are remembered, oldest evicted first.
pub const RECENT_ENTITIES_CAP: usize = 5;

/// Consecutive duplicate answers before the entity prompt carries an
/// explicit avoidance clause.
pub const AVOIDANCE_THRESHOLD: u32 = 3;

/// Mutable history shared by all generation calls in one process.
///
/// Owned by the orchestrator behind a mutex; this type itself is not
/// thread-aware.
#[derive(Debug, Default)]
pub struct GenerationHistory {
    seen_themes: HashSet<String>,
    recent_entities: VecDeque<String>,
    duplicate_streak: u32,
}

impl GenerationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every theme produced so far, for prompt construction.
    pub fn seen_themes(&self) -> Vec<String> {
        self.seen_themes.iter().cloned().collect()
    }

    pub fn contains_theme(&self, theme: &str) -> bool {
        self.seen_themes.contains(theme)
    }

    /// Record an accepted theme. Returns false when the theme was already
    /// handed out, in which case nothing is recorded.
    pub fn record_theme(&mut self, theme: &str) -> bool {
        self.seen_themes.insert(theme.to_string())
    }

    /// The most recently accepted entity, if any.
    pub fn last_entity(&self) -> Option<&str> {
        self.recent_entities.back().map(String::as_str)
    }

    /// Entity the next prompt should explicitly exclude, once the model has
    /// repeated itself often enough.
    pub fn entity_to_avoid(&self) -> Option<&str> {
        if self.duplicate_streak >= AVOIDANCE_THRESHOLD { self.last_entity() } else { None }
    }

    /// Note that the model answered with the same entity as last time.
    pub fn note_duplicate_entity(&mut self) {
        self.duplicate_streak += 1;
    }

    /// Accept a fresh entity: remember it (evicting the oldest beyond
    /// capacity) and clear the duplicate streak.
    pub fn accept_entity(&mut self, entity: &str) {
        if self.recent_entities.len() == RECENT_ENTITIES_CAP {
            self.recent_entities.pop_front();
        }
        self.recent_entities.push_back(entity.to_string());
        self.duplicate_streak = 0;
    }

    pub fn recent_entities(&self) -> impl Iterator<Item = &str> {
        self.recent_entities.iter().map(String::as_str)
    }
}
