pub mod config;
pub mod error;
pub mod history;
pub mod theme;

pub use config::CompletionApiConfig;
pub use error::CompletionError;
pub use history::GenerationHistory;
pub use theme::{GenerationMode, ThemeRecord};
