mod completion_http;
mod generator;
pub mod prompts;

pub use completion_http::HttpCompletionClient;
pub use generator::{
    ENTITY_MAX_ATTEMPTS, NORMAL_MAX_ATTEMPTS, THEME_MAX_ATTEMPTS, ThemeGenerator,
};
