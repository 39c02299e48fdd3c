//! Completion service port definition.

use crate::domain::CompletionError;

/// One completion call to the text-generation service.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// The full instruction text to send.
    pub prompt: String,
    /// Output budget in tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

/// Port for the external text-generation service.
///
/// Implementations perform a single call per invocation and report failures
/// through the `CompletionError` taxonomy; retry policy lives with the
/// orchestrator, not here.
pub trait CompletionClient {
    /// Send one prompt and return the raw completion text.
    fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError>;
}

impl<C: CompletionClient + ?Sized> CompletionClient for &C {
    fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        (**self).complete(request)
    }
}

impl<C: CompletionClient + ?Sized> CompletionClient for Box<C> {
    fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        (**self).complete(request)
    }
}
