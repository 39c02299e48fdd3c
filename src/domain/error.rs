use thiserror::Error;

/// Failure taxonomy for completion calls.
///
/// Retry policy is keyed on these variants rather than on message text:
/// `AuthFailure` is terminal for the current call chain, every other kind
/// consumes one attempt from the active budget.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompletionError {
    /// The request exceeded the per-call network timeout.
    #[error("completion request timed out")]
    Timeout,

    /// Credentials are missing or were rejected by the service.
    #[error("completion credentials missing or rejected")]
    AuthFailure,

    /// HTTP-level failure (connection error or non-success status).
    #[error("completion transport error{}: {message}", fmt_status(.status))]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// The service answered but the body was not a usable completion.
    #[error("malformed completion response: {0}")]
    Malformed(String),
}

impl CompletionError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, CompletionError::AuthFailure)
    }
}

fn fmt_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (status={code})"),
        None => String::new(),
    }
}
