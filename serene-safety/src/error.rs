use thiserror::Error;

/// Errors raised while building a [`SafetyScreen`](crate::SafetyScreen) or
/// loading its configuration.
#[derive(Debug, Error)]
pub enum SafetyError {
    #[error("Invalid keyword pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Invalid keyword file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Empty keyword in '{list}' list")]
    EmptyKeyword { list: &'static str },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SafetyError>;
