use thiserror::Error;

pub const TEXT_REQUIRED: &str = "Message text is required";

#[derive(Debug, Error)]
pub enum ChatError {
    /// The request itself was unacceptable (maps to 400)
    #[error("{0}")]
    Validation(String),

    /// The request never produced a successful response
    #[error("{action}: {detail}")]
    Network { action: &'static str, detail: String },

    /// The response arrived but did not match the expected shape
    #[error("{action}: unexpected response: {detail}")]
    UnexpectedResponse { action: &'static str, detail: String },

    /// A store backend failed (maps to 500)
    #[error("storage failure: {0}")]
    Storage(String),
}

impl ChatError {
    pub fn text_required() -> Self {
        ChatError::Validation(TEXT_REQUIRED.to_string())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ChatError::Validation(_))
    }
}

pub type ChatResult<T> = Result<T, ChatError>;
