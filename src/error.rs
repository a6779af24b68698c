use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The requested record id does not resolve in the store.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// A renderer call made in a state that does not allow it, or with
    /// geometry that cannot be laid out.
    #[error("contract violation: {0}")]
    ContractViolation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn violation(msg: impl Into<String>) -> Self {
        Error::ContractViolation(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}
