use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Caller-supplied parameters were rejected before any derivation ran.
    #[error("{0}")]
    InvalidInput(String),

    /// A single hardware identifier source could not be read.
    #[error("probe {probe} unavailable: {reason}")]
    ProbeUnavailable { probe: &'static str, reason: String },

    #[error("key derivation failed: {0}")]
    Derivation(String),
}

impl Error {
    pub(crate) fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub(crate) fn probe(probe: &'static str, reason: impl ToString) -> Self {
        Self::ProbeUnavailable {
            probe,
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
