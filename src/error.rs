/// Engine-level errors.
///
/// Sparse data (no history, no preferences, no similar actors) is never an
/// error; these variants cover contract violations and the I/O boundary.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("Invalid actor id: {0:?}")]
    InvalidActorId(String),

    #[error("Invalid item id: {0:?}")]
    InvalidItemId(String),

    #[error("Invalid trait rule {trait_id:?}: {reason}")]
    InvalidTraitRule { trait_id: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
