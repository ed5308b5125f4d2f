/// Core error types for the Stimscape engine.
use std::path::PathBuf;

/// A specialized Result type for Stimscape operations.
pub type StimResult<T> = Result<T, StimError>;

/// Top-level error type encompassing all Stimscape subsystems.
#[derive(Debug, thiserror::Error)]
pub enum StimError {
    /// Malformed or insufficient constraint parameters. Never retried.
    #[error("config error: {0}")]
    Config(String),

    /// Degenerate camera basis or a point at non-positive depth.
    #[error("geometry error: {0}")]
    Geometry(String),

    /// Rejection sampling ran out of attempts.
    #[error("placement error: {message} after {attempts} attempts")]
    Placement { message: String, attempts: usize },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("failed to load {path:?}: {message}")]
    Load { message: String, path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("toml error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("toml error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl StimError {
    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        StimError::Config(message.into())
    }

    /// Create a geometry error.
    pub fn geometry(message: impl Into<String>) -> Self {
        StimError::Geometry(message.into())
    }

    /// Create a placement (exhaustion) error.
    pub fn placement(message: impl Into<String>, attempts: usize) -> Self {
        StimError::Placement {
            message: message.into(),
            attempts,
        }
    }

    /// Create a load error for a file path.
    pub fn load(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        StimError::Load {
            message: message.into(),
            path: path.into(),
        }
    }

    /// True for the expected, retried-then-reported failure mode.
    pub fn is_placement(&self) -> bool {
        matches!(self, StimError::Placement { .. })
    }
}
