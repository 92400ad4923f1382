use thiserror::Error;

#[derive(Error, Debug)]
pub enum BufferError {
    #[error("Invalid trajectory length: expected {expected}, got {actual}")]
    InvalidTrajectoryLength { expected: usize, actual: usize },

    #[error("Cannot add trajectory to immutable replay buffer")]
    ImmutableBufferError,

    #[error("Cannot sample from an empty replay buffer")]
    EmptyBufferError,

    #[error("Incompatible buffer shape: expected (L, W) = {expected:?}, found {actual:?}")]
    IncompatibleBufferShape {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Dimension mismatch in {field}: expected {expected}, got {actual}")]
    DimensionMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Corrupt buffer file: {0}")]
    CorruptFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type alias for buffer operations
pub type Result<T> = std::result::Result<T, BufferError>;
