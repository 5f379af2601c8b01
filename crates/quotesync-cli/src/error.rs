use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] quotesync_core::ValidationError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("instrument '{0}' is not stored")]
    NotFound(String),

    #[error(transparent)]
    Ingest(#[from] quotesync_core::IngestError),

    #[error("http client error: {0}")]
    Transport(#[from] quotesync_core::HttpError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] quotesync_warehouse::WarehouseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Config(_) => 2,
            Self::NotFound(_) => 2,
            Self::Ingest(_) => 3,
            Self::Transport(_) => 3,
            Self::Serialization(_) => 4,
            Self::Storage(_) => 7,
            Self::Io(_) => 10,
        }
    }
}
