use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScreenError {
    #[error("Missing ticker identity: {0}")]
    MissingIdentity(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Repository error: {0}")]
    RepositoryError(String),

    #[error("FX provider error: {0}")]
    FxError(String),

    #[error("Writer error: {0}")]
    WriterError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}
