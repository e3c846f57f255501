use thiserror::Error;

/// Errors raised by the vault content repositories.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage connection error: {0}")]
    StorageConnection(String),
    #[error("Storage operation failed: {0}")]
    StorageOperationFailed(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),
}

impl From<turso::Error> for StoreError {
    fn from(err: turso::Error) -> Self {
        StoreError::StorageOperationFailed(err.to_string())
    }
}

/// Errors raised while talking to the citation model.
#[derive(Error, Debug)]
pub enum CitationError {
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
    #[error("Request to AI provider failed: {0}")]
    AiRequest(reqwest::Error),
    #[error("Failed to deserialize AI provider response: {0}")]
    AiDeserialization(reqwest::Error),
    #[error("AI provider returned an error: {0}")]
    AiApi(String),
    #[error("AI provider returned an empty citation")]
    EmptyResponse,
    #[error("No information provided for citation generation")]
    NothingToCite,
}

/// Errors raised when fanning out real-time events.
#[derive(Error, Debug)]
pub enum EventError {
    #[error("Event channel registry is unavailable: {0}")]
    Registry(String),
}
