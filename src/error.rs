use std::{io, path::PathBuf};

use async_openai::error::OpenAIError;
use thiserror::Error;
use tokio::task::JoinError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Remote call failed: {0}")]
    RemoteCallFailure(String),

    #[error("Open AI error: {0}")]
    OpenAI(#[from] OpenAIError),

    #[error("Resource unavailable: {}: {source}", path.display())]
    ResourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serde JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Dispatch task failed: {0}")]
    Join(#[from] JoinError),
}

impl Error {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfiguration(message.into())
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Error::RemoteCallFailure(message.into())
    }

    /// True for errors raised by a remote collaborator, which the failure
    /// policy may turn into per-item markers.
    pub fn is_remote_failure(&self) -> bool {
        matches!(self, Error::RemoteCallFailure(_) | Error::OpenAI(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = Error::invalid_config("batch_size must be positive");
        assert_eq!(
            error.to_string(),
            "Invalid configuration: batch_size must be positive"
        );

        let error = Error::remote("quota exceeded");
        assert_eq!(error.to_string(), "Remote call failed: quota exceeded");

        let error = Error::ResourceUnavailable {
            path: PathBuf::from("data_source/missing.txt"),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(
            error.to_string(),
            "Resource unavailable: data_source/missing.txt: not found"
        );
    }

    #[test]
    fn test_remote_classification() {
        assert!(Error::remote("boom").is_remote_failure());
        assert!(Error::OpenAI(OpenAIError::InvalidArgument("bad".into())).is_remote_failure());
        assert!(!Error::invalid_config("bad").is_remote_failure());
        assert!(!Error::Io(io::Error::new(io::ErrorKind::Other, "x")).is_remote_failure());
    }
}
