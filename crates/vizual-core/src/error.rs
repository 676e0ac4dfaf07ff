//! Error taxonomy shared by every vizual crate

use crate::model::{EdgeId, Locator};

#[derive(Debug, thiserror::Error)]
pub enum VizualError {
    /// No root, root is not a directory, unreadable config file or invalid glob.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("failed to read {locator}: {source}")]
    Io {
        locator: Locator,
        #[source]
        source: std::io::Error,
    },

    /// Symbol outline could not be produced.
    #[error("failed to resolve symbols for {locator}: {message}")]
    Resolution { locator: Locator, message: String },

    /// Debug adapter request failed or returned an unexpected body.
    #[error("debug adapter request '{command}' failed: {message}")]
    Protocol { command: String, message: String },

    #[error("edge {0} references a node that does not exist")]
    MissingEndpoint(EdgeId),
}

impl VizualError {
    pub fn protocol(command: impl Into<String>, message: impl ToString) -> Self {
        VizualError::Protocol {
            command: command.into(),
            message: message.to_string(),
        }
    }

    pub fn resolution(locator: &Locator, message: impl ToString) -> Self {
        VizualError::Resolution {
            locator: locator.clone(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, VizualError>;
