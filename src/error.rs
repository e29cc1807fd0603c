use crate::document::HostError;
use thiserror::Error;

/// Failures that abort a whole generation run.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FlowError {
    #[error("components page \"{name}\" not found")]
    MissingLibrary { name: String },

    #[error(transparent)]
    Host(#[from] HostError),
}
