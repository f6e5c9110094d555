use thiserror::Error;

use crate::model::WindowId;

/// A rejected command. Nothing has been mutated when one of these is returned.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CommandError {
    #[error("a window id is required")]
    MissingId,
    #[error("window {0} not found")]
    NotFound(WindowId),
    #[error("window {0} has no snap binding")]
    NoBinding(WindowId),
    #[error("target window {0} not found")]
    TargetNotFound(WindowId),
    #[error("invalid params: {0}")]
    InvalidParams(String),
    #[error("unknown command {service}.{command}")]
    UnknownCommand { service: String, command: String },
}

impl CommandError {
    /// The symbolic code reported to the host.
    pub fn code(&self) -> &'static str {
        match self {
            CommandError::MissingId => "MISSING_ID",
            CommandError::NotFound(_) | CommandError::NoBinding(_) => "NOT_FOUND",
            CommandError::TargetNotFound(_) => "TARGET_NOT_FOUND",
            CommandError::InvalidParams(_) => "INVALID_PARAMS",
            CommandError::UnknownCommand { .. } => "UNKNOWN_COMMAND",
        }
    }
}

impl From<serde_json::Error> for CommandError {
    fn from(err: serde_json::Error) -> Self { CommandError::InvalidParams(err.to_string()) }
}
