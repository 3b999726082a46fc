use std::path::PathBuf;
use thiserror::Error;

use crate::command::USAGE;

/// Errors that stop a command before any region is dumped.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid number of arguments. Usage: {}", USAGE)]
    Usage,

    #[error("Invalid target directory, directory does not exist: {}", .0.display())]
    InvalidTargetDirectory(PathBuf),

    #[error("Undefined command: \"{0}\"")]
    UnknownCommand(String),

    #[error(transparent)]
    Host(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
