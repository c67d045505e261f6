//! Error types for slepc-check

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CheckError>;

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("Unable to link with library {name}\nIn directories {}\nWith flags {}", .dirs.join(" "), .flags.join(" "))]
    LibraryNotFound {
        name: String,
        dirs: Vec<String>,
        flags: Vec<String>,
    },

    #[error("Failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Missing PETSc configuration file: {0}")]
    MissingPetscFile(PathBuf),

    #[error("Invalid PETSc configuration: {0}")]
    InvalidPetsc(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
