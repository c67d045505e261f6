//! Error types for slepc-ftnstubs

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StubError>;

/// A hand-written interface file that imports a whole PETSc module inside an
/// interface block instead of naming what it needs with `only:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadImport {
    pub text: String,
    pub line: usize,
    pub file: PathBuf,
}

impl fmt::Display for BadImport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Importing entire package: \"{}\" line {} file {}",
            self.text,
            self.line,
            self.file.display()
        )
    }
}

#[derive(Error, Debug)]
pub enum StubError {
    #[error("Specified path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Stub generator failed ({status})\nIn {}\n{output}", .dir.display())]
    Generator {
        dir: PathBuf,
        status: String,
        output: String,
    },

    #[error("Cannot place Fortran interfaces: no MANSEC in makefile of {}", .0.display())]
    UnknownMansec(PathBuf),

    #[error("{} hand-written interface(s) import an entire package", .0.len())]
    BadImports(Vec<BadImport>),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
