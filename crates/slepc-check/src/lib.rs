//! Link probes used while configuring SLEPc.
//!
//! This crate provides:
//! - Fortran name-mangling discovery by linking trial programs
//! - a search for Fortran-convention libraries over candidate directories
//! - a check of the LAPACK routines available through PETSc
//! - the `configure.log` writer shared by all checks

mod error;
pub mod lapack;
mod linker;
mod log;
mod mangling;
pub mod petsc;
pub mod probe;
mod program;

pub use error::{CheckError, Result};
pub use lapack::{LapackReport, check_lapack, lapack_routines};
pub use linker::{LinkAttempt, Linker, MakeLinker, link_with_log};
pub use log::ConfigureLog;
pub use mangling::Mangling;
pub use petsc::{Language, PetscFacts, Precision, Scalar};
pub use probe::{
    DetectedLibrary, ProbeOutcome, find_fortran_library, install_dir_guesses, probe_mangling,
};
pub use program::TrialProgram;
