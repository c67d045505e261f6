//! Post-processing of the Fortran glue generated for SLEPc.
//!
//! This crate provides:
//! - **Stub fixing**: turns the C stubs written by the stub generator into
//!   compilable C (`fixer`)
//! - **Stub directories**: prepares `ftn-auto` directories, writes their
//!   makefiles and stages the generated Fortran interface fragments (`tree`)
//! - **Interface merging**: validates hand-written interfaces and merges the
//!   staged fragments into one include file per sub-section (`interfaces`)

mod error;
pub mod fixer;
mod generator;
pub mod interfaces;
pub mod layout;
mod makefile;
pub mod tree;

pub use error::{BadImport, Result, StubError};
pub use fixer::{FixedStub, fix_stub_file, fix_stub_source, source_for_stub};
pub use generator::{Bfort, StubGenerator};
pub use interfaces::{
    MergeReport, check_hand_written_interfaces, collect_derived_types, merge_interfaces,
};
pub use makefile::MakefileInfo;
pub use tree::{
    GenerateSummary, StubDirReport, fix_stub_dir, generate_stubs, keep_subdir, prepare_stub_dir,
    process_dir,
};
