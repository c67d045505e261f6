//! Compiling and linking trial programs.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use crate::error::{CheckError, Result};
use crate::log::ConfigureLog;
use crate::program::TrialProgram;

/// Outcome of one link attempt. `output` holds the program source followed
/// by whatever the toolchain printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkAttempt {
    pub success: bool,
    pub output: String,
}

pub trait Linker {
    /// Compiles and links `program` with the extra linker `flags`.
    ///
    /// A program that fails to link is reported through
    /// [`LinkAttempt::success`]; `Err` is reserved for failures to run the
    /// toolchain at all.
    fn link(&self, program: &TrialProgram, flags: &[String]) -> Result<LinkAttempt>;
}

/// Links `program` and appends the full output to the log.
pub fn link_with_log(
    linker: &dyn Linker,
    log: &mut ConfigureLog,
    program: &TrialProgram,
    flags: &[String],
) -> Result<bool> {
    let attempt = linker.link(program, flags)?;
    log.write(&attempt.output)?;
    Ok(attempt.success)
}

const CHECKLINK_MAKEFILE: &str = "\
checklink: checklink.o
\t${CLINKER} -o checklink checklink.o ${TESTFLAGS} ${PETSC_KSP_LIB}
\t@${RM} -f checklink checklink.o
LOCDIR = ./
include ${PETSC_DIR}/lib/petsc/conf/variables
include ${PETSC_DIR}/lib/petsc/conf/rules
";

/// Links through PETSc's makefile rules in a private scratch directory, so
/// that the compiler, flags and libraries are exactly the ones PETSc uses.
pub struct MakeLinker {
    make: Vec<String>,
    petsc_dir: PathBuf,
    petsc_arch: String,
    scratch: TempDir,
}

impl MakeLinker {
    pub fn new(make: &str, petsc_dir: impl Into<PathBuf>, petsc_arch: &str) -> Result<Self> {
        let make: Vec<String> = make.split_whitespace().map(str::to_string).collect();
        if make.is_empty() {
            return Err(CheckError::InvalidPetsc("empty make command".into()));
        }
        let scratch = tempfile::Builder::new().prefix("slepc-checklink").tempdir()?;
        fs::write(scratch.path().join("makefile"), CHECKLINK_MAKEFILE)?;
        Ok(Self {
            make,
            petsc_dir: petsc_dir.into(),
            petsc_arch: petsc_arch.to_string(),
            scratch,
        })
    }

    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }
}

impl Linker for MakeLinker {
    fn link(&self, program: &TrialProgram, flags: &[String]) -> Result<LinkAttempt> {
        let dir = self.scratch.path();
        fs::write(dir.join("checklink.c"), program.source())?;

        let mut command = Command::new(&self.make[0]);
        command
            .args(&self.make[1..])
            .arg("-C")
            .arg(dir)
            .arg("checklink")
            .arg(format!("TESTFLAGS={}", flags.join(" ")))
            .env("PETSC_DIR", &self.petsc_dir)
            .env("PETSC_ARCH", &self.petsc_arch);
        tracing::debug!(?command, "linking trial program");

        let output = command.output().map_err(|source| CheckError::Spawn {
            command: self.make.join(" "),
            source,
        })?;

        let mut text = program.source().to_string();
        text.push_str(&String::from_utf8_lossy(&output.stdout));
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(LinkAttempt {
            success: output.status.success(),
            output: text,
        })
    }
}
