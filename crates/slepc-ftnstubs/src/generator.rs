//! Invocation of the external stub generator.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Result, StubError};

/// Produces C stubs in `out_dir` for `sources` (file names relative to
/// `source_dir`) and writes the Fortran interface definitions to
/// `source_dir/<module_file>`.
pub trait StubGenerator {
    fn generate(
        &self,
        source_dir: &Path,
        out_dir: &Path,
        sources: &[String],
        module_file: &str,
    ) -> Result<()>;
}

const BFORT_OPTIONS: &[&str] = &[
    "-mnative",
    "-ansi",
    "-nomsgs",
    "-noprofile",
    "-anyname",
    "-mapptr",
    "-mpi",
    "-shortargname",
    "-ferr",
    "-ptrprefix",
    "Petsc",
    "-ptr64",
    "PETSC_USE_POINTER_CONVERSION",
    "-fcaps",
    "PETSC_HAVE_FORTRAN_CAPS",
    "-fuscore",
    "PETSC_HAVE_FORTRAN_UNDERSCORE",
    "-f90mod_skip_header",
    "-on_error_abort",
];

/// Sowing's `bfort`.
#[derive(Debug, Clone)]
pub struct Bfort {
    program: PathBuf,
    config_path: PathBuf,
}

impl Bfort {
    pub fn new(program: impl Into<PathBuf>, slepc_dir: &Path) -> Self {
        Self {
            program: program.into(),
            config_path: slepc_dir.join("lib").join("slepc").join("conf"),
        }
    }

    fn command(
        &self,
        source_dir: &Path,
        out_dir: &Path,
        sources: &[String],
        module_file: &str,
    ) -> Command {
        let mut command = Command::new(&self.program);
        command
            .current_dir(source_dir)
            .env("BFORT_CONFIG_PATH", &self.config_path)
            .arg("-dir")
            .arg(out_dir)
            .args(BFORT_OPTIONS)
            .args(sources)
            .arg("-f90modfile")
            .arg(module_file);
        command
    }
}

impl StubGenerator for Bfort {
    fn generate(
        &self,
        source_dir: &Path,
        out_dir: &Path,
        sources: &[String],
        module_file: &str,
    ) -> Result<()> {
        let mut command = self.command(source_dir, out_dir, sources, module_file);
        tracing::debug!(?command, "running stub generator");
        let output = command.output().map_err(|source| StubError::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;
        if output.status.success() {
            return Ok(());
        }
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Err(StubError::Generator {
            dir: source_dir.to_path_buf(),
            status: output.status.to_string(),
            output: text,
        })
    }
}
