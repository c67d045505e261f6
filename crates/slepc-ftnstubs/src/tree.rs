//! Walking the source tree and managing `ftn-auto` stub directories.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use walkdir::WalkDir;

use crate::error::{Result, StubError};
use crate::fixer::{fix_stub_file, source_for_stub};
use crate::generator::StubGenerator;
use crate::layout::{fragment_dir, fragment_file_name};
use crate::makefile::MakefileInfo;

pub const STUB_DIR: &str = "ftn-auto";

/// Sources handed to one generator run.
const BATCH_SIZE: usize = 10;

const SOURCE_EXTENSIONS: &[&str] = &["c", "h", "cxx", "cu"];

const SKIPPED_DIRS: &[&str] = &[
    "SCCS",
    "output",
    "BitKeeper",
    "examples",
    "externalpackages",
    "bilinear",
    "ftn-auto",
    "ftn-auto-interfaces",
    "fortran",
    "bin",
    "maint",
    "ftn-custom",
    "config",
    "f90-custom",
    "ftn-kernels",
    "slepc",
];

static MODULE_FRAGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^f90module[0-9]+\.f90$").expect("fragment pattern must compile")
});

/// What [`fix_stub_dir`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StubDirReport {
    pub c_stubs: Vec<String>,
    pub interface_headers: Vec<String>,
    pub makefile_written: bool,
    pub removed: bool,
    /// Staged interface fragments appended to.
    pub fragments: Vec<PathBuf>,
}

/// Creates `dir`, or empties it if it already exists.
pub fn prepare_stub_dir(dir: &Path) -> Result<()> {
    if dir.exists() && !dir.is_dir() {
        return Err(StubError::NotADirectory(dir.to_path_buf()));
    }
    if !dir.exists() {
        fs::create_dir(dir)?;
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Fixes the stubs in a freshly generated `dir`, writes its makefile, and
/// stages the interface fragments the generator left in the parent.
pub fn fix_stub_dir(slepc_dir: &Path, dir: &Path) -> Result<StubDirReport> {
    let mut report = StubDirReport::default();
    let parent = dir.parent().unwrap_or(dir).to_path_buf();

    for name in sorted_file_names(dir)? {
        let path = dir.join(&name);
        match path.extension().and_then(|e| e.to_str()) {
            Some("c") | Some("cxx") => {
                fix_stub_file(&path)?;
                if let Some(source) = source_for_stub(&path) {
                    tracing::trace!(stub = %path.display(), source = %source.display(), "fixed stub");
                }
                report.c_stubs.push(name);
            }
            Some("h90") => report.interface_headers.push(name),
            _ => {}
        }
    }

    let makefile_path = parent.join("makefile");
    let info = if makefile_path.is_file() {
        MakefileInfo::parse(&fs::read_to_string(&makefile_path)?)
    } else {
        MakefileInfo::default()
    };

    if !report.c_stubs.is_empty() || !report.interface_headers.is_empty() {
        if !makefile_path.is_file() {
            tracing::error!("Error! missing file: {}", makefile_path.display());
            return Ok(report);
        }
        fs::write(dir.join("makefile"), info.stub_makefile(&report.c_stubs))?;
        report.makefile_written = true;
    }

    if dir.is_dir() && fs::read_dir(dir)?.next().is_none() {
        fs::remove_dir(dir)?;
        report.removed = true;
    }

    for name in sorted_file_names(&parent)? {
        if !MODULE_FRAGMENT.is_match(&name) {
            continue;
        }
        let fragment = parent.join(&name);
        tracing::debug!("Generating F90 interface for {}", fragment.display());
        let text = fs::read_to_string(&fragment)?;
        if !text.is_empty() {
            let (Some(mansec), Some(submansec)) = (&info.mansec, &info.submansec) else {
                return Err(StubError::UnknownMansec(parent));
            };
            let staging = fragment_dir(slepc_dir, mansec, submansec);
            fs::create_dir_all(&staging)?;
            let target = staging.join(fragment_file_name(slepc_dir, &parent));
            let mut out = OpenOptions::new().create(true).append(true).open(&target)?;
            out.write_all(text.as_bytes())?;
            if !report.fragments.contains(&target) {
                report.fragments.push(target);
            }
        }
        fs::remove_file(&fragment)?;
    }

    Ok(report)
}

/// Runs the generator over the sources of one directory and fixes the
/// result. Returns `None` when the directory has no sources.
pub fn process_dir(
    slepc_dir: &Path,
    generator: &dyn StubGenerator,
    dir: &Path,
    file_names: &[String],
) -> Result<Option<StubDirReport>> {
    let sources: Vec<String> = file_names
        .iter()
        .filter(|name| {
            Path::new(name)
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| SOURCE_EXTENSIONS.contains(&e))
        })
        .cloned()
        .collect();
    if sources.is_empty() {
        return Ok(None);
    }

    let out_dir = dir.join(STUB_DIR);
    prepare_stub_dir(&out_dir)?;
    for (batch, chunk) in sources.chunks(BATCH_SIZE).enumerate() {
        let module_file = format!("f90module{}.f90", batch * BATCH_SIZE);
        generator.generate(dir, &out_dir, chunk, &module_file)?;
    }
    fix_stub_dir(slepc_dir, &out_dir).map(Some)
}

/// Whether the walk should descend into `parent/name`.
pub fn keep_subdir(parent: &Path, name: &str) -> bool {
    if SKIPPED_DIRS.contains(&name) || name.starts_with('.') {
        return false;
    }
    // PETSC_ARCH-style build directories
    let candidate = parent.join(name);
    !(candidate.join("lib").join("slepc").is_dir()
        || candidate.join("lib").join("slepc-conf").is_dir()
        || candidate.join("conf").is_dir())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateSummary {
    pub directories: usize,
    pub stubs: usize,
}

/// Generates and fixes stubs for `root` and every source directory below it.
pub fn generate_stubs(
    slepc_dir: &Path,
    generator: &dyn StubGenerator,
    root: &Path,
) -> Result<GenerateSummary> {
    let mut summary = GenerateSummary::default();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            entry
                .path()
                .parent()
                .is_none_or(|parent| keep_subdir(parent, &name))
        });

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let names: Vec<String> = sorted_file_names(entry.path())?
            .into_iter()
            .filter(|name| !name.contains('#'))
            .collect();
        if let Some(report) = process_dir(slepc_dir, generator, entry.path(), &names)? {
            summary.directories += 1;
            summary.stubs += report.c_stubs.len();
        }
    }
    Ok(summary)
}

fn sorted_file_names(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}
