//! Checking hand-written Fortran interfaces and merging the generated ones
//! into one include file per sub-section.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{BadImport, Result, StubError};
use crate::layout::{INTERFACES_DIR, all_mansec_dirs, submansec_of_fragment_dir};

/// PETSc derived types that generated interfaces may need to import.
pub const PETSC_DERIVED_TYPES: &[&str] = &[
    "tDM",
    "tVecScatter",
    "tKSPGuess",
    "tDMLabel",
    "tISColoring",
    "tIS",
    "tPetscSection",
    "PetscSFNode",
    "tPC",
    "tTSAdapt",
    "tPetscRandom",
    "tVecTagger",
    "tTSTrajectory",
    "tMatFDColoring",
    "tMat",
    "tTS",
    "tVec",
    "tMatNullSpace",
    "tPetscConvEst",
    "tPetscSubcomm",
    "tPetscSectionSym",
    "tPetscSF",
    "tKSP",
    "tPetscViewer",
    "tPetscOptions",
    "tSNES",
    "tDMPlexCellRefiner",
];

const SUBROUTINE_MARKER: &str = "      subroutine";

static INTERFACE_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*interface\b").expect("interface pattern must compile"));
static INTERFACE_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*end\s+interface\b").expect("end interface pattern must compile")
});

/// `use petsc...` lines without `only:` inside interface blocks of the
/// `.h90` and `.F90` files directly in `dir`.
pub fn check_hand_written_interfaces(dir: &Path) -> Result<Vec<BadImport>> {
    let mut bad = Vec::new();
    for path in files_with_extension(dir, &["h90", "F90"])? {
        let text = fs::read_to_string(&path)?;
        let mut in_block = false;
        for (idx, line) in text.lines().enumerate() {
            if INTERFACE_END.is_match(line) {
                in_block = false;
            } else if INTERFACE_START.is_match(line) {
                in_block = true;
            } else if in_block && line.contains("use petsc") && !line.contains("only:") {
                bad.push(BadImport {
                    text: line.trim().to_string(),
                    line: idx + 1,
                    file: path.clone(),
                });
            }
        }
    }
    Ok(bad)
}

/// Names declared with `type` in the `.h` files directly in `dir`.
/// Commented-out declarations are ignored.
pub fn collect_derived_types(dir: &Path, types: &mut BTreeSet<String>) -> Result<()> {
    for path in files_with_extension(dir, &["h"])? {
        let text = fs::read_to_string(&path)?;
        for line in text.lines().filter(|l| l.contains(" type ")) {
            let words: Vec<&str> = line.trim().split(' ').collect();
            if words.first().is_some_and(|w| w.contains('!')) {
                continue;
            }
            if let Some(pos) = words.iter().position(|w| *w == "type") {
                if let Some(name) = words.get(pos + 1).filter(|n| !n.is_empty()) {
                    types.insert(name.to_string());
                }
            }
        }
    }
    Ok(())
}

/// Rewrites one generated `subroutine` block for inclusion in a module.
pub fn rewrite_subroutine(block: &str, types: &BTreeSet<String>) -> String {
    let block = block
        .replace("integer z", "PetscErrorCode z")
        .replace("integer a ! MPI_Comm", "MPI_Comm a ! MPI_Comm");
    let imports: Vec<&str> = types
        .iter()
        .filter(|t| {
            let bare = t.get(1..).unwrap_or_default();
            !bare.is_empty() && block.contains(&format!(" {bare} "))
        })
        .map(String::as_str)
        .collect();
    if imports.is_empty() {
        block
    } else {
        block.replacen(')', &format!(")\n       import {}", imports.join(",")), 1)
    }
}

/// Merges the text of staged fragment files into module include text.
pub fn merge_fragments<S: AsRef<str>>(fragments: &[S], types: &BTreeSet<String>) -> String {
    let mut out = String::new();
    for fragment in fragments {
        for piece in fragment.as_ref().split(SUBROUTINE_MARKER).skip(1) {
            let block = format!("{SUBROUTINE_MARKER}{piece}");
            out.push_str(&rewrite_subroutine(&block, types));
        }
    }
    out
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub written: Vec<PathBuf>,
}

/// Validates the hand-written interfaces of every section, then merges each
/// `<sub>-tmpdir` staging directory into `slepc<sub>.h90` and removes it.
pub fn merge_interfaces(slepc_dir: &Path) -> Result<MergeReport> {
    let mansec_dirs: Vec<PathBuf> = all_mansec_dirs(slepc_dir)
        .into_iter()
        .filter(|d| {
            let present = d.is_dir();
            if !present {
                tracing::debug!("skipping missing {}", d.display());
            }
            present
        })
        .collect();

    let mut bad = Vec::new();
    let mut types = BTreeSet::new();
    for dir in &mansec_dirs {
        bad.extend(check_hand_written_interfaces(dir)?);
        collect_derived_types(dir, &mut types)?;
    }
    types.extend(PETSC_DERIVED_TYPES.iter().map(|t| t.to_string()));

    if !bad.is_empty() {
        for import in &bad {
            tracing::error!("{import}");
        }
        return Err(StubError::BadImports(bad));
    }

    let mut report = MergeReport::default();
    for dir in &mansec_dirs {
        let interfaces = dir.join(INTERFACES_DIR);
        if !interfaces.is_dir() {
            continue;
        }
        let mut staging: Vec<(String, PathBuf)> = Vec::new();
        for entry in fs::read_dir(&interfaces)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(sub) = submansec_of_fragment_dir(&name) {
                staging.push((sub.to_string(), entry.path()));
            }
        }
        staging.sort();

        for (sub, tmp) in staging {
            tracing::debug!("Processing F90 interface for {sub}");
            let mut fragments = Vec::new();
            for path in files_with_extension(&tmp, &["h90"])? {
                tracing::debug!("  Copying in {}", path.display());
                fragments.push(fs::read_to_string(&path)?);
            }
            let include = interfaces.join(format!("slepc{sub}.h90"));
            fs::write(&include, merge_fragments(&fragments, &types))?;
            fs::remove_dir_all(&tmp)?;
            report.written.push(include);
        }
    }
    Ok(report)
}

fn files_with_extension(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| extensions.contains(&e));
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
