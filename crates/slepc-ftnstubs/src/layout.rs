//! Where Fortran module sources live in the SLEPc tree.

use std::path::{Path, PathBuf};

/// Manual sections whose sources live under `src/sys/classes`.
pub const CLASS_MANSECS: &[&str] = &["bv", "ds", "fn", "rg", "st"];

/// Manual sections with their own top-level directory under `src`.
pub const SOLVER_MANSECS: &[&str] = &["sys", "eps", "svd", "pep", "nep", "mfn", "lme"];

pub const INTERFACES_DIR: &str = "ftn-auto-interfaces";

const TMPDIR_SUFFIX: &str = "-tmpdir";

/// `f90-mod` directory holding the Fortran module of `mansec`.
pub fn mansec_dir(slepc_dir: &Path, mansec: &str) -> PathBuf {
    if CLASS_MANSECS.contains(&mansec) {
        slepc_dir
            .join("src")
            .join("sys")
            .join("classes")
            .join(mansec)
            .join("f90-mod")
    } else {
        slepc_dir.join("src").join(mansec).join("f90-mod")
    }
}

/// Every `f90-mod` directory, classes first.
pub fn all_mansec_dirs(slepc_dir: &Path) -> Vec<PathBuf> {
    CLASS_MANSECS
        .iter()
        .chain(SOLVER_MANSECS)
        .map(|m| mansec_dir(slepc_dir, m))
        .collect()
}

/// Staging directory collecting the fragments of one sub-section.
pub fn fragment_dir(slepc_dir: &Path, mansec: &str, submansec: &str) -> PathBuf {
    mansec_dir(slepc_dir, mansec)
        .join(INTERFACES_DIR)
        .join(format!("{submansec}{TMPDIR_SUFFIX}"))
}

pub fn submansec_of_fragment_dir(name: &str) -> Option<&str> {
    name.strip_suffix(TMPDIR_SUFFIX).filter(|s| !s.is_empty())
}

/// Name of the staged fragment for a source directory: its path relative to
/// the SLEPc root with separators replaced by `_`.
pub fn fragment_file_name(slepc_dir: &Path, source_dir: &Path) -> String {
    let rel = source_dir.strip_prefix(slepc_dir).unwrap_or(source_dir);
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    format!("{}.h90", parts.join("_"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_and_solver_sections() {
        let root = Path::new("/slepc");
        assert_eq!(
            mansec_dir(root, "st"),
            PathBuf::from("/slepc/src/sys/classes/st/f90-mod")
        );
        assert_eq!(mansec_dir(root, "eps"), PathBuf::from("/slepc/src/eps/f90-mod"));
        assert_eq!(all_mansec_dirs(root).len(), 12);
    }

    #[test]
    fn fragment_locations() {
        let root = Path::new("/slepc");
        assert_eq!(
            fragment_dir(root, "eps", "eps"),
            PathBuf::from("/slepc/src/eps/f90-mod/ftn-auto-interfaces/eps-tmpdir")
        );
        assert_eq!(
            fragment_file_name(root, Path::new("/slepc/src/eps/interface")),
            "src_eps_interface.h90"
        );
        assert_eq!(submansec_of_fragment_dir("bv-tmpdir"), Some("bv"));
        assert_eq!(submansec_of_fragment_dir("slepcbv.h90"), None);
    }
}
