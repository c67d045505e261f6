//! Rewrites C stub files produced by the stub generator into compilable C.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::Result;

pub const STUB_HEADER: &str = "#include \"petscsys.h\"\n#include \"petscfix.h\"\n#include \"petsc/private/fortranimpl.h\"\n";

enum Rule {
    Literal(&'static str, &'static str),
    Pattern(&'static str, &'static str),
}

/// Applied in order.
const RULES: &[Rule] = &[
    Rule::Literal("\nvoid ", "\nSLEPC_EXTERN void "),
    Rule::Literal("\nPetscErrorCode ", "\nSLEPC_EXTERN void "),
    Rule::Pattern(r"Petsc([ToRm]*)Pointer\(int\)", "Petsc${1}Pointer(void*)"),
    Rule::Literal(
        "PetscToPointer(a) (a)",
        "PetscToPointer(a) (*(PetscFortranAddr *)(a))",
    ),
    Rule::Literal(
        "PetscFromPointer(a) (int)(a)",
        "PetscFromPointer(a) (PetscFortranAddr)(a)",
    ),
    Rule::Literal("PetscToPointer( *(int*)", "PetscToPointer("),
    Rule::Literal("MPI_Comm comm", "MPI_Comm *comm"),
    Rule::Literal(
        "(MPI_Comm)PetscToPointer( (comm) )",
        "MPI_Comm_f2c(*(MPI_Fint*)(comm))",
    ),
    Rule::Literal("(PetscInt* )PetscToPointer", ""),
    Rule::Literal("(Tao* )PetscToPointer", ""),
    Rule::Literal("(TaoConvergedReason* )PetscToPointer", ""),
    Rule::Literal("(TaoLineSearch* )PetscToPointer", ""),
    Rule::Literal("(TaoLineSearchConvergedReason* )PetscToPointer", ""),
    Rule::Pattern(
        r"\b(PETSC|TAO)(_DLL|VEC_DLL|MAT_DLL|DM_DLL|KSP_DLL|SNES_DLL|TS_DLL|FORTRAN_DLL)(EXPORT)",
        "",
    ),
];

static PATTERNS: LazyLock<Vec<Option<Regex>>> = LazyLock::new(|| {
    RULES
        .iter()
        .map(|rule| match rule {
            Rule::Pattern(pattern, _) => {
                Some(Regex::new(pattern).expect("stub rewrite pattern must compile"))
            }
            Rule::Literal(..) => None,
        })
        .collect()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedStub {
    /// Rewritten source, without the include header.
    pub text: String,
    /// 1-based line and column of the first NUL character in the input.
    pub nul_at: Option<(usize, usize)>,
}

pub fn fix_stub_source(raw: &str) -> FixedStub {
    let nul_at = find_line_col(raw, '\0');
    let mut text = raw.replace('\0', "");
    for (rule, pattern) in RULES.iter().zip(PATTERNS.iter()) {
        text = match (rule, pattern) {
            (Rule::Literal(from, to), _) => text.replace(from, to),
            (Rule::Pattern(_, to), Some(re)) => re.replace_all(&text, *to).into_owned(),
            (Rule::Pattern(..), None) => text,
        };
    }
    FixedStub { text, nul_at }
}

/// Fixes a generated stub in place and prepends the standard includes.
pub fn fix_stub_file(path: &Path) -> Result<FixedStub> {
    let raw = String::from_utf8_lossy(&fs::read(path)?).into_owned();
    let fixed = fix_stub_source(&raw);
    if let Some((line, col)) = fixed.nul_at {
        tracing::warn!(
            "Found null character in generated Fortran stub file:\n  {}:{line}:{col}",
            path.display()
        );
    }
    fs::write(path, format!("{STUB_HEADER}{}", fixed.text))?;
    Ok(fixed)
}

/// Source a stub was generated from: `<dir>/ftn-auto/vecf.c` comes from
/// `<dir>/vec.c`. `None` when the stub is not inside an `ftn-auto` directory.
pub fn source_for_stub(stub: &Path) -> Option<PathBuf> {
    let gendir = stub.parent()?;
    if gendir.file_name()? != "ftn-auto" {
        return None;
    }
    let stem = stub.file_stem()?.to_str()?;
    let mut chars = stem.chars();
    chars.next_back()?;
    let mut name = chars.as_str().to_string();
    if let Some(ext) = stub.extension().and_then(|e| e.to_str()) {
        name.push('.');
        name.push_str(ext);
    }
    Some(gendir.parent()?.join(name))
}

fn find_line_col(text: &str, needle: char) -> Option<(usize, usize)> {
    text.split('\n').enumerate().find_map(|(idx, line)| {
        line.find(needle)
            .map(|byte| (idx + 1, line[..byte].chars().count() + 1))
    })
}
