use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Convention a Fortran compiler uses to turn a routine name into a linker
/// symbol. Variants are listed in the order they are probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mangling {
    /// `dgesdd` links as `dgesdd_`
    Underscore,
    /// `dgesdd` links as `DGESDD`
    Caps,
    /// `dgesdd` links as `dgesdd`
    Unmodified,
}

impl Mangling {
    pub const PROBE_ORDER: [Mangling; 3] =
        [Mangling::Underscore, Mangling::Caps, Mangling::Unmodified];

    pub fn apply(self, name: &str) -> String {
        let name = sanitize_symbol(name);
        match self {
            Mangling::Underscore => format!("{name}_"),
            Mangling::Caps => name.to_ascii_uppercase(),
            Mangling::Unmodified => name,
        }
    }

    pub fn apply_all<S: AsRef<str>>(self, names: &[S]) -> Vec<String> {
        names.iter().map(|n| self.apply(n.as_ref())).collect()
    }

    /// Suffix of the `SLEPC_<LIB>_HAVE_<SUFFIX>` macro written to the
    /// configuration header.
    pub fn define_suffix(self) -> &'static str {
        match self {
            Mangling::Underscore => "UNDERSCORE",
            Mangling::Caps => "CAPS",
            Mangling::Unmodified => "STDCALL",
        }
    }

    /// Interprets PETSc's BLAS/LAPACK mangling setting.
    pub fn from_petsc(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "underscore" => Mangling::Underscore,
            "caps" => Mangling::Caps,
            _ => Mangling::Unmodified,
        }
    }

    pub(crate) fn banner(self) -> &'static str {
        match self {
            Mangling::Underscore => "underscore",
            Mangling::Caps => "capital",
            Mangling::Unmodified => "unmodified",
        }
    }
}

impl Display for Mangling {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Mangling::Underscore => "underscore",
            Mangling::Caps => "caps",
            Mangling::Unmodified => "unmodified",
        };
        f.write_str(name)
    }
}

fn sanitize_symbol(name: &str) -> String {
    name.trim()
        .trim_end_matches('\0')
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
        .collect()
}
