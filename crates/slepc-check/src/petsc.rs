//! PETSc configuration facts needed by the link probes.
//!
//! The facts come from two files PETSc's own configure leaves in
//! `$PETSC_DIR/$PETSC_ARCH`: the `petscvariables` makefile fragment and the
//! `petscconf.h` header.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CheckError, Result};
use crate::mangling::Mangling;

/// Language PETSc was compiled with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    C,
    Cxx,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Scalar {
    #[default]
    Real,
    Complex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Precision {
    Single,
    #[default]
    Double,
    Quad,
}

impl Precision {
    /// Prefix of the LAPACK routine names for this precision.
    pub fn lapack_prefix(&self, scalar: Scalar) -> char {
        match (scalar, self) {
            (Scalar::Real, Precision::Single) => 's',
            (Scalar::Real, Precision::Double) => 'd',
            (Scalar::Real, Precision::Quad) => 'q',
            (Scalar::Complex, Precision::Single) => 'c',
            (Scalar::Complex, Precision::Double) => 'z',
            (Scalar::Complex, Precision::Quad) => 'w',
        }
    }

    pub fn petsc_name(&self) -> &'static str {
        match self {
            Precision::Single => "single",
            Precision::Double => "double",
            Precision::Quad => "__float128",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetscFacts {
    pub dir: PathBuf,
    pub arch: String,
    /// Make program, possibly with arguments.
    pub make: String,
    pub language: Language,
    pub scalar: Scalar,
    pub precision: Precision,
    pub blaslapack_mangling: Mangling,
}

impl PetscFacts {
    pub fn conf_dir(dir: &Path, arch: &str) -> PathBuf {
        dir.join(arch).join("lib").join("petsc").join("conf")
    }

    pub fn load(dir: impl AsRef<Path>, arch: &str) -> Result<Self> {
        let dir = dir.as_ref();
        let variables_path = Self::conf_dir(dir, arch).join("petscvariables");
        let header_path = dir.join(arch).join("include").join("petscconf.h");
        let variables = read_required(&variables_path)?;
        let header = read_required(&header_path)?;
        let mut facts = Self::from_sources(&variables, &header)?;
        facts.dir = dir.to_path_buf();
        facts.arch = arch.to_string();
        tracing::debug!(?facts, "loaded PETSc configuration");
        Ok(facts)
    }

    /// Builds the facts from the text of `petscvariables` and `petscconf.h`.
    pub fn from_sources(variables: &str, header: &str) -> Result<Self> {
        let variables = parse_variables(variables);
        let defines = parse_defines(header);
        let defined = |name: &str| defines.get(name).is_some_and(|v| v != "0");

        let make = variables
            .get("MAKE")
            .filter(|m| !m.is_empty())
            .cloned()
            .ok_or_else(|| CheckError::InvalidPetsc("MAKE is not set in petscvariables".into()))?;

        let language = if defined("PETSC_CLANGUAGE_CXX") {
            Language::Cxx
        } else {
            Language::C
        };
        let scalar = if defined("PETSC_USE_COMPLEX") {
            Scalar::Complex
        } else {
            Scalar::Real
        };
        let precision = if defined("PETSC_USE_REAL_SINGLE") {
            Precision::Single
        } else if defined("PETSC_USE_REAL___FLOAT128") {
            Precision::Quad
        } else {
            Precision::Double
        };
        let blaslapack_mangling = if defined("PETSC_BLASLAPACK_UNDERSCORE") {
            Mangling::Underscore
        } else if defined("PETSC_BLASLAPACK_CAPS") {
            Mangling::Caps
        } else {
            Mangling::Unmodified
        };

        Ok(Self {
            dir: PathBuf::new(),
            arch: String::new(),
            make,
            language,
            scalar,
            precision,
            blaslapack_mangling,
        })
    }
}

fn read_required(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(CheckError::MissingPetscFile(path.to_path_buf()));
    }
    Ok(fs::read_to_string(path)?)
}

/// `KEY = VALUE` lines of a makefile fragment. Later assignments win.
fn parse_variables(text: &str) -> BTreeMap<String, String> {
    text.lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            (
                key.trim().trim_end_matches(':').trim().to_string(),
                value.trim().to_string(),
            )
        })
        .filter(|(key, _)| !key.is_empty() && !key.contains(char::is_whitespace))
        .collect()
}

fn parse_defines(text: &str) -> BTreeMap<String, String> {
    text.lines()
        .filter_map(|line| {
            let mut words = line.split_whitespace();
            match (words.next(), words.next()) {
                (Some("#define"), Some(name)) => {
                    Some((name.to_string(), words.collect::<Vec<_>>().join(" ")))
                }
                _ => None,
            }
        })
        .collect()
}
