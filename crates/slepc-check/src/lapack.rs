//! Check that the LAPACK PETSc links against provides every routine SLEPc
//! calls.

use crate::error::Result;
use crate::linker::{Linker, link_with_log};
use crate::log::ConfigureLog;
use crate::petsc::{PetscFacts, Scalar};
use crate::program::TrialProgram;

/// Routines used in both real and complex builds.
const COMMON: &[&str] = &[
    "laev2", "gehrd", "lanhs", "lange", "trexc", "trevc", "geevx", "gees", "ggev", "ggevx",
    "gelqf", "geqp3", "gesdd", "tgexc", "tgevc", "pbtrf", "stedc", "hsein", "larfg", "larf",
    "lacpy", "lascl", "lansy", "laset", "trsyl", "trtri",
];

const REAL_ONLY_NAMES: &[&str] = &[
    "orghr", "syevr", "syevd", "sytrd", "sygv", "sygvd", "ormlq", "orgtr",
];

const COMPLEX_ONLY_NAMES: &[&str] = &[
    "unghr", "heevr", "heevd", "hetrd", "hegv", "hegvd", "unmlq", "ungtr",
];

/// Routines always called in their real version.
const ALWAYS_REAL: &[&str] = &[
    "stevr", "bdsdc", "lamch", "lag2", "lasv2", "lartg", "laln2", "laed4", "lamrg", "lapy2",
];

/// Complex routines are reported under the name of their real counterpart.
fn real_counterpart(name: &str) -> &str {
    COMPLEX_ONLY_NAMES
        .iter()
        .position(|c| *c == name)
        .map(|i| REAL_ONLY_NAMES[i])
        .unwrap_or(name)
}

/// Full, prefixed names of the routines to check for the given build.
pub fn lapack_routines(facts: &PetscFacts) -> Vec<String> {
    let (scalar, precision) = (facts.scalar, facts.precision);
    let prefix = precision.lapack_prefix(scalar);
    let specific = match scalar {
        Scalar::Real => REAL_ONLY_NAMES,
        Scalar::Complex => COMPLEX_ONLY_NAMES,
    };
    let real_prefix = precision.lapack_prefix(Scalar::Real);

    COMMON
        .iter()
        .chain(specific)
        .map(|name| format!("{prefix}{name}"))
        .chain(ALWAYS_REAL.iter().map(|name| format!("{real_prefix}{name}")))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LapackReport {
    /// Prefixed routine names that failed to link.
    pub missing: Vec<String>,
}

impl LapackReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// `SLEPC_MISSING_LAPACK_<NAME>` defines for the configuration header.
    pub fn conf_defines(&self) -> String {
        self.missing
            .iter()
            .map(|routine| {
                let bare = routine.get(1..).unwrap_or_default();
                format!(
                    "#define SLEPC_MISSING_LAPACK_{} 1\n",
                    real_counterpart(bare).to_uppercase()
                )
            })
            .collect()
    }

    /// Warning shown at the end of configure, `None` when nothing is missing.
    pub fn summary(&self) -> Option<String> {
        if self.is_complete() {
            return None;
        }
        Some(format!(
            "LAPACK missing functions:\n  {}\n\n\
             WARNING: Some SLEPc functionality will not be available\n\
             PLEASE reconfigure and recompile PETSc with a full LAPACK implementation",
            self.missing.join(" ")
        ))
    }
}

/// Links all routines at once and, if that fails, one at a time to find
/// which ones are missing.
pub fn check_lapack(
    linker: &dyn Linker,
    log: &mut ConfigureLog,
    facts: &PetscFacts,
) -> Result<LapackReport> {
    log.new_section("Checking LAPACK library...")?;

    let routines = lapack_routines(facts);
    let mangling = facts.blaslapack_mangling;
    let no_flags: &[String] = &[];

    log.write("=== Checking all LAPACK functions...")?;
    let all = TrialProgram::blas_lapack(&mangling.apply_all(&routines), facts.language);
    if link_with_log(linker, log, &all, no_flags)? {
        return Ok(LapackReport::default());
    }

    let mut report = LapackReport::default();
    for routine in &routines {
        log.write(&format!("=== Checking LAPACK {routine} function..."))?;
        let program = TrialProgram::blas_lapack(&[mangling.apply(routine)], facts.language);
        if !link_with_log(linker, log, &program, no_flags)? {
            tracing::warn!(routine = routine.as_str(), "LAPACK routine missing");
            report.missing.push(routine.clone());
        }
    }
    Ok(report)
}
