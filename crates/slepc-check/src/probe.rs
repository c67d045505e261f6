//! Discovery of the Fortran name mangling used by a library.
//!
//! A library is probed by linking the same trial program three times, once
//! per [`Mangling`], in the order underscore, caps, unmodified. The first
//! convention that links wins.

use std::path::Path;

use crate::error::{CheckError, Result};
use crate::linker::Linker;
use crate::log::ConfigureLog;
use crate::mangling::Mangling;
use crate::program::TrialProgram;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Linked { mangling: Mangling, output: String },
    /// No convention linked; `output` accumulates every attempt.
    Failed { output: String },
}

impl ProbeOutcome {
    pub fn mangling(&self) -> Option<Mangling> {
        match self {
            ProbeOutcome::Linked { mangling, .. } => Some(*mangling),
            ProbeOutcome::Failed { .. } => None,
        }
    }

    pub fn output(&self) -> &str {
        match self {
            ProbeOutcome::Linked { output, .. } | ProbeOutcome::Failed { output } => output,
        }
    }
}

pub fn probe_mangling<S: AsRef<str>>(
    linker: &dyn Linker,
    functions: &[S],
    callbacks: &[S],
    flags: &[String],
) -> Result<ProbeOutcome> {
    let mut accumulated = format!("\n=== With linker flags: {}", flags.join(" "));

    for mangling in Mangling::PROBE_ORDER {
        let program = TrialProgram::mangled(functions, callbacks, mangling);
        let attempt = linker.link(&program, flags)?;
        let output = format!(
            "\n====== With {} Fortran names\n{}",
            mangling.banner(),
            attempt.output
        );
        if attempt.success {
            tracing::debug!(%mangling, "trial program linked");
            return Ok(ProbeOutcome::Linked { mangling, output });
        }
        accumulated.push_str(&output);
    }

    Ok(ProbeOutcome::Failed {
        output: accumulated,
    })
}

/// Directories worth trying when looking for library `name`, starting with
/// the empty entry that means "no `-L` flag". Only existing directories are
/// kept.
pub fn install_dir_guesses(name: &str, home: Option<&Path>) -> Vec<String> {
    let mut roots: Vec<String> = vec!["/usr/local".into(), "/opt".into()];
    if let Some(home) = home {
        roots.insert(0, home.to_string_lossy().into_owned());
    }

    let mut dirs = Vec::new();
    for root in &roots {
        dirs.push(format!("{root}/lib"));
        for variant in [name.to_string(), name.to_uppercase(), name.to_lowercase()] {
            dirs.push(format!("{root}/{variant}"));
            dirs.push(format!("{root}/{variant}/lib"));
            dirs.push(format!("{root}/lib/{variant}"));
        }
    }

    let mut guesses = vec![String::new()];
    for dir in dirs {
        if Path::new(&dir).exists() && !guesses.contains(&dir) {
            guesses.push(dir);
        }
    }
    guesses
}

/// A library that linked, with what is needed to write the configure
/// artifacts for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedLibrary {
    pub name: String,
    pub mangling: Mangling,
    /// Directory the library was found in; empty when no `-L` was needed.
    pub dir: String,
    pub libs: Vec<String>,
    pub flags: Vec<String>,
}

impl DetectedLibrary {
    /// Block for the configuration header.
    pub fn conf_block(&self) -> String {
        let name = &self.name;
        format!(
            "#ifndef SLEPC_HAVE_{name}\n#define SLEPC_HAVE_{name} 1\n#define SLEPC_{name}_HAVE_{} 1\n#endif\n\n",
            self.mangling.define_suffix()
        )
    }

    /// Line for the makefile variables file.
    pub fn variables_line(&self) -> String {
        format!("{}_LIB = {}\n", self.name, self.flags.join(" "))
    }

    pub fn cmake_lines(&self) -> String {
        let libnames: String = self
            .libs
            .iter()
            .map(|l| format!("{} ", l.strip_prefix("-l").unwrap_or(l)))
            .collect();
        format!(
            "set (SLEPC_HAVE_{name} YES)\nfind_library ({name}_LIB {libnames}HINTS {dir})\n",
            name = self.name,
            dir = self.dir
        )
    }
}

/// Tries every directory with every set of library flags until one links.
pub fn find_fortran_library<S: AsRef<str>>(
    linker: &dyn Linker,
    log: &mut ConfigureLog,
    name: &str,
    dirs: &[String],
    lib_sets: &[Vec<String>],
    functions: &[S],
    callbacks: &[S],
) -> Result<DetectedLibrary> {
    log.new_section(&format!("Checking {name} library..."))?;

    let mut diagnostics = String::new();
    for dir in dirs {
        for libs in lib_sets {
            let mut flags = Vec::with_capacity(libs.len() + 1);
            if !dir.is_empty() {
                flags.push(format!("-L{dir}"));
            }
            flags.extend(libs.iter().cloned());

            match probe_mangling(linker, functions, callbacks, &flags)? {
                ProbeOutcome::Linked { mangling, output } => {
                    log.write(&output)?;
                    return Ok(DetectedLibrary {
                        name: name.to_string(),
                        mangling,
                        dir: dir.clone(),
                        libs: libs.clone(),
                        flags,
                    });
                }
                ProbeOutcome::Failed { output } => diagnostics.push_str(&output),
            }
        }
    }

    log.write(&diagnostics)?;
    let err = CheckError::LibraryNotFound {
        name: name.to_string(),
        dirs: dirs.to_vec(),
        flags: lib_sets.iter().map(|l| l.join(" ")).collect(),
    };
    log.println(&format!("ERROR: {err}"))?;
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linker::LinkAttempt;
    use std::cell::RefCell;

    /// Links only when every referenced function is in `exports` and the
    /// flags contain `needs_flag` (if set). Records each attempt.
    struct FakeLinker {
        exports: Vec<&'static str>,
        needs_flag: Option<&'static str>,
        attempts: RefCell<Vec<Vec<String>>>,
    }

    impl FakeLinker {
        fn new(exports: &[&'static str]) -> Self {
            Self {
                exports: exports.to_vec(),
                needs_flag: None,
                attempts: RefCell::new(Vec::new()),
            }
        }
    }

    impl Linker for FakeLinker {
        fn link(&self, program: &TrialProgram, flags: &[String]) -> Result<LinkAttempt> {
            self.attempts.borrow_mut().push(program.functions().to_vec());
            let flag_ok = self
                .needs_flag
                .is_none_or(|needed| flags.iter().any(|f| f == needed));
            let success = flag_ok
                && program
                    .functions()
                    .iter()
                    .all(|f| self.exports.contains(&f.as_str()));
            Ok(LinkAttempt {
                success,
                output: format!("attempt {}\n", program.functions().join(",")),
            })
        }
    }

    #[test]
    fn stops_at_underscore_when_it_links() {
        let linker = FakeLinker::new(&["dsaupd_"]);
        let outcome = probe_mangling(&linker, &["dsaupd"], &[], &[]).expect("probe runs");
        assert_eq!(outcome.mangling(), Some(Mangling::Underscore));
        assert_eq!(linker.attempts.borrow().len(), 1);
        assert!(outcome.output().contains("====== With underscore Fortran names"));
    }

    #[test]
    fn tries_caps_then_unmodified_in_order() {
        let linker = FakeLinker::new(&["dsaupd"]);
        let outcome = probe_mangling(&linker, &["dsaupd"], &[], &[]).expect("probe runs");
        assert_eq!(outcome.mangling(), Some(Mangling::Unmodified));
        assert_eq!(
            *linker.attempts.borrow(),
            vec![vec!["dsaupd_"], vec!["DSAUPD"], vec!["dsaupd"]]
        );
        assert!(outcome.output().contains("====== With unmodified Fortran names"));
    }

    #[test]
    fn caps_short_circuits_before_unmodified() {
        let linker = FakeLinker::new(&["DSAUPD", "dsaupd"]);
        let outcome = probe_mangling(&linker, &["dsaupd"], &[], &[]).expect("probe runs");
        assert_eq!(outcome.mangling(), Some(Mangling::Caps));
        assert_eq!(linker.attempts.borrow().len(), 2);
    }

    #[test]
    fn failure_accumulates_all_three_attempts() {
        let linker = FakeLinker::new(&[]);
        let flags = vec!["-L/opt/lib".to_string(), "-larpack".to_string()];
        let outcome = probe_mangling(&linker, &["dsaupd"], &[], &flags).expect("probe runs");
        let ProbeOutcome::Failed { output } = outcome else {
            panic!("nothing should link");
        };
        assert!(output.starts_with("\n=== With linker flags: -L/opt/lib -larpack"));
        let underscore = output.find("With underscore").expect("underscore attempt");
        let caps = output.find("With capital").expect("caps attempt");
        let unmodified = output.find("With unmodified").expect("unmodified attempt");
        assert!(underscore < caps && caps < unmodified);
        assert!(output.contains("attempt dsaupd_\n"));
        assert!(output.contains("attempt DSAUPD\n"));
        assert!(output.contains("attempt dsaupd\n"));
    }

    #[test]
    fn guesses_start_with_empty_entry_and_keep_existing_dirs() {
        let home = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(home.path().join("arpack/lib")).expect("mkdir");
        std::fs::create_dir_all(home.path().join("lib")).expect("mkdir");

        let guesses = install_dir_guesses("arpack", Some(home.path()));
        let root = home.path().display().to_string();
        assert_eq!(guesses[0], "");
        assert_eq!(guesses[1], format!("{root}/lib"));
        assert!(guesses.contains(&format!("{root}/arpack")));
        assert!(guesses.contains(&format!("{root}/arpack/lib")));
        assert!(!guesses.contains(&format!("{root}/ARPACK")));
    }

    #[test]
    fn library_search_walks_dirs_and_lib_sets() {
        let linker = FakeLinker {
            exports: vec!["DSAUPD"],
            needs_flag: Some("-lparpack"),
            attempts: RefCell::new(Vec::new()),
        };
        let mut log = ConfigureLog::in_memory();
        let dirs = vec![String::new(), "/opt/arpack/lib".to_string()];
        let lib_sets = vec![
            vec!["-larpack".to_string()],
            vec!["-lparpack".to_string(), "-larpack".to_string()],
        ];
        let found = find_fortran_library(
            &linker,
            &mut log,
            "ARPACK",
            &dirs,
            &lib_sets,
            &["dsaupd"],
            &[],
        )
        .expect("library found");

        assert_eq!(found.mangling, Mangling::Caps);
        assert_eq!(found.dir, "");
        assert_eq!(found.flags, vec!["-lparpack", "-larpack"]);
        assert_eq!(
            found.conf_block(),
            "#ifndef SLEPC_HAVE_ARPACK\n#define SLEPC_HAVE_ARPACK 1\n#define SLEPC_ARPACK_HAVE_CAPS 1\n#endif\n\n"
        );
        assert_eq!(found.variables_line(), "ARPACK_LIB = -lparpack -larpack\n");
        assert_eq!(
            found.cmake_lines(),
            "set (SLEPC_HAVE_ARPACK YES)\nfind_library (ARPACK_LIB parpack arpack HINTS )\n"
        );
        assert!(log.captured().expect("memory").contains("Checking ARPACK library..."));
    }

    #[test]
    fn library_search_failure_names_everything() {
        let linker = FakeLinker::new(&[]);
        let mut log = ConfigureLog::in_memory();
        let dirs = vec![String::new(), "/opt/blzpack".to_string()];
        let lib_sets = vec![vec!["-lblzpack".to_string()]];
        let err = find_fortran_library(&linker, &mut log, "BLZPACK", &dirs, &lib_sets, &["blzdrd"], &[])
            .expect_err("nothing links");
        assert!(matches!(err, CheckError::LibraryNotFound { .. }));
        assert_eq!(linker.attempts.borrow().len(), 6);
        let text = log.captured().expect("memory");
        assert!(text.contains("=== With linker flags: -L/opt/blzpack -lblzpack"));
        assert!(text.contains("ERROR: Unable to link with library BLZPACK"));
    }
}
