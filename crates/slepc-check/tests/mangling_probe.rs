use std::cell::RefCell;

use slepc_check::{
    ConfigureLog, LinkAttempt, Linker, Mangling, ProbeOutcome, Result, TrialProgram,
    find_fortran_library, probe_mangling,
};

/// Pretends to be a toolchain linking against a library compiled with a
/// fixed Fortran convention. Callbacks defined by the program satisfy the
/// library's references only when spelled the same way.
struct Toolchain {
    convention: Option<Mangling>,
    exported: Vec<&'static str>,
    required_callbacks: Vec<&'static str>,
    seen: RefCell<Vec<String>>,
}

impl Toolchain {
    fn new(convention: Option<Mangling>) -> Self {
        Self {
            convention,
            exported: vec!["dsaupd", "dseupd"],
            required_callbacks: vec!["matvec"],
            seen: RefCell::new(Vec::new()),
        }
    }
}

impl Linker for Toolchain {
    fn link(&self, program: &TrialProgram, _flags: &[String]) -> Result<LinkAttempt> {
        self.seen.borrow_mut().push(program.source().to_string());
        let success = self.convention.is_some_and(|m| {
            let exported = m.apply_all(&self.exported);
            let callbacks = m.apply_all(&self.required_callbacks);
            program.functions().iter().all(|f| exported.contains(f))
                && callbacks.iter().all(|c| program.callbacks().contains(c))
        });
        let output = if success {
            String::new()
        } else {
            "undefined reference\n".to_string()
        };
        Ok(LinkAttempt {
            success,
            output: format!("{}{}", program.source(), output),
        })
    }
}

#[test]
fn detects_each_convention() {
    for (convention, attempts) in [
        (Mangling::Underscore, 1),
        (Mangling::Caps, 2),
        (Mangling::Unmodified, 3),
    ] {
        let toolchain = Toolchain::new(Some(convention));
        let outcome = probe_mangling(&toolchain, &["dsaupd", "dseupd"], &["matvec"], &[])
            .expect("probe runs");
        assert_eq!(outcome.mangling(), Some(convention));
        assert_eq!(toolchain.seen.borrow().len(), attempts);
    }
}

#[test]
fn trial_programs_follow_probe_order() {
    let toolchain = Toolchain::new(None);
    let outcome =
        probe_mangling(&toolchain, &["dsaupd"], &["matvec"], &[]).expect("probe runs");
    assert!(matches!(outcome, ProbeOutcome::Failed { .. }));

    let seen = toolchain.seen.borrow();
    assert_eq!(seen.len(), 3);
    assert!(seen[0].contains("dsaupd_();") && seen[0].contains("int matvec_()"));
    assert!(seen[1].contains("DSAUPD();") && seen[1].contains("int MATVEC()"));
    assert!(seen[2].contains("\ndsaupd();") && seen[2].contains("int matvec()"));
    assert_eq!(outcome.output().matches("undefined reference").count(), 3);
}

#[test]
fn library_artifacts_for_underscore_library() {
    let toolchain = Toolchain::new(Some(Mangling::Underscore));
    let mut log = ConfigureLog::in_memory();
    let found = find_fortran_library(
        &toolchain,
        &mut log,
        "ARPACK",
        &[String::new()],
        &[vec!["-larpack".to_string()]],
        &["dsaupd"],
        &["matvec"],
    )
    .expect("library links");
    assert_eq!(found.mangling, Mangling::Underscore);
    assert!(found.conf_block().contains("#define SLEPC_ARPACK_HAVE_UNDERSCORE 1"));
    assert_eq!(found.variables_line(), "ARPACK_LIB = -larpack\n");
}
