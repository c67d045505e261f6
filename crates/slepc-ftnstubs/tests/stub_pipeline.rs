use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use slepc_ftnstubs::{
    BadImport, StubError, StubGenerator, generate_stubs, merge_interfaces, process_dir,
};

/// Writes one stub per C source and one interface block per source into the
/// module fragment, the way the real generator lays its output out.
#[derive(Default)]
struct FakeGenerator {
    calls: RefCell<Vec<(PathBuf, Vec<String>, String)>>,
}

impl StubGenerator for FakeGenerator {
    fn generate(
        &self,
        source_dir: &Path,
        out_dir: &Path,
        sources: &[String],
        module_file: &str,
    ) -> slepc_ftnstubs::Result<()> {
        self.calls.borrow_mut().push((
            source_dir.to_path_buf(),
            sources.to_vec(),
            module_file.to_string(),
        ));
        let mut module = String::new();
        for source in sources.iter().filter(|s| s.ends_with(".c")) {
            let stem = source.trim_end_matches(".c");
            fs::write(
                out_dir.join(format!("{stem}f.c")),
                format!("/* generated */\nvoid {stem}_(EPS *a, int *ierr)\n{{\n}}\n"),
            )?;
            module.push_str(&format!(
                "      subroutine {stem}(a,z)\n       EPS a ! EPS\n       integer z\n      end subroutine\n"
            ));
        }
        if !module.is_empty() {
            fs::write(source_dir.join(module_file), module)?;
        }
        Ok(())
    }
}

/// Fails on the directory whose name ends in `broken`.
struct FailingGenerator;

impl StubGenerator for FailingGenerator {
    fn generate(
        &self,
        source_dir: &Path,
        _out_dir: &Path,
        _sources: &[String],
        _module_file: &str,
    ) -> slepc_ftnstubs::Result<()> {
        if source_dir.ends_with("broken") {
            return Err(StubError::Generator {
                dir: source_dir.to_path_buf(),
                status: "exit status: 1".to_string(),
                output: "bfort: cannot parse broken.c\n".to_string(),
            });
        }
        Ok(())
    }
}

fn write(path: &Path, text: &str) {
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, text).expect("write");
}

fn slepc_tree() -> tempfile::TempDir {
    let root = tempfile::tempdir().expect("tempdir");
    let slepc = root.path();
    write(
        &slepc.join("src/eps/interface/makefile"),
        "CPPFLAGS =\nSOURCEC  = epsview.c epssolve.c\nLIBBASE  = libslepceps\nMANSEC   = EPS\n",
    );
    write(&slepc.join("src/eps/interface/epsview.c"), "/* view */\n");
    write(&slepc.join("src/eps/interface/epssolve.c"), "/* solve */\n");
    write(&slepc.join("src/eps/interface/#epssolve.c#"), "editor backup\n");
    write(&slepc.join("src/eps/interface/ftn-custom/zepsf.c"), "/* custom */\n");
    write(&slepc.join("src/eps/f90-mod/slepceps.h"), "      type tEPS\n      end type tEPS\n");
    root
}

#[test]
fn generates_fixes_stages_and_merges() {
    let root = slepc_tree();
    let slepc = root.path();
    let generator = FakeGenerator::default();

    let summary = generate_stubs(slepc, &generator, &slepc.join("src")).expect("generation runs");
    assert_eq!(summary.stubs, 2);

    let calls = generator.calls.borrow();
    assert!(calls.iter().all(|(dir, _, _)| !dir.ends_with("ftn-custom")));
    let interface_call = calls
        .iter()
        .find(|(dir, _, _)| dir.ends_with("src/eps/interface"))
        .expect("interface directory processed");
    assert_eq!(interface_call.1, vec!["epssolve.c", "epsview.c"]);
    assert_eq!(interface_call.2, "f90module0.f90");

    let stub_dir = slepc.join("src/eps/interface/ftn-auto");
    let stub = fs::read_to_string(stub_dir.join("epsviewf.c")).expect("stub written");
    assert!(stub.starts_with("#include \"petscsys.h\"\n"));
    assert!(stub.contains("\nSLEPC_EXTERN void epsview_(EPS *a, int *ierr)\n"));

    let makefile = fs::read_to_string(stub_dir.join("makefile")).expect("makefile written");
    assert!(makefile.contains("SOURCEC  = epssolvef.c epsviewf.c\n"));
    assert!(makefile.contains("LIBBASE  = libslepceps\n"));

    assert!(!slepc.join("src/eps/interface/f90module0.f90").exists());
    assert!(!slepc.join("src/eps/f90-mod/ftn-auto").exists());
    let staged = slepc.join("src/eps/f90-mod/ftn-auto-interfaces/eps-tmpdir/src_eps_interface.h90");
    assert!(staged.is_file());

    let report = merge_interfaces(slepc).expect("merge runs");
    let include = slepc.join("src/eps/f90-mod/ftn-auto-interfaces/slepceps.h90");
    assert_eq!(report.written, vec![include.clone()]);
    let merged = fs::read_to_string(&include).expect("include written");
    assert_eq!(
        merged,
        "      subroutine epssolve(a,z)\n       import tEPS\n       EPS a ! EPS\n       PetscErrorCode z\n      end subroutine\n\
         \x20     subroutine epsview(a,z)\n       import tEPS\n       EPS a ! EPS\n       PetscErrorCode z\n      end subroutine\n"
    );
    assert!(!staged.parent().expect("tmpdir").exists());
}

#[test]
fn sources_are_batched_by_ten() {
    let root = slepc_tree();
    let slepc = root.path();
    let dir = slepc.join("src/eps/impls/krylov");
    write(&dir.join("makefile"), "LIBBASE = libslepceps\nMANSEC = EPS\n");
    let names: Vec<String> = (0..12).map(|i| format!("k{i:02}.c")).collect();
    for name in &names {
        write(&dir.join(name), "");
    }

    let generator = FakeGenerator::default();
    let report = process_dir(slepc, &generator, &dir, &names)
        .expect("processing runs")
        .expect("directory has sources");
    assert_eq!(report.c_stubs.len(), 12);

    let calls = generator.calls.borrow();
    let modules: Vec<&str> = calls.iter().map(|(_, _, m)| m.as_str()).collect();
    assert_eq!(modules, vec!["f90module0.f90", "f90module10.f90"]);
    assert_eq!(calls[1].1, vec!["k10.c", "k11.c"]);
    let staged = fs::read_to_string(
        slepc.join("src/eps/f90-mod/ftn-auto-interfaces/eps-tmpdir/src_eps_impls_krylov.h90"),
    )
    .expect("fragments staged");
    assert_eq!(staged.matches("      subroutine").count(), 12);
}

#[test]
fn merge_refuses_whole_package_imports() {
    let root = slepc_tree();
    let slepc = root.path();
    let bad_file = slepc.join("src/sys/classes/st/f90-mod/slepcst.h90");
    write(
        &bad_file,
        "      interface\n        subroutine STGetOperator(a,b,z)\n          use petscmat\n        end subroutine\n      end interface\n",
    );

    let err = merge_interfaces(slepc).expect_err("bad import rejected");
    let bad = match err {
        StubError::BadImports(bad) => bad,
        other => panic!("expected bad imports, got {other}"),
    };
    assert_eq!(
        bad,
        vec![BadImport {
            text: "use petscmat".to_string(),
            line: 3,
            file: bad_file,
        }]
    );
}

#[test]
fn generator_failure_stops_the_walk() {
    let root = slepc_tree();
    let slepc = root.path();
    write(&slepc.join("src/eps/broken/broken.c"), "/* broken */\n");

    let err = generate_stubs(slepc, &FailingGenerator, &slepc.join("src")).expect_err("generator fails");
    match err {
        StubError::Generator { dir, output, .. } => {
            assert!(dir.ends_with("src/eps/broken"));
            assert!(output.contains("cannot parse broken.c"));
        }
        other => panic!("expected generator failure, got {other}"),
    }
    assert!(!slepc.join("src/eps/interface/ftn-auto").exists());
}
