//! `slepc-config`: configure-time probes and Fortran stub post-processing.
//!
//! ```bash
//! # Normalize configure arguments and show what was understood
//! slepc-config args -- --prefix=/opt/slepc --download-primme --disable-cmake
//!
//! # Check the LAPACK routines available through PETSc
//! slepc-config check-lapack --out $PETSC_ARCH/include
//!
//! # Find a Fortran library and its name mangling
//! slepc-config check-lib --name ARPACK --libs "-lparpack -larpack" --function dsaupd
//!
//! # Generate and fix Fortran stubs, then merge the interface fragments
//! slepc-config stubs --bfort /usr/bin/bfort
//! slepc-config merge
//! ```

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use slepc_argdb::{ArgDb, ConfigureOptions, EXTERNAL_PACKAGES};
use slepc_check::{
    ConfigureLog, DetectedLibrary, LapackReport, MakeLinker, PetscFacts, check_lapack,
    find_fortran_library, install_dir_guesses,
};
use slepc_ftnstubs::{Bfort, GenerateSummary, MergeReport, generate_stubs, merge_interfaces};

const CONF_HEADER: &str = "slepcconf.h";
const VARIABLES_FILE: &str = "slepcvariables";
const CMAKE_FILE: &str = "SLEPcConfig.cmake";
const LOG_FILE: &str = "configure.log";

#[derive(Parser, Debug)]
#[command(name = "slepc-config")]
#[command(about = "Configure-time probes and Fortran stub tooling for SLEPc")]
#[command(version)]
struct Cli {
    /// Log debug output (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct PetscArgs {
    #[arg(long, env = "PETSC_DIR")]
    petsc_dir: PathBuf,

    #[arg(long, env = "PETSC_ARCH")]
    petsc_arch: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Normalize configure arguments and print the recognized options as JSON
    Args {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Check which LAPACK routines PETSc's LAPACK provides
    CheckLapack {
        #[command(flatten)]
        petsc: PetscArgs,

        /// Directory receiving slepcconf.h and configure.log
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },

    /// Locate a Fortran library and detect its name mangling
    CheckLib {
        #[command(flatten)]
        petsc: PetscArgs,

        /// Name used in the generated macros, e.g. ARPACK
        #[arg(long)]
        name: String,

        /// Directory to search; defaults to common install locations
        #[arg(long = "dir")]
        dirs: Vec<String>,

        /// Set of library flags to try, e.g. "-lparpack -larpack"
        #[arg(long = "libs", required = true, allow_hyphen_values = true)]
        libs: Vec<String>,

        /// Routine that must link, without mangling
        #[arg(long = "function", required = true)]
        functions: Vec<String>,

        /// Routine the library calls back into
        #[arg(long = "callback")]
        callbacks: Vec<String>,

        #[arg(long, default_value = ".")]
        out: PathBuf,
    },

    /// Generate Fortran stubs below a directory and fix them
    Stubs {
        #[arg(long, env = "SLEPC_DIR")]
        slepc_dir: PathBuf,

        /// Stub generator executable
        #[arg(long)]
        bfort: PathBuf,

        /// Directory to process; defaults to the current one
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Check hand-written interfaces and merge the generated ones
    Merge {
        #[arg(long, env = "SLEPC_DIR")]
        slepc_dir: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn append(path: &Path, text: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    file.write_all(text.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))
}

fn print_configure_help() {
    println!("Configure options:");
    println!("  --prefix=<dir>                      Installation directory");
    println!("  --with-clean=<bool>                 Delete prior build files");
    println!("  --with-cmake=<bool>                 Enable builds with CMake");
    println!("  --with-packages-download-dir=<dir>  Skip network downloads");
    for name in EXTERNAL_PACKAGES {
        println!("  --with-{name}-dir=<dir> / --with-{name}-flags=<flags> / --download-{name}[=<url>]");
    }
}

fn run_args(args: &[String]) -> Result<()> {
    let mut db = ArgDb::new(args);
    let options = ConfigureOptions::from_argdb(&mut db)?;
    if options.help {
        print_configure_help();
        return Ok(());
    }
    println!("{}", serde_json::to_string_pretty(&options)?);
    Ok(())
}

fn load_facts(petsc: &PetscArgs) -> Result<PetscFacts> {
    PetscFacts::load(&petsc.petsc_dir, &petsc.petsc_arch).with_context(|| {
        format!(
            "cannot read PETSc configuration from {}/{}",
            petsc.petsc_dir.display(),
            petsc.petsc_arch
        )
    })
}

fn print_lapack_report(report: &LapackReport) {
    println!("lapack_missing: {}", report.missing.len());
    if let Some(summary) = report.summary() {
        eprintln!("{summary}");
    }
}

fn run_check_lapack(petsc: &PetscArgs, out: &Path) -> Result<()> {
    let facts = load_facts(petsc)?;
    fs::create_dir_all(out).with_context(|| format!("failed to create {}", out.display()))?;
    let mut log = ConfigureLog::append(out.join(LOG_FILE))?;
    let linker = MakeLinker::new(&facts.make, &facts.dir, &facts.arch)?;

    let report = check_lapack(&linker, &mut log, &facts)?;
    append(&out.join(CONF_HEADER), &report.conf_defines())?;
    print_lapack_report(&report);
    Ok(())
}

fn print_library(found: &DetectedLibrary) {
    println!("library: {}", found.name);
    println!("mangling: {}", found.mangling);
    println!("flags: {}", found.flags.join(" "));
}

struct LibraryRequest<'a> {
    name: &'a str,
    dirs: &'a [String],
    libs: &'a [String],
    functions: &'a [String],
    callbacks: &'a [String],
}

fn run_check_lib(petsc: &PetscArgs, request: LibraryRequest<'_>, out: &Path) -> Result<()> {
    let facts = load_facts(petsc)?;
    fs::create_dir_all(out).with_context(|| format!("failed to create {}", out.display()))?;
    let mut log = ConfigureLog::append(out.join(LOG_FILE))?;
    let linker = MakeLinker::new(&facts.make, &facts.dir, &facts.arch)?;

    let dirs = if request.dirs.is_empty() {
        let home = std::env::var_os("HOME").map(PathBuf::from);
        install_dir_guesses(request.name, home.as_deref())
    } else {
        request.dirs.to_vec()
    };
    let lib_sets: Vec<Vec<String>> = request
        .libs
        .iter()
        .map(|set| set.split_whitespace().map(str::to_string).collect())
        .collect();

    let found = find_fortran_library(
        &linker,
        &mut log,
        request.name,
        &dirs,
        &lib_sets,
        request.functions,
        request.callbacks,
    )?;
    append(&out.join(CONF_HEADER), &found.conf_block())?;
    append(&out.join(VARIABLES_FILE), &found.variables_line())?;
    append(&out.join(CMAKE_FILE), &found.cmake_lines())?;
    print_library(&found);
    Ok(())
}

fn print_generate_summary(root: &Path, summary: &GenerateSummary) {
    println!("stubs_root: {}", root.display());
    println!("stub_directories: {}", summary.directories);
    println!("stub_files: {}", summary.stubs);
}

fn run_stubs(slepc_dir: &Path, bfort: &Path, root: Option<&Path>) -> Result<()> {
    let root = match root {
        Some(root) => root.to_path_buf(),
        None => std::env::current_dir().context("cannot determine current directory")?,
    };
    let generator = Bfort::new(bfort, slepc_dir);
    let summary = generate_stubs(slepc_dir, &generator, &root)?;
    print_generate_summary(&root, &summary);
    Ok(())
}

fn print_merge_report(report: &MergeReport) {
    println!("interfaces_written: {}", report.written.len());
    for path in &report.written {
        println!("  {}", path.display());
    }
}

fn run_merge(slepc_dir: &Path) -> Result<()> {
    let report = merge_interfaces(slepc_dir)?;
    print_merge_report(&report);
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Args { args } => run_args(&args),
        Command::CheckLapack { petsc, out } => run_check_lapack(&petsc, &out),
        Command::CheckLib {
            petsc,
            name,
            dirs,
            libs,
            functions,
            callbacks,
            out,
        } => run_check_lib(
            &petsc,
            LibraryRequest {
                name: &name,
                dirs: &dirs,
                libs: &libs,
                functions: &functions,
                callbacks: &callbacks,
            },
            &out,
        ),
        Command::Stubs {
            slepc_dir,
            bfort,
            root,
        } => run_stubs(&slepc_dir, &bfort, root.as_deref()),
        Command::Merge { slepc_dir } => run_merge(&slepc_dir),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ERROR: {err:#}");
            ExitCode::from(1)
        }
    }
}
