//! Generation of the small C programs used as link probes.

use crate::mangling::Mangling;
use crate::petsc::Language;

/// Source of a trial program plus the symbols it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialProgram {
    source: String,
    functions: Vec<String>,
    callbacks: Vec<String>,
}

impl TrialProgram {
    /// Program that initializes PETSc, calls each of `functions` once and
    /// defines each of `callbacks` as a no-op returning zero. Names are
    /// emitted exactly as given.
    pub fn petsc<S: AsRef<str>>(functions: &[S], callbacks: &[S]) -> Self {
        let functions: Vec<String> = functions.iter().map(|f| f.as_ref().to_string()).collect();
        let callbacks: Vec<String> = callbacks.iter().map(|c| c.as_ref().to_string()).collect();

        let mut code = String::from("#include \"petscksp.h\"\nEXTERN_C_BEGIN\n");
        for f in &functions {
            code.push_str(&format!("extern int\n{f}();\n"));
        }
        code.push_str("EXTERN_C_END\n");
        for c in &callbacks {
            code.push_str(&format!("int {c}() {{ return 0; }} \n"));
        }
        code.push_str("int main() {\n");
        code.push_str("PetscInitialize(PETSC_NULL,PETSC_NULL,PETSC_NULL,PETSC_NULL);\n");
        code.push_str("VecCreate(PETSC_NULL,PETSC_NULL);\n");
        code.push_str("MatCreate(PETSC_NULL,PETSC_NULL);\n");
        code.push_str("KSPCreate(PETSC_NULL,PETSC_NULL);\n");
        for f in &functions {
            code.push_str(&format!("{f}();\n"));
        }
        code.push_str("return 0;\n}\n");

        Self {
            source: code,
            functions,
            callbacks,
        }
    }

    /// [`TrialProgram::petsc`] with every function and callback name
    /// rewritten by `mangling`.
    pub fn mangled<S: AsRef<str>>(functions: &[S], callbacks: &[S], mangling: Mangling) -> Self {
        Self::petsc(&mangling.apply_all(functions), &mangling.apply_all(callbacks))
    }

    /// Bare program calling BLAS/LAPACK routines; no PETSc headers involved.
    pub fn blas_lapack<S: AsRef<str>>(functions: &[S], language: Language) -> Self {
        let functions: Vec<String> = functions.iter().map(|f| f.as_ref().to_string()).collect();
        let mut code = String::new();
        for f in &functions {
            match language {
                Language::Cxx => code.push_str(&format!("extern \"C\" void {f}();\n")),
                Language::C => code.push_str(&format!("extern void {f}();\n")),
            }
        }
        code.push_str("int main() {\n");
        for f in &functions {
            code.push_str(&format!("{f}();\n"));
        }
        code.push_str("return 0;\n}\n");

        Self {
            source: code,
            functions,
            callbacks: Vec::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn functions(&self) -> &[String] {
        &self.functions
    }

    pub fn callbacks(&self) -> &[String] {
        &self.callbacks
    }
}
