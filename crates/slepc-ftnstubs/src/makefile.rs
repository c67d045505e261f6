//! What a stub directory needs to know from the makefile of the source
//! directory it was generated from.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MakefileInfo {
    /// Whole `CPPFLAGS` line, copied verbatim.
    pub cppflags: String,
    /// Whole `LIBBASE` line, copied verbatim.
    pub libbase: String,
    pub mansec: Option<String>,
    /// Sub-section used to group interface fragments.
    pub submansec: Option<String>,
}

impl MakefileInfo {
    pub fn parse(text: &str) -> Self {
        let mut info = Self::default();
        let mut submansec = None;
        let mut bfort_submansec = None;

        for line in text.lines() {
            if line.contains("CPPFLAGS") {
                info.cppflags = line.to_string();
            }
            if line.contains("LIBBASE") {
                info.libbase = line.to_string();
            } else if line.contains("BFORTSUBMANSEC") {
                bfort_submansec = assigned_value(line);
            } else if line.contains("SUBMANSEC") {
                submansec = assigned_value(line);
            } else if line.contains("MANSEC") {
                info.mansec = assigned_value(line);
            }
        }

        info.submansec = bfort_submansec.or(submansec).or_else(|| info.mansec.clone());
        info
    }

    /// Makefile written into the stub directory.
    pub fn stub_makefile<S: AsRef<str>>(&self, c_sources: &[S]) -> String {
        let sources: Vec<&str> = c_sources.iter().map(|s| s.as_ref()).collect();
        let mut out = String::from("\n");
        out.push_str("#requiresdefine   'PETSC_HAVE_FORTRAN'\n");
        out.push_str("ALL: lib\n");
        out.push_str(&self.cppflags);
        out.push('\n');
        out.push_str(&format!("SOURCEC  = {}\n", sources.join(" ")));
        out.push_str(&self.libbase);
        out.push('\n');
        out.push_str("include ${SLEPC_DIR}/lib/slepc/conf/slepc_common\n");
        out
    }
}

fn assigned_value(line: &str) -> Option<String> {
    line.split_once('=')
        .map(|(_, value)| value.trim().to_lowercase())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_sections_and_flags() {
        let info = MakefileInfo::parse(
            "CFLAGS   =\nCPPFLAGS = -I../impls\nSOURCEC  = epsview.c\nLIBBASE  = libslepceps\nMANSEC   = EPS\nSUBMANSEC = ST\n",
        );
        assert_eq!(info.cppflags, "CPPFLAGS = -I../impls");
        assert_eq!(info.libbase, "LIBBASE  = libslepceps");
        assert_eq!(info.mansec.as_deref(), Some("eps"));
        assert_eq!(info.submansec.as_deref(), Some("st"));
    }

    #[test]
    fn submansec_defaults_to_mansec() {
        let info = MakefileInfo::parse("MANSEC = PEP\n");
        assert_eq!(info.submansec.as_deref(), Some("pep"));
    }

    #[test]
    fn bfort_submansec_wins() {
        let info = MakefileInfo::parse("MANSEC = Sys\nBFORTSUBMANSEC = BV\nSUBMANSEC = DS\n");
        assert_eq!(info.mansec.as_deref(), Some("sys"));
        assert_eq!(info.submansec.as_deref(), Some("bv"));
    }

    #[test]
    fn writes_stub_makefile() {
        let info = MakefileInfo {
            cppflags: String::new(),
            libbase: "LIBBASE  = libslepcnep".to_string(),
            mansec: Some("nep".to_string()),
            submansec: Some("nep".to_string()),
        };
        assert_eq!(
            info.stub_makefile(&["nepsolvef.c", "nepviewf.c"]),
            "\n#requiresdefine   'PETSC_HAVE_FORTRAN'\nALL: lib\n\nSOURCEC  = nepsolvef.c nepviewf.c\nLIBBASE  = libslepcnep\ninclude ${SLEPC_DIR}/lib/slepc/conf/slepc_common\n"
        );
    }
}
