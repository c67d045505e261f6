//! Configure-style argument database.
//!
//! Arguments are normalized once on construction so that every boolean
//! switch is spelled `--with-X=<value>`:
//!
//! - `--enable-X` becomes `--with-X=1`
//! - `--disable-X` and `--without-X` become `--with-X=0`
//! - a bare `--with-X` becomes `--with-X=1`
//!
//! Recognized keywords are then popped out of the database one by one. Whatever
//! is left at the end was not understood and is reported by
//! [`ArgDb::error_if_not_empty`].

mod options;

use thiserror::Error;

pub use options::{ConfigureOptions, Download, EXTERNAL_PACKAGES, PackageOptions};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgError {
    #[error("Invalid arguments {}\nUse -h for help", .0.join(" "))]
    Unrecognized(Vec<String>),
}

/// Value extracted by a `pop_*` call together with the number of entries
/// that matched the keyword. The value is the one of the last match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Popped<T> {
    pub value: T,
    pub hits: usize,
}

impl<T> Popped<T> {
    pub fn found(&self) -> bool {
        self.hits > 0
    }
}

/// Result of [`ArgDb::pop_url`]: `--download-X`, `--download-X=0` or
/// `--download-X=<url>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlValue {
    pub url: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgDb {
    args: Vec<String>,
}

impl ArgDb {
    /// Builds the database from arguments that do not include the program name.
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args = args
            .into_iter()
            .map(|arg| normalize(arg.as_ref()))
            .collect();
        Self { args }
    }

    pub fn remaining(&self) -> &[String] {
        &self.args
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn pop_string(&mut self, keyword: &str) -> Popped<String> {
        let prefix = format!("--{keyword}=");
        let matches = self.take_matching(|arg| arg.starts_with(&prefix));
        let value = matches
            .last()
            .map(|arg| value_of(arg).to_string())
            .unwrap_or_default();
        Popped {
            value,
            hits: matches.len(),
        }
    }

    /// Like [`ArgDb::pop_string`], with trailing `/` removed from the value.
    pub fn pop_path(&mut self, keyword: &str) -> Popped<String> {
        let popped = self.pop_string(keyword);
        Popped {
            value: popped.value.trim_end_matches('/').to_string(),
            hits: popped.hits,
        }
    }

    /// Matches `--keyword` with or without a value. The entry is disabled only
    /// when its value is `0`.
    pub fn pop_url(&mut self, keyword: &str) -> Popped<UrlValue> {
        let prefix = format!("--{keyword}");
        let matches = self.take_matching(|arg| arg.starts_with(&prefix));
        let value = match matches.last() {
            Some(arg) => UrlValue {
                url: arg
                    .split_once('=')
                    .map(|(_, v)| v.to_string())
                    .unwrap_or_default(),
                enabled: !arg.ends_with("=0"),
            },
            None => UrlValue::default(),
        };
        Popped {
            value,
            hits: matches.len(),
        }
    }

    pub fn pop_bool(&mut self, keyword: &str) -> Popped<bool> {
        let prefix = format!("--{keyword}=");
        let matches = self.take_matching(|arg| arg.starts_with(&prefix));
        let value = matches.last().is_some_and(|arg| !arg.ends_with("=0"));
        Popped {
            value,
            hits: matches.len(),
        }
    }

    /// Removes every help request (`--h*`, `-h*`, `-?*`).
    pub fn pop_help(&mut self) -> bool {
        let matches = self.take_matching(|arg| {
            arg.starts_with("--h") || arg.starts_with("-h") || arg.starts_with("-?")
        });
        !matches.is_empty()
    }

    pub fn error_if_not_empty(&self) -> Result<(), ArgError> {
        if self.args.is_empty() {
            Ok(())
        } else {
            Err(ArgError::Unrecognized(self.args.clone()))
        }
    }

    fn take_matching(&mut self, mut matches: impl FnMut(&str) -> bool) -> Vec<String> {
        let (taken, kept): (Vec<String>, Vec<String>) =
            self.args.drain(..).partition(|arg| matches(arg));
        self.args = kept;
        if !taken.is_empty() {
            tracing::trace!(?taken, "popped arguments");
        }
        taken
    }
}

/// Rewrites one argument into its canonical `--with-X=<value>` form.
pub fn normalize(arg: &str) -> String {
    if let Some(rest) = arg.strip_prefix("--enable") {
        if rest.contains('=') {
            format!("--with{rest}")
        } else {
            format!("--with{rest}=1")
        }
    } else if let Some(rest) = arg.strip_prefix("--disable") {
        negate(rest)
    } else if let Some(rest) = arg.strip_prefix("--without") {
        negate(rest)
    } else if arg.starts_with("--with") && !arg.contains('=') {
        format!("{arg}=1")
    } else {
        arg.to_string()
    }
}

fn negate(rest: &str) -> String {
    match rest.split_once('=') {
        None => format!("--with{rest}=0"),
        Some((name, "1")) => format!("--with{name}=0"),
        Some(_) => format!("--with{rest}"),
    }
}

fn value_of(arg: &str) -> &str {
    arg.split_once('=').map(|(_, v)| v).unwrap_or_default()
}
