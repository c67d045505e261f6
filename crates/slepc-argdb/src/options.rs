//! Typed view of the options understood by the configure script.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{ArgDb, ArgError};

/// External packages that can be enabled, located or downloaded.
pub const EXTERNAL_PACKAGES: &[&str] = &[
    "arpack",
    "blopex",
    "blzpack",
    "evsl",
    "primme",
    "trlan",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Download {
    /// Explicit tarball location; `None` means the package default.
    pub url: Option<String>,
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageOptions {
    pub name: String,
    /// Value of `--with-<name>`, if given.
    pub requested: Option<bool>,
    pub dir: Option<PathBuf>,
    pub flags: Vec<String>,
    pub download: Option<Download>,
}

impl PackageOptions {
    fn pop(db: &mut ArgDb, name: &str, repeated: &mut Vec<String>) -> Self {
        let mut note = |keyword: String, hits: usize| {
            if hits > 1 {
                repeated.push(keyword);
            }
        };

        let dir_key = format!("with-{name}-dir");
        let dir = db.pop_path(&dir_key);
        note(dir_key, dir.hits);

        let flags_key = format!("with-{name}-flags");
        let flags = db.pop_string(&flags_key);
        note(flags_key, flags.hits);

        let with_key = format!("with-{name}");
        let with = db.pop_bool(&with_key);
        note(with_key, with.hits);

        let download_key = format!("download-{name}");
        let download = db.pop_url(&download_key);
        note(download_key, download.hits);

        Self {
            name: name.to_string(),
            requested: with.found().then_some(with.value),
            dir: dir.found().then(|| PathBuf::from(dir.value)),
            flags: flags.value.split_whitespace().map(str::to_string).collect(),
            download: download.found().then(|| Download {
                url: (!download.value.url.is_empty()).then_some(download.value.url),
                enabled: download.value.enabled,
            }),
        }
    }

    /// A package is wanted when it was asked for explicitly, located, or
    /// downloaded, unless `--with-<name>=0` turned it off.
    pub fn is_enabled(&self) -> bool {
        match self.requested {
            Some(value) => value,
            None => {
                self.dir.is_some()
                    || !self.flags.is_empty()
                    || self.download.as_ref().is_some_and(|d| d.enabled)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigureOptions {
    pub help: bool,
    pub prefix: Option<PathBuf>,
    pub clean: bool,
    pub cmake: bool,
    pub packages_download_dir: Option<PathBuf>,
    pub packages: Vec<PackageOptions>,
    /// Keywords given more than once; the last occurrence won.
    pub repeated: Vec<String>,
}

impl ConfigureOptions {
    /// Pops every known keyword. Leftover arguments are an error unless help
    /// was requested.
    pub fn from_argdb(db: &mut ArgDb) -> Result<Self, ArgError> {
        let mut options = Self {
            help: db.pop_help(),
            ..Self::default()
        };

        let prefix = db.pop_path("prefix");
        if prefix.hits > 1 {
            options.repeated.push("prefix".to_string());
        }
        options.prefix = prefix.found().then(|| PathBuf::from(prefix.value));

        options.clean = db.pop_bool("with-clean").value;
        options.cmake = db.pop_bool("with-cmake").value;

        let download_dir = db.pop_path("with-packages-download-dir");
        options.packages_download_dir = download_dir
            .found()
            .then(|| PathBuf::from(download_dir.value));

        for name in EXTERNAL_PACKAGES {
            options
                .packages
                .push(PackageOptions::pop(db, name, &mut options.repeated));
        }

        for keyword in &options.repeated {
            tracing::warn!(keyword = keyword.as_str(), "option given more than once, using the last value");
        }

        if !options.help {
            db.error_if_not_empty()?;
        }
        Ok(options)
    }

    pub fn package(&self, name: &str) -> Option<&PackageOptions> {
        self.packages.iter().find(|p| p.name == name)
    }

    pub fn enabled_packages(&self) -> impl Iterator<Item = &PackageOptions> {
        self.packages.iter().filter(|p| p.is_enabled())
    }
}
