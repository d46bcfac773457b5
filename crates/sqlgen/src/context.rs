//! Execution context.
//!
//! The generator runs for one source file of one package. Both come from the
//! environment (`SQLGEN_PACKAGE`, `SQLGEN_FILE`) so a build step can invoke it
//! per file; the CLI may override either.

use crate::error::{GenError, GenResult};
use std::path::{Path, PathBuf};

pub const PACKAGE_ENV: &str = "SQLGEN_PACKAGE";
pub const FILE_ENV: &str = "SQLGEN_FILE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecContext {
    pub package: String,
    pub file: PathBuf,
}

impl ExecContext {
    pub fn new(package: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            package: package.into(),
            file: file.into(),
        }
    }

    pub fn from_env() -> GenResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve both values through `lookup`; absent or blank values fail.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> GenResult<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| GenError::environment(format!("{key} is not set")))
        };
        Ok(Self {
            package: get(PACKAGE_ENV)?,
            file: PathBuf::from(get(FILE_ENV)?),
        })
    }

    /// Directory holding the source file; the package that gets scanned.
    pub fn package_dir(&self) -> &Path {
        match self.file.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }

    /// File name of the source file, for the generated header.
    pub fn file_name(&self) -> String {
        self.file
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// `<dir>/<stem><suffix>`
    pub fn output_path(&self, suffix: &str) -> PathBuf {
        let stem = self
            .file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.package_dir().join(format!("{stem}{suffix}"))
    }

    /// Fail when the scanned package is not the one the caller named.
    pub fn check_package(&self, scanned: &str) -> GenResult<()> {
        if self.package != scanned {
            return Err(GenError::environment(format!(
                "{PACKAGE_ENV} is `{}` but {} belongs to package `{scanned}`",
                self.package,
                self.file.display()
            )));
        }
        Ok(())
    }
}
