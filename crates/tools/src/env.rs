//! Environment sources for configuration loading
//!
//! The loader never reads `std::env` directly. It asks an [`EnvSource`],
//! which lets callers hand it the real process environment, a `.env` file,
//! a fixed map, or a layered combination of those.

use std::collections::{BTreeMap, HashMap};
use std::env::VarError;
use std::path::{Path, PathBuf};

use crate::config::ConfigError;

/// Default `.env` file looked up relative to the working directory
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Read-only key/value lookup used by the configuration loader
pub trait EnvSource {
    /// Look up a variable
    ///
    /// Returns `Ok(None)` when the variable is not set, and an error when it
    /// is set but can't be read as a string.
    fn var(&self, key: &str) -> Result<Option<String>, ConfigError>;
}

impl<T: EnvSource + ?Sized> EnvSource for &T {
    fn var(&self, key: &str) -> Result<Option<String>, ConfigError> {
        (**self).var(key)
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Result<Option<String>, ConfigError> {
        Ok(self.get(key).cloned())
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn var(&self, key: &str) -> Result<Option<String>, ConfigError> {
        Ok(self.get(key).cloned())
    }
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Result<Option<String>, ConfigError> {
        match std::env::var(key) {
            Ok(value) => Ok(Some(value)),
            Err(VarError::NotPresent) => Ok(None),
            Err(VarError::NotUnicode(_)) => {
                Err(ConfigError::invalid(key, "value is not valid unicode"))
            }
        }
    }
}

/// Two sources where `primary` wins and `fallback` fills the gaps
#[derive(Debug, Clone)]
pub struct Layered<A, B> {
    primary: A,
    fallback: B,
}

impl<A: EnvSource, B: EnvSource> Layered<A, B> {
    pub fn new(primary: A, fallback: B) -> Self {
        Self { primary, fallback }
    }
}

impl<A: EnvSource, B: EnvSource> EnvSource for Layered<A, B> {
    fn var(&self, key: &str) -> Result<Option<String>, ConfigError> {
        match self.primary.var(key)? {
            Some(value) => Ok(Some(value)),
            None => self.fallback.var(key),
        }
    }
}

/// Variables parsed from a `.env` style file
///
/// Reading the file does not touch the process environment; layer the
/// result under [`ProcessEnv`] to get the usual dotenv precedence.
#[derive(Debug, Clone, Default)]
pub struct EnvFile {
    path: Option<PathBuf>,
    vars: BTreeMap<String, String>,
}

impl EnvFile {
    /// Parse the file at `path`
    ///
    /// A missing file is not an error and yields an empty set. A file that
    /// exists but can't be read or parsed is reported as
    /// [`ConfigError::EnvFile`].
    pub fn read(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let iter = match dotenvy::from_path_iter(path) {
            Ok(iter) => iter,
            Err(err) if err.not_found() => {
                tracing::debug!(path = %path.display(), "no env file found, skipping");
                return Ok(Self::default());
            }
            Err(err) => return Err(ConfigError::EnvFile(err)),
        };

        let mut vars = BTreeMap::new();
        for item in iter {
            let (key, value) = item?;
            vars.insert(key, value);
        }

        tracing::debug!(
            path = %path.display(),
            count = vars.len(),
            "loaded env file"
        );

        Ok(Self {
            path: Some(path.to_path_buf()),
            vars,
        })
    }

    /// Path the variables were read from, if the file existed
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl EnvSource for EnvFile {
    fn var(&self, key: &str) -> Result<Option<String>, ConfigError> {
        Ok(self.vars.get(key).cloned())
    }
}
