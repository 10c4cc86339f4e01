use crate::errors::Error;
use crate::storage::ReadyOptions;
use clap::ValueEnum;
use std::fmt;
use std::path::PathBuf;

const DATA_DIR_NAME: &str = ".cloudtree";

/// Where tree nodes are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// One directory per tree under the data dir.
    File,
    /// Process-local; gone on exit.
    Memory,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::File => write!(f, "file"),
            Backend::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub tree: String,
    pub backend: Backend,
    pub data_dir: PathBuf,
    pub ready: ReadyOptions,
}

impl Config {
    pub fn new(tree: &str) -> Self {
        Self {
            tree: tree.to_string(),
            backend: Backend::File,
            data_dir: default_data_dir(),
            ready: ReadyOptions::default(),
        }
    }

    /// # Errors
    /// Returns `Error::Config` for an empty tree name or a zero poll budget.
    pub fn validate(&self) -> Result<(), Error> {
        if self.tree.trim().is_empty() {
            return Err(err!(Config, "Tree name must not be empty"));
        }
        if self.ready.max_polls == 0 {
            return Err(err!(Config, "Readiness poll count must be at least 1"));
        }
        Ok(())
    }
}

/// `~/.cloudtree`, or `./data` when there is no home directory.
pub fn default_data_dir() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(DATA_DIR_NAME),
        None => PathBuf::from("data"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new("people");
        assert_eq!(config.tree, "people");
        assert_eq!(config.backend, Backend::File);
        assert_eq!(config.ready, ReadyOptions::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_data_dir() {
        let dir = default_data_dir();
        assert!(dir.ends_with(DATA_DIR_NAME) || dir == PathBuf::from("data"));
    }

    #[test]
    fn test_validate() {
        let err = Config::new("  ").validate().unwrap_err();
        assert_eq!(err.code(), 8000);

        let mut config = Config::new("people");
        config.ready.max_polls = 0;
        assert!(config.validate().unwrap_err().to_string().contains("at least 1"));
    }

    #[test]
    fn test_backend_names() {
        assert_eq!(Backend::from_str("memory", true).unwrap(), Backend::Memory);
        assert_eq!(Backend::File.to_string(), "file");
    }
}
