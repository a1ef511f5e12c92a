//! Run configuration and persistent settings.
//!
//! Two layers live here:
//!
//! - [`Settings`]: user preferences merged with figment from built-in
//!   defaults, `config.toml` in the platform config directory and
//!   `DUPSWEEP_*` environment variables. CLI flags override them later.
//! - [`Configuration`]: the immutable description of one run that the core
//!   pipeline consumes. It is built once through [`ConfigurationBuilder`] and
//!   never mutated afterwards.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::duplicates::SortOrder;

/// Errors raised while assembling a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No root directory was supplied.
    #[error("Directory is not specified")]
    MissingRoot,

    /// An answer to a sort or yes/no question was not one of the choices.
    #[error("Invalid value '{value}' for {option}")]
    InvalidOption {
        /// Option name
        option: &'static str,
        /// Rejected value
        value: String,
    },

    /// Deletion was confirmed for a run that does not check duplicates.
    #[error("Deleting files requires a duplicate check")]
    DeleteWithoutCheck,

    /// The settings file or environment could not be parsed.
    #[error("Failed to load settings: {0}")]
    Settings(#[from] Box<figment::Error>),
}

/// Immutable configuration of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    root: PathBuf,
    extension_filter: Option<String>,
    sort_order: SortOrder,
    check_duplicates: bool,
    delete_confirmed: bool,
    selected_numbers: Vec<usize>,
}

impl Configuration {
    /// Start building a configuration.
    #[must_use]
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::default()
    }

    /// Directory to scan.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Name suffix filter, `None` when every file is considered.
    #[must_use]
    pub fn extension_filter(&self) -> Option<&str> {
        self.extension_filter.as_deref()
    }

    /// Direction of the size listing.
    #[must_use]
    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    /// Whether content hashing runs.
    #[must_use]
    pub fn check_duplicates(&self) -> bool {
        self.check_duplicates
    }

    /// Whether selected files get deleted.
    #[must_use]
    pub fn delete_confirmed(&self) -> bool {
        self.delete_confirmed
    }

    /// Record numbers picked for deletion.
    #[must_use]
    pub fn selected_numbers(&self) -> &[usize] {
        &self.selected_numbers
    }
}

/// Builder for [`Configuration`].
#[derive(Debug, Clone, Default)]
pub struct ConfigurationBuilder {
    root: Option<PathBuf>,
    extension_filter: Option<String>,
    sort_order: SortOrder,
    check_duplicates: bool,
    delete_confirmed: bool,
    selected_numbers: Vec<usize>,
}

impl ConfigurationBuilder {
    /// Set the directory to scan.
    #[must_use]
    pub fn root(mut self, root: Option<impl Into<PathBuf>>) -> Self {
        self.root = root.map(Into::into);
        self
    }

    /// Set the name suffix filter; an empty string means no filter.
    #[must_use]
    pub fn extension_filter(mut self, filter: Option<impl Into<String>>) -> Self {
        self.extension_filter = filter.map(Into::into).filter(|s: &String| !s.is_empty());
        self
    }

    /// Set the size ordering.
    #[must_use]
    pub fn sort_order(mut self, order: SortOrder) -> Self {
        self.sort_order = order;
        self
    }

    /// Enable content hashing.
    #[must_use]
    pub fn check_duplicates(mut self, check: bool) -> Self {
        self.check_duplicates = check;
        self
    }

    /// Confirm deletion of the selected numbers.
    #[must_use]
    pub fn delete_confirmed(mut self, confirmed: bool) -> Self {
        self.delete_confirmed = confirmed;
        self
    }

    /// Set the record numbers to delete.
    #[must_use]
    pub fn selected_numbers(mut self, numbers: impl IntoIterator<Item = usize>) -> Self {
        self.selected_numbers = numbers.into_iter().collect();
        self
    }

    /// Validate and freeze the configuration.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingRoot`] when no root (or an empty one) was given
    /// - [`ConfigError::DeleteWithoutCheck`] when deletion is confirmed
    ///   without duplicate checking
    pub fn build(self) -> Result<Configuration, ConfigError> {
        let root = self
            .root
            .filter(|r| !r.as_os_str().is_empty())
            .ok_or(ConfigError::MissingRoot)?;

        if self.delete_confirmed && !self.check_duplicates {
            return Err(ConfigError::DeleteWithoutCheck);
        }

        Ok(Configuration {
            root,
            extension_filter: self.extension_filter,
            sort_order: self.sort_order,
            check_duplicates: self.check_duplicates,
            delete_confirmed: self.delete_confirmed,
            selected_numbers: self.selected_numbers,
        })
    }
}

/// Persistent user preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Size ordering used when none is given on the command line.
    /// `None` means ask.
    pub sort_order: Option<SortOrder>,
    /// Threads used for hashing.
    pub io_threads: usize,
    /// Move deleted files to the trash instead of removing them.
    pub trash: bool,
    /// Refuse selections that remove every copy of a group.
    pub keep_one: bool,
    /// Skip hidden files and directories while scanning.
    pub skip_hidden: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sort_order: None,
            io_threads: 4,
            trash: false,
            keep_one: false,
            skip_hidden: false,
        }
    }
}

impl Settings {
    /// Load settings from the default config file and environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Settings`] if a source exists but is malformed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment(Self::config_path().as_deref()))
    }

    /// Figment stack: defaults, then `file` if given, then `DUPSWEEP_*`.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));
        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed("DUPSWEEP_"))
    }

    /// Extract settings from an arbitrary figment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Settings`] on malformed values.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let settings: Settings = figment.extract().map_err(Box::new)?;
        log::debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    /// Platform-specific path of `config.toml`.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "dupsweep", "dupsweep")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
