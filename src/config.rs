//! Configuration management for the RAX file store
//!
//! Values come from built-in defaults, an optional `config.toml` in the working
//! directory, and `RAX_FS_*` environment variables, in increasing priority.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::storage::filesystem::TEMP_SUFFIX;
use crate::storage::index::QUARANTINE_SUFFIX;

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_META_FILE: &str = "fs_meta.json";
const DEFAULT_USERS_FILE: &str = "users.json";
const DEFAULT_ADMIN_USER: &str = "admin";
const DEFAULT_GUEST_USER: &str = "guest";
const DEFAULT_MAX_USERNAME_LENGTH: usize = 32;
const DEFAULT_MAX_PATH_DEPTH: usize = 32;

/// Complete store configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    // ═══ ON-DISK LAYOUT (Environment Override Supported) ═══
    /// Root directory holding `<owner>/...` subtrees and the sidecar documents
    /// Environment: RAX_FS_DATA_DIR
    pub data_dir: String,

    /// File name of the metadata sidecar inside `data_dir`
    /// Environment: RAX_FS_META_FILE
    pub meta_file: String,

    /// File name of the credential store inside `data_dir`
    /// Environment: RAX_FS_USERS_FILE
    pub users_file: String,

    // ═══ ACCESS POLICY ═══
    /// Username granted administrative operations
    pub admin_user: String,

    /// Username that logs in without a password as a regular user.
    /// Empty disables guest login.
    pub guest_user: String,

    // ═══ SECURITY LIMITS ═══
    pub max_username_length: usize,
    pub max_path_depth: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: DEFAULT_DATA_DIR.to_string(),
            meta_file: DEFAULT_META_FILE.to_string(),
            users_file: DEFAULT_USERS_FILE.to_string(),
            admin_user: DEFAULT_ADMIN_USER.to_string(),
            guest_user: DEFAULT_GUEST_USER.to_string(),
            max_username_length: DEFAULT_MAX_USERNAME_LENGTH,
            max_path_depth: DEFAULT_MAX_PATH_DEPTH,
        }
    }
}

impl StoreConfig {
    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("data_dir", DEFAULT_DATA_DIR)?
            .set_default("meta_file", DEFAULT_META_FILE)?
            .set_default("users_file", DEFAULT_USERS_FILE)?
            .set_default("admin_user", DEFAULT_ADMIN_USER)?
            .set_default("guest_user", DEFAULT_GUEST_USER)?
            .set_default("max_username_length", DEFAULT_MAX_USERNAME_LENGTH as i64)?
            .set_default("max_path_depth", DEFAULT_MAX_PATH_DEPTH as i64)?
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("RAX_FS"))
            .build()?;

        let config: StoreConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Default configuration rooted at `data_dir`
    pub fn with_data_dir(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_string_lossy().to_string(),
            ..Self::default()
        }
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data_dir.trim().is_empty() {
            return Err(ConfigError::Message("data_dir cannot be empty".into()));
        }

        for (key, name) in [("meta_file", &self.meta_file), ("users_file", &self.users_file)] {
            if !is_plain_file_name(name) {
                return Err(ConfigError::Message(format!(
                    "{key} must be a plain file name, got {name:?}"
                )));
            }
        }

        if self.meta_file == self.users_file {
            return Err(ConfigError::Message(
                "meta_file and users_file must differ".into(),
            ));
        }

        if self.admin_user.trim().is_empty() {
            return Err(ConfigError::Message("admin_user cannot be empty".into()));
        }

        if self.guest_user == self.admin_user {
            return Err(ConfigError::Message(
                "guest_user and admin_user must differ".into(),
            ));
        }

        if self.max_username_length == 0 {
            return Err(ConfigError::Message(
                "max_username_length must be greater than 0".into(),
            ));
        }

        if self.max_path_depth == 0 {
            return Err(ConfigError::Message(
                "max_path_depth must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Get the data root as PathBuf
    pub fn data_dir_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    /// Full path of the metadata sidecar
    pub fn meta_path(&self) -> PathBuf {
        self.data_dir_path().join(&self.meta_file)
    }

    /// Full path of the credential store
    pub fn users_path(&self) -> PathBuf {
        self.data_dir_path().join(&self.users_file)
    }

    /// Names in the data root owned by the sidecar documents, including their
    /// temporary and quarantine siblings. No owner may use them.
    pub fn reserved_names(&self) -> Vec<String> {
        [&self.meta_file, &self.users_file]
            .into_iter()
            .flat_map(|name| {
                [
                    name.clone(),
                    format!("{name}{TEMP_SUFFIX}"),
                    format!("{name}{QUARANTINE_SUFFIX}"),
                ]
            })
            .collect()
    }

    /// Whether guest login is enabled
    pub fn guest_enabled(&self) -> bool {
        !self.guest_user.trim().is_empty()
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.trim().is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}
