//! Store configuration.

use crate::crypto::KeyMaterial;
use crate::error::{CoreError, CoreResult};
use std::path::PathBuf;

/// Default sack file name.
pub const DEFAULT_SACK_NAME: &str = "cache.sack";

/// Configuration for a [`Store`](crate::Store).
///
/// Setting a configuration never touches the file system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory holding the sack file.
    pub sack_dir: PathBuf,

    /// File name of the sack file within `sack_dir`.
    pub sack_name: String,

    /// Whether payloads are encrypted at rest.
    pub encryption: bool,

    /// Key and IV used when `encryption` is on.
    pub key_material: Option<KeyMaterial>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sack_dir: PathBuf::from("."),
            sack_name: DEFAULT_SACK_NAME.to_string(),
            encryption: false,
            key_material: None,
        }
    }
}

impl StoreConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration for the sack file at `path`.
    ///
    /// A path without a file name keeps the default name.
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut config = Self::default();
        if let Some(name) = path.file_name() {
            config.sack_name = name.to_string_lossy().into_owned();
            config.sack_dir = path
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
        } else {
            config.sack_dir = path;
        }
        config
    }

    /// Sets the sack file directory.
    #[must_use]
    pub fn sack_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sack_dir = dir.into();
        self
    }

    /// Sets the sack file name.
    #[must_use]
    pub fn sack_name(mut self, name: impl Into<String>) -> Self {
        self.sack_name = name.into();
        self
    }

    /// Enables or disables payload encryption.
    #[must_use]
    pub const fn encryption(mut self, enabled: bool) -> Self {
        self.encryption = enabled;
        self
    }

    /// Sets the key material.
    #[must_use]
    pub fn key_material(mut self, material: KeyMaterial) -> Self {
        self.key_material = Some(material);
        self
    }

    /// Sets the key material from base64 key and IV strings.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if either string is not base64.
    pub fn base64_key_material(self, key: &str, iv: &str) -> CoreResult<Self> {
        Ok(self.key_material(KeyMaterial::from_base64(key, iv)?))
    }

    /// Returns the full sack file path.
    #[must_use]
    pub fn sack_path(&self) -> PathBuf {
        self.sack_dir.join(&self.sack_name)
    }

    /// Returns the key material to use, or `None` when encryption is off.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidKeyMaterial`] if encryption is on and no
    /// key material is set.
    pub fn cipher(&self) -> CoreResult<Option<&KeyMaterial>> {
        if !self.encryption {
            return Ok(None);
        }
        self.key_material
            .as_ref()
            .map(Some)
            .ok_or_else(|| CoreError::invalid_key_material("encryption enabled without a key"))
    }
}
