//! Config module - Manages Bluvera configuration (bluvera.toml).
//!
//! Configuration file contains:
//! - Vault path and storage backend
//! - Key namespace of the collections
//! - Upload size limits

use crate::storage::{KeyValueStore, MemoryStore, SqliteStore};
use crate::store::{VaultStore, DEFAULT_NAMESPACE};
use crate::upload::MB;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// `vault.db` inside the vault directory (default)
    #[default]
    Sqlite,
    /// Nothing survives the process; useful for demos and tests
    Memory,
}

/// Upload limits, in megabytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_max_image_mb")]
    pub max_image_mb: u64,
    #[serde(default = "default_max_pdf_mb")]
    pub max_pdf_mb: u64,
}

fn default_max_image_mb() -> u64 {
    5
}

fn default_max_pdf_mb() -> u64 {
    4
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_image_mb: default_max_image_mb(),
            max_pdf_mb: default_max_pdf_mb(),
        }
    }
}

impl UploadConfig {
    pub fn max_image_bytes(&self) -> u64 {
        self.max_image_mb * MB
    }

    pub fn max_pdf_bytes(&self) -> u64 {
        self.max_pdf_mb * MB
    }
}

/// Main Bluvera configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Config version (for future migrations)
    #[serde(default = "default_version")]
    pub version: u32,

    /// Prefix of the collection keys
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Path to vault directory
    #[serde(default = "default_vault_path")]
    pub vault_path: PathBuf,

    #[serde(default)]
    pub backend: Backend,

    #[serde(default)]
    pub upload: UploadConfig,
}

fn default_version() -> u32 {
    1
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            namespace: default_namespace(),
            vault_path: default_vault_path(),
            backend: Backend::default(),
            upload: UploadConfig::default(),
        }
    }
}

/// Get default vault path.
pub fn default_vault_path() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("bluvera").join("vault"))
        .unwrap_or_else(|| PathBuf::from("./vault"))
}

/// Get default config directory (~/.config/bluvera/).
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("bluvera"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get default config file path.
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("bluvera.toml")
}

impl Config {
    /// Create new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create config with specific vault path.
    pub fn with_vault_path(vault_path: PathBuf) -> Self {
        Self {
            vault_path,
            ..Self::default()
        }
    }

    /// Load config from file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Cannot parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load config from `path`, falling back to defaults when the file is missing.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file.
    pub fn save(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).with_context(|| "Cannot serialize config to TOML")?;

        std::fs::write(path, content)
            .with_context(|| format!("Cannot write config file: {}", path.display()))?;

        // Restrict file permissions on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    /// Get vault directory path.
    pub fn vault_dir(&self) -> &Path {
        &self.vault_path
    }

    /// Get SQLite backend path.
    pub fn vault_db_path(&self) -> PathBuf {
        self.vault_path.join("vault.db")
    }

    /// Open the configured backend.
    pub fn open_backend(&self) -> Result<Box<dyn KeyValueStore>> {
        let backend: Box<dyn KeyValueStore> = match self.backend {
            Backend::Sqlite => {
                let path = self.vault_db_path();
                let store = SqliteStore::open(&path).with_context(|| {
                    format!("Cannot open vault database: {}", path.display())
                })?;
                Box::new(store)
            }
            Backend::Memory => Box::new(MemoryStore::new()),
        };
        Ok(backend)
    }

    /// Open a vault store over the configured backend and namespace.
    pub fn open_store(&self) -> Result<VaultStore<Box<dyn KeyValueStore>>> {
        Ok(VaultStore::with_namespace(
            self.open_backend()?,
            self.namespace.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::NoteDraft;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, 1);
        assert_eq!(config.namespace, "obsidian-vault-blue");
        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.upload.max_image_bytes(), 5 * 1024 * 1024);
        assert_eq!(config.upload.max_pdf_bytes(), 4 * 1024 * 1024);
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("test.toml");

        let mut config = Config::with_vault_path(temp_dir.path().join("vault"));
        config.namespace = "my-vault".to_string();
        config.upload.max_pdf_mb = 10;
        config.save(&config_path)?;

        let loaded = Config::load(&config_path)?;
        assert_eq!(loaded.namespace, "my-vault");
        assert_eq!(loaded.upload.max_pdf_mb, 10);
        assert_eq!(loaded.upload.max_image_mb, 5);
        assert_eq!(loaded.vault_path, temp_dir.path().join("vault"));

        Ok(())
    }

    #[test]
    fn test_partial_file_uses_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("partial.toml");
        std::fs::write(&config_path, "backend = \"memory\"\n")?;

        let loaded = Config::load(&config_path)?;
        assert_eq!(loaded.backend, Backend::Memory);
        assert_eq!(loaded.namespace, DEFAULT_NAMESPACE);

        let missing = Config::load_or_default(&temp_dir.path().join("missing.toml"))?;
        assert_eq!(missing.version, 1);
        Ok(())
    }

    #[test]
    #[cfg(unix)]
    fn test_save_permissions() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("test_perms.toml");

        let config = Config::new();
        config.save(&config_path)?;

        let metadata = std::fs::metadata(&config_path)?;
        let mode = metadata.permissions().mode();
        assert_eq!(
            mode & 0o777,
            0o600,
            "Config file should have 0600 permissions"
        );

        Ok(())
    }

    #[test]
    fn test_open_store_sqlite() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config = Config::with_vault_path(temp_dir.path().join("vault"));

        {
            let mut store = config.open_store()?;
            store.save_note(NoteDraft::new("kept", "on disk"))?;
        }

        let store = config.open_store()?;
        assert_eq!(store.get_notes().len(), 1);
        assert!(config.vault_db_path().exists());
        Ok(())
    }
}
