use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::keystore::KdfStrength;

pub const MAINNET_URL: &str = "https://api.trongrid.io";
pub const SHASTA_URL: &str = "https://api.shasta.trongrid.io";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ExecConfig {
    pub node: NodeConfig,
    pub keystore: KeystoreConfig,
    #[serde(default)]
    pub transaction: TransactionConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NodeConfig {
    pub url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct KeystoreConfig {
    pub dir: PathBuf,
    #[serde(default = "default_kdf")]
    pub kdf: KdfStrength,
}

fn default_kdf() -> KdfStrength {
    KdfStrength::Light
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TransactionConfig {
    /// Upper bound on energy fees for contract calls, in sun.
    #[serde(default = "default_fee_limit")]
    pub fee_limit: i64,
    #[serde(default = "default_freeze_duration_days")]
    pub freeze_duration_days: i64,
}

fn default_fee_limit() -> i64 {
    100_000_000
}

fn default_freeze_duration_days() -> i64 {
    3
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            fee_limit: default_fee_limit(),
            freeze_duration_days: default_freeze_duration_days(),
        }
    }
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            node: NodeConfig {
                url: SHASTA_URL.to_string(),
                api_key: None,
                timeout_secs: default_timeout_secs(),
                log_level: default_log_level(),
            },
            keystore: KeystoreConfig {
                dir: PathBuf::from("./keystore"),
                kdf: default_kdf(),
            },
            transaction: TransactionConfig::default(),
        }
    }
}

/// Where a loaded config came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File,
    /// The file was missing; defaults were written to it.
    Created,
    /// The file could not be read or parsed; defaults are in effect.
    Fallback(String),
}

impl ConfigSource {
    /// Report the outcome. Call once logging is up.
    pub fn log(&self, path: &str) {
        match self {
            ConfigSource::File => info!("Config loaded from {}", path),
            ConfigSource::Created => info!("Config file not found at '{}'. Created default.", path),
            ConfigSource::Fallback(reason) => {
                warn!("Error loading config '{}': {}. Using defaults.", path, reason)
            }
        }
    }
}

impl ExecConfig {
    /// Read `path`; fall back to defaults (writing them out if the file is missing).
    ///
    /// Nothing is logged here: the binary loads its config before the
    /// subscriber exists, so the caller reports the [`ConfigSource`].
    pub fn load_or_default(path: &str) -> (Self, ConfigSource) {
        if !std::path::Path::new(path).exists() {
            let config = Self::default();
            if let Ok(s) = toml::to_string_pretty(&config) {
                let _ = std::fs::write(path, s);
            }
            return (config, ConfigSource::Created);
        }
        match std::fs::read_to_string(path) {
            Ok(s) => match toml::from_str(&s) {
                Ok(c) => (c, ConfigSource::File),
                Err(e) => (Self::default(), ConfigSource::Fallback(format!("parse error: {}", e))),
            },
            Err(e) => (Self::default(), ConfigSource::Fallback(format!("read error: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExecConfig::default();
        assert_eq!(config.node.url, SHASTA_URL);
        assert_eq!(config.transaction.fee_limit, 100_000_000);
        assert_eq!(config.transaction.freeze_duration_days, 3);
        assert_eq!(config.keystore.kdf, KdfStrength::Light);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let text = r#"
            [node]
            url = "https://api.trongrid.io"
            api_key = "abc"

            [keystore]
            dir = "/tmp/keys"
            kdf = "standard"
        "#;
        let config: ExecConfig = toml::from_str(text).unwrap();
        assert_eq!(config.node.api_key.as_deref(), Some("abc"));
        assert_eq!(config.node.timeout_secs, 30);
        assert_eq!(config.keystore.kdf, KdfStrength::Standard);
        assert_eq!(config.transaction, TransactionConfig::default());
    }

    #[test]
    fn test_missing_file_writes_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("tron-exec.toml");
        let path = path.to_str().unwrap();

        let (config, source) = ExecConfig::load_or_default(path);
        assert_eq!(source, ConfigSource::Created);
        assert_eq!(config, ExecConfig::default());
        assert!(std::path::Path::new(path).exists());
        assert_eq!(
            ExecConfig::load_or_default(path),
            (config, ConfigSource::File)
        );
    }

    #[test]
    fn test_malformed_file_falls_back_with_reason() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        let text = "[node]\nurl = \"https://api.trongrid.io\"\nthis is not toml\n";
        std::fs::write(&path, text).unwrap();

        let (config, source) = ExecConfig::load_or_default(path.to_str().unwrap());
        assert_eq!(config.node.url, SHASTA_URL);
        match source {
            ConfigSource::Fallback(reason) => assert!(reason.contains("parse error")),
            other => panic!("expected fallback, got {other:?}"),
        }
        // The broken file is left for the user to fix.
        assert!(std::fs::read_to_string(&path).unwrap().contains("not toml"));
    }
}
