use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use alloy_primitives::{address, Address};
use thiserror::Error;

use crate::types::config::{ChainConfig, NativeCurrency, Settings};

/// File name of the settings file inside the config directory.
pub const SETTINGS_FILE: &str = "settings.yaml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid settings: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("chain {chain_id}: chain_id_hex '{hex}' does not match")]
    ChainIdMismatch { chain_id: u64, hex: String },
    #[error("chain {chain_id}: block explorer '{url}' is not a valid URL")]
    BadExplorer { chain_id: u64, url: String },
    #[error("no chains configured")]
    NoChains,
}


/// Arbitrum One chain id.
pub const ARBITRUM_ONE: u64 = 42161;
/// Arbitrum Sepolia chain id.
pub const ARBITRUM_SEPOLIA: u64 = 421614;

/// Token deployed on Arbitrum Sepolia.
pub const SEPOLIA_TOKEN: Address = address!("23fd096B2875A6dEccae8C688f44fAf0001E3Eef");
/// Token deployed on Arbitrum One.
pub const MAINNET_TOKEN: Address = address!("d0e4fc5B430b0cAC0f59b7B8B66D40d0b3f64A6b");

/// Icon offered to wallets when the token is added to their asset list.
pub const TOKEN_IMAGE_URL: &str = "https://tracer.endglobalwarming.net/assets/tracerroundicon.svg";


/// Returns the built-in settings: both Arbitrum networks, an 8 second
/// message lifetime and a two hour permit deadline.
pub fn default_settings() -> Settings {
    let mut chains = BTreeMap::new();
    chains.insert(
        ARBITRUM_SEPOLIA,
        ChainConfig {
            name: "Arbitrum Sepolia".into(),
            chain_id_hex: "0x66eee".into(),
            rpc_url: "https://sepolia-rollup.arbitrum.io/rpc".into(),
            block_explorer: "https://sepolia.arbiscan.io/".into(),
            native_currency: NativeCurrency {
                name: "Arbitrum Sepolia Ether".into(),
                symbol: "ETH".into(),
                decimals: 18,
            },
            token_address: Some(SEPOLIA_TOKEN),
        },
    );
    chains.insert(
        ARBITRUM_ONE,
        ChainConfig {
            name: "Arbitrum One".into(),
            chain_id_hex: "0xa4b1".into(),
            rpc_url: "https://arb1.arbitrum.io/rpc".into(),
            block_explorer: "https://arbiscan.io/".into(),
            native_currency: NativeCurrency {
                name: "Ether".into(),
                symbol: "ETH".into(),
                decimals: 18,
            },
            token_address: Some(MAINNET_TOKEN),
        },
    );

    Settings {
        chains,
        message_ttl_ms: 8000,
        deadline_minutes: 120,
        token_image_url: Some(TOKEN_IMAGE_URL.into()),
    }
}


/// Load `Settings` from a YAML file. Fields absent from the file keep their
/// defaults; a `chains` map replaces the default chains entirely.
pub fn load(path: &Path) -> Result<Settings, SettingsError> {
    let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&content)
}


/// Load `config_dir/settings.yaml`, or the defaults if it does not exist.
pub fn load_or_default(config_dir: &Path) -> Result<Settings, SettingsError> {
    let path = config_dir.join(SETTINGS_FILE);
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no settings file, using defaults");
        return Ok(default_settings());
    }
    load(&path)
}


/// Parse and validate settings from a YAML string.
pub fn parse(content: &str) -> Result<Settings, SettingsError> {
    let settings: Settings = if content.trim().is_empty() {
        default_settings()
    } else {
        serde_yaml::from_str(content)?
    };
    validate(&settings)?;
    Ok(settings)
}


/// Save `Settings` to a YAML file.
pub fn save(path: &Path, settings: &Settings) -> Result<(), SettingsError> {
    let content = serde_yaml::to_string(settings)?;
    std::fs::write(path, content).map_err(|source| SettingsError::Write {
        path: path.to_path_buf(),
        source,
    })
}


/// Check that every chain's hex id matches its key and its explorer URL
/// parses.
pub fn validate(settings: &Settings) -> Result<(), SettingsError> {
    if settings.chains.is_empty() {
        return Err(SettingsError::NoChains);
    }
    for (&chain_id, chain) in &settings.chains {
        let hex = chain.chain_id_hex.trim_start_matches("0x");
        if u64::from_str_radix(hex, 16).ok() != Some(chain_id) {
            return Err(SettingsError::ChainIdMismatch {
                chain_id,
                hex: chain.chain_id_hex.clone(),
            });
        }
        if url::Url::parse(&chain.block_explorer).is_err() {
            return Err(SettingsError::BadExplorer {
                chain_id,
                url: chain.block_explorer.clone(),
            });
        }
    }
    Ok(())
}
