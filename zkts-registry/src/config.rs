//! Registry deployment configuration.

use std::env;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use zkts_common::{Address, Amount, VerifierRef};

use crate::types::InitParams;

/// Page size used when a caller does not ask for one.
pub const DEFAULT_PAGE_LIMIT: u64 = 50;

/// Deployment settings consumed by `initialize`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Owner to install; the deploying caller when unset.
    #[serde(default)]
    pub owner: Option<Address>,
    /// Fee charged per stamp.
    #[serde(default)]
    pub initial_fee: Amount,
    /// Verifier used for proof checks.
    #[serde(default)]
    pub verifier: Option<VerifierRef>,
    /// Page size for signer and hash listings.
    #[serde(default = "default_page_limit")]
    pub default_page_limit: u64,
}

fn default_page_limit() -> u64 {
    DEFAULT_PAGE_LIMIT
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            owner: None,
            initial_fee: 0,
            verifier: None,
            default_page_limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl RegistryConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let owner = env::var("ZKTS_OWNER")
            .ok()
            .map(|s| s.parse::<Address>())
            .transpose()
            .context("ZKTS_OWNER must be a 20-byte hex address")?;

        let initial_fee: Amount = env::var("ZKTS_INITIAL_FEE")
            .ok()
            .map(|s| s.trim().parse::<Amount>())
            .transpose()
            .context("ZKTS_INITIAL_FEE must be an integer")?
            .unwrap_or(0);

        let verifier = env::var("ZKTS_VERIFIER")
            .ok()
            .map(|s| s.parse::<VerifierRef>())
            .transpose()
            .context("ZKTS_VERIFIER must be a 20-byte hex reference")?;

        let default_page_limit: u64 = env::var("ZKTS_PAGE_LIMIT")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|limit| *limit > 0)
            .unwrap_or(DEFAULT_PAGE_LIMIT);

        Ok(Self {
            owner,
            initial_fee,
            verifier,
            default_page_limit,
        })
    }

    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    /// Initialization parameters, falling back to `deployer` as owner.
    pub fn init_params(&self, deployer: Address) -> Result<InitParams> {
        let verifier = self
            .verifier
            .context("a verifier reference is required to initialize")?;
        Ok(InitParams {
            fee: self.initial_fee,
            verifier,
            owner: self.owner.unwrap_or(deployer),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_defaults() {
        let config: RegistryConfig =
            serde_json::from_str(r#"{"initial_fee": 25}"#).expect("parse");
        assert_eq!(config.initial_fee, 25);
        assert_eq!(config.default_page_limit, DEFAULT_PAGE_LIMIT);
        assert!(config.owner.is_none());
    }

    #[test]
    fn test_init_params_fallbacks() {
        let deployer = Address::new([3; 20]);
        let mut config = RegistryConfig::default();
        assert!(config.init_params(deployer).is_err());

        config.verifier = Some(VerifierRef::new([4; 20]));
        let params = config.init_params(deployer).expect("params");
        assert_eq!(params.owner, deployer);
        assert_eq!(params.fee, 0);
    }

    #[test]
    fn test_from_file() {
        let dir = std::env::temp_dir().join(format!("zkts-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join("registry.json");
        let owner = Address::new([9; 20]);
        std::fs::write(
            &path,
            format!(r#"{{"owner": "{owner}", "initial_fee": 7, "default_page_limit": 10}}"#),
        )
        .expect("write config");

        let config = RegistryConfig::from_file(&path).expect("load");
        assert_eq!(config.owner, Some(owner));
        assert_eq!(config.initial_fee, 7);
        assert_eq!(config.default_page_limit, 10);

        std::fs::remove_dir_all(&dir).ok();
    }
}
