//! Verifier configuration loading

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::oracle::OraclePolicy;
use crate::pool::PoolConfig;

/// Pool configuration plus oracle policy, as stored in a TOML file
///
/// ```toml
/// [pool]
/// token0 = "ELON"
/// token1 = "WETH"
/// chain_id = 1
/// system_fee_rate_per_mille = 4
/// price_tolerance_threshold = 98
///
/// [oracle]
/// timeout_ms = 1500
/// on_unavailable = "reject"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierConfig {
    pub pool: PoolConfig,
    #[serde(default)]
    pub oracle: OraclePolicy,
}

impl VerifierConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("Failed to parse verifier config")?;
        config.pool.validate().context("Invalid pool configuration")?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("Verifier config not found: {}", path.display());
        }

        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read verifier config: {}", path.display()))?;

        Self::from_toml_str(&data).with_context(|| format!("Invalid verifier config: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::UnavailablePolicy;
    use std::io::Write;

    const SAMPLE: &str = r#"
        [pool]
        token0 = "ELON"
        token1 = "WETH"
        chain_id = 1
        is_security_pool = true
        is_token0_security = true
        system_fee_rate_per_mille = 4
        price_tolerance_threshold = 98

        [oracle]
        timeout_ms = 1500
        on_unavailable = "reject"
    "#;

    #[test]
    fn test_parse_sample() {
        let config = VerifierConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.pool.token0.as_str(), "ELON");
        assert!(config.pool.is_token0_security);
        assert!(!config.pool.is_token1_security);
        assert!(config.pool.mitigation_enabled);
        assert_eq!(config.pool.decimals, 18);
        assert_eq!(config.oracle.timeout_ms, 1500);
        assert_eq!(config.oracle.on_unavailable, UnavailablePolicy::Reject);
    }

    #[test]
    fn test_oracle_section_optional() {
        let text = r#"
            [pool]
            token0 = "X"
            token1 = "Y"
            system_fee_rate_per_mille = 10
            price_tolerance_threshold = 98
        "#;
        let config = VerifierConfig::from_toml_str(text).unwrap();
        assert_eq!(config.oracle, OraclePolicy::default());
        assert_eq!(config.pool.chain_id, None);
    }

    #[test]
    fn test_rejects_invalid_pool() {
        let text = SAMPLE.replace("price_tolerance_threshold = 98", "price_tolerance_threshold = 120");
        let err = VerifierConfig::from_toml_str(&text).unwrap_err();
        assert!(format!("{err:#}").contains("threshold"));
    }

    #[test]
    fn test_rejects_security_token_on_standard_pool() {
        let text = SAMPLE.replace("is_security_pool = true", "is_security_pool = false");
        let err = VerifierConfig::from_toml_str(&text).unwrap_err();
        assert!(format!("{err:#}").contains("not a security pool"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = VerifierConfig::from_file(file.path()).unwrap();
        assert_eq!(config.pool.token1.as_str(), "WETH");

        let missing = VerifierConfig::from_file(Path::new("/nonexistent/verifier.toml"));
        assert!(missing.unwrap_err().to_string().contains("not found"));
    }
}
