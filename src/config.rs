use super::core::constants::DEFAULT_MAX_POOLS;
use super::types::DexConfig;
use anyhow::{Context, Result};
use num_bigint::BigUint;
use std::path::{Path, PathBuf};
use std::str::FromStr;

impl Default for DexConfig {
    fn default() -> Self {
        Self {
            working_dir: "working_dir".to_string(),
            pool_file: "pools.json".to_string(),
            token_file: "tokens.csv".to_string(),
            max_pools: DEFAULT_MAX_POOLS,
            // 30 gwei
            gas_price_wei: "30000000000".to_string(),
            swap_gas: 100_000,
            listen_addr: "127.0.0.1:3000".to_string(),
        }
    }
}

impl DexConfig {
    // Helper method to load from a specific path
    pub fn load_from(path: PathBuf) -> Result<Self> {
        let config: Self = confy::load_path(&path)
            .with_context(|| format!("Couldn't load config {}", path.display()))?;
        Ok(config)
    }

    pub fn pool_file_path(&self) -> PathBuf {
        Path::new(self.working_dir.as_str()).join(&self.pool_file)
    }

    pub fn token_file_path(&self) -> PathBuf {
        Path::new(self.working_dir.as_str()).join(&self.token_file)
    }

    pub fn gas_price(&self) -> Result<BigUint> {
        BigUint::from_str(self.gas_price_wei.trim())
            .with_context(|| format!("Invalid gas price {}", self.gas_price_wei))
    }
}
