use super::super::types::{normalize_address, Token};
use super::Result;
use anyhow::Context;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

pub type TokenRegistry = BTreeMap<String, Token>;

#[derive(Debug, Deserialize)]
struct TokenRecord {
    address: String,
    symbol: String,
    decimals: u32,
    #[serde(default)]
    per_eth: Option<Decimal>,
}

pub fn read_token_registry<P: AsRef<Path>>(token_file_path: P) -> Result<TokenRegistry> {
    let path = token_file_path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Couldn't open token registry {}", path.display()))?;

    let mut registry = TokenRegistry::new();
    for record in reader.deserialize() {
        let record: TokenRecord = record.context("Malformed token registry row")?;
        let address = normalize_address(&record.address);
        registry.insert(
            address.clone(),
            Token {
                address,
                symbol: record.symbol,
                decimals: record.decimals,
                per_eth: record.per_eth.unwrap_or(Decimal::ZERO),
            },
        );
    }
    Ok(registry)
}
