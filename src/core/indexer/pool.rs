use super::super::types::{normalize_address, Pool, PoolSet, PoolToken};
use super::Result;
use anyhow::{anyhow, Context};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

// On-disk snapshot: balances in whole tokens, as pool listings publish them.
#[derive(Serialize, Deserialize, Debug, Clone)]
struct PoolList {
    pools: Vec<PoolEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
struct PoolEntry {
    id: String,
    swap_fee: Decimal,
    tokens: Vec<TokenEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
struct TokenEntry {
    address: String,
    balance: Decimal,
    decimals: u32,
    #[serde(alias = "denormWeight")]
    weight: Decimal,
}

pub fn read_pool_set_from_disk<P: AsRef<Path>>(pool_file_path: P) -> Result<PoolSet> {
    let path = pool_file_path.as_ref();
    let json = fs::read_to_string(path)
        .with_context(|| format!("Couldn't read pool snapshot {}", path.display()))?;
    let pool_list: PoolList = serde_json::from_str(&json)
        .with_context(|| format!("Malformed pool snapshot {}", path.display()))?;
    pool_list.into_pool_set()
}

pub fn write_pool_set_on_disk<P: AsRef<Path>>(pool_file_path: P, pool_set: &PoolSet) -> Result<()> {
    let pool_list = PoolList::from_pool_set(pool_set)?;
    let json = serde_json::to_string_pretty(&pool_list)?;

    fs::write(pool_file_path, json)?;
    Ok(())
}

impl PoolList {
    fn into_pool_set(self) -> Result<PoolSet> {
        let mut pool_set = PoolSet::with_capacity(self.pools.len());
        for entry in self.pools {
            if entry.tokens.len() < 2 {
                warn!(pool = %entry.id, "skipping pool with fewer than two tokens");
                continue;
            }
            let tokens = entry
                .tokens
                .iter()
                .map(|token| {
                    Ok(PoolToken {
                        address: normalize_address(&token.address),
                        balance: scale(token.balance, token.decimals, true)?,
                        weight: token.weight,
                        decimals: token.decimals,
                    })
                })
                .collect::<Result<Vec<_>>>();
            let tokens = match tokens {
                Ok(tokens) => tokens,
                Err(e) => {
                    warn!(pool = %entry.id, error = %e, "skipping pool with unrepresentable balances");
                    continue;
                }
            };
            pool_set.push(Pool {
                id: normalize_address(&entry.id),
                swap_fee: entry.swap_fee,
                tokens,
            });
        }
        Ok(pool_set)
    }

    fn from_pool_set(pool_set: &PoolSet) -> Result<Self> {
        let pools = pool_set
            .iter()
            .map(|pool| {
                let tokens = pool
                    .tokens
                    .iter()
                    .map(|token| {
                        Ok(TokenEntry {
                            address: token.address.clone(),
                            balance: scale(token.balance, token.decimals, false)?,
                            decimals: token.decimals,
                            weight: token.weight,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(PoolEntry {
                    id: pool.id.clone(),
                    swap_fee: pool.swap_fee,
                    tokens,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { pools })
    }
}

// Whole tokens to base units (`up`) or back.
fn scale(amount: Decimal, decimals: u32, up: bool) -> Result<Decimal> {
    if decimals > 28 {
        return Err(anyhow!("unsupported token precision {decimals}"));
    }
    let factor = Decimal::from_i128_with_scale(10i128.pow(decimals), 0);
    let scaled = if up {
        amount.checked_mul(factor).map(|units| units.trunc())
    } else {
        amount.checked_div(factor).map(|whole| whole.normalize())
    };
    scaled.ok_or_else(|| anyhow!("balance {amount} overflows at {decimals} decimals"))
}
