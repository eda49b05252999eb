use super::error::{Result, RouterError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub type PoolSet = Vec<Pool>;
// Ordered so every stage iterates pools in the same order on every call
pub type PoolMap = BTreeMap<String, Pool>;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PoolToken {
    pub address: String,
    pub balance: Decimal, // base units
    pub weight: Decimal,
    #[serde(default)]
    pub decimals: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub id: String,
    pub swap_fee: Decimal, // fraction, 0.003 for 0.3%
    pub tokens: Vec<PoolToken>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub address: String,
    pub symbol: String,
    pub decimals: u32,
    // units of this token per ETH
    #[serde(default)]
    pub per_eth: Decimal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwapType {
    #[serde(rename = "exactIn", alias = "swapExactIn")]
    ExactIn,
    #[serde(rename = "exactOut", alias = "swapExactOut")]
    ExactOut,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathKind {
    Direct,
    Multihop,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Path {
    pub id: String,
    pub kind: PathKind,
    pub pool_ids: Vec<String>,
    pub tokens: Vec<String>, // [token_in, hop?, token_out]
}

#[derive(Clone, Debug, Default)]
pub struct FilteredPools {
    pub direct_pools: PoolMap,
    pub hop_tokens: Vec<String>,
    pub pools_token_in: PoolMap,
    pub pools_token_out: PoolMap,
}

// `path_ids` and `amounts` are aligned
#[derive(Clone, Debug, PartialEq)]
pub struct PriceOfInterest {
    pub price: Decimal,
    pub path_ids: Vec<String>,
    pub amounts: Vec<Decimal>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SwapAllocation {
    pub path_id: String,
    pub pool_ids: Vec<String>,
    pub tokens: Vec<String>,
    pub amount: Decimal,
    pub return_amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SwapPlan {
    pub swap_type: SwapType,
    pub total_amount: Decimal,
    pub total_return: Decimal,
    pub allocations: Vec<SwapAllocation>,
}

pub fn normalize_address(address: &str) -> String {
    address.trim().to_lowercase()
}

impl Pool {
    pub fn live_token(&self, address: &str) -> Option<&PoolToken> {
        self.tokens.iter().find(|token| {
            normalize_address(&token.address) == address
                && token.balance > Decimal::ZERO
                && token.weight > Decimal::ZERO
        })
    }

    pub fn holds(&self, address: &str) -> bool {
        self.live_token(address).is_some()
    }

    pub fn live_addresses(&self) -> impl Iterator<Item = String> + '_ {
        self.tokens
            .iter()
            .filter(|token| token.balance > Decimal::ZERO && token.weight > Decimal::ZERO)
            .map(|token| normalize_address(&token.address))
    }

    pub fn total_weight(&self) -> Decimal {
        self.tokens.iter().map(|token| token.weight).sum()
    }
}

impl Token {
    // Truncates dust below the token precision
    pub fn to_base_units(&self, amount: Decimal) -> Result<Decimal> {
        let scale = pow10(self.decimals)?;
        amount
            .checked_mul(scale)
            .map(|units| units.trunc())
            .ok_or(RouterError::InvalidAmount(amount))
    }

    pub fn from_base_units(&self, units: Decimal) -> Result<Decimal> {
        let scale = pow10(self.decimals)?;
        units
            .checked_div(scale)
            .ok_or(RouterError::InvalidAmount(units))
    }
}

fn pow10(decimals: u32) -> Result<Decimal> {
    // Decimal keeps at most 28 fractional digits and a 96-bit mantissa
    if decimals > 28 {
        return Err(RouterError::InvalidRequest(format!(
            "unsupported token precision {decimals}"
        )));
    }
    Ok(Decimal::from_i128_with_scale(10i128.pow(decimals), 0))
}

impl fmt::Display for SwapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwapType::ExactIn => write!(f, "exactIn"),
            SwapType::ExactOut => write!(f, "exactOut"),
        }
    }
}
