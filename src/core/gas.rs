use super::error::{Result, RouterError};
use super::types::Token;
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

const WEI_PER_ETH: u64 = 1_000_000_000_000_000_000;

// Cost of one extra pool swap in base units of the token returns are
// measured in. Tokens without an ETH price cost nothing.
pub fn cost_output_token(gas_price_wei: &BigUint, swap_gas: &BigUint, token: &Token) -> Result<Decimal> {
    if token.per_eth.is_zero() {
        return Ok(Decimal::ZERO);
    }
    let cost_wei = gas_price_wei * swap_gas;
    if cost_wei.is_zero() {
        return Ok(Decimal::ZERO);
    }
    let cost_wei = cost_wei
        .to_u128()
        .and_then(Decimal::from_u128)
        .ok_or_else(|| RouterError::InvalidRequest(format!("gas cost {cost_wei} wei out of range")))?;
    let cost_eth = cost_wei / Decimal::from(WEI_PER_ETH);

    let cost_tokens = cost_eth
        .checked_mul(token.per_eth)
        .ok_or_else(|| RouterError::InvalidRequest("gas cost overflow".to_string()))?;
    token.to_base_units(cost_tokens)
}
