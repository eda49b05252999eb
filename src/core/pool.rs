use super::constants::{MAX_IN_RATIO, MAX_OUT_RATIO};
use super::error::{Result, RouterError};
use super::math::{exclusive_limit, round_down};
use super::types::{normalize_address, Pool, SwapType};
use rust_decimal::{Decimal, MathematicalOps};

/// One pool swap `token_in -> token_out`, frozen from the snapshot.
///
/// Weighted-pool invariant `Π B_k^(w_k) = const`. With `g = 1 - fee` and
/// `r = w_in / w_out`:
///
/// ```text
/// out(a) = B_out * (1 - (B_in / (B_in + g*a))^r)
/// in(a)  = B_in * ((B_out / (B_out - a))^(1/r) - 1) / g
/// price  = (B_in + g*a_in) / (g * r * (B_out - a_out))
/// ```
///
/// Prices are quoted as token_in per token_out, so lower is better in both
/// swap directions.
#[derive(Clone, Debug, PartialEq)]
pub struct Leg {
    pub pool_id: String,
    pub token_in: String,
    pub token_out: String,
    pub balance_in: Decimal,
    pub balance_out: Decimal,
    pub weight_in: Decimal,
    pub weight_out: Decimal,
    pub swap_fee: Decimal,
}

impl Leg {
    pub fn from_pool(pool: &Pool, token_in: &str, token_out: &str) -> Result<Self> {
        let token_in = normalize_address(token_in);
        let token_out = normalize_address(token_out);
        let find = |address: &str| {
            pool.tokens
                .iter()
                .find(|token| normalize_address(&token.address) == address)
                .ok_or_else(|| RouterError::degenerate(&pool.id, format!("missing token {address}")))
        };
        let t_in = find(&token_in)?;
        let t_out = find(&token_out)?;

        if t_in.balance <= Decimal::ZERO || t_out.balance <= Decimal::ZERO {
            return Err(RouterError::degenerate(&pool.id, "zero balance"));
        }
        if t_in.weight <= Decimal::ZERO || t_out.weight <= Decimal::ZERO {
            return Err(RouterError::degenerate(&pool.id, "zero weight"));
        }
        if pool.swap_fee < Decimal::ZERO || pool.swap_fee >= Decimal::ONE {
            return Err(RouterError::degenerate(
                &pool.id,
                format!("swap fee {} outside [0, 1)", pool.swap_fee),
            ));
        }

        Ok(Self {
            pool_id: pool.id.clone(),
            token_in,
            token_out,
            balance_in: t_in.balance,
            balance_out: t_out.balance,
            weight_in: t_in.weight,
            weight_out: t_out.weight,
            swap_fee: pool.swap_fee,
        })
    }

    fn degenerate(&self, reason: &str) -> RouterError {
        RouterError::degenerate(&self.pool_id, reason)
    }

    fn fee_complement(&self) -> Decimal {
        Decimal::ONE - self.swap_fee
    }

    fn weight_ratio(&self) -> Result<Decimal> {
        self.weight_in
            .checked_div(self.weight_out)
            .ok_or_else(|| self.degenerate("weight ratio overflow"))
    }

    pub fn spot_price(&self) -> Result<Decimal> {
        self.marginal_price(Decimal::ZERO, Decimal::ZERO)
    }

    pub fn marginal_price(&self, amount_in: Decimal, amount_out: Decimal) -> Result<Decimal> {
        let g = self.fee_complement();
        let remaining_out = self.balance_out - amount_out;
        if remaining_out <= Decimal::ZERO {
            return Err(self.degenerate("output balance exhausted"));
        }
        let numerator = g
            .checked_mul(amount_in)
            .and_then(|x| x.checked_add(self.balance_in))
            .ok_or_else(|| self.degenerate("input balance overflow"))?;
        let denominator = g
            .checked_mul(self.weight_ratio()?)
            .and_then(|x| x.checked_mul(remaining_out))
            .ok_or_else(|| self.degenerate("price overflow"))?;
        numerator
            .checked_div(denominator)
            .ok_or_else(|| self.degenerate("non-finite price"))
    }

    pub fn out_given_in(&self, amount: Decimal) -> Result<Decimal> {
        if amount <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }
        let effective_in = amount
            .checked_mul(self.fee_complement())
            .ok_or_else(|| self.degenerate("input overflow"))?;
        let new_balance_in = self
            .balance_in
            .checked_add(effective_in)
            .ok_or_else(|| self.degenerate("input balance overflow"))?;

        if self.weight_in == self.weight_out {
            // Constant product; the rational form keeps every digit.
            let share = effective_in
                .checked_div(new_balance_in)
                .ok_or_else(|| self.degenerate("non-finite output"))?;
            return self
                .balance_out
                .checked_mul(share)
                .ok_or_else(|| self.degenerate("output overflow"));
        }

        let base = self
            .balance_in
            .checked_div(new_balance_in)
            .ok_or_else(|| self.degenerate("non-finite output"))?;
        let kept = base
            .checked_powd(self.weight_ratio()?)
            .ok_or_else(|| self.degenerate("power overflow"))?;
        self.balance_out
            .checked_mul(Decimal::ONE - kept)
            .map(|out| out.max(Decimal::ZERO))
            .ok_or_else(|| self.degenerate("output overflow"))
    }

    pub fn in_given_out(&self, amount: Decimal) -> Result<Decimal> {
        if amount <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }
        let remaining_out = self.balance_out - amount;
        if remaining_out <= Decimal::ZERO {
            return Err(self.degenerate("output balance exhausted"));
        }
        let g = self.fee_complement();

        let growth = if self.weight_in == self.weight_out {
            amount
                .checked_div(remaining_out)
                .ok_or_else(|| self.degenerate("non-finite input"))?
        } else {
            let base = self
                .balance_out
                .checked_div(remaining_out)
                .ok_or_else(|| self.degenerate("non-finite input"))?;
            let exponent = self
                .weight_out
                .checked_div(self.weight_in)
                .ok_or_else(|| self.degenerate("weight ratio overflow"))?;
            base.checked_powd(exponent)
                .ok_or_else(|| self.degenerate("power overflow"))?
                - Decimal::ONE
        };

        self.balance_in
            .checked_mul(growth)
            .and_then(|x| x.checked_div(g))
            .map(|x| x.max(Decimal::ZERO))
            .ok_or_else(|| self.degenerate("input overflow"))
    }

    // Largest input whose fee-adjusted amount still fits next to the input
    // balance, so `B_in + g*a` never overflows.
    pub(crate) fn input_headroom(&self) -> Decimal {
        let g = self.fee_complement();
        (Decimal::MAX - self.balance_in)
            .checked_div(g)
            .map(|room| (round_down(room) - Decimal::ONE).max(Decimal::ZERO))
            .unwrap_or(Decimal::MAX)
    }

    // Fixed-side amount the pool accepts: input for exact-in, output for
    // exact-out.
    pub fn limit(&self, swap_type: SwapType) -> Result<Decimal> {
        let headroom = self.input_headroom();
        match swap_type {
            SwapType::ExactIn => Ok(exclusive_limit(self.balance_in * MAX_IN_RATIO).min(headroom)),
            SwapType::ExactOut => {
                let bound = exclusive_limit(self.balance_out * MAX_OUT_RATIO);
                match self.in_given_out(bound) {
                    Ok(needed) if needed <= headroom => Ok(bound),
                    _ => Ok(bound.min(round_down(self.out_given_in(headroom)?))),
                }
            }
        }
    }
}
