// Amounts are base units. Allocations and exact-in returns round down,
// exact-out returns round up.

use super::constants::{BISECTION_MAX_ITERATIONS, BISECTION_TOLERANCE};
use super::error::Result;
use super::types::SwapType;
use rust_decimal::{Decimal, RoundingStrategy};

pub fn round_down(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::ToNegativeInfinity)
}

pub fn round_up(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::ToPositiveInfinity)
}

pub fn round_return(amount: Decimal, swap_type: SwapType) -> Decimal {
    match swap_type {
        SwapType::ExactIn => round_down(amount),
        SwapType::ExactOut => round_up(amount),
    }
}

// Sum that pins at `Decimal::MAX` instead of panicking on huge balances.
pub fn sum_amounts<'a>(amounts: impl IntoIterator<Item = &'a Decimal>) -> Decimal {
    amounts
        .into_iter()
        .fold(Decimal::ZERO, |acc, amount| acc.saturating_add(*amount))
}

pub fn exclusive_limit(bound: Decimal) -> Decimal {
    if bound <= Decimal::ONE {
        return Decimal::ZERO;
    }
    round_up(bound) - Decimal::ONE
}

// `too_high` must be false at `lo` and true at `hi`.
pub fn bisect<F>(mut lo: Decimal, mut hi: Decimal, mut too_high: F) -> Result<(Decimal, Decimal)>
where
    F: FnMut(Decimal) -> Result<bool>,
{
    let two = Decimal::TWO;
    for _ in 0..BISECTION_MAX_ITERATIONS {
        let width = hi - lo;
        if width <= hi.abs() * BISECTION_TOLERANCE {
            break;
        }
        let mid = lo + width / two;
        if mid <= lo || mid >= hi {
            break;
        }
        if too_high(mid)? {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    Ok((lo, hi))
}
