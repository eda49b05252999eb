use super::error::{Result, RouterError};
use super::math::{bisect, round_down, round_return, sum_amounts};
use super::paths::PricedPath;
use super::types::{PoolMap, PriceOfInterest, SwapAllocation, SwapType};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::debug;

struct Candidate {
    allocations: Vec<SwapAllocation>,
    total_return: Decimal,
    net_return: Decimal,
}

pub fn route(
    pools: &PoolMap,
    paths: &[PricedPath],
    swap_type: SwapType,
    total_amount: Decimal,
    max_pools: usize,
    cost_output_token: Decimal,
    interest_points: &[PriceOfInterest],
) -> Result<(Vec<SwapAllocation>, Decimal)> {
    if paths.is_empty() {
        return Err(RouterError::NoViableRoute);
    }
    if max_pools == 0 {
        return Err(RouterError::InvalidRequest("max pools must be at least 1".to_string()));
    }
    if total_amount < Decimal::ZERO {
        return Err(RouterError::InvalidAmount(total_amount));
    }
    if total_amount.is_zero() {
        return Ok((Vec::new(), Decimal::ZERO));
    }

    let by_id: HashMap<&str, &PricedPath> = paths.iter().map(|path| (path.id(), path)).collect();
    let mut best: Option<Candidate> = None;

    for size in 1..=max_pools.min(paths.len()) {
        let Some(amounts) = allocate(&by_id, interest_points, size, total_amount)? else {
            continue;
        };
        let candidate = evaluate(pools, amounts, swap_type, cost_output_token)?;
        debug!(
            size,
            paths = candidate.allocations.len(),
            total_return = %candidate.total_return,
            net_return = %candidate.net_return,
            "evaluated best set"
        );

        let improves = match &best {
            None => true,
            Some(current) => match swap_type {
                SwapType::ExactIn => candidate.net_return > current.net_return,
                SwapType::ExactOut => candidate.net_return < current.net_return,
            },
        };
        if !improves {
            break;
        }
        best = Some(candidate);
    }

    match best {
        Some(candidate) => Ok((candidate.allocations, candidate.total_return)),
        None => Err(RouterError::InsufficientLiquidity {
            requested: total_amount,
            capacity: capacity(interest_points, max_pools),
        }),
    }
}

// `None` when no price of interest can absorb `total` on `size` paths.
fn allocate<'a>(
    by_id: &HashMap<&str, &'a PricedPath>,
    interest_points: &[PriceOfInterest],
    size: usize,
    total: Decimal,
) -> Result<Option<Vec<(&'a PricedPath, Decimal)>>> {
    let Some(bracket) = interest_points
        .iter()
        .position(|point| sum_amounts(point.amounts.iter().take(size)) >= total)
    else {
        return Ok(None);
    };
    let point = &interest_points[bracket];
    let active = point
        .path_ids
        .iter()
        .take(size)
        .map(|id| {
            by_id
                .get(id.as_str())
                .copied()
                .ok_or_else(|| RouterError::InvalidRequest(format!("unknown path {id}")))
        })
        .collect::<Result<Vec<_>>>()?;

    let amounts_at = |price: Decimal| -> Result<Vec<Decimal>> {
        active.iter().map(|path| path.amount_for_price(price)).collect()
    };
    let placed_at = |price: Decimal| -> Result<Decimal> { Ok(sum_amounts(&amounts_at(price)?)) };

    let mut floor = match bracket {
        0 => Decimal::ZERO,
        _ => interest_points[bracket - 1].price,
    };
    if placed_at(floor)? >= total {
        floor = Decimal::ZERO;
    }
    let (price_lo, price_hi) = bisect(floor, point.price, |price| Ok(placed_at(price)? >= total))?;

    // Below `price_lo` too little is placed, at `price_hi` enough; split the
    // gap in proportion to how much each path moves between them.
    let lo = amounts_at(price_lo)?;
    let hi = amounts_at(price_hi)?;
    let placed_lo = sum_amounts(&lo);
    let spread = sum_amounts(&hi) - placed_lo;
    let remainder = total - placed_lo;

    let mut amounts = Vec::with_capacity(active.len());
    for ((low, high), path) in lo.iter().zip(&hi).zip(&active) {
        let share = if spread > Decimal::ZERO {
            (*high - *low) / spread
        } else {
            Decimal::ZERO
        };
        let amount = round_down(*low + remainder * share).min(path.limit());
        amounts.push(amount);
    }

    // Hand rounding dust out one unit at a time, best path first, to paths
    // with headroom left.
    let mut leftover = total - sum_amounts(&amounts);
    // Division rounding may overshoot by a hair; take it back from the worst.
    for amount in amounts.iter_mut().rev() {
        if leftover >= Decimal::ZERO {
            break;
        }
        let cut = (-leftover).min(*amount);
        *amount -= cut;
        leftover += cut;
    }
    while leftover > Decimal::ZERO {
        let mut progressed = false;
        for (amount, path) in amounts.iter_mut().zip(&active) {
            let extra = leftover.min(Decimal::ONE).min(path.limit() - *amount);
            if extra > Decimal::ZERO {
                *amount += extra;
                leftover -= extra;
                progressed = true;
            }
            if leftover <= Decimal::ZERO {
                break;
            }
        }
        if !progressed {
            return Ok(None);
        }
    }

    Ok(Some(active.into_iter().zip(amounts).collect()))
}

fn evaluate(
    pools: &PoolMap,
    amounts: Vec<(&PricedPath, Decimal)>,
    swap_type: SwapType,
    cost_output_token: Decimal,
) -> Result<Candidate> {
    let mut allocations = Vec::new();
    let mut total_return = Decimal::ZERO;
    let mut interactions = 0u32;

    for (path, amount) in amounts.into_iter().filter(|(_, amount)| *amount > Decimal::ZERO) {
        if let Some(missing) = path.path.pool_ids.iter().find(|id| !pools.contains_key(*id)) {
            return Err(RouterError::degenerate(missing, "pool missing from snapshot"));
        }
        let return_amount = round_return(path.return_amount(amount)?, swap_type);
        total_return = total_return
            .checked_add(return_amount)
            .ok_or(RouterError::InvalidAmount(amount))?;
        interactions += path.path.pool_ids.len() as u32;
        allocations.push(SwapAllocation {
            path_id: path.id().to_string(),
            pool_ids: path.path.pool_ids.clone(),
            tokens: path.path.tokens.clone(),
            amount,
            return_amount,
        });
    }

    let gas = cost_output_token * Decimal::from(interactions);
    let net_return = match swap_type {
        SwapType::ExactIn => total_return - gas,
        SwapType::ExactOut => total_return + gas,
    };
    Ok(Candidate {
        allocations,
        total_return,
        net_return,
    })
}

fn capacity(interest_points: &[PriceOfInterest], max_pools: usize) -> Decimal {
    interest_points
        .iter()
        .map(|point| sum_amounts(point.amounts.iter().take(max_pools)))
        .max()
        .unwrap_or(Decimal::ZERO)
}
