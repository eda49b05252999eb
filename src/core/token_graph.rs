use super::error::{Result, RouterError};
use super::types::{normalize_address, FilteredPools, Pool, PoolMap, PoolSet};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

pub fn filter_pools(
    pool_set: &PoolSet,
    token_in: &str,
    token_out: &str,
    max_pools: usize,
) -> Result<FilteredPools> {
    let token_in = normalize_address(token_in);
    let token_out = normalize_address(token_out);
    if token_in == token_out {
        return Err(RouterError::InvalidRequest(format!(
            "token in and token out are both {token_in}"
        )));
    }

    let mut filtered = FilteredPools::default();
    let mut paired_with_in: BTreeSet<String> = BTreeSet::new();
    let mut paired_with_out: BTreeSet<String> = BTreeSet::new();
    let mut touches_either = false;

    for pool in pool_set {
        let holds_in = pool.holds(&token_in);
        let holds_out = pool.holds(&token_out);
        touches_either |= holds_in || holds_out;

        if holds_in && holds_out {
            filtered.direct_pools.insert(pool.id.clone(), pool.clone());
        } else if max_pools > 1 && holds_in {
            paired_with_in.extend(pool.live_addresses().filter(|t| *t != token_in));
            filtered.pools_token_in.insert(pool.id.clone(), pool.clone());
        } else if max_pools > 1 && holds_out {
            paired_with_out.extend(pool.live_addresses().filter(|t| *t != token_out));
            filtered.pools_token_out.insert(pool.id.clone(), pool.clone());
        }
    }

    if !touches_either {
        return Err(RouterError::EmptyPoolSet { token_in, token_out });
    }

    filtered.hop_tokens = paired_with_in
        .intersection(&paired_with_out)
        .cloned()
        .collect();

    let hop_tokens = &filtered.hop_tokens;
    let holds_hop = |pool: &Pool| hop_tokens.iter().any(|hop| pool.holds(hop));
    filtered.pools_token_in.retain(|_, pool| holds_hop(pool));
    filtered.pools_token_out.retain(|_, pool| holds_hop(pool));

    debug!(
        direct = filtered.direct_pools.len(),
        hops = filtered.hop_tokens.len(),
        first_leg = filtered.pools_token_in.len(),
        second_leg = filtered.pools_token_out.len(),
        "filtered pools"
    );
    Ok(filtered)
}

// Liquidity is the outer token balance over its weight share; ties go to
// the lowest pool id.
pub fn sort_pools_most_liquid(
    token_in: &str,
    token_out: &str,
    hop_tokens: &[String],
    pools_token_in: &PoolMap,
    pools_token_out: &PoolMap,
) -> (BTreeMap<String, Pool>, BTreeMap<String, Pool>) {
    let token_in = normalize_address(token_in);
    let token_out = normalize_address(token_out);
    let mut first_hop_pools = BTreeMap::new();
    let mut second_hop_pools = BTreeMap::new();

    for hop in hop_tokens {
        let first = most_liquid(pools_token_in, &token_in, hop);
        let second = most_liquid(pools_token_out, &token_out, hop);
        match (first, second) {
            (Some(first), Some(second)) => {
                first_hop_pools.insert(hop.clone(), first.clone());
                second_hop_pools.insert(hop.clone(), second.clone());
            }
            _ => debug!(hop = %hop, "hop token lacks a pool on one leg, skipping"),
        }
    }

    (first_hop_pools, second_hop_pools)
}

fn most_liquid<'a>(pools: &'a PoolMap, ranked_token: &str, hop: &str) -> Option<&'a Pool> {
    // PoolMap iterates by ascending id, so the strict comparison keeps the
    // lowest id among equals.
    let mut best: Option<(&Pool, Decimal)> = None;
    for pool in pools.values().filter(|pool| pool.holds(hop)) {
        let Some(liquidity) = normalized_liquidity(pool, ranked_token) else {
            continue;
        };
        if best.map_or(true, |(_, top)| liquidity > top) {
            best = Some((pool, liquidity));
        }
    }
    best.map(|(pool, _)| pool)
}

fn normalized_liquidity(pool: &Pool, token: &str) -> Option<Decimal> {
    let held = pool.live_token(token)?;
    let share = held.weight.checked_div(pool.total_weight())?;
    held.balance.checked_div(share)
}
