use super::error::{Result, RouterError};
use super::math::bisect;
use super::pool::Leg;
use super::types::{normalize_address, Path, PathKind, Pool, PoolMap, SwapType};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

// No truncation to max_pools here; the optimizer enforces it.
pub fn parse_pool_data(
    direct_pools: &PoolMap,
    token_in: &str,
    token_out: &str,
    first_hop_pools: &BTreeMap<String, Pool>,
    second_hop_pools: &BTreeMap<String, Pool>,
    hop_tokens: &[String],
) -> (PoolMap, Vec<Path>) {
    let token_in = normalize_address(token_in);
    let token_out = normalize_address(token_out);
    let mut pools = PoolMap::new();
    let mut paths = Vec::new();

    for (id, pool) in direct_pools {
        pools.insert(id.clone(), pool.clone());
        paths.push(Path {
            id: id.clone(),
            kind: PathKind::Direct,
            pool_ids: vec![id.clone()],
            tokens: vec![token_in.clone(), token_out.clone()],
        });
    }

    for hop in hop_tokens {
        let (Some(first), Some(second)) = (first_hop_pools.get(hop), second_hop_pools.get(hop))
        else {
            continue;
        };
        pools.insert(first.id.clone(), first.clone());
        pools.insert(second.id.clone(), second.clone());
        paths.push(Path {
            id: format!("{}>{}", first.id, second.id),
            kind: PathKind::Multihop,
            pool_ids: vec![first.id.clone(), second.id.clone()],
            tokens: vec![token_in.clone(), hop.clone(), token_out.clone()],
        });
    }

    debug!(pools = pools.len(), paths = paths.len(), "built candidate paths");
    (pools, paths)
}

// Amounts are on the fixed side of the swap: token_in sold for exact-in,
// token_out bought for exact-out.
#[derive(Clone, Debug, PartialEq)]
pub struct PricedPath {
    pub path: Path,
    pub swap_type: SwapType,
    legs: Vec<Leg>,
    spot_price: Decimal,
    limit: Decimal,
}

pub fn process_paths(paths: &[Path], pools: &PoolMap, swap_type: SwapType) -> Result<Vec<PricedPath>> {
    let mut priced = paths
        .iter()
        .map(|path| PricedPath::new(path.clone(), pools, swap_type))
        .collect::<Result<Vec<_>>>()?;
    priced.sort_by(|a, b| {
        a.spot_price
            .cmp(&b.spot_price)
            .then_with(|| a.path.id.cmp(&b.path.id))
    });
    Ok(priced)
}

impl PricedPath {
    pub fn new(path: Path, pools: &PoolMap, swap_type: SwapType) -> Result<Self> {
        let legs = path
            .pool_ids
            .iter()
            .zip(path.tokens.windows(2))
            .map(|(pool_id, pair)| {
                let pool = pools
                    .get(pool_id)
                    .ok_or_else(|| RouterError::degenerate(pool_id, "pool missing from snapshot"))?;
                Leg::from_pool(pool, &pair[0], &pair[1])
            })
            .collect::<Result<Vec<_>>>()?;
        if legs.is_empty() || legs.len() > 2 {
            return Err(RouterError::InvalidRequest(format!(
                "path {} has {} legs",
                path.id,
                legs.len()
            )));
        }

        let mut spot_price = Decimal::ONE;
        for leg in &legs {
            spot_price = spot_price
                .checked_mul(leg.spot_price()?)
                .ok_or_else(|| RouterError::degenerate(&leg.pool_id, "spot price overflow"))?;
        }

        let mut priced = Self {
            path,
            swap_type,
            legs,
            spot_price,
            limit: Decimal::ZERO,
        };
        priced.limit = priced.compute_limit()?;
        Ok(priced)
    }

    pub fn id(&self) -> &str {
        &self.path.id
    }

    pub fn spot_price(&self) -> Decimal {
        self.spot_price
    }

    pub fn limit(&self) -> Decimal {
        self.limit
    }

    pub fn return_amount(&self, amount: Decimal) -> Result<Decimal> {
        Ok(self.trace(amount)?.1)
    }

    pub fn marginal_price(&self, amount: Decimal) -> Result<Decimal> {
        if amount <= Decimal::ZERO {
            return Ok(self.spot_price);
        }
        let (flows, _) = self.trace(amount)?;
        let mut price = Decimal::ONE;
        for (leg, (amount_in, amount_out)) in self.legs.iter().zip(flows) {
            price = price
                .checked_mul(leg.marginal_price(amount_in, amount_out)?)
                .ok_or_else(|| RouterError::degenerate(&leg.pool_id, "price overflow"))?;
        }
        Ok(price)
    }

    // Clamped to [0, limit]
    pub fn amount_for_price(&self, price: Decimal) -> Result<Decimal> {
        if price <= self.spot_price || self.limit <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }
        if self.marginal_price(self.limit)? <= price {
            return Ok(self.limit);
        }
        let (lo, _) = bisect(Decimal::ZERO, self.limit, |amount| {
            Ok(self.marginal_price(amount)? > price)
        })?;
        Ok(lo)
    }

    fn trace(&self, amount: Decimal) -> Result<(Vec<(Decimal, Decimal)>, Decimal)> {
        let mut flows = Vec::with_capacity(self.legs.len());
        match self.swap_type {
            SwapType::ExactIn => {
                let mut current = amount;
                for leg in &self.legs {
                    let out = leg.out_given_in(current)?;
                    flows.push((current, out));
                    current = out;
                }
                Ok((flows, current))
            }
            SwapType::ExactOut => {
                let mut current = amount;
                for leg in self.legs.iter().rev() {
                    let paid = leg.in_given_out(current)?;
                    flows.push((paid, current));
                    current = paid;
                }
                flows.reverse();
                Ok((flows, current))
            }
        }
    }

    fn compute_limit(&self) -> Result<Decimal> {
        let swap_type = self.swap_type;
        let limit = match self.legs.as_slice() {
            [leg] => leg.limit(swap_type),
            [first, second] => match swap_type {
                SwapType::ExactIn => {
                    // What the first leg may sell, capped by the input that
                    // would feed the second leg exactly its own limit.
                    let own = first.limit(swap_type)?;
                    let second_in = second.limit(swap_type)?;
                    if second_in >= first.balance_out {
                        return Ok(own);
                    }
                    // Unrepresentable input is more than the first leg takes.
                    match first.in_given_out(second_in) {
                        Ok(needed) => Ok(own.min(needed)),
                        Err(_) => Ok(own),
                    }
                }
                SwapType::ExactOut => {
                    // What the second leg may release, capped by the output
                    // the first leg's own limit can pay for.
                    let own = second.limit(swap_type)?;
                    let first_out = first.limit(swap_type)?;
                    let fed = first_out.min(second.input_headroom());
                    Ok(own.min(second.out_given_in(fed)?))
                }
            },
            _ => Ok(Decimal::ZERO),
        }?;
        Ok(limit.trunc())
    }
}
