use super::core::gas::cost_output_token;
use super::core::indexer::pool::read_pool_set_from_disk;
use super::core::indexer::token::{read_token_registry, TokenRegistry};
use super::core::interest_points::process_interest_points;
use super::core::optimization::route;
use super::core::paths::{parse_pool_data, process_paths};
use super::core::token_graph::{filter_pools, sort_pools_most_liquid};
use super::core::types::{normalize_address, PoolSet, SwapAllocation, SwapPlan, SwapType, Token};
use super::core::RouterError;
use super::types::{DexConfig, QuoteRequest, QuoteResponse, ResponsePool, Route};
use anyhow::{anyhow, Context, Result};
use num_bigint::BigUint;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::info;

#[derive(Clone, Debug)]
pub struct Snapshot {
    pub pools: PoolSet,
    pub tokens: TokenRegistry,
}

pub fn load_snapshot(config: &DexConfig) -> Result<Snapshot> {
    let pools = read_pool_set_from_disk(config.pool_file_path())?;
    let tokens = read_token_registry(config.token_file_path())?;
    info!(pools = pools.len(), tokens = tokens.len(), "loaded pool snapshot");
    Ok(Snapshot { pools, tokens })
}

// `amount` and `cost_output_token` are base units
pub fn find_best_swaps(
    pool_set: &PoolSet,
    token_in: &str,
    token_out: &str,
    swap_type: SwapType,
    amount: Decimal,
    max_pools: usize,
    cost_output_token: Decimal,
) -> super::core::Result<SwapPlan> {
    let filtered = filter_pools(pool_set, token_in, token_out, max_pools)?;
    let (first_hop_pools, second_hop_pools) = sort_pools_most_liquid(
        token_in,
        token_out,
        &filtered.hop_tokens,
        &filtered.pools_token_in,
        &filtered.pools_token_out,
    );
    let (pools, paths) = parse_pool_data(
        &filtered.direct_pools,
        token_in,
        token_out,
        &first_hop_pools,
        &second_hop_pools,
        &filtered.hop_tokens,
    );
    let paths = process_paths(&paths, &pools, swap_type)?;
    let interest_points = process_interest_points(&paths, swap_type, max_pools)?;
    let (allocations, total_return) = route(
        &pools,
        &paths,
        swap_type,
        amount,
        max_pools,
        cost_output_token,
        &interest_points,
    )?;

    Ok(SwapPlan {
        swap_type,
        total_amount: amount,
        total_return,
        allocations,
    })
}

pub fn validate_request(snapshot: &Snapshot, request: &QuoteRequest) -> Result<()> {
    if request.buy_token_address.trim().is_empty() || request.sell_token_address.trim().is_empty() {
        return Err(anyhow!("Buy and Sell Token addresses cannot be empty"));
    }

    if !snapshot.tokens.contains_key(&normalize_address(&request.buy_token_address))
        || !snapshot.tokens.contains_key(&normalize_address(&request.sell_token_address))
    {
        return Err(anyhow!("Unsupported token address"));
    }

    match (&request.sell_amount, &request.buy_amount) {
        (None, None) => Err(anyhow!("One of sell amount or buy amount is mandatory")),
        (Some(_), Some(_)) => Err(anyhow!("Only one of sell amount or buy amount may be set")),
        _ => Ok(()),
    }
}

pub fn get_aggregator_quotes(
    config: &DexConfig,
    snapshot: &Snapshot,
    request: QuoteRequest,
) -> Result<QuoteResponse> {
    validate_request(snapshot, &request)?;
    let token_in = registry_token(snapshot, &request.sell_token_address)?;
    let token_out = registry_token(snapshot, &request.buy_token_address)?;

    // The optimizer measures returns, and therefore gas, in the token whose
    // amount it is solving for.
    let (swap_type, raw_amount, fixed_token, return_token) =
        match (&request.sell_amount, &request.buy_amount) {
            (Some(sell), _) => (SwapType::ExactIn, sell, token_in, token_out),
            (None, Some(buy)) => (SwapType::ExactOut, buy, token_out, token_in),
            (None, None) => return Err(anyhow!("One of sell amount or buy amount is mandatory")),
        };
    let amount = Decimal::from_str(raw_amount.trim())
        .with_context(|| format!("Invalid amount {raw_amount}"))?;
    let amount = fixed_token.to_base_units(amount)?;

    let gas_price = config.gas_price()?;
    let cost = cost_output_token(&gas_price, &BigUint::from(config.swap_gas), return_token)?;

    let plan = find_best_swaps(
        &snapshot.pools,
        &token_in.address,
        &token_out.address,
        swap_type,
        amount,
        config.max_pools,
        cost,
    )
    .map_err(anyhow::Error::from)?;

    let total_return = return_token.from_base_units(plan.total_return)?;
    info!(
        %swap_type,
        sell = %token_in.symbol,
        buy = %token_out.symbol,
        amount = %raw_amount,
        total_return = %total_return,
        routes = plan.allocations.len(),
        "quoted swap"
    );

    let routes = plan
        .allocations
        .iter()
        .map(|allocation| build_route(snapshot, allocation, amount, fixed_token, return_token))
        .collect::<Result<Vec<_>>>()?;

    let fixed_amount = fixed_token.from_base_units(amount)?.normalize().to_string();
    let (sell_amount, buy_amount) = match swap_type {
        SwapType::ExactIn => (fixed_amount, total_return.normalize().to_string()),
        SwapType::ExactOut => (total_return.normalize().to_string(), fixed_amount),
    };

    Ok(QuoteResponse {
        sell_token_address: token_in.address.clone(),
        buy_token_address: token_out.address.clone(),
        sell_amount,
        buy_amount,
        swap_type: swap_type.to_string(),
        routes,
    })
}

fn registry_token<'a>(snapshot: &'a Snapshot, address: &str) -> Result<&'a Token> {
    snapshot
        .tokens
        .get(&normalize_address(address))
        .ok_or_else(|| anyhow!("Unsupported token address {address}"))
}

fn build_route(
    snapshot: &Snapshot,
    allocation: &SwapAllocation,
    total: Decimal,
    fixed_token: &Token,
    return_token: &Token,
) -> Result<Route> {
    let percent = (allocation.amount / total * Decimal::ONE_HUNDRED)
        .to_f64()
        .unwrap_or(0.0);
    let path = allocation
        .pool_ids
        .iter()
        .zip(allocation.tokens.windows(2))
        .map(|(pool_id, pair)| ResponsePool {
            pool_id: pool_id.clone(),
            token_in: pair[0].clone(),
            token_out: pair[1].clone(),
            token_in_symbol: symbol(snapshot, &pair[0]),
            token_out_symbol: symbol(snapshot, &pair[1]),
        })
        .collect();

    Ok(Route {
        percent,
        amount: fixed_token.from_base_units(allocation.amount)?.normalize().to_string(),
        return_amount: return_token
            .from_base_units(allocation.return_amount)?
            .normalize()
            .to_string(),
        path,
    })
}

// Hop tokens need not be in the registry; fall back to the address.
fn symbol(snapshot: &Snapshot, address: &str) -> String {
    snapshot
        .tokens
        .get(address)
        .map(|token| token.symbol.clone())
        .unwrap_or_else(|| address.to_string())
}

impl From<RouterError> for QuoteError {
    fn from(error: RouterError) -> Self {
        match error {
            RouterError::DegeneratePool { .. } => QuoteError::Internal(error.to_string()),
            other => QuoteError::Rejected(other.to_string()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QuoteError {
    #[error("{0}")]
    Rejected(String),
    #[error("{0}")]
    Internal(String),
}

impl QuoteError {
    pub fn classify(error: &anyhow::Error) -> Self {
        match error.downcast_ref::<RouterError>() {
            Some(router_error) => router_error.clone().into(),
            None => QuoteError::Rejected(format!("{error:#}")),
        }
    }
}
