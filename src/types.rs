use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DexConfig {
    pub working_dir: String,
    pub pool_file: String,
    pub token_file: String,
    pub max_pools: usize,
    pub gas_price_wei: String,
    pub swap_gas: u64,
    pub listen_addr: String,
}

#[derive(Serialize, Deserialize, ToSchema, IntoParams, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    #[schema(example = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48")]
    pub sell_token_address: String,

    #[schema(example = "0x6b175474e89094c44da98b954eedeac495271d0f")]
    pub buy_token_address: String,

    // Whole tokens, e.g. "1000.5"; exactly one of the two amounts is set
    #[schema(example = "1000", nullable = true)]
    pub sell_amount: Option<String>,

    #[schema(example = "1000", nullable = true)]
    pub buy_amount: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub sell_token_address: String,
    pub buy_token_address: String,
    pub sell_amount: String,
    pub buy_amount: String,
    pub swap_type: String,
    pub routes: Vec<Route>,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub percent: f64,
    pub amount: String,
    pub return_amount: String,
    pub path: Vec<ResponsePool>,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePool {
    pub pool_id: String,
    pub token_in: String,
    pub token_out: String,
    pub token_in_symbol: String,
    pub token_out_symbol: String,
}
