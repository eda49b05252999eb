use dex_router::core::gas::cost_output_token;
use dex_router::core::indexer::pool::{read_pool_set_from_disk, write_pool_set_on_disk};
use dex_router::core::RouterError;
use dex_router::orchestrator::{get_aggregator_quotes, load_snapshot, QuoteError, Snapshot};
use dex_router::types::{DexConfig, QuoteRequest};
use num_bigint::BigUint;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::path::Path;
use std::str::FromStr;

const USDC: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";
const DAI: &str = "0x6b175474e89094c44da98b954eedeac495271d0f";
const WETH: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";

fn test_config() -> DexConfig {
    let mut config = DexConfig::default();
    config.working_dir = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/working_dir")
        .to_string_lossy()
        .to_string();
    config
}

fn snapshot(config: &DexConfig) -> Snapshot {
    load_snapshot(config).unwrap()
}

fn request(sell: &str, buy: &str, sell_amount: Option<&str>, buy_amount: Option<&str>) -> QuoteRequest {
    QuoteRequest {
        sell_token_address: sell.to_string(),
        buy_token_address: buy.to_string(),
        sell_amount: sell_amount.map(str::to_string),
        buy_amount: buy_amount.map(str::to_string),
    }
}

#[test]
fn loads_snapshot_in_base_units() {
    let config = test_config();
    let snapshot = snapshot(&config);

    // The single-token pool is skipped
    assert_eq!(snapshot.pools.len(), 6);
    assert!(snapshot.pools.iter().all(|pool| pool.id != "0x06"));
    assert_eq!(snapshot.tokens.len(), 4);

    let pool = snapshot.pools.iter().find(|pool| pool.id == "0x01").unwrap();
    assert_eq!(pool.tokens[0].address, USDC);
    assert_eq!(pool.tokens[0].balance, dec!(1000000000000));
    assert_eq!(pool.tokens[1].balance, dec!(1000000000000000000000000));

    let weighted = snapshot.pools.iter().find(|pool| pool.id == "0x02").unwrap();
    assert_eq!(weighted.tokens[0].weight, dec!(40));

    let dai = &snapshot.tokens[DAI];
    assert_eq!(dai.symbol, "DAI");
    assert_eq!(dai.decimals, 18);
    assert_eq!(dai.per_eth, dec!(2000));
    assert_eq!(snapshot.tokens["0x2260fac5e5542a773aa44fbcfedf7c193bc2c599"].per_eth, Decimal::ZERO);
}

#[test]
fn pool_snapshot_survives_a_disk_round_trip() {
    let config = test_config();
    let pools = read_pool_set_from_disk(config.pool_file_path()).unwrap();

    let file = std::env::temp_dir().join(format!("dex-router-pools-{}.json", std::process::id()));
    write_pool_set_on_disk(&file, &pools).unwrap();
    let reloaded = read_pool_set_from_disk(&file).unwrap();
    std::fs::remove_file(&file).unwrap();

    assert_eq!(pools, reloaded);
}

#[test]
fn pools_with_unrepresentable_balances_are_skipped() {
    let file = std::env::temp_dir().join(format!("dex-router-huge-{}.json", std::process::id()));
    // 1e11 DAI at 18 decimals is 1e29 base units, past the decimal range
    let json = r#"{
  "pools": [
    {
      "id": "0xHUGE",
      "swapFee": "0.003",
      "tokens": [
        { "address": "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48", "balance": "1000000", "decimals": 6, "weight": "0.5" },
        { "address": "0x6b175474e89094c44da98b954eedeac495271d0f", "balance": "100000000000", "decimals": 18, "weight": "0.5" }
      ]
    },
    {
      "id": "0x01",
      "swapFee": "0.003",
      "tokens": [
        { "address": "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48", "balance": "1000000", "decimals": 6, "weight": "0.5" },
        { "address": "0x6b175474e89094c44da98b954eedeac495271d0f", "balance": "1000000", "decimals": 18, "weight": "0.5" }
      ]
    }
  ]
}"#;
    std::fs::write(&file, json).unwrap();
    let pools = read_pool_set_from_disk(&file).unwrap();
    std::fs::remove_file(&file).unwrap();

    assert_eq!(pools.len(), 1);
    assert_eq!(pools[0].id, "0x01");
    assert_eq!(pools[0].tokens[1].balance, dec!(1000000000000000000000000));
}

#[test]
fn gas_cost_is_priced_in_the_return_token() {
    let config = test_config();
    let snapshot = snapshot(&config);
    let gas_price = config.gas_price().unwrap();
    let swap_gas = BigUint::from(config.swap_gas);

    // 30 gwei * 100k gas = 0.003 ETH, i.e. 6 DAI
    let dai = cost_output_token(&gas_price, &swap_gas, &snapshot.tokens[DAI]).unwrap();
    assert_eq!(dai, dec!(6000000000000000000));

    let usdc = cost_output_token(&gas_price, &swap_gas, &snapshot.tokens[USDC]).unwrap();
    assert_eq!(usdc, dec!(6000000));

    let weth = cost_output_token(&gas_price, &swap_gas, &snapshot.tokens[WETH]).unwrap();
    assert_eq!(weth, dec!(3000000000000000));

    let unpriced = &snapshot.tokens["0x2260fac5e5542a773aa44fbcfedf7c193bc2c599"];
    assert_eq!(cost_output_token(&gas_price, &swap_gas, unpriced).unwrap(), Decimal::ZERO);
}

#[test]
fn get_quotes_given_amount_in() {
    let config = test_config();
    let snapshot = snapshot(&config);

    let response =
        get_aggregator_quotes(&config, &snapshot, request(USDC, DAI, Some("1000"), None)).unwrap();

    assert_eq!(response.swap_type, "exactIn");
    assert_eq!(response.sell_token_address, USDC);
    assert_eq!(response.buy_token_address, DAI);
    assert_eq!(response.sell_amount, "1000");

    let bought = Decimal::from_str(&response.buy_amount).unwrap();
    assert!(bought > dec!(985) && bought < dec!(1000), "bought {bought}");

    assert!(!response.routes.is_empty());
    let sold: Decimal = response
        .routes
        .iter()
        .map(|route| Decimal::from_str(&route.amount).unwrap())
        .sum();
    assert_eq!(sold, dec!(1000));
    let returned: Decimal = response
        .routes
        .iter()
        .map(|route| Decimal::from_str(&route.return_amount).unwrap())
        .sum();
    assert_eq!(returned, bought);
    let percent: f64 = response.routes.iter().map(|route| route.percent).sum();
    assert!((percent - 100.0).abs() < 1e-6);

    for route in &response.routes {
        let first = route.path.first().unwrap();
        let last = route.path.last().unwrap();
        assert_eq!(first.token_in, USDC);
        assert_eq!(first.token_in_symbol, "USDC");
        assert_eq!(last.token_out, DAI);
        assert_eq!(last.token_out_symbol, "DAI");
    }
}

#[test]
fn get_quotes_given_amount_out() {
    let config = test_config();
    let snapshot = snapshot(&config);

    let response =
        get_aggregator_quotes(&config, &snapshot, request(USDC, DAI, None, Some("1000"))).unwrap();

    assert_eq!(response.swap_type, "exactOut");
    assert_eq!(response.buy_amount, "1000");
    let sold = Decimal::from_str(&response.sell_amount).unwrap();
    assert!(sold > dec!(1000) && sold < dec!(1015), "sold {sold}");

    let bought: Decimal = response
        .routes
        .iter()
        .map(|route| Decimal::from_str(&route.amount).unwrap())
        .sum();
    assert_eq!(bought, dec!(1000));
}

#[test]
fn quotes_accept_mixed_case_addresses() {
    let config = test_config();
    let snapshot = snapshot(&config);

    let lower = get_aggregator_quotes(&config, &snapshot, request(USDC, DAI, Some("250"), None)).unwrap();
    let mixed = get_aggregator_quotes(
        &config,
        &snapshot,
        request(
            "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
            "0x6B175474E89094C44Da98b954EedeAC495271d0F",
            Some("250"),
            None,
        ),
    )
    .unwrap();
    assert_eq!(lower, mixed);
}

#[test]
fn rejects_malformed_requests() {
    let config = test_config();
    let snapshot = snapshot(&config);

    let both = get_aggregator_quotes(&config, &snapshot, request(USDC, DAI, Some("1"), Some("1")));
    assert!(both.is_err());

    let neither = get_aggregator_quotes(&config, &snapshot, request(USDC, DAI, None, None));
    assert!(neither.is_err());

    let unknown = get_aggregator_quotes(&config, &snapshot, request("0xdead", DAI, Some("1"), None));
    assert!(unknown.unwrap_err().to_string().contains("Unsupported token address"));

    let garbage = get_aggregator_quotes(&config, &snapshot, request(USDC, DAI, Some("lots"), None));
    assert!(matches!(
        QuoteError::classify(&garbage.unwrap_err()),
        QuoteError::Rejected(_)
    ));

    let same = get_aggregator_quotes(&config, &snapshot, request(USDC, USDC, Some("1"), None)).unwrap_err();
    assert!(matches!(
        same.downcast_ref::<RouterError>(),
        Some(RouterError::InvalidRequest(_))
    ));
}

#[test]
fn oversized_trade_reports_insufficient_liquidity() {
    let config = test_config();
    let snapshot = snapshot(&config);

    let error = get_aggregator_quotes(&config, &snapshot, request(USDC, DAI, Some("10000000"), None))
        .unwrap_err();
    assert!(matches!(
        error.downcast_ref::<RouterError>(),
        Some(RouterError::InsufficientLiquidity { .. })
    ));
    assert!(matches!(QuoteError::classify(&error), QuoteError::Rejected(_)));
}

#[test]
fn routes_through_a_hop_token() {
    let config = test_config();
    let snapshot = snapshot(&config);

    // WBTC only trades against WETH, which then reaches DAI
    let response = get_aggregator_quotes(
        &config,
        &snapshot,
        request("0x2260fac5e5542a773aa44fbcfedf7c193bc2c599", DAI, Some("1"), None),
    )
    .unwrap();

    assert_eq!(response.routes.len(), 1);
    let route = &response.routes[0];
    assert_eq!(route.amount, "1");
    assert_eq!(route.path.len(), 2);
    assert_eq!(route.path[0].pool_id, "0x07");
    assert_eq!(route.path[0].token_out_symbol, "WETH");
    assert_eq!(route.path[1].pool_id, "0x04");
    assert_eq!(route.path[1].token_in, WETH);

    let bought = Decimal::from_str(&response.buy_amount).unwrap();
    assert!(bought > dec!(35000) && bought < dec!(40000), "bought {bought}");
}

#[test]
fn default_config_points_at_working_dir() {
    let config = DexConfig::default();
    assert_eq!(config.max_pools, 4);
    assert_eq!(config.swap_gas, 100_000);
    assert_eq!(config.gas_price().unwrap(), BigUint::from(30_000_000_000u64));
    assert_eq!(config.pool_file_path(), Path::new("working_dir").join("pools.json"));
    assert_eq!(config.token_file_path(), Path::new("working_dir").join("tokens.csv"));
}
