use std::sync::Arc;

use pairsim::prelude::*;
use tracing_subscriber::EnvFilter;

/// Installs the process-wide test subscriber; later calls are no-ops.
pub fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// One synthetic week from parallel BTC/ETH price paths, one row per minute.
pub fn setup_week(btc: &[f64], eth: &[f64], performance: f64) -> WeekData {
    assert_eq!(btc.len(), eth.len(), "price paths must be parallel");

    WeekData {
        rows: btc
            .iter()
            .zip(eth)
            .enumerate()
            .map(|(t, (btc_price, eth_price))| MarketRow {
                trading_time: t as i64 * 60_000,
                features: vec![0.1, -0.2, 0.3, 0.05],
                target_price: [Price(*btc_price), Price(*eth_price)],
            })
            .collect(),
        performance,
    }
}

/// Dataset where every week replays the same price paths.
///
/// With 31 weeks and curriculum fraction 0.1 the eligible training range is
/// `[2, 3)`, so every training episode replays week 2.
pub fn setup_uniform_dataset(
    btc: &[f64],
    eth: &[f64],
    performance: f64,
) -> Arc<TableMarketData> {
    let weeks = (0..31).map(|_| setup_week(btc, eth, performance)).collect();
    Arc::new(TableMarketData::new(weeks).unwrap())
}

pub fn setup_simulator(data: Arc<TableMarketData>, seed: u64) -> Simulator {
    setup_tracing();
    let config = SimulatorConfig::default()
        .with_seed(seed)
        .with_step_detail(true);
    Simulator::new(config, data).unwrap()
}
