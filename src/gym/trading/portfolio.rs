use serde::{Deserialize, Serialize};

use crate::{
    data::domain::{Instrument, Price, Quantity, Symbol, round5},
    error::{EnvError, PairsimResult},
    gym::trading::{
        action::ActionId,
        asset::{Asset, TradeFill},
    },
};

/// Per-leg outcome of one order execution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExecuteResult {
    /// Trade return per leg, fees included, rounded to five decimals.
    pub trade_returns: [f64; 2],
    pub fills: [TradeFill; 2],
}

impl ExecuteResult {
    /// Aggregate trade return across both legs.
    pub fn net_trade_return(&self) -> f64 {
        self.trade_returns.iter().sum()
    }
}

/// Snapshot of aggregate portfolio accounting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioInfo {
    /// Initial equity plus the total PnL of both legs.
    pub portfolio_value: f64,

    /// Per-leg total (realized + unrealized) PnL, rounded to five decimals.
    pub assets_pnl: [f64; 2],

    /// Value change since the last market-price snapshot.
    pub changed_value: f64,
}

/// Coordinates order execution across the fixed two-leg pair.
///
/// Owns one [`Asset`] per leg and enforces the joint rebalance-eligibility
/// rule: an action executes only if **both** legs can move by at least their
/// minimum order size. An ineligible action degrades to a hold on both legs,
/// never to a one-sided fill.
#[derive(Debug, Clone)]
pub struct PortfolioManager {
    symbols: [Symbol; 2],
    initial_equity: f64,
    legs: [Asset; 2],
    market_prices: [Price; 2],
    previous_value: f64,
}

impl PortfolioManager {
    pub fn new(symbols: [Symbol; 2], initial_equity: f64) -> PairsimResult<Self> {
        if symbols[0] == symbols[1] {
            return Err(EnvError::InvalidConfig(format!(
                "pair legs must be distinct, got {} twice",
                symbols[0]
            ))
            .into());
        }
        if initial_equity <= 0.0 {
            return Err(EnvError::InvalidConfig(format!(
                "initial equity must be positive, got {initial_equity}"
            ))
            .into());
        }

        Ok(Self {
            symbols,
            initial_equity,
            legs: [Asset::new(symbols[0]), Asset::new(symbols[1])],
            market_prices: [Price(0.0); 2],
            previous_value: initial_equity,
        })
    }

    pub fn symbols(&self) -> [Symbol; 2] {
        self.symbols
    }

    pub fn initial_equity(&self) -> f64 {
        self.initial_equity
    }

    pub fn market_prices(&self) -> [Price; 2] {
        self.market_prices
    }

    /// Per-leg average entry prices, rounded for reporting.
    pub fn avg_prices(&self) -> [f64; 2] {
        self.legs.each_ref().map(|leg| round5(leg.avg_price().0))
    }

    /// Per-leg position sizes, rounded for reporting.
    pub fn sizes(&self) -> [f64; 2] {
        self.legs.each_ref().map(|leg| round5(leg.size().0))
    }

    pub fn portfolio_info(&self) -> PortfolioInfo {
        let assets_pnl = self.legs.each_ref().map(|leg| round5(leg.total_pnl()));
        let portfolio_value = self.initial_equity + assets_pnl.iter().sum::<f64>();

        PortfolioInfo {
            portfolio_value,
            assets_pnl,
            changed_value: round5(portfolio_value - self.previous_value),
        }
    }

    /// Resolves an action id into quantized per-leg target sizes and checks
    /// joint eligibility.
    ///
    /// The target notional per leg is `ratio × portfolio_value`, snapped to
    /// the tick grid; dividing by the leg's market price and snapping to the
    /// step grid yields the target size. The flat action forces both targets
    /// to zero before quantization.
    pub fn available_action(&self, action: ActionId) -> (bool, [Quantity; 2]) {
        let portfolio_value = self.portfolio_info().portfolio_value;
        let ratios = action.ratios();

        let mut targets = [Quantity(0.0); 2];
        let mut eligible = true;

        for (idx, symbol) in self.symbols.iter().enumerate() {
            let price = self.market_prices[idx].0;

            let target = if action.is_flat() || price <= 0.0 {
                Quantity(0.0)
            } else {
                let order_value = symbol.quantize_value(ratios[idx] * portfolio_value);
                symbol.quantize_size(Quantity(order_value / price))
            };

            targets[idx] = target;
            eligible &= self.legs[idx].can_rebalance(target);
        }

        (eligible, targets)
    }

    /// Executes an action against the current market prices.
    ///
    /// Ineligible actions execute as a zero-target hold on both legs rather
    /// than a forced liquidation.
    #[tracing::instrument(skip(self), fields(action = %action))]
    pub fn execute_order(&mut self, action: ActionId) -> PairsimResult<ExecuteResult> {
        let (eligible, targets) = self.available_action(action);

        let mut trade_returns = [0.0; 2];
        let mut fills = [TradeFill::default(); 2];

        for idx in 0..2 {
            let target = if eligible { targets[idx] } else { Quantity(0.0) };
            let (trade_return, fill) = self.legs[idx].update(target, self.market_prices[idx])?;
            trade_returns[idx] = round5(trade_return);
            fills[idx] = fill;
        }

        if !eligible {
            tracing::debug!("action not jointly executable, held both legs");
        }

        Ok(ExecuteResult {
            trade_returns,
            fills,
        })
    }

    /// Re-prices the portfolio for the next timestep.
    ///
    /// Snapshots the current portfolio value **before** applying the new
    /// prices, so the next `changed_value` reading isolates price movement
    /// from the value change caused by order execution earlier in the step.
    pub fn update_market_price(&mut self, prices: [Price; 2]) {
        self.previous_value = self.portfolio_info().portfolio_value;
        self.market_prices = prices;
    }

    pub fn reset(&mut self) -> PortfolioInfo {
        for leg in &mut self.legs {
            leg.reset();
        }
        self.market_prices = [Price(0.0); 2];
        self.previous_value = self.initial_equity;
        self.portfolio_info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gym::trading::{
        action::{FLAT_ACTION, NO_OP_ACTION},
        asset::TradeKind,
    };

    const EPS: f64 = 1e-9;

    fn manager() -> PortfolioManager {
        PortfolioManager::new([Symbol::Btcusdt, Symbol::Ethusdt], 1500.0).unwrap()
    }

    fn priced_manager(btc: f64, eth: f64) -> PortfolioManager {
        let mut pm = manager();
        pm.update_market_price([Price(btc), Price(eth)]);
        pm
    }

    #[test]
    fn construction_rejects_degenerate_configs() {
        assert!(PortfolioManager::new([Symbol::Btcusdt, Symbol::Btcusdt], 1500.0).is_err());
        assert!(PortfolioManager::new([Symbol::Btcusdt, Symbol::Ethusdt], 0.0).is_err());
    }

    #[test]
    fn spread_action_opens_both_legs() {
        let mut pm = priced_manager(30_000.0, 2_000.0);
        let action = ActionId::new(1).unwrap(); // (0.5, -0.5)

        let (eligible, targets) = pm.available_action(action);
        assert!(eligible);
        // 750 / 30000 = 0.025 BTC long; 750 / 2000 = 0.375 ETH short.
        assert!((targets[0].0 - 0.025).abs() < EPS);
        assert!((targets[1].0 + 0.375).abs() < EPS);

        let result = pm.execute_order(action).unwrap();
        assert_eq!(result.fills[0].kind, TradeKind::OpenNew);
        assert_eq!(result.fills[1].kind, TradeKind::OpenNew);
        assert!(pm.sizes()[0] > 0.0);
        assert!(pm.sizes()[1] < 0.0);
    }

    #[test]
    fn one_small_leg_blocks_both() {
        // ETH at 50k: 375 / 50000 = 0.0075, below ETH's 0.01 minimum.
        let mut pm = priced_manager(30_000.0, 50_000.0);
        let action = ActionId::new(6).unwrap(); // (0.25, -0.25)

        let (eligible, _) = pm.available_action(action);
        assert!(!eligible);

        let result = pm.execute_order(action).unwrap();
        assert_eq!(result.trade_returns, [0.0, 0.0]);
        assert_eq!(result.fills[0].kind, TradeKind::Hold);
        assert_eq!(result.fills[1].kind, TradeKind::Hold);
        assert_eq!(pm.sizes(), [0.0, 0.0]);
    }

    #[test]
    fn flat_action_targets_zero_on_both_legs() {
        let mut pm = priced_manager(30_000.0, 2_000.0);
        pm.execute_order(ActionId::new(3).unwrap()).unwrap();
        assert!(pm.sizes()[0] != 0.0);

        let (eligible, targets) = pm.available_action(FLAT_ACTION);
        assert!(eligible);
        assert_eq!(targets, [Quantity(0.0), Quantity(0.0)]);

        // Zero targets execute as holds under current risk policy.
        let result = pm.execute_order(FLAT_ACTION).unwrap();
        assert_eq!(result.fills[0].kind, TradeKind::Hold);
        assert!(pm.sizes()[0] != 0.0);
    }

    #[test]
    fn no_op_on_flat_book_is_ineligible_but_harmless() {
        let mut pm = priced_manager(30_000.0, 2_000.0);
        let (eligible, _) = pm.available_action(NO_OP_ACTION);
        assert!(!eligible);

        let result = pm.execute_order(NO_OP_ACTION).unwrap();
        assert_eq!(result.net_trade_return(), 0.0);
    }

    #[test]
    fn portfolio_info_aggregates_leg_pnl() {
        let mut pm = priced_manager(30_000.0, 2_000.0);
        let result = pm.execute_order(ActionId::new(3).unwrap()).unwrap();

        let info = pm.portfolio_info();
        // Opening fees live in the trade returns, not in asset PnL: marked at
        // the entry price, the freshly opened legs carry zero PnL.
        assert!(result.net_trade_return() < 0.0);
        assert_eq!(info.assets_pnl, [0.0, 0.0]);
        assert_eq!(info.portfolio_value, 1500.0);
    }

    #[test]
    fn changed_value_reflects_price_movement_since_snapshot() {
        let mut pm = priced_manager(30_000.0, 2_000.0);
        pm.execute_order(ActionId::new(3).unwrap()).unwrap();

        // Re-price: snapshot happens before the new prices apply.
        pm.update_market_price([Price(30_300.0), Price(2_000.0)]);
        // A hold marks both legs to the new prices.
        pm.execute_order(NO_OP_ACTION).unwrap();

        let info = pm.portfolio_info();
        // Long 0.05 BTC (1500 / 30000), price +300 => +15 on the BTC leg.
        assert!(
            (info.changed_value - 15.0).abs() < 0.01,
            "changed_value = {}",
            info.changed_value
        );
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut pm = priced_manager(30_000.0, 2_000.0);
        pm.execute_order(ActionId::new(4).unwrap()).unwrap();

        let info = pm.reset();
        assert_eq!(info.portfolio_value, 1500.0);
        assert_eq!(info.assets_pnl, [0.0, 0.0]);
        assert_eq!(info.changed_value, 0.0);
        assert_eq!(pm.market_prices(), [Price(0.0), Price(0.0)]);
        assert_eq!(pm.sizes(), [0.0, 0.0]);
    }
}
