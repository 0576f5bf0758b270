use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::{
    data::domain::{Instrument, Price, Quantity, Symbol, round5},
    error::{PairsimResult, SystemError},
};

/// Taker fee charged on every executed order, as a fraction of notional.
pub const TAKER_FEE_RATE: f64 = 0.0005;

/// Classification of a position transition.
///
/// The classifier is exhaustive over the (current sign, new sign) space for a
/// nonzero quantized size change; every other combination is unrepresentable
/// by construction and guarded by a defensive invariant check.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
    IntoStaticStr,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeKind {
    /// No order executed this step.
    #[default]
    Hold,
    /// Entry from a flat book.
    OpenNew,
    /// Same direction, magnitude grows.
    Increase,
    /// Same direction, magnitude shrinks. Realizes PnL.
    Decrease,
    /// Direction flips: the old position is closed and a new one opened at
    /// the same price. Realizes PnL and resets the average entry price.
    CloseOpenNew,
}

/// The outcome of a single [`Asset::update`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeFill {
    pub kind: TradeKind,
    /// Quantized size delta actually executed (zero for holds).
    pub size_change: Quantity,
}

impl TradeFill {
    fn hold() -> Self {
        Self {
            kind: TradeKind::Hold,
            size_change: Quantity(0.0),
        }
    }

    /// Diagnostic label for the journal, e.g. `OPEN_NEW_1` or `HOLD_0`.
    pub fn label(&self) -> String {
        format!("{}_{}", self.kind, round5(self.size_change.0))
    }
}

/// Single-instrument position ledger.
///
/// Tracks signed size, average entry price, and realized PnL; mutated only
/// through [`Asset::update`] and reset to the zero state at episode
/// boundaries. The average price is meaningful only while the size is
/// nonzero; closing or flipping resets it to the trade price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    symbol: Symbol,
    size: Quantity,
    avg_price: Price,
    realized_pnl: f64,
    market_price: Price,
}

impl Asset {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            size: Quantity(0.0),
            avg_price: Price(0.0),
            realized_pnl: 0.0,
            market_price: Price(0.0),
        }
    }

    pub fn symbol(&self) -> Symbol {
        self.symbol
    }

    pub fn size(&self) -> Quantity {
        self.size
    }

    pub fn avg_price(&self) -> Price {
        self.avg_price
    }

    pub fn market_price(&self) -> Price {
        self.market_price
    }

    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    pub fn market_value(&self) -> f64 {
        self.market_price.0 * self.size.0.abs()
    }

    /// Mark-to-market PnL of the open position.
    ///
    /// Zero while no market price has been observed yet.
    pub fn unrealized_pnl(&self) -> f64 {
        if self.market_price.0 > 0.0 {
            (self.market_price.0 - self.avg_price.0) * self.size.0
        } else {
            0.0
        }
    }

    pub fn total_pnl(&self) -> f64 {
        self.realized_pnl + self.unrealized_pnl()
    }

    /// True iff moving to `new_size` survives quantization, i.e. the step-size
    /// grid and the minimum order size leave a nonzero delta to execute.
    pub fn can_rebalance(&self, new_size: Quantity) -> bool {
        self.symbol.quantize_size(new_size - self.size).0 != 0.0
    }

    /// Executes a transition toward `new_size` at `price`.
    ///
    /// Returns the trade return of this step (fees included, realized PnL on
    /// reductions and flips) together with the classified fill.
    ///
    /// A `new_size` of zero is a hold, not a forced liquidation: the market
    /// price is refreshed but no sizing logic runs. The same applies when the
    /// quantized size delta collapses to zero.
    pub fn update(&mut self, new_size: Quantity, price: Price) -> PairsimResult<(f64, TradeFill)> {
        self.market_price = price;

        if new_size.0 == 0.0 {
            return Ok((0.0, TradeFill::hold()));
        }

        let size_change = self.symbol.quantize_size(new_size - self.size);
        if size_change.0 == 0.0 {
            return Ok((0.0, TradeFill::hold()));
        }

        let kind = self.classify(new_size, size_change)?;
        let fee = size_change.0.abs() * price.0 * TAKER_FEE_RATE;
        let mut trade_return = -fee;
        let old_size = self.size;

        match kind {
            TradeKind::OpenNew => {
                self.avg_price = price;
            }
            TradeKind::Increase => {
                let total_value = old_size.0 * self.avg_price.0 + size_change.0 * price.0;
                self.avg_price = Price(total_value / (old_size.0 + size_change.0));
            }
            TradeKind::Decrease => {
                trade_return += (price.0 - self.avg_price.0) * new_size.0;
                self.realized_pnl += trade_return;
            }
            TradeKind::CloseOpenNew => {
                trade_return += (price.0 - self.avg_price.0) * old_size.0;
                self.realized_pnl += trade_return;
                self.avg_price = price;
            }
            TradeKind::Hold => {
                return Err(SystemError::InvariantViolation(
                    "classify returned HOLD for a nonzero size change".to_string(),
                )
                .into());
            }
        }

        self.size = new_size;

        let fill = TradeFill { kind, size_change };
        tracing::debug!(
            symbol = %self.symbol,
            fill = %fill.label(),
            price = price.0,
            trade_return,
            "order executed"
        );

        Ok((trade_return, fill))
    }

    pub fn reset(&mut self) {
        self.size = Quantity(0.0);
        self.avg_price = Price(0.0);
        self.realized_pnl = 0.0;
        self.market_price = Price(0.0);
    }

    /// Classifies the transition from the current position to `new_size`.
    ///
    /// Only called with a nonzero quantized `size_change`; the error arm
    /// covers combinations that cannot arise from valid quantized input and
    /// signals an algorithmic bug rather than a recoverable condition.
    fn classify(&self, new_size: Quantity, size_change: Quantity) -> PairsimResult<TradeKind> {
        let current = self.size.0;
        let new = new_size.0;

        let kind = if current == 0.0 {
            Some(TradeKind::OpenNew)
        } else if current > 0.0 && new > 0.0 {
            match size_change.0 {
                c if c > 0.0 => Some(TradeKind::Increase),
                c if c < 0.0 => Some(TradeKind::Decrease),
                _ => None,
            }
        } else if current < 0.0 && new < 0.0 {
            match size_change.0 {
                c if c < 0.0 => Some(TradeKind::Increase),
                c if c > 0.0 => Some(TradeKind::Decrease),
                _ => None,
            }
        } else if current > 0.0 && new < 0.0 || current < 0.0 && new > 0.0 {
            Some(TradeKind::CloseOpenNew)
        } else {
            None
        };

        kind.ok_or_else(|| {
            SystemError::InvariantViolation(format!(
                "unclassifiable transition: avg_price={}, size={}, new_size={}, size_change={}",
                self.avg_price.0, current, new, size_change.0
            ))
            .into()
        })
    }
}
