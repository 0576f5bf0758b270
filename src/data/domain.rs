use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, IntoStaticStr};
use strum_macros::EnumString;

use crate::{
    impl_abs_primitive, impl_add_sub_mul_div_primitive, impl_from_primitive, impl_neg_primitive,
};

// ================================================================================================
// Domain Strong Types (NewTypes)
// ================================================================================================

/// Represents a price level in the quote currency (USDT).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Price(pub f64);
impl_from_primitive!(Price, f64);
impl_add_sub_mul_div_primitive!(Price, f64);
impl_neg_primitive!(Price, f64);
impl_abs_primitive!(Price, f64);

/// Represents a signed amount of the base asset.
///
/// Positive values are long exposure, negative values short exposure. This is
/// the fundamental unit for position sizes and order deltas. It wraps `f64`
/// to support fractional assets while providing strong typing against `Price`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Quantity(pub f64);
impl_from_primitive!(Quantity, f64);
impl_add_sub_mul_div_primitive!(Quantity, f64);
impl_neg_primitive!(Quantity, f64);
impl_abs_primitive!(Quantity, f64);

/// Represents the sequential index of a historical trading week.
///
/// Weeks 0 and 1 are reserved as lookback history for feature normalization
/// and are never sampled as episodes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct WeekId(pub usize);
impl_from_primitive!(WeekId, usize);

/// Rounds a value to five decimal places for reporting and aggregate accounting.
pub fn round5(value: f64) -> f64 {
    (value * 100_000.0).round() / 100_000.0
}

// ================================================================================================
// Symbols
// ================================================================================================

/// The tradable instruments of the hedged pair.
///
/// The environment is hard-wired to a two-leg spread; the symbol set is a
/// closed enum so an unsupported instrument cannot be configured at all.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    EnumCount,
    Serialize,
    Deserialize,
    PartialOrd,
    Ord,
    IntoStaticStr,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Symbol {
    Btcusdt,
    Ethusdt,
}

impl Symbol {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

// ================================================================================================
// Instrument Trait
// ================================================================================================

/// Tolerance for snapping a ratio onto its quantization grid.
///
/// `f64` division can land a hair off an exact grid multiple; anything within
/// this distance of a grid point is treated as on-grid rather than truncated
/// a full step down.
const GRID_EPSILON: f64 = 1e-9;

/// Defines the exchange quantization rules of a tradable instrument.
pub trait Instrument {
    /// The minimum price increment orders must be multiples of.
    fn tick_size(&self) -> f64;

    /// The minimum quantity increment orders must be multiples of.
    fn step_size(&self) -> f64;

    /// The smallest nonzero quantity the venue accepts.
    ///
    /// Quantized orders whose magnitude falls below this are suppressed to zero.
    fn min_order_size(&self) -> f64;

    // === CONVERSION LOGIC (Default Implementations) ===

    /// Quantizes an order quantity to the step-size grid.
    ///
    /// Returns the multiple of the step size nearest to `qty` in the direction
    /// of zero, or `0.0` if the result is smaller than the minimum order size.
    fn quantize_size(&self, qty: Quantity) -> Quantity {
        Quantity(suppress_below(
            snap_toward_zero(qty.0, self.step_size()),
            self.min_order_size(),
        ))
    }

    /// Quantizes a notional order value to the tick-size grid.
    ///
    /// Shares the minimum-order-size suppression with [`Self::quantize_size`].
    fn quantize_value(&self, value: f64) -> f64 {
        suppress_below(
            snap_toward_zero(value, self.tick_size()),
            self.min_order_size(),
        )
    }
}

impl Instrument for Symbol {
    fn tick_size(&self) -> f64 {
        match self {
            Symbol::Btcusdt => 1.0,
            Symbol::Ethusdt => 0.1,
        }
    }

    fn step_size(&self) -> f64 {
        match self {
            Symbol::Btcusdt => 0.0001,
            Symbol::Ethusdt => 0.001,
        }
    }

    fn min_order_size(&self) -> f64 {
        match self {
            Symbol::Btcusdt => 0.001,
            Symbol::Ethusdt => 0.01,
        }
    }
}

/// Truncates `value` toward zero onto the `grid`, treating near-exact
/// multiples as exact.
fn snap_toward_zero(value: f64, grid: f64) -> f64 {
    let steps = value / grid;
    let snapped = if (steps - steps.round()).abs() < GRID_EPSILON {
        steps.round()
    } else {
        steps.trunc()
    };
    snapped * grid
}

fn suppress_below(value: f64, min: f64) -> f64 {
    if value.abs() + GRID_EPSILON >= min {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn quantize_suppresses_below_min_order_size() {
        let btc = Symbol::Btcusdt;
        // step = 0.0001, min = 0.001
        assert_eq!(btc.quantize_size(Quantity(0.00005)), Quantity(0.0));
        assert_eq!(btc.quantize_size(Quantity(0.0009)), Quantity(0.0));
        assert_eq!(btc.quantize_size(Quantity(-0.0004)), Quantity(0.0));
    }

    #[test]
    fn quantize_truncates_toward_zero() {
        let btc = Symbol::Btcusdt;
        let q = btc.quantize_size(Quantity(0.00157)).0;
        assert!((q - 0.0015).abs() < EPS, "got {q}");

        let q_neg = btc.quantize_size(Quantity(-0.00157)).0;
        assert!((q_neg + 0.0015).abs() < EPS, "got {q_neg}");
    }

    #[test]
    fn quantize_keeps_exact_grid_multiples() {
        let btc = Symbol::Btcusdt;
        let q = btc.quantize_size(Quantity(0.0015)).0;
        assert!((q - 0.0015).abs() < EPS, "got {q}");

        // The minimum order size itself survives.
        let q_min = btc.quantize_size(Quantity(0.001)).0;
        assert!((q_min - 0.001).abs() < EPS, "got {q_min}");
    }

    #[test]
    fn quantize_value_uses_tick_grid() {
        let eth = Symbol::Ethusdt;
        // tick = 0.1
        let v = eth.quantize_value(750.27);
        assert!((v - 750.2).abs() < EPS, "got {v}");

        let btc = Symbol::Btcusdt;
        assert_eq!(btc.quantize_value(1499.99), 1499.0);
    }

    #[test]
    fn symbol_round_trips_through_strings() {
        use std::str::FromStr;
        assert_eq!(Symbol::Btcusdt.to_string(), "BTCUSDT");
        assert_eq!(Symbol::from_str("ETHUSDT").unwrap(), Symbol::Ethusdt);
        assert!(Symbol::from_str("DOGEUSDT").is_err());
    }

    #[test]
    fn round5_rounds_to_five_decimals() {
        assert_eq!(round5(1.2345649), 1.23456);
        assert_eq!(round5(-0.000004), -0.0);
        assert_eq!(round5(9.999995), 10.0);
    }
}
