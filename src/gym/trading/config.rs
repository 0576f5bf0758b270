use serde::{Deserialize, Serialize};

use crate::data::domain::Symbol;

/// Configuration blueprint for building a [`Simulator`](super::env::Simulator).
///
/// Defaults match the reference deployment: the BTC/ETH hedged pair on a
/// $1500 account. Builder-style `with_*` methods allow selective overrides.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// The two legs of the hedged pair, in slot order.
    pub symbols: [Symbol; 2],

    /// Starting account equity in the quote currency.
    pub initial_equity: f64,

    /// Number of training weeks, which doubles as the index of the held-out
    /// week replayed in evaluation mode.
    pub num_weeks_train: usize,

    /// Replay the held-out week instead of sampling the curriculum.
    pub evaluation: bool,

    /// Collect per-step diagnostic records into the journal.
    pub collect_step_detail: bool,

    /// Seed for this instance's RNG stream. Parallel workers must use
    /// distinct seeds to avoid correlated curricula.
    pub seed: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            symbols: [Symbol::Btcusdt, Symbol::Ethusdt],
            initial_equity: 1500.0,
            num_weeks_train: 0,
            evaluation: false,
            collect_step_detail: false,
            seed: 0,
        }
    }
}

impl SimulatorConfig {
    pub fn with_symbols(self, symbols: [Symbol; 2]) -> Self {
        Self { symbols, ..self }
    }

    pub fn with_initial_equity(self, initial_equity: f64) -> Self {
        Self {
            initial_equity,
            ..self
        }
    }

    pub fn with_num_weeks_train(self, num_weeks_train: usize) -> Self {
        Self {
            num_weeks_train,
            ..self
        }
    }

    pub fn with_evaluation(self, evaluation: bool) -> Self {
        Self { evaluation, ..self }
    }

    pub fn with_step_detail(self, collect_step_detail: bool) -> Self {
        Self {
            collect_step_detail,
            ..self
        }
    }

    pub fn with_seed(self, seed: u64) -> Self {
        Self { seed, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reference_deployment() {
        let config = SimulatorConfig::default();
        assert_eq!(config.symbols, [Symbol::Btcusdt, Symbol::Ethusdt]);
        assert_eq!(config.initial_equity, 1500.0);
        assert!(!config.evaluation);
        assert!(!config.collect_step_detail);
    }

    #[test]
    fn builder_overrides_compose() {
        let config = SimulatorConfig::default()
            .with_seed(42)
            .with_evaluation(true)
            .with_num_weeks_train(120)
            .with_step_detail(true);

        assert_eq!(config.seed, 42);
        assert!(config.evaluation);
        assert_eq!(config.num_weeks_train, 120);
        assert!(config.collect_step_detail);
        assert_eq!(config.initial_equity, 1500.0);
    }
}
