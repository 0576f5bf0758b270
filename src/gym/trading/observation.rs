use ndarray::Array1;

use crate::gym::trading::action::{ActionId, NUM_ACTIONS};

/// Number of per-step portfolio statistics tracked in the returns history:
/// two leg trade returns, portfolio value, two leg PnLs, and the value change.
pub const PORTFOLIO_STAT_COLS: usize = 6;

/// What the agent sees each step: a validity mask over the discrete actions
/// and the flat observation vector.
///
/// The vector layout is `[normalized portfolio stats, normalized reward,
/// previous-action one-hot, raw market features]`.
#[derive(Debug, Clone)]
pub struct Observation {
    /// `1` where the action is currently executable, `0` otherwise.
    pub action_mask: Array1<i8>,
    pub observations: Array1<f32>,
}

impl Observation {
    /// Observation dimensionality for a given market feature width.
    pub fn dim(market_features: usize) -> usize {
        PORTFOLIO_STAT_COLS + 1 + NUM_ACTIONS + market_features
    }

    /// An all-valid action mask, as emitted right after a reset.
    pub fn all_valid_mask() -> Array1<i8> {
        Array1::ones(NUM_ACTIONS)
    }

    /// Concatenates the observation vector from its parts.
    pub fn assemble(
        portfolio_stats: [f64; PORTFOLIO_STAT_COLS],
        reward_stat: f64,
        prev_action: Option<ActionId>,
        market_features: &Array1<f32>,
        action_mask: Array1<i8>,
    ) -> Self {
        let mut observations = Vec::with_capacity(Self::dim(market_features.len()));

        observations.extend(portfolio_stats.iter().map(|v| *v as f32));
        observations.push(reward_stat as f32);

        let mut one_hot = [0.0f32; NUM_ACTIONS];
        if let Some(action) = prev_action {
            one_hot[action.index()] = 1.0;
        }
        observations.extend_from_slice(&one_hot);
        observations.extend(market_features.iter().copied());

        Self {
            action_mask,
            observations: Array1::from_vec(observations),
        }
    }
}

/// Z-score of the latest element against the full history.
///
/// Degenerate histories (single sample, zero variance) normalize to 0 rather
/// than propagating NaN/inf into the observation.
pub(crate) fn zscore_latest(values: &[f64]) -> f64 {
    let Some(last) = values.last() else {
        return 0.0;
    };

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let z = (last - mean) / variance.sqrt();

    if z.is_finite() { z } else { 0.0 }
}

/// Column-wise [`zscore_latest`] over a history of stat rows.
pub(crate) fn zscore_latest_columns<const N: usize>(rows: &[[f64; N]]) -> [f64; N] {
    let mut out = [0.0; N];
    let mut column = Vec::with_capacity(rows.len());

    for (idx, slot) in out.iter_mut().enumerate() {
        column.clear();
        column.extend(rows.iter().map(|row| row[idx]));
        *slot = zscore_latest(&column);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn zscore_of_degenerate_histories_is_zero() {
        assert_eq!(zscore_latest(&[]), 0.0);
        assert_eq!(zscore_latest(&[5.0]), 0.0);
        assert_eq!(zscore_latest(&[3.0, 3.0, 3.0]), 0.0);
    }

    #[test]
    fn zscore_normalizes_the_latest_element() {
        // mean = 2, population std = sqrt(2/3)
        let z = zscore_latest(&[1.0, 2.0, 3.0]);
        let expected = 1.0 / (2.0f64 / 3.0).sqrt();
        assert!((z - expected).abs() < EPS, "got {z}");
    }

    #[test]
    fn column_zscores_are_independent() {
        let rows = [[1.0, 10.0], [2.0, 10.0], [3.0, 10.0]];
        let [a, b] = zscore_latest_columns(&rows);
        assert!(a > 0.0);
        assert_eq!(b, 0.0);
    }

    #[test]
    fn assemble_lays_out_the_vector() {
        let market = Array1::from_vec(vec![0.5f32, -0.5, 0.25, 0.0]);
        let action = ActionId::new(3).unwrap();
        let obs = Observation::assemble(
            [0.0; PORTFOLIO_STAT_COLS],
            1.5,
            Some(action),
            &market,
            Observation::all_valid_mask(),
        );

        assert_eq!(obs.observations.len(), Observation::dim(4));
        assert_eq!(obs.observations[PORTFOLIO_STAT_COLS], 1.5);
        // One-hot block starts after the stats and reward slots.
        assert_eq!(obs.observations[PORTFOLIO_STAT_COLS + 1 + 3], 1.0);
        assert_eq!(obs.observations[Observation::dim(4) - 4], 0.5);
        assert_eq!(obs.action_mask.len(), NUM_ACTIONS);
    }

    #[test]
    fn assemble_without_prev_action_zeroes_the_one_hot() {
        let market = Array1::from_vec(vec![0.0f32; 2]);
        let obs = Observation::assemble(
            [0.0; PORTFOLIO_STAT_COLS],
            0.0,
            None,
            &market,
            Observation::all_valid_mask(),
        );
        let one_hot = &obs.observations.as_slice().unwrap()
            [PORTFOLIO_STAT_COLS + 1..PORTFOLIO_STAT_COLS + 1 + NUM_ACTIONS];
        assert!(one_hot.iter().all(|v| *v == 0.0));
    }
}
