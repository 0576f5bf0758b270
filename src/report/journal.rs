use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{IoError, PairsimResult};

/// One per-step diagnostic row, collected when step detail is enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Trading timestamp in epoch milliseconds.
    pub trading_time: i64,
    /// Discrete action id the agent submitted.
    pub action: usize,
    /// Per-leg fill labels, e.g. `OPEN_NEW_0.025` / `HOLD_0`.
    pub fills: [String; 2],
    pub reward: f64,
    /// The agent's own value estimate, echoed for offline comparison.
    pub predicted_reward: f64,
    pub target_prices: [f64; 2],
    pub avg_prices: [f64; 2],
    pub sizes: [f64; 2],
    pub trade_returns: [f64; 2],
    pub portfolio_value: f64,
    pub assets_pnl: [f64; 2],
    pub changed_value: f64,
}

impl StepRecord {
    /// The trading timestamp as a UTC datetime, if representable.
    pub fn trading_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.trading_time)
    }
}

/// Ordered per-step trade diagnostics of the running episode sequence.
///
/// Persistence is out of scope here; the journal only accumulates records in
/// order and serializes them on demand for offline reporting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Journal {
    records: Vec<StepRecord>,
}

impl Journal {
    pub fn push(&mut self, record: StepRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn to_json(&self) -> PairsimResult<String> {
        serde_json::to_string_pretty(&self.records).map_err(|e| IoError::Json(e).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(t: i64) -> StepRecord {
        StepRecord {
            trading_time: t,
            action: 3,
            fills: ["OPEN_NEW_0.025".to_string(), "OPEN_NEW_-0.375".to_string()],
            reward: 0.054,
            predicted_reward: 0.0,
            target_prices: [30_000.0, 2_000.0],
            avg_prices: [30_000.0, 2_000.0],
            sizes: [0.025, -0.375],
            trade_returns: [-0.375, -0.375],
            portfolio_value: 1500.0,
            assets_pnl: [0.0, 0.0],
            changed_value: 0.0,
        }
    }

    #[test]
    fn records_keep_insertion_order() {
        let mut journal = Journal::default();
        journal.push(record(1_000));
        journal.push(record(2_000));

        assert_eq!(journal.len(), 2);
        assert_eq!(journal.records()[0].trading_time, 1_000);
        assert_eq!(journal.records()[1].trading_time, 2_000);
    }

    #[test]
    fn timestamps_render_as_utc() {
        let rec = record(1_700_000_000_000);
        let dt = rec.trading_datetime().unwrap();
        assert_eq!(dt.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn json_round_trips() {
        let mut journal = Journal::default();
        journal.push(record(42));
        let json = journal.to_json().unwrap();

        let parsed: Vec<StepRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, journal.records());
    }
}
