use ndarray::Array1;

use crate::{
    data::domain::{Price, WeekId},
    error::{DataError, PairsimResult},
};

/// One fully-engineered market record, as consumed by the environment.
///
/// Produced by the external feature pipeline (hedge ratio, greeks, week
/// segmentation happen upstream); the environment only reads the finished
/// feature vector and the per-leg execution price for the next rebalance.
#[derive(Debug, Clone)]
pub struct MarketState {
    /// Trading timestamp in epoch milliseconds.
    pub trading_time: i64,

    /// Normalized market feature vector.
    pub obs: Array1<f32>,

    /// Per-leg price the next order executes against.
    pub target_price: [Price; 2],

    /// True exactly at the last timestamp of the week.
    pub done: bool,
}

/// The dataset provider consumed by the environment.
///
/// Implementations own a finite set of historical weeks, each a contiguous
/// run of timesteps. All methods are pure lookups; the provider carries no
/// cursor state of its own.
pub trait MarketData: Send + Sync {
    /// Returns the market record at `timestep` within `week`.
    fn market_state(&self, week: WeekId, timestep: usize) -> PairsimResult<MarketState>;

    /// Total number of weeks in the dataset, including the two lookback weeks.
    fn total_weeks(&self) -> usize;

    /// Benchmark return of `week`, used for terminal reward comparison.
    fn week_performance(&self, week: WeekId) -> PairsimResult<f64>;
}

/// A single timestep of a pre-built week table.
#[derive(Debug, Clone)]
pub struct MarketRow {
    pub trading_time: i64,
    pub features: Vec<f32>,
    pub target_price: [Price; 2],
}

/// One historical week: its timestep rows and its benchmark return.
#[derive(Debug, Clone)]
pub struct WeekData {
    pub rows: Vec<MarketRow>,
    pub performance: f64,
}

/// In-memory [`MarketData`] realization backed by per-week row tables.
///
/// This is the crate-side stand-in for the external feature pipeline; tests
/// and demos build their datasets through it.
#[derive(Debug, Clone)]
pub struct TableMarketData {
    weeks: Vec<WeekData>,
}

impl TableMarketData {
    pub fn new(weeks: Vec<WeekData>) -> PairsimResult<Self> {
        for (idx, week) in weeks.iter().enumerate() {
            if week.rows.is_empty() {
                return Err(DataError::Malformed(format!("week {idx} has no rows")).into());
            }
        }
        Ok(Self { weeks })
    }

    fn week(&self, week: WeekId) -> PairsimResult<&WeekData> {
        self.weeks.get(week.0).ok_or_else(|| {
            DataError::WeekOutOfRange {
                week: week.0,
                total: self.weeks.len(),
            }
            .into()
        })
    }
}

impl MarketData for TableMarketData {
    fn market_state(&self, week: WeekId, timestep: usize) -> PairsimResult<MarketState> {
        let data = self.week(week)?;
        let row = data.rows.get(timestep).ok_or(DataError::TimestepOutOfRange {
            week: week.0,
            timestep,
        })?;

        Ok(MarketState {
            trading_time: row.trading_time,
            obs: Array1::from_vec(row.features.clone()),
            target_price: row.target_price,
            done: timestep + 1 == data.rows.len(),
        })
    }

    fn total_weeks(&self) -> usize {
        self.weeks.len()
    }

    fn week_performance(&self, week: WeekId) -> PairsimResult<f64> {
        Ok(self.week(week)?.performance)
    }
}
