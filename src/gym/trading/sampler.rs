use std::sync::Arc;

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::{
    data::{
        domain::WeekId,
        market::{MarketData, MarketState},
    },
    error::{EnvError, PairsimResult},
};

/// Curriculum-aware sampler over the dataset's historical weeks.
///
/// In training mode, week ids are drawn from a shuffled queue over the
/// eligible range `[2, round(fraction × total))`; weeks 0 and 1 are lookback
/// history for feature normalization and the last week is held out for
/// evaluation. The queue regenerates transparently on exhaustion or when the
/// curriculum fraction changes, making the sequence an infinite resumable
/// cycle rather than a fixed-length iterator.
///
/// In evaluation mode the externally supplied week id is replayed every
/// episode, with no shuffling.
///
/// The sampler is idle until the first [`Self::reset`]; reading market state
/// before that is an invalid-state error. The RNG is seeded per instance:
/// parallel workers must pass distinct seeds or their curricula will be
/// correlated.
pub struct HistoricalPriceManager {
    data: Arc<dyn MarketData>,
    evaluation: bool,
    eval_week: WeekId,
    curriculum_fraction: f64,
    rng: StdRng,
    queue: Vec<WeekId>,
    current_week: Option<WeekId>,
    timestep: usize,
}

impl HistoricalPriceManager {
    /// Share of the training weeks assumed exposed before the first
    /// curriculum update arrives.
    pub const INITIAL_CURRICULUM_FRACTION: f64 = 0.1;

    pub fn new(
        data: Arc<dyn MarketData>,
        eval_week: WeekId,
        evaluation: bool,
        seed: u64,
    ) -> PairsimResult<Self> {
        if evaluation && eval_week.0 >= data.total_weeks() {
            return Err(EnvError::InvalidConfig(format!(
                "evaluation week {} is out of range (dataset has {} weeks)",
                eval_week.0,
                data.total_weeks()
            ))
            .into());
        }

        Ok(Self {
            data,
            evaluation,
            eval_week,
            curriculum_fraction: Self::INITIAL_CURRICULUM_FRACTION,
            rng: StdRng::seed_from_u64(seed),
            queue: Vec::new(),
            current_week: None,
            timestep: 0,
        })
    }

    pub fn curriculum_fraction(&self) -> f64 {
        self.curriculum_fraction
    }

    pub fn current_week(&self) -> PairsimResult<WeekId> {
        self.current_week.ok_or_else(not_reset)
    }

    /// Benchmark return of the current week, for terminal reward comparison.
    pub fn performance(&self) -> PairsimResult<f64> {
        self.data.week_performance(self.current_week()?)
    }

    /// Returns the next timestep's market record and advances the cursor.
    ///
    /// The `done` flag on the returned state is authoritative: true exactly
    /// at the week's last timestamp.
    pub fn market_obs(&mut self) -> PairsimResult<MarketState> {
        let state = self.data.market_state(self.current_week()?, self.timestep)?;
        self.timestep += 1;
        Ok(state)
    }

    /// Starts the next episode and eagerly returns its first observation.
    ///
    /// A changed curriculum fraction discards the pending queue before the
    /// next week id is drawn.
    pub fn reset(&mut self, curriculum_fraction: f64) -> PairsimResult<MarketState> {
        if curriculum_fraction != self.curriculum_fraction {
            tracing::debug!(
                old = self.curriculum_fraction,
                new = curriculum_fraction,
                "curriculum fraction changed, regenerating week queue"
            );
            self.curriculum_fraction = curriculum_fraction;
            self.queue.clear();
        }

        let week = self.draw_week()?;
        self.current_week = Some(week);
        self.timestep = 0;

        tracing::info!(week = week.0, "episode starting");
        self.market_obs()
    }

    fn draw_week(&mut self) -> PairsimResult<WeekId> {
        if self.evaluation {
            return Ok(self.eval_week);
        }

        if let Some(week) = self.queue.pop() {
            return Ok(week);
        }

        self.regenerate_queue()?;
        // Non-empty by construction after a successful regeneration.
        self.queue.pop().ok_or_else(|| {
            EnvError::InvalidConfig("regenerated week queue is empty".to_string()).into()
        })
    }

    fn regenerate_queue(&mut self) -> PairsimResult<()> {
        // The last dataset week is held out for evaluation runs.
        let total = self.data.total_weeks().saturating_sub(1);
        let upper = (self.curriculum_fraction * total as f64).round() as usize;

        if upper <= 2 {
            return Err(EnvError::InvalidConfig(format!(
                "curriculum fraction {} of {} weeks leaves no sampleable range",
                self.curriculum_fraction, total
            ))
            .into());
        }

        self.queue = (2..upper).map(WeekId).collect();
        self.queue.shuffle(&mut self.rng);

        tracing::debug!(len = self.queue.len(), upper, "week queue regenerated");
        Ok(())
    }
}

fn not_reset() -> crate::error::PairsimError {
    EnvError::InvalidState("sampler holds no week; call `reset()` first".to_string()).into()
}
