use std::sync::Arc;

use crate::{
    data::{
        domain::{WeekId, round5},
        market::{MarketData, MarketState},
    },
    error::{EnvError, PairsimResult, SystemError},
    gym::{Env, EpisodePhase, Reward, Step},
    gym::trading::{
        action::{ActionId, NUM_ACTIONS},
        config::SimulatorConfig,
        observation::{Observation, PORTFOLIO_STAT_COLS, zscore_latest, zscore_latest_columns},
        portfolio::{ExecuteResult, PortfolioManager},
        sampler::HistoricalPriceManager,
    },
    report::journal::{Journal, StepRecord},
};

/// Episode aborts once the account loses this much, in quote currency.
pub const DRAWDOWN_LIMIT_USD: f64 = -30.0;

/// Terminal bonus threshold, in quote currency.
pub const PROFIT_TARGET_USD: f64 = 20.0;

// Reward shaping constants.
const PNL_SIGN_REWARD: f64 = 0.004;
const TRADE_RETURN_REWARD: f64 = 0.05;
const TRADE_RETURN_THRESHOLD: f64 = 0.001;
const BENCHMARK_BONUS: f64 = 2.0;
const PROFIT_BONUS: f64 = 4.0;

/// Episode orchestrator: drives the portfolio and the week sampler one
/// timestep per `step()`, shapes the reward, and assembles observations.
///
/// Termination follows a two-call protocol (see [`EpisodePhase`]): the call
/// that exhausts the week or crosses the drawdown limit still returns
/// `done = false`; the next call applies the terminal reward adjustment and
/// returns `done = true`, after which only `reset()` is accepted.
///
/// Instances are fully self-contained (own dataset handle, RNG stream, and
/// ledger) and deterministic given (dataset, seed, action sequence), so
/// thousands can run in parallel workers without any shared state.
pub struct Simulator {
    config: SimulatorConfig,
    price_manager: HistoricalPriceManager,
    portfolio: PortfolioManager,
    market_state: Option<MarketState>,
    phase: EpisodePhase,
    returns_history: Vec<[f64; PORTFOLIO_STAT_COLS]>,
    reward_history: Vec<f64>,
    prev_action: Option<ActionId>,
    journal: Journal,
}

impl Simulator {
    pub fn new(config: SimulatorConfig, data: Arc<dyn MarketData>) -> PairsimResult<Self> {
        let portfolio = PortfolioManager::new(config.symbols, config.initial_equity)?;
        let price_manager = HistoricalPriceManager::new(
            data,
            WeekId(config.num_weeks_train),
            config.evaluation,
            config.seed,
        )?;

        Ok(Self {
            config,
            price_manager,
            portfolio,
            market_state: None,
            phase: EpisodePhase::Finished,
            returns_history: Vec::new(),
            reward_history: Vec::new(),
            prev_action: None,
            journal: Journal::default(),
        })
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn phase(&self) -> EpisodePhase {
        self.phase
    }

    /// Size of the discrete action space.
    pub fn action_space(&self) -> usize {
        NUM_ACTIONS
    }

    /// Observation dimensionality, known once an episode has started.
    pub fn observation_dim(&self) -> Option<usize> {
        self.market_state
            .as_ref()
            .map(|state| Observation::dim(state.obs.len()))
    }

    /// Account return since episode start as `(quote currency, fraction)`.
    pub fn portfolio_return(&self) -> (f64, f64) {
        let info = self.portfolio.portfolio_info();
        let pnl_value = info.portfolio_value - self.config.initial_equity;
        (pnl_value, pnl_value / self.config.initial_equity)
    }

    /// Per-step trade diagnostics of the current episode, when enabled.
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    fn check_step_status(&self) -> PairsimResult<()> {
        if self.phase.is_finished() {
            return Err(EnvError::InvalidState(
                "Episode is finished. Call `reset()` before stepping.".to_string(),
            )
            .into());
        }
        Ok(())
    }

    /// Base reward shaping: sign of total PnL this step, plus a bonus or
    /// penalty when the aggregate trade return crosses the noise threshold.
    fn reward_scheme(&self, result: &ExecuteResult) -> Reward {
        let assets_pnl: f64 = self.portfolio.portfolio_info().assets_pnl.iter().sum();
        let trades_return = result.net_trade_return();

        let mut reward = Reward(0.0);

        if assets_pnl < 0.0 {
            reward -= PNL_SIGN_REWARD;
        } else {
            reward += PNL_SIGN_REWARD;
        }

        if trades_return < -TRADE_RETURN_THRESHOLD {
            reward -= TRADE_RETURN_REWARD;
        } else if trades_return > TRADE_RETURN_THRESHOLD {
            reward += TRADE_RETURN_REWARD;
        }

        reward
    }

    fn record_state(
        &mut self,
        action: ActionId,
        result: &ExecuteResult,
        reward: Reward,
        predicted_value: f64,
    ) {
        let info = self.portfolio.portfolio_info();

        self.returns_history.push([
            result.trade_returns[0],
            result.trade_returns[1],
            info.portfolio_value,
            info.assets_pnl[0],
            info.assets_pnl[1],
            info.changed_value,
        ]);
        self.reward_history.push(reward.0);

        if !self.config.collect_step_detail {
            return;
        }
        let Some(state) = &self.market_state else {
            return;
        };

        self.journal.push(StepRecord {
            trading_time: state.trading_time,
            action: action.index(),
            fills: [result.fills[0].label(), result.fills[1].label()],
            reward: round5(reward.0),
            predicted_reward: round5(predicted_value),
            target_prices: [state.target_price[0].0, state.target_price[1].0],
            avg_prices: self.portfolio.avg_prices(),
            sizes: self.portfolio.sizes(),
            trade_returns: result.trade_returns,
            portfolio_value: info.portfolio_value,
            assets_pnl: info.assets_pnl,
            changed_value: info.changed_value,
        });
    }

    /// Builds the observation and action mask from the current state.
    fn observation_state(&self) -> PairsimResult<Observation> {
        let state = self.market_state.as_ref().ok_or_else(|| {
            SystemError::MissingField("market state is unset outside an episode".to_string())
        })?;

        let portfolio_stats = zscore_latest_columns(&self.returns_history);
        let reward_stat = zscore_latest(&self.reward_history);

        let mut action_mask = Observation::all_valid_mask();
        for action in ActionId::all() {
            let (eligible, _) = self.portfolio.available_action(action);
            if !eligible && !action.is_no_op() {
                action_mask[action.index()] = 0;
            }
        }

        Ok(Observation::assemble(
            portfolio_stats,
            reward_stat,
            self.prev_action,
            &state.obs,
            action_mask,
        ))
    }
}

impl Env for Simulator {
    #[tracing::instrument(skip(self), fields(phase = ?self.phase, action = %action))]
    fn step(&mut self, action: ActionId, predicted_value: f64) -> PairsimResult<Step> {
        self.check_step_status()?;

        let result = self.portfolio.execute_order(action)?;
        let mut reward = self.reward_scheme(&result);
        self.prev_action = Some(action);

        match self.phase {
            EpisodePhase::Active => {
                self.record_state(action, &result, reward, predicted_value);

                let state = self.price_manager.market_obs()?;
                self.portfolio.update_market_price(state.target_price);
                let week_done = state.done;
                self.market_state = Some(state);

                if week_done || self.portfolio_return().0 < DRAWDOWN_LIMIT_USD {
                    tracing::debug!(
                        week_done,
                        pnl = self.portfolio_return().0,
                        "terminal condition reached, episode pending"
                    );
                    self.phase = EpisodePhase::PendingTerminal;
                }

                Ok(Step {
                    observation: self.observation_state()?,
                    reward,
                    done: false,
                    info: serde_json::Map::new(),
                })
            }
            EpisodePhase::PendingTerminal => {
                let (pnl_value, pnl_pct) = self.portfolio_return();

                if pnl_pct > self.price_manager.performance()? {
                    reward += BENCHMARK_BONUS;
                } else {
                    reward -= BENCHMARK_BONUS;
                }

                if pnl_value > PROFIT_TARGET_USD {
                    reward += PROFIT_BONUS;
                } else {
                    reward -= PROFIT_BONUS;
                }

                self.record_state(action, &result, reward, predicted_value);
                self.phase = EpisodePhase::Finished;

                tracing::info!(pnl_value, pnl_pct, reward = reward.0, "episode finished");

                Ok(Step {
                    observation: self.observation_state()?,
                    reward,
                    done: true,
                    info: serde_json::Map::new(),
                })
            }
            EpisodePhase::Finished => Err(EnvError::InvalidState(
                "Episode is finished. Call `reset()` before stepping.".to_string(),
            )
            .into()),
        }
    }

    #[tracing::instrument(skip(self), fields(fraction = curriculum_fraction))]
    fn reset(&mut self, curriculum_fraction: f64) -> PairsimResult<Observation> {
        self.returns_history.clear();
        self.reward_history.clear();
        self.journal.clear();
        self.prev_action = None;

        let state = self.price_manager.reset(curriculum_fraction)?;
        self.portfolio.reset();
        self.portfolio.update_market_price(state.target_price);

        let observation = Observation::assemble(
            [0.0; PORTFOLIO_STAT_COLS],
            0.0,
            None,
            &state.obs,
            Observation::all_valid_mask(),
        );

        self.market_state = Some(state);
        self.phase = EpisodePhase::Active;

        Ok(observation)
    }
}
