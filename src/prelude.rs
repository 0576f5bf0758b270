// 1. Traits
pub use crate::data::domain::Instrument;
pub use crate::data::market::MarketData;
pub use crate::gym::Env;

// 2. The Core "Loop" Types
pub use crate::gym::trading::{
    action::{ActionId, FLAT_ACTION, NO_OP_ACTION, NUM_ACTIONS},
    config::SimulatorConfig,
    env::{DRAWDOWN_LIMIT_USD, PROFIT_TARGET_USD, Simulator},
    observation::Observation,
    sampler::HistoricalPriceManager,
};
pub use crate::gym::{EpisodePhase, Reward, Step};

// 3. Financial Domain Types
pub use crate::data::domain::{Price, Quantity, Symbol, WeekId};
pub use crate::data::market::{MarketRow, MarketState, TableMarketData, WeekData};
pub use crate::gym::trading::asset::{Asset, TAKER_FEE_RATE, TradeFill, TradeKind};
pub use crate::gym::trading::portfolio::{ExecuteResult, PortfolioInfo, PortfolioManager};

// 4. Errors
pub use crate::error::{
    DataError, EnvError, IoError, PairsimError, PairsimResult, SystemError,
};

// 5. Reporting
pub use crate::report::journal::{Journal, StepRecord};
