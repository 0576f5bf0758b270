pub mod data;
pub mod error;
pub mod gym;
mod macros;
pub mod prelude;
pub mod report;

pub use error::{PairsimError, PairsimResult};
pub use gym::Env;
pub use gym::trading::{config::SimulatorConfig, env::Simulator};
