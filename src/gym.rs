use serde::{Deserialize, Serialize};

use crate::{
    error::PairsimResult,
    gym::trading::{action::ActionId, observation::Observation},
    impl_add_sub_mul_div_primitive, impl_from_primitive, impl_neg_primitive,
};

pub mod trading;

/// Represents a shaped reward value.
///
/// Wraps `f64` because the reward scheme mixes fractional shaping terms
/// (per-step sign bonuses) with whole-number terminal adjustments.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Reward(pub f64);
impl_from_primitive!(Reward, f64);
impl_add_sub_mul_div_primitive!(Reward, f64);
impl_neg_primitive!(Reward, f64);

/// Represents the lifecycle phase of an episode.
///
/// The environment follows a two-call termination protocol: the `step()` call
/// that crosses the week boundary or the drawdown limit still returns
/// `done = false`, and only the immediately following call emits
/// `done = true` together with the terminal reward adjustment.
///
/// ```md
/// Current Phase     | Event                               | Next Phase
/// ------------------|-------------------------------------|----------------
/// `Active`          | step() within the week              | Active
/// `Active`          | step() exhausts week / hits drawdown| PendingTerminal
/// `PendingTerminal` | step() emits done=true              | Finished
/// `Finished`        | reset()                             | Active
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodePhase {
    /// The sampled week is being traded step by step.
    Active,

    /// The terminal condition was reached; the next `step()` call closes the
    /// episode with `done = true`.
    PendingTerminal,

    /// The terminal step was emitted. Only `reset()` is valid now.
    Finished,
}

impl EpisodePhase {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn is_pending_terminal(&self) -> bool {
        matches!(self, Self::PendingTerminal)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

/// The result bundle of a single environment step.
#[derive(Debug, Clone)]
pub struct Step {
    pub observation: Observation,
    pub reward: Reward,
    pub done: bool,
    pub info: serde_json::Map<String, serde_json::Value>,
}

/// The step/reset contract consumed by the training loop.
pub trait Env {
    /// Starts a new episode under the given curriculum fraction and returns
    /// its initial observation.
    fn reset(&mut self, curriculum_fraction: f64) -> PairsimResult<Observation>;

    /// Applies a discrete rebalancing action and advances one timestep.
    ///
    /// `predicted_value` is the agent's own value estimate; it is only echoed
    /// into the diagnostic journal and never influences the simulation.
    fn step(&mut self, action: ActionId, predicted_value: f64) -> PairsimResult<Step>;
}
