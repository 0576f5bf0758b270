use serde::{Deserialize, Serialize};

use crate::error::{EnvError, PairsimResult};

/// Number of discrete rebalancing actions.
pub const NUM_ACTIONS: usize = 11;

/// The fully-flat action: forces a target size of zero on both legs
/// regardless of the ratio table.
pub const FLAT_ACTION: ActionId = ActionId(0);

/// The designated no-op action. Always marked valid in the action mask so
/// the agent can hold even when no rebalance is executable.
pub const NO_OP_ACTION: ActionId = ActionId(5);

/// Per-leg target allocation ratios, as fractions of current portfolio value.
///
/// Positive is long, negative is short. The two legs always carry opposite
/// signs: every action is a hedged spread, long one instrument against the
/// other. Index 0 is the flat action, index 5 the no-op.
pub const ALLOCATION_RATIOS: [[f64; 2]; NUM_ACTIONS] = [
    [0.0, 0.0],
    [0.5, -0.5],
    [-0.5, 0.5],
    [1.0, -1.0],
    [-1.0, 1.0],
    [0.0, 0.0],
    [0.25, -0.25],
    [-0.25, 0.25],
    [0.75, -0.75],
    [-0.75, 0.75],
    [1.5, -1.5],
];

/// A validated index into the discrete action table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct ActionId(usize);

impl ActionId {
    pub fn new(id: usize) -> PairsimResult<Self> {
        if id < NUM_ACTIONS {
            Ok(Self(id))
        } else {
            Err(EnvError::UnknownAction(id).into())
        }
    }

    pub fn index(&self) -> usize {
        self.0
    }

    /// The per-leg allocation ratios this action targets.
    pub fn ratios(&self) -> [f64; 2] {
        ALLOCATION_RATIOS[self.0]
    }

    pub fn is_flat(&self) -> bool {
        *self == FLAT_ACTION
    }

    pub fn is_no_op(&self) -> bool {
        *self == NO_OP_ACTION
    }

    /// Iterates over every action id in table order.
    pub fn all() -> impl Iterator<Item = ActionId> {
        (0..NUM_ACTIONS).map(ActionId)
    }
}

impl std::fmt::Display for ActionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_table_ids() {
        assert!(ActionId::new(NUM_ACTIONS).is_err());
        assert!(ActionId::new(usize::MAX).is_err());
        assert!(ActionId::new(NUM_ACTIONS - 1).is_ok());
    }

    #[test]
    fn special_ids_carry_zero_ratios() {
        assert_eq!(FLAT_ACTION.ratios(), [0.0, 0.0]);
        assert_eq!(NO_OP_ACTION.ratios(), [0.0, 0.0]);
        assert!(FLAT_ACTION.is_flat());
        assert!(NO_OP_ACTION.is_no_op());
    }

    #[test]
    fn every_action_is_a_hedged_spread() {
        for action in ActionId::all() {
            let [a, b] = action.ratios();
            assert_eq!(a, -b, "action {action} is not sign-symmetric");
        }
    }

    #[test]
    fn all_yields_table_order() {
        let ids: Vec<usize> = ActionId::all().map(|a| a.index()).collect();
        assert_eq!(ids, (0..NUM_ACTIONS).collect::<Vec<_>>());
    }
}
