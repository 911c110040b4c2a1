//! Return record and recurrence state types.

use serde::{Deserialize, Serialize};

use crate::{Date, Leg, Strategy};

/// Daily return row for one strategy leg.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnRecord {
    /// Evaluation date.
    pub date: Date,
    /// Strategy.
    pub strategy: Strategy,
    /// Leg.
    pub leg: Leg,
    /// Change in cumulative value since the previous evaluation date.
    pub daily_return: f64,
    /// Cumulative value of the leg, starting from 1.
    pub cumulative_value: f64,
}

/// Recurrence state carried into a return computation for one leg.
///
/// A leg starts `Uninitialized` and becomes `Active` once a return record has
/// been written for it; there is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PriorState {
    /// No return has been computed for this leg yet.
    #[default]
    Uninitialized,
    /// The leg has history.
    Active {
        /// Cumulative value on the last rebalance date.
        initial_value: f64,
        /// Cumulative value on the most recent prior evaluation date.
        last_value: f64,
    },
}

impl PriorState {
    /// Build state from the stored history of a leg.
    ///
    /// `initial` is the cumulative value recorded on the last rebalance date,
    /// `last` the most recent value before the evaluation date. Without a
    /// previous value the leg is uninitialized; a missing rebalance-day value
    /// falls back to 1.
    #[must_use]
    pub fn from_history(initial: Option<f64>, last: Option<f64>) -> Self {
        match last {
            None => Self::Uninitialized,
            Some(last_value) => {
                Self::Active { initial_value: initial.unwrap_or(1.0), last_value }
            }
        }
    }

    /// Cumulative value at the last rebalance.
    #[must_use]
    pub const fn initial_value(&self) -> f64 {
        match self {
            Self::Uninitialized => 1.0,
            Self::Active { initial_value, .. } => *initial_value,
        }
    }

    /// Cumulative value at the previous evaluation date.
    #[must_use]
    pub const fn last_value(&self) -> f64 {
        match self {
            Self::Uninitialized => 1.0,
            Self::Active { last_value, .. } => *last_value,
        }
    }

    /// Whether the leg already has history.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uninitialized_starts_at_one() {
        let state = PriorState::default();
        assert!(!state.is_active());
        assert_eq!(state.initial_value(), 1.0);
        assert_eq!(state.last_value(), 1.0);
    }

    #[test]
    fn from_history_without_previous_value() {
        assert_eq!(PriorState::from_history(Some(1.2), None), PriorState::Uninitialized);
    }

    #[test]
    fn from_history_missing_rebalance_value() {
        let state = PriorState::from_history(None, Some(1.05));
        assert_eq!(state, PriorState::Active { initial_value: 1.0, last_value: 1.05 });
    }
}
