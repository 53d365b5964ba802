//! Transition tuples and sampled batches.
use serde::{Deserialize, Serialize};

/// One recorded experience tuple.
///
/// Discrete actions are stored as a single-element vector holding the action
/// index; continuous actions as the action vector itself. The terminal flag
/// is 1 if `next_obs` is a terminal state and 0 otherwise.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct Transition {
    /// Observation before the action was taken.
    pub obs: Vec<f32>,

    /// Action taken.
    pub act: Vec<f32>,

    /// Reward received.
    pub reward: f32,

    /// Observation after the action was taken.
    pub next_obs: Vec<f32>,

    /// Termination flag (0 or 1).
    pub is_terminated: u8,
}

/// A batch of transitions in structure-of-arrays layout.
///
/// All five sequences have the same length and element `i` of each sequence
/// belongs to the same underlying transition. Termination flags are promoted
/// to `f32` so the whole batch can be fed to a numeric backend directly.
#[derive(Debug, PartialEq, Clone)]
pub struct TransitionBatch {
    /// Sampled observations.
    pub obs: Vec<Vec<f32>>,

    /// Sampled actions.
    pub act: Vec<Vec<f32>>,

    /// Sampled rewards.
    pub reward: Vec<f32>,

    /// Sampled next observations.
    pub next_obs: Vec<Vec<f32>>,

    /// Sampled termination flags, promoted to `f32`.
    pub is_terminated: Vec<f32>,
}

impl TransitionBatch {
    /// Returns the number of transitions in the batch.
    pub fn len(&self) -> usize {
        self.reward.len()
    }

    /// Returns `true` if the batch holds no transitions.
    pub fn is_empty(&self) -> bool {
        self.reward.is_empty()
    }
}
