use crate::env::{Action, Observation};
use std::collections::HashMap;

/// Sparse feature-weight mapping exposed by a learning agent.
pub type Weights = HashMap<String, f64>;

/// Capability set the training loop requires from a learning agent. The
/// update rule, feature extraction and exploration policy all live behind
/// this trait.
pub trait Agent {
    fn begin_episode(&mut self, state: &Observation);

    fn choose_action(&mut self, state: &Observation) -> Action;

    /// Feeds one transition back to the agent. `next_state` is `None` when
    /// the environment terminated. Returning `Some(action)` forces the loop
    /// to take that action next (off-policy agents); `None` lets the agent
    /// pick via `choose_action` on the following step.
    fn incorporate_feedback(
        &mut self,
        state: &Observation,
        action: Action,
        reward: f64,
        next_state: Option<&Observation>,
    ) -> Option<Action>;

    fn weights(&self) -> &Weights;

    /// Ordered set of legal actions.
    fn actions(&self) -> &[Action];

    /// Identifier used in filenames and logs.
    fn name(&self) -> &str;
}
