use crate::RecsError;
use serde::{Deserialize, Serialize};

pub const MIN_HAND_SIZE: usize = 4;
pub const MAX_ACTION_HAND_SIZE: usize = 5;
pub const MAX_TARGETS_HAND_SIZE: usize = 6;
pub const FP_START_HAND_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoreWeights {
    pub milestone_linked: f64,
    pub action_school_match: f64,
    pub adjacency_school_match: f64,
    pub recency: f64,
    pub player_preference: f64,
    pub diversity_penalty: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            milestone_linked: 4.0,
            action_school_match: 3.0,
            adjacency_school_match: 1.5,
            recency: 2.0,
            player_preference: 1.0,
            diversity_penalty: -1.25,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RecsConfig {
    pub action_hand_size: usize,
    pub targets_hand_size: usize,
    /// How many recent runs count as "recently used" for novelty.
    pub novelty_window: usize,
    /// How many recent runs are searched for target candidates.
    pub targets_run_window: usize,
    pub milestone_confidence_threshold: f64,
    pub weights: ScoreWeights,
}

impl Default for RecsConfig {
    fn default() -> Self {
        Self {
            action_hand_size: 5,
            targets_hand_size: 5,
            novelty_window: 10,
            targets_run_window: 5,
            milestone_confidence_threshold: 0.7,
            weights: ScoreWeights::default(),
        }
    }
}

impl RecsConfig {
    pub fn validate(&self) -> Result<(), RecsError> {
        if !(MIN_HAND_SIZE..=MAX_ACTION_HAND_SIZE).contains(&self.action_hand_size) {
            return Err(RecsError::InvalidConfig(format!(
                "actionHandSize must be within {MIN_HAND_SIZE}..={MAX_ACTION_HAND_SIZE}, got {}",
                self.action_hand_size
            )));
        }
        if !(MIN_HAND_SIZE..=MAX_TARGETS_HAND_SIZE).contains(&self.targets_hand_size) {
            return Err(RecsError::InvalidConfig(format!(
                "targetsHandSize must be within {MIN_HAND_SIZE}..={MAX_TARGETS_HAND_SIZE}, got {}",
                self.targets_hand_size
            )));
        }
        if self.novelty_window == 0 || self.targets_run_window == 0 {
            return Err(RecsError::InvalidConfig(
                "run windows must be at least 1".to_string(),
            ));
        }
        let threshold = self.milestone_confidence_threshold;
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(RecsError::InvalidConfig(format!(
                "milestoneConfidenceThreshold must be within 0..=1, got {threshold}"
            )));
        }
        Ok(())
    }

    pub fn steady_action_hand_size(&self) -> usize {
        self.action_hand_size
            .clamp(MIN_HAND_SIZE, MAX_ACTION_HAND_SIZE)
    }

    pub fn clamped_targets_hand_size(&self) -> usize {
        self.targets_hand_size
            .clamp(MIN_HAND_SIZE, MAX_TARGETS_HAND_SIZE)
    }
}
