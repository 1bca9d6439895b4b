use crate::{
    build_action_hand, build_targets_hand, ActionDef, ActionHand, CollectibleId, GameStateForRecs,
    HintParser, HintRules, RecsConfig, TargetsHand,
};

/// Engine configuration plus the hint vocabulary used for the progress slot.
#[derive(Debug, Clone, Default)]
pub struct Recommender<H = HintRules> {
    pub config: RecsConfig,
    pub hints: H,
}

impl Recommender<HintRules> {
    pub fn new(config: RecsConfig) -> Self {
        Self {
            config,
            hints: HintRules::standard(),
        }
    }
}

impl<H: HintParser> Recommender<H> {
    pub fn with_hints(config: RecsConfig, hints: H) -> Self {
        Self { config, hints }
    }

    pub fn action_hand(
        &self,
        state: &GameStateForRecs,
        actions: &[ActionDef],
        now_ms: u64,
    ) -> ActionHand {
        build_action_hand(state, actions, now_ms, &self.config, &self.hints)
    }

    pub fn targets_hand(
        &self,
        state: &GameStateForRecs,
        selected_action: &ActionDef,
        milestone_composition_ids: &[CollectibleId],
        now_ms: u64,
    ) -> TargetsHand {
        build_targets_hand(
            state,
            selected_action,
            milestone_composition_ids,
            now_ms,
            &self.config,
        )
    }
}

pub fn generate_action_hand(
    state: &GameStateForRecs,
    actions: &[ActionDef],
    now_ms: u64,
) -> ActionHand {
    Recommender::new(RecsConfig::default()).action_hand(state, actions, now_ms)
}

pub fn generate_targets_hand(
    state: &GameStateForRecs,
    selected_action: &ActionDef,
    milestone_composition_ids: &[CollectibleId],
    now_ms: u64,
) -> TargetsHand {
    Recommender::new(RecsConfig::default()).targets_hand(
        state,
        selected_action,
        milestone_composition_ids,
        now_ms,
    )
}
