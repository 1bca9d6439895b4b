//! Pool-merging targets hand for a chosen action.
//!
//! Four pools feed the hand: abstraction keystones a synthesis needs (D),
//! milestone composition (B), recent output (A) and one foundation keystone
//! (C). They merge in that order, so an item keeps its strongest pool.

use crate::{
    build_targets_snapshot, diversify_by, has_abstraction_evidence, school_compatibility,
    score_recency, sort_hand_items_desc, unique_by, ActionDef, BasisTag, Collectible,
    CollectibleId, CollectibleType, GameStateForRecs, HandItem, RecsConfig, School,
    ScoreWeights, TargetsHand, TargetsRecSnapshot, FS_REQUIRES_FA_NOTICE, MAX_TARGETS_HAND_SIZE,
    MIN_HAND_SIZE,
};
use std::collections::BTreeSet;
use tracing::debug;

pub const NO_ABSTRACTION_NOTICE: &str =
    "No abstraction (FA) targets exist yet. Run an Abstraction action first.";

const REQUIRED_ABSTRACTION_BONUS: f64 = 5.0;
const FOUNDATION_BONUS: f64 = 0.75;
const KEYSTONE_BONUS: f64 = 0.35;
const OBJECT_FACET_BONUS: f64 = 0.1;
const MAX_REQUIRED_ABSTRACTIONS: usize = 2;
const MAX_SAME_BUCKET: usize = 3;
const DIVERSITY_SLACK: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetPool {
    RequiredAbstraction,
    MilestoneLinked,
    Recent { age_index: usize },
    Foundation,
}

impl TargetPool {
    pub fn tag(self) -> BasisTag {
        match self {
            Self::RequiredAbstraction => BasisTag::RequiresAbstraction,
            Self::MilestoneLinked => BasisTag::MilestoneLinked,
            Self::Recent { .. } => BasisTag::RecentOutput,
            Self::Foundation => BasisTag::Foundation,
        }
    }

    pub fn note(self) -> &'static str {
        match self {
            Self::RequiredAbstraction => "Needed for synthesis (from abstraction).",
            Self::MilestoneLinked => "Milestone-linked.",
            Self::Recent { .. } => "Recent output.",
            Self::Foundation => "Foundation pick.",
        }
    }

    fn bonus(self, weights: &ScoreWeights) -> f64 {
        match self {
            Self::RequiredAbstraction => REQUIRED_ABSTRACTION_BONUS,
            Self::MilestoneLinked => weights.milestone_linked,
            Self::Recent { age_index } => weights.recency * score_recency(age_index),
            Self::Foundation => FOUNDATION_BONUS,
        }
    }
}

pub fn is_targetable(kind: CollectibleType) -> bool {
    kind.is_keystone() || kind.is_object_facet()
}

fn type_bonus(kind: CollectibleType) -> f64 {
    if kind.is_keystone() {
        KEYSTONE_BONUS
    } else if kind.is_object_facet() {
        OBJECT_FACET_BONUS
    } else {
        0.0
    }
}

fn is_abstraction_keystone(item: &Collectible) -> bool {
    item.produced_by_school == Some(School::Abstraction) && item.kind.is_keystone()
}

/// Collectibles the player marked as favourites. Nothing tracks them yet, so
/// the set is always empty.
pub fn favorite_collectible_ids(_snapshot: &TargetsRecSnapshot) -> BTreeSet<CollectibleId> {
    BTreeSet::new()
}

pub fn score_target(
    item: &Collectible,
    pool: TargetPool,
    action: &ActionDef,
    favorites: &BTreeSet<CollectibleId>,
    weights: &ScoreWeights,
) -> HandItem<Collectible> {
    let mut score = pool.bonus(weights);
    score += school_compatibility(action.school, item, weights);
    if favorites.contains(&item.id) {
        score += weights.player_preference;
    }
    score += type_bonus(item.kind);
    HandItem {
        item: item.clone(),
        basis_tag: pool.tag(),
        basis_note: pool.note().to_string(),
        score,
    }
}

fn milestone_pool(
    candidates: &[Collectible],
    composition_ids: &[CollectibleId],
) -> Vec<Collectible> {
    composition_ids
        .iter()
        .filter_map(|id| candidates.iter().find(|item| item.id == *id))
        .cloned()
        .collect()
}

/// Oldest keystone in the window that the milestone pool does not already hold.
fn foundation_pool(candidates: &[Collectible], milestone: &[Collectible]) -> Option<Collectible> {
    candidates
        .iter()
        .rev()
        .filter(|item| item.kind.is_keystone())
        .find(|item| !milestone.iter().any(|linked| linked.id == item.id))
        .cloned()
}

pub fn build_targets_hand(
    state: &GameStateForRecs,
    selected_action: &ActionDef,
    milestone_composition_ids: &[CollectibleId],
    now_ms: u64,
    config: &RecsConfig,
) -> TargetsHand {
    let snapshot = build_targets_snapshot(
        state,
        selected_action,
        milestone_composition_ids,
        config,
        now_ms,
    );
    let weights = &config.weights;
    let action = &snapshot.selected_action;
    let synthesis = action.school == School::Synthesis;
    let mut hard_constraints = Vec::new();

    let candidates: Vec<Collectible> = snapshot
        .recent_collectibles
        .iter()
        .filter(|item| is_targetable(item.kind))
        .cloned()
        .collect();

    if synthesis {
        hard_constraints.push(FS_REQUIRES_FA_NOTICE.to_string());
        if !has_abstraction_evidence(state) {
            debug!(snapshot = %snapshot.snapshot_id, "synthesis without abstraction evidence");
            hard_constraints.push(NO_ABSTRACTION_NOTICE.to_string());
            return TargetsHand {
                snapshot_id: snapshot.snapshot_id,
                generated_at_ms: snapshot.generated_at_ms,
                targets: Vec::new(),
                hard_constraints,
            };
        }
    }

    let abstractions: Vec<Collectible> = if synthesis {
        candidates
            .iter()
            .filter(|item| is_abstraction_keystone(item))
            .cloned()
            .collect()
    } else {
        Vec::new()
    };
    let milestone = milestone_pool(&candidates, &snapshot.milestone_composition_ids);
    let foundation = foundation_pool(&candidates, &milestone);
    let favorites = favorite_collectible_ids(&snapshot);
    debug!(
        snapshot = %snapshot.snapshot_id,
        candidates = candidates.len(),
        abstractions = abstractions.len(),
        milestone = milestone.len(),
        foundation = foundation.is_some(),
        "target pools built"
    );

    let score = |item: &Collectible, pool: TargetPool| {
        score_target(item, pool, action, &favorites, weights)
    };
    let mut scored = Vec::new();
    for item in abstractions.iter().take(MAX_REQUIRED_ABSTRACTIONS) {
        scored.push(score(item, TargetPool::RequiredAbstraction));
    }
    for item in &milestone {
        scored.push(score(item, TargetPool::MilestoneLinked));
    }
    for (age_index, item) in candidates.iter().enumerate() {
        scored.push(score(item, TargetPool::Recent { age_index }));
    }
    if let Some(item) = &foundation {
        scored.push(score(item, TargetPool::Foundation));
    }

    let mut merged = unique_by(scored, |entry| entry.item.id.clone());
    sort_hand_items_desc(&mut merged);

    let size = config.clamped_targets_hand_size();
    let spread = diversify_by(
        merged.clone(),
        MAX_SAME_BUCKET,
        |entry| entry.item.run_id.clone(),
        size + DIVERSITY_SLACK,
    );
    let spread = diversify_by(
        spread,
        MAX_SAME_BUCKET,
        |entry| entry.item.kind,
        size + DIVERSITY_SLACK,
    );

    let mut hand: Vec<HandItem<Collectible>> = spread.into_iter().take(size).collect();
    if hand.len() < MIN_HAND_SIZE {
        for entry in &merged {
            if hand.len() >= MIN_HAND_SIZE {
                break;
            }
            if !hand.iter().any(|held| held.item.id == entry.item.id) {
                hand.push(entry.clone());
            }
        }
    }
    let mut hand = unique_by(hand, |entry| entry.item.id.clone());
    sort_hand_items_desc(&mut hand);
    hand.truncate(MAX_TARGETS_HAND_SIZE);

    if synthesis && !hand.iter().any(|entry| is_abstraction_keystone(&entry.item)) {
        if let Some(best) = abstractions.first() {
            debug!(target = %best.id, "swapping in an abstraction keystone");
            hand.pop();
            hand.push(score(best, TargetPool::RequiredAbstraction));
            sort_hand_items_desc(&mut hand);
            hand = unique_by(hand, |entry| entry.item.id.clone());
        }
    }

    debug!(snapshot = %snapshot.snapshot_id, size = hand.len(), "targets hand ready");
    TargetsHand {
        snapshot_id: snapshot.snapshot_id,
        generated_at_ms: snapshot.generated_at_ms,
        targets: hand,
        hard_constraints,
    }
}
