//! Slot-filling action hand: fixed milestone steps first, then five scored
//! slots, then guardrails that re-validate the whole hand.

use crate::{
    build_action_snapshot, enrichment_actions_for, has_abstraction_evidence, pick_best_action,
    preferred_school_from_player, recent_action_ids, school_for_progress, score_adjacency,
    score_novelty, score_player_preference, score_school_match, sort_hand_items_desc, unique_by,
    ActionBasis, ActionCatalogIndex, ActionDef, ActionHand, ActionId, ActionRecMode,
    ActionRecSnapshot, BasisTag, GameStateForRecs, HandItem, HintParser, RecsConfig, School,
    ScoreWeights, ScoredAction, FP_START_HAND_SIZE, FP_START_SEQUENCE, FS_REQUIRES_FA_NOTICE,
    MIN_HAND_SIZE,
};
use std::collections::BTreeSet;
use tracing::debug;

const FP_START_SCORE: f64 = 10.0;
const ENRICHMENT_SCORE: f64 = 12.0;
const MAX_ENRICHMENT_SLOTS: usize = 2;
const FS_FALLBACK_BASE: f64 = 9.0;
const VARIETY_FIX_BASE: f64 = 8.0;
const FALLBACK_SCORE: f64 = 1.0;
const VARIETY_BONUS: f64 = 0.75;

const MILESTONE_FLOW_NOTE: &str = "Milestone creation flow.";
const ENRICHMENT_NOTE: &str = "Completes milestone enrichment.";
const FS_FALLBACK_NOTE: &str = "Avoided FS (no abstractions yet).";
const VARIETY_FIX_NOTE: &str = "Added variety for momentum.";
const FALLBACK_NOTE: &str = "Fallback candidate.";

const STABILITY_SCHOOL: School = School::Abstraction;
const UNSTEADY_STABILITY_SCHOOL: School = School::Understanding;

pub fn note_for_basis(basis: ActionBasis, snapshot: &ActionRecSnapshot) -> &'static str {
    match basis {
        ActionBasis::ProgressProxy => {
            if snapshot.latest_progress.is_some() {
                "Based on latest progress signal."
            } else {
                "Based on recent posture."
            }
        }
        ActionBasis::Adjacency => "Natural next move in the flow.",
        ActionBasis::Stability => "Stability move to reduce drift later.",
        ActionBasis::Variety => "A plausible alternate path.",
        ActionBasis::PlayerStyle => "Matches your usual style.",
        ActionBasis::MilestoneEnrichment => ENRICHMENT_NOTE,
    }
}

struct SlotContext<'a> {
    snapshot: &'a ActionRecSnapshot,
    weights: &'a ScoreWeights,
    recent_ids: &'a [ActionId],
}

impl SlotContext<'_> {
    fn scored(&self, action: &ActionDef, score: f64, basis: ActionBasis) -> ScoredAction {
        ScoredAction {
            action: action.clone(),
            score,
            basis,
            note: note_for_basis(basis, self.snapshot).to_string(),
        }
    }

    fn school_match(&self, action: &ActionDef, desired: Option<School>) -> f64 {
        score_school_match(action, desired, self.weights)
    }

    fn adjacency(&self, action: &ActionDef) -> f64 {
        score_adjacency(action, self.snapshot.last_school, self.weights)
    }

    fn preference(&self, action: &ActionDef) -> f64 {
        score_player_preference(action, self.snapshot.player_stats.as_ref(), self.weights)
    }

    fn novelty(&self, action: &ActionDef) -> f64 {
        score_novelty(action, self.recent_ids)
    }

    fn progress_slot(&self, action: &ActionDef, hinted: Option<School>) -> ScoredAction {
        let score = self.school_match(action, hinted)
            + self.adjacency(action) * 0.5
            + self.preference(action) * 0.25
            + self.novelty(action);
        self.scored(action, score, ActionBasis::ProgressProxy)
    }

    fn adjacency_slot(&self, action: &ActionDef) -> ScoredAction {
        let score =
            self.adjacency(action) + self.preference(action) * 0.25 + self.novelty(action);
        self.scored(action, score, ActionBasis::Adjacency)
    }

    fn stability_slot(&self, action: &ActionDef, stability: School) -> ScoredAction {
        let score = self.school_match(action, Some(stability)) * 0.9
            + self.adjacency(action) * 0.25
            + self.preference(action) * 0.25
            + self.novelty(action);
        self.scored(action, score, ActionBasis::Stability)
    }

    fn variety_slot(&self, action: &ActionDef, used: &BTreeSet<School>) -> ScoredAction {
        let variety = if used.contains(&action.school) {
            self.weights.diversity_penalty
        } else {
            VARIETY_BONUS
        };
        let score = variety
            + self.adjacency(action) * 0.15
            + self.preference(action) * 0.35
            + self.novelty(action);
        self.scored(action, score, ActionBasis::Variety)
    }

    fn player_slot(&self, action: &ActionDef, preferred: Option<School>) -> ScoredAction {
        let score = self.school_match(action, preferred) + self.novelty(action) * 0.5;
        self.scored(action, score, ActionBasis::PlayerStyle)
    }
}

fn to_hand_item(scored: ScoredAction) -> HandItem<ActionDef> {
    HandItem {
        item: scored.action,
        basis_tag: scored.basis.tag(),
        basis_note: scored.note,
        score: scored.score,
    }
}

fn fixed_item(
    action: &ActionDef,
    basis_tag: BasisTag,
    note: &str,
    score: f64,
) -> HandItem<ActionDef> {
    HandItem {
        item: action.clone(),
        basis_tag,
        basis_note: note.to_string(),
        score,
    }
}

fn in_hand(hand: &[HandItem<ActionDef>], id: &str) -> bool {
    hand.iter().any(|entry| entry.item.id == id)
}

fn without_chosen(eligible: &[ActionDef], hand: &[HandItem<ActionDef>]) -> Vec<ActionDef> {
    eligible
        .iter()
        .filter(|action| !in_hand(hand, &action.id))
        .cloned()
        .collect()
}

fn has_synthesis(hand: &[HandItem<ActionDef>]) -> bool {
    hand.iter().any(|entry| entry.item.school == School::Synthesis)
}

/// Whether a late addition keeps the synthesis rules intact: synthesis needs
/// abstraction evidence, and the chase holds at most one.
fn admissible(
    action: &ActionDef,
    hand: &[HandItem<ActionDef>],
    mode: ActionRecMode,
    synthesis_allowed: bool,
) -> bool {
    if action.school != School::Synthesis {
        return true;
    }
    synthesis_allowed && !(mode == ActionRecMode::Chase && has_synthesis(hand))
}

pub fn build_action_hand<H: HintParser + ?Sized>(
    state: &GameStateForRecs,
    actions: &[ActionDef],
    now_ms: u64,
    config: &RecsConfig,
    hints: &H,
) -> ActionHand {
    let snapshot = build_action_snapshot(state, config, now_ms);
    let catalog = ActionCatalogIndex::new(actions);
    let missing_fp = enrichment_actions_for(&snapshot.missing_milestone_fields);
    let eligible = catalog.eligible_for_mode(state, snapshot.mode, &missing_fp);
    let recent_ids = recent_action_ids(state, config.novelty_window);
    debug!(
        snapshot = %snapshot.snapshot_id,
        mode = snapshot.mode.label(),
        catalog = catalog.len(),
        eligible = eligible.len(),
        "building action hand"
    );

    if snapshot.mode == ActionRecMode::FpStart {
        return fp_start_hand(&snapshot, &catalog, &eligible);
    }

    let target_size = config.steady_action_hand_size();
    let mut hand: Vec<HandItem<ActionDef>> = Vec::new();
    let mut hard_constraints = Vec::new();

    if snapshot.mode == ActionRecMode::Enrich {
        for id in missing_fp.iter().take(MAX_ENRICHMENT_SLOTS) {
            if let Some(action) = eligible.iter().find(|action| action.id == *id) {
                hand.push(fixed_item(
                    action,
                    BasisTag::MilestoneLinked,
                    ENRICHMENT_NOTE,
                    ENRICHMENT_SCORE,
                ));
            }
        }
    }

    let ctx = SlotContext {
        snapshot: &snapshot,
        weights: &config.weights,
        recent_ids: &recent_ids,
    };
    fill_dynamic_slots(&mut hand, &eligible, &ctx, hints, target_size);

    let mode = snapshot.mode;
    let seed = |suffix: &str| format!("{}:{}", snapshot.snapshot_id, suffix);

    // (a) dedup
    let mut hand = unique_by(hand, |entry| entry.item.id.clone());

    // (b) the chase keeps a single synthesis action
    if mode == ActionRecMode::Chase {
        keep_top_synthesis(&mut hand);
    }

    // (c) synthesis needs abstraction evidence
    let synthesis_allowed = has_abstraction_evidence(state);
    if has_synthesis(&hand) && !synthesis_allowed {
        hand.retain(|entry| entry.item.school != School::Synthesis);
        let candidates: Vec<ActionDef> = without_chosen(&eligible, &hand)
            .into_iter()
            .filter(|action| {
                matches!(action.school, School::Abstraction | School::Understanding)
            })
            .collect();
        let fallback = pick_best_action(&candidates, &seed("fs_fallback"), |action| {
            ScoredAction {
                action: action.clone(),
                score: FS_FALLBACK_BASE + ctx.novelty(action),
                basis: ActionBasis::Stability,
                note: FS_FALLBACK_NOTE.to_string(),
            }
        });
        debug!(
            substitute = fallback.as_ref().map(|pick| pick.action.id.as_str()),
            "dropped synthesis without abstraction evidence"
        );
        if let Some(pick) = fallback {
            hand.push(to_hand_item(pick));
        }
    }

    // (d) the chase spans at least two schools
    if mode == ActionRecMode::Chase {
        let schools: BTreeSet<School> = hand.iter().map(|entry| entry.item.school).collect();
        if schools.len() < 2 {
            let anchor = hand.first().map(|entry| entry.item.school);
            let candidates: Vec<ActionDef> = without_chosen(&eligible, &hand)
                .into_iter()
                .filter(|action| Some(action.school) != anchor)
                .filter(|action| admissible(action, &hand, mode, synthesis_allowed))
                .collect();
            let extra = pick_best_action(&candidates, &seed("diversity_fix"), |action| {
                ScoredAction {
                    action: action.clone(),
                    score: VARIETY_FIX_BASE + ctx.novelty(action),
                    basis: ActionBasis::Variety,
                    note: VARIETY_FIX_NOTE.to_string(),
                }
            });
            if let Some(pick) = extra {
                hand.push(to_hand_item(pick));
            }
        }
    }

    // (e) rank and clamp
    let mut hand = unique_by(hand, |entry| entry.item.id.clone());
    sort_hand_items_desc(&mut hand);
    hand.truncate(target_size);

    // (f) thin catalogs
    if hand.len() < MIN_HAND_SIZE {
        backfill(&mut hand, &eligible, MIN_HAND_SIZE, |action, hand| {
            admissible(action, hand, mode, synthesis_allowed)
        });
    }

    // (g) every pick explains itself
    for entry in &mut hand {
        if entry.basis_note.trim().is_empty() {
            entry.basis_note = note_for_basis(ActionBasis::Variety, &snapshot).to_string();
        }
    }

    if has_synthesis(&hand) {
        hard_constraints.push(FS_REQUIRES_FA_NOTICE.to_string());
    }

    debug!(
        snapshot = %snapshot.snapshot_id,
        size = hand.len(),
        "action hand ready"
    );
    ActionHand {
        mode,
        snapshot_id: snapshot.snapshot_id.clone(),
        generated_at_ms: snapshot.generated_at_ms,
        actions: hand,
        hard_constraints,
    }
}

fn fill_dynamic_slots<H: HintParser + ?Sized>(
    hand: &mut Vec<HandItem<ActionDef>>,
    eligible: &[ActionDef],
    ctx: &SlotContext<'_>,
    hints: &H,
    target_size: usize,
) {
    let snapshot = ctx.snapshot;
    let seed = |slot: u8| format!("{}:slot{slot}", snapshot.snapshot_id);

    let hinted = school_for_progress(hints, snapshot.latest_progress.as_ref());
    let pick = pick_best_action(&without_chosen(eligible, hand), &seed(1), |action| {
        ctx.progress_slot(action, hinted)
    });
    push_pick(hand, pick);

    let pick = pick_best_action(&without_chosen(eligible, hand), &seed(2), |action| {
        ctx.adjacency_slot(action)
    });
    push_pick(hand, pick);

    let unsteady = snapshot
        .latest_progress
        .as_ref()
        .is_some_and(|progress| progress.progress_label.is_unsteady());
    let stability = if unsteady {
        UNSTEADY_STABILITY_SCHOOL
    } else {
        STABILITY_SCHOOL
    };
    let pick = pick_best_action(&without_chosen(eligible, hand), &seed(3), |action| {
        ctx.stability_slot(action, stability)
    });
    push_pick(hand, pick);

    let used: BTreeSet<School> = hand.iter().map(|entry| entry.item.school).collect();
    let pick = pick_best_action(&without_chosen(eligible, hand), &seed(4), |action| {
        ctx.variety_slot(action, &used)
    });
    push_pick(hand, pick);

    if hand.len() < target_size {
        let preferred = preferred_school_from_player(snapshot.player_stats.as_ref());
        let pick = pick_best_action(&without_chosen(eligible, hand), &seed(5), |action| {
            ctx.player_slot(action, preferred)
        });
        push_pick(hand, pick);
    }
}

fn push_pick(hand: &mut Vec<HandItem<ActionDef>>, pick: Option<ScoredAction>) {
    if let Some(scored) = pick {
        debug!(
            action = %scored.action.id,
            basis = scored.basis.tag().label(),
            score = scored.score,
            "slot filled"
        );
        hand.push(to_hand_item(scored));
    }
}

fn keep_top_synthesis(hand: &mut Vec<HandItem<ActionDef>>) {
    let mut keep: Option<(&str, f64)> = None;
    let mut count = 0;
    for entry in hand.iter().filter(|entry| entry.item.school == School::Synthesis) {
        count += 1;
        if keep.map_or(true, |(_, best)| entry.score > best) {
            keep = Some((entry.item.id.as_str(), entry.score));
        }
    }
    if count <= 1 {
        return;
    }
    let Some(keep_id) = keep.map(|(id, _)| id.to_string()) else {
        return;
    };
    hand.retain(|entry| entry.item.school != School::Synthesis || entry.item.id == keep_id);
}

fn backfill<F>(
    hand: &mut Vec<HandItem<ActionDef>>,
    eligible: &[ActionDef],
    floor: usize,
    allow: F,
) where
    F: Fn(&ActionDef, &[HandItem<ActionDef>]) -> bool,
{
    for action in eligible {
        if hand.len() >= floor {
            break;
        }
        if in_hand(hand.as_slice(), &action.id) || !allow(action, hand.as_slice()) {
            continue;
        }
        hand.push(fixed_item(
            action,
            BasisTag::Variety,
            FALLBACK_NOTE,
            FALLBACK_SCORE,
        ));
    }
}

fn fp_start_hand(
    snapshot: &ActionRecSnapshot,
    catalog: &ActionCatalogIndex,
    eligible: &[ActionDef],
) -> ActionHand {
    let mut hand = Vec::new();
    for id in FP_START_SEQUENCE {
        let Some(action) = catalog.get(id) else {
            continue;
        };
        if !eligible.iter().any(|candidate| candidate.id == action.id) {
            continue;
        }
        hand.push(fixed_item(
            action,
            BasisTag::MilestoneLinked,
            MILESTONE_FLOW_NOTE,
            FP_START_SCORE,
        ));
    }
    let mut hand = unique_by(hand, |entry| entry.item.id.clone());
    backfill(&mut hand, eligible, FP_START_HAND_SIZE, |_, _| true);
    hand.truncate(FP_START_HAND_SIZE);

    ActionHand {
        mode: ActionRecMode::FpStart,
        snapshot_id: snapshot.snapshot_id.clone(),
        generated_at_ms: snapshot.generated_at_ms,
        actions: hand,
        hard_constraints: Vec::new(),
    }
}
