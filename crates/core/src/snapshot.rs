use crate::{
    to_base36, unique_by, ActionDef, ActionId, ActionRecMode, ActiveMilestoneSignals, Collectible,
    CollectibleId, GameStateForRecs, MilestoneField, MilestoneId, PlayerStats, RecsConfig,
    RunProgress, RunRecord, School,
};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct ActionRecSnapshot {
    pub snapshot_id: String,
    pub generated_at_ms: u64,
    pub mode: ActionRecMode,
    pub active_milestone_id: Option<MilestoneId>,
    pub missing_milestone_fields: Vec<MilestoneField>,
    pub last_action_id: Option<ActionId>,
    pub last_school: Option<School>,
    pub latest_progress: Option<RunProgress>,
    pub player_stats: Option<PlayerStats>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetsRecSnapshot {
    pub snapshot_id: String,
    pub generated_at_ms: u64,
    pub active_milestone_id: Option<MilestoneId>,
    /// Authoritative milestone composition, first occurrence kept.
    pub milestone_composition_ids: Vec<CollectibleId>,
    pub selected_action: ActionDef,
    pub recent_collectibles: Vec<Collectible>,
    pub player_stats: Option<PlayerStats>,
}

pub fn make_snapshot_id(prefix: &str, now_ms: u64) -> String {
    format!("{prefix}:{}", to_base36(now_ms))
}

/// An explicit, non-empty missing list wins over confidence inference.
pub fn infer_missing_fields(
    field_confidence: Option<&BTreeMap<MilestoneField, f64>>,
    explicit_missing: Option<&[MilestoneField]>,
    threshold: f64,
) -> Vec<MilestoneField> {
    if let Some(explicit) = explicit_missing.filter(|list| !list.is_empty()) {
        return unique_by(explicit.to_vec(), |field| *field);
    }
    let Some(confidence) = field_confidence else {
        return Vec::new();
    };
    MilestoneField::ALL
        .into_iter()
        .filter(|field| confidence.get(field).copied().unwrap_or(0.0) < threshold)
        .collect()
}

pub fn derive_mode(
    active: Option<&ActiveMilestoneSignals>,
    missing_fields: &[MilestoneField],
) -> ActionRecMode {
    let Some(active) = active else {
        return ActionRecMode::FpStart;
    };
    let fully_enriched = active
        .is_fully_enriched
        .unwrap_or(missing_fields.is_empty());
    if fully_enriched {
        ActionRecMode::Chase
    } else {
        ActionRecMode::Enrich
    }
}

/// Most recent per-run progress signal; per-milestone signals are skipped.
pub fn latest_run_progress(runs: &[RunRecord]) -> Option<&RunProgress> {
    runs.iter()
        .rev()
        .find_map(|run| run.progress_facet.as_ref().and_then(|facet| facet.as_run()))
}

pub fn build_action_snapshot(
    state: &GameStateForRecs,
    config: &RecsConfig,
    now_ms: u64,
) -> ActionRecSnapshot {
    let active = state.active_milestone.as_ref();
    let missing = infer_missing_fields(
        active.and_then(|milestone| milestone.field_confidence.as_ref()),
        active.and_then(|milestone| milestone.missing_fields.as_deref()),
        config.milestone_confidence_threshold,
    );
    let mode = derive_mode(active, &missing);
    let last_run = state.runs.last();

    ActionRecSnapshot {
        snapshot_id: make_snapshot_id("AHS", now_ms),
        generated_at_ms: now_ms,
        mode,
        active_milestone_id: active.map(|milestone| milestone.id.clone()),
        missing_milestone_fields: missing,
        last_action_id: last_run.map(|run| run.action_id.clone()),
        last_school: last_run.map(|run| run.school),
        latest_progress: latest_run_progress(&state.runs).cloned(),
        player_stats: state.player_stats.clone(),
    }
}

pub fn build_targets_snapshot(
    state: &GameStateForRecs,
    selected_action: &ActionDef,
    milestone_composition_ids: &[CollectibleId],
    config: &RecsConfig,
    now_ms: u64,
) -> TargetsRecSnapshot {
    let window_start = state.runs.len().saturating_sub(config.targets_run_window);
    let recent_collectibles = state.runs[window_start..]
        .iter()
        .rev()
        .flat_map(|run| run.collectibles.iter().cloned())
        .collect();

    TargetsRecSnapshot {
        snapshot_id: make_snapshot_id("THS", now_ms),
        generated_at_ms: now_ms,
        active_milestone_id: state
            .active_milestone
            .as_ref()
            .map(|milestone| milestone.id.clone()),
        milestone_composition_ids: unique_by(milestone_composition_ids.to_vec(), |id| id.clone()),
        selected_action: selected_action.clone(),
        recent_collectibles,
        player_stats: state.player_stats.clone(),
    }
}

pub fn recent_action_ids(state: &GameStateForRecs, limit: usize) -> Vec<ActionId> {
    state
        .runs
        .iter()
        .rev()
        .take(limit)
        .map(|run| run.action_id.clone())
        .collect()
}
