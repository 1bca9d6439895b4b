use crate::{ActionDef, ActionId, ActionRecMode, GameStateForRecs, MilestoneField, School};
use std::collections::{BTreeMap, HashMap};

pub const FS_REQUIRES_FA_NOTICE: &str = "FS requires FA-derived targets (abstractions).";

/// Canonical milestone definition order: goal, scope fence, tripwires, done receipt.
pub const FP_START_SEQUENCE: [&str; 4] = ["FP-01", "FP-02", "FP-08", "FP-10"];

pub fn adjacency_next(school: School) -> &'static [School] {
    match school {
        School::Planning => &[School::Introduction],
        School::Introduction => &[School::Understanding],
        School::Understanding => &[School::Presentation, School::Abstraction],
        School::Presentation => &[School::Abstraction, School::Synthesis],
        School::Abstraction => &[School::Synthesis],
        School::Synthesis => &[School::Introduction, School::Understanding],
    }
}

pub fn adjacent_schools(last: Option<School>) -> &'static [School] {
    match last {
        Some(school) => adjacency_next(school),
        None => &[],
    }
}

pub fn enrichment_action_for(field: MilestoneField) -> &'static str {
    match field {
        MilestoneField::NorthStar => "FP-01",
        MilestoneField::ScopeFence => "FP-02",
        MilestoneField::Tripwires => "FP-08",
        MilestoneField::DoneReceipt => "FP-10",
    }
}

pub fn enrichment_actions_for(missing: &[MilestoneField]) -> Vec<ActionId> {
    FP_START_SEQUENCE
        .iter()
        .filter(|id| {
            missing
                .iter()
                .any(|field| enrichment_action_for(*field) == **id)
        })
        .map(|id| id.to_string())
        .collect()
}

/// True when a run of `school`, or a collectible produced by it, exists.
/// Scans newest first and stops at the first match.
pub fn has_school_evidence(state: &GameStateForRecs, school: School) -> bool {
    state.runs.iter().rev().any(|run| {
        run.school == school
            || run
                .collectibles
                .iter()
                .any(|item| item.produced_by_school == Some(school))
    })
}

pub fn has_abstraction_evidence(state: &GameStateForRecs) -> bool {
    has_school_evidence(state, School::Abstraction)
}

#[derive(Debug, Clone, Default)]
pub struct ActionCatalogIndex {
    by_id: HashMap<ActionId, ActionDef>,
    by_school: BTreeMap<School, Vec<ActionDef>>,
    all: Vec<ActionDef>,
}

impl ActionCatalogIndex {
    pub fn new(actions: &[ActionDef]) -> Self {
        let mut by_id = HashMap::new();
        let mut by_school: BTreeMap<School, Vec<ActionDef>> = BTreeMap::new();
        for action in actions {
            by_id.insert(action.id.clone(), action.clone());
            by_school
                .entry(action.school)
                .or_default()
                .push(action.clone());
        }
        for bucket in by_school.values_mut() {
            bucket.sort_by(|a, b| a.id.cmp(&b.id));
        }
        let mut all = actions.to_vec();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Self {
            by_id,
            by_school,
            all,
        }
    }

    pub fn get(&self, id: &str) -> Option<&ActionDef> {
        self.by_id.get(id)
    }

    pub fn by_school(&self, school: School) -> &[ActionDef] {
        self.by_school
            .get(&school)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn all(&self) -> &[ActionDef] {
        &self.all
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    pub fn eligible_for_mode(
        &self,
        state: &GameStateForRecs,
        mode: ActionRecMode,
        missing_fp_action_ids: &[ActionId],
    ) -> Vec<ActionDef> {
        self.all
            .iter()
            .filter(|action| !state.is_unavailable(&action.id))
            .filter(|action| match mode {
                ActionRecMode::FpStart => action.school == School::Planning,
                ActionRecMode::Enrich => true,
                ActionRecMode::Chase => {
                    action.school != School::Planning
                        || missing_fp_action_ids.iter().any(|id| *id == action.id)
                }
            })
            .cloned()
            .collect()
    }
}
