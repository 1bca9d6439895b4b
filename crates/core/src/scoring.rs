use crate::{
    adjacent_schools, round_half_up, seeded_sort, ActionDef, ActionId, BasisTag, Collectible,
    PlayerStats, School, ScoreWeights,
};

const NOVELTY_BONUS: f64 = 0.5;
const REPEAT_PENALTY: f64 = -1.0;

const CLOSE_SCHOOL_PAIRS: [(School, School); 5] = [
    (School::Introduction, School::Understanding),
    (School::Understanding, School::Presentation),
    (School::Presentation, School::Abstraction),
    (School::Abstraction, School::Synthesis),
    (School::Synthesis, School::Introduction),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionBasis {
    ProgressProxy,
    Adjacency,
    Stability,
    Variety,
    PlayerStyle,
    MilestoneEnrichment,
}

impl ActionBasis {
    pub fn tag(self) -> BasisTag {
        match self {
            Self::ProgressProxy => BasisTag::ProgressProxy,
            Self::Adjacency => BasisTag::Adjacency,
            Self::Stability => BasisTag::Stability,
            Self::Variety => BasisTag::Variety,
            Self::PlayerStyle => BasisTag::PlayerStyle,
            Self::MilestoneEnrichment => BasisTag::MilestoneLinked,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredAction {
    pub action: ActionDef,
    pub score: f64,
    pub basis: ActionBasis,
    pub note: String,
}

/// Most-picked school; ties go to the school recorded first.
pub fn preferred_school_from_player(stats: Option<&PlayerStats>) -> Option<School> {
    let mut best: Option<(School, u32)> = None;
    for (school, count) in stats?.school_pick_counts.iter() {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((school, count));
        }
    }
    best.map(|(school, _)| school)
}

pub fn score_school_match(
    action: &ActionDef,
    desired: Option<School>,
    weights: &ScoreWeights,
) -> f64 {
    match desired {
        Some(school) if action.school == school => weights.action_school_match,
        _ => 0.0,
    }
}

pub fn score_adjacency(
    action: &ActionDef,
    last_school: Option<School>,
    weights: &ScoreWeights,
) -> f64 {
    if adjacent_schools(last_school).contains(&action.school) {
        weights.adjacency_school_match
    } else {
        0.0
    }
}

pub fn score_player_preference(
    action: &ActionDef,
    stats: Option<&PlayerStats>,
    weights: &ScoreWeights,
) -> f64 {
    match preferred_school_from_player(stats) {
        Some(school) if action.school == school => weights.player_preference,
        _ => 0.0,
    }
}

pub fn score_novelty(action: &ActionDef, recent_action_ids: &[ActionId]) -> f64 {
    if recent_action_ids.iter().any(|id| *id == action.id) {
        REPEAT_PENALTY
    } else {
        NOVELTY_BONUS
    }
}

/// Scores every candidate, pre-orders them with a seeded shuffle so ties
/// scatter per slot, then takes the top score.
pub fn pick_best_action<F>(
    candidates: &[ActionDef],
    seed_key: &str,
    score_fn: F,
) -> Option<ScoredAction>
where
    F: Fn(&ActionDef) -> ScoredAction,
{
    if candidates.is_empty() {
        return None;
    }
    let scored: Vec<ScoredAction> = candidates.iter().map(score_fn).collect();
    let mut scored = seeded_sort(scored, seed_key, |item| {
        format!("{}:{}", item.action.id, round_half_up(item.score * 1000.0))
    });
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.into_iter().next()
}

pub fn school_compatibility(
    action_school: School,
    item: &Collectible,
    weights: &ScoreWeights,
) -> f64 {
    let Some(produced) = item.produced_by_school else {
        return 0.0;
    };
    if produced == action_school {
        return weights.action_school_match;
    }
    let close = CLOSE_SCHOOL_PAIRS.iter().any(|(a, b)| {
        (produced == *a && action_school == *b) || (produced == *b && action_school == *a)
    });
    if close {
        weights.adjacency_school_match
    } else {
        0.0
    }
}
