use crate::RecsError;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

pub type ActionId = String;
pub type RunId = String;
pub type MilestoneId = String;
pub type CollectibleId = String;

/// Thematic category an action or collectible belongs to.
///
/// Declaration order is the canonical school sequence; derived `Ord` relies on it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum School {
    #[serde(rename = "FP")]
    Planning,
    #[serde(rename = "FI")]
    Introduction,
    #[serde(rename = "FU")]
    Understanding,
    #[serde(rename = "FPR")]
    Presentation,
    #[serde(rename = "FA")]
    Abstraction,
    #[serde(rename = "FS")]
    Synthesis,
}

impl School {
    pub const ALL: [School; 6] = [
        School::Planning,
        School::Introduction,
        School::Understanding,
        School::Presentation,
        School::Abstraction,
        School::Synthesis,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::Planning => "FP",
            Self::Introduction => "FI",
            Self::Understanding => "FU",
            Self::Presentation => "FPR",
            Self::Abstraction => "FA",
            Self::Synthesis => "FS",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Planning => "Planning",
            Self::Introduction => "Introduction",
            Self::Understanding => "Understanding",
            Self::Presentation => "Presentation",
            Self::Abstraction => "Abstraction",
            Self::Synthesis => "Synthesis",
        }
    }

    pub fn display_order(self) -> u8 {
        match self {
            Self::Introduction => 10,
            Self::Understanding => 20,
            Self::Presentation => 30,
            Self::Abstraction => 40,
            Self::Synthesis => 50,
            Self::Planning => 60,
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|school| school.code().eq_ignore_ascii_case(code))
    }
}

impl fmt::Display for School {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for School {
    type Err = RecsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_code(value.trim()).ok_or_else(|| RecsError::UnknownSchool(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WriteEffect {
    #[default]
    None,
    Issues,
    Codebase,
    Both,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MilestoneField {
    NorthStar,
    DoneReceipt,
    ScopeFence,
    Tripwires,
}

impl MilestoneField {
    pub const ALL: [MilestoneField; 4] = [
        MilestoneField::NorthStar,
        MilestoneField::DoneReceipt,
        MilestoneField::ScopeFence,
        MilestoneField::Tripwires,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::NorthStar => "NORTH_STAR",
            Self::DoneReceipt => "DONE_RECEIPT",
            Self::ScopeFence => "SCOPE_FENCE",
            Self::Tripwires => "TRIPWIRES",
        }
    }
}

impl FromStr for MilestoneField {
    type Err = RecsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|field| field.key().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| RecsError::UnknownMilestoneField(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActionRecMode {
    #[serde(rename = "FP_START")]
    FpStart,
    #[serde(rename = "ENRICH")]
    Enrich,
    #[serde(rename = "CHASE")]
    Chase,
}

impl ActionRecMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::FpStart => "FP_START",
            Self::Enrich => "ENRICH",
            Self::Chase => "CHASE",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BasisTag {
    ProgressProxy,
    Adjacency,
    Stability,
    Variety,
    PlayerStyle,
    MilestoneLinked,
    RecentOutput,
    Foundation,
    #[serde(rename = "fs_requires_fa")]
    RequiresAbstraction,
}

impl BasisTag {
    pub fn label(self) -> &'static str {
        match self {
            Self::ProgressProxy => "progress_proxy",
            Self::Adjacency => "adjacency",
            Self::Stability => "stability",
            Self::Variety => "variety",
            Self::PlayerStyle => "player_style",
            Self::MilestoneLinked => "milestone_linked",
            Self::RecentOutput => "recent_output",
            Self::Foundation => "foundation",
            Self::RequiresAbstraction => "fs_requires_fa",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActionDef {
    pub id: ActionId,
    pub title: String,
    pub school: School,
    #[serde(default)]
    pub write_effect: WriteEffect,
    #[serde(default)]
    pub fp_no_code: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ActionDef {
    pub fn new(id: impl Into<String>, title: impl Into<String>, school: School) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            school,
            write_effect: WriteEffect::None,
            fp_no_code: false,
            tags: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Targetability {
    Keystone,
    ObjectFacet,
    StatusFacet,
    Unknown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CollectibleType {
    #[serde(rename = "K1_DECISION")]
    Decision,
    #[serde(rename = "K2_PLAN")]
    Plan,
    #[serde(rename = "K3_SPEC")]
    Spec,
    #[serde(rename = "K4_RATIONALE")]
    Rationale,
    #[serde(rename = "K_CODE_PATCH")]
    CodePatch,
    #[serde(rename = "F1_ANCHOR")]
    Anchor,
    #[serde(rename = "F2_PROOF")]
    Proof,
    #[serde(rename = "P1_PROGRESS")]
    Progress,
    #[serde(rename = "P_MILESTONE_PROGRESS")]
    MilestoneProgress,
    #[serde(rename = "K_MILESTONE_NORTH_STAR")]
    MilestoneNorthStar,
    #[serde(rename = "K_MILESTONE_DONE_RECEIPT")]
    MilestoneDoneReceipt,
    #[serde(rename = "K_MILESTONE_SCOPE_FENCE")]
    MilestoneScopeFence,
    #[serde(rename = "K_MILESTONE_TRIPWIRES")]
    MilestoneTripwires,
    #[serde(other)]
    Unknown,
}

impl CollectibleType {
    pub fn targetability(self) -> Targetability {
        match self {
            Self::Decision
            | Self::Plan
            | Self::Spec
            | Self::Rationale
            | Self::CodePatch
            | Self::MilestoneNorthStar
            | Self::MilestoneDoneReceipt
            | Self::MilestoneScopeFence
            | Self::MilestoneTripwires => Targetability::Keystone,
            Self::Anchor | Self::Proof => Targetability::ObjectFacet,
            Self::Progress | Self::MilestoneProgress => Targetability::StatusFacet,
            Self::Unknown => Targetability::Unknown,
        }
    }

    pub fn is_keystone(self) -> bool {
        self.targetability() == Targetability::Keystone
    }

    pub fn is_object_facet(self) -> bool {
        self.targetability() == Targetability::ObjectFacet
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Decision => "K1_DECISION",
            Self::Plan => "K2_PLAN",
            Self::Spec => "K3_SPEC",
            Self::Rationale => "K4_RATIONALE",
            Self::CodePatch => "K_CODE_PATCH",
            Self::Anchor => "F1_ANCHOR",
            Self::Proof => "F2_PROOF",
            Self::Progress => "P1_PROGRESS",
            Self::MilestoneProgress => "P_MILESTONE_PROGRESS",
            Self::MilestoneNorthStar => "K_MILESTONE_NORTH_STAR",
            Self::MilestoneDoneReceipt => "K_MILESTONE_DONE_RECEIPT",
            Self::MilestoneScopeFence => "K_MILESTONE_SCOPE_FENCE",
            Self::MilestoneTripwires => "K_MILESTONE_TRIPWIRES",
            Self::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Collectible {
    pub id: CollectibleId,
    #[serde(rename = "type")]
    pub kind: CollectibleType,
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub run_id: RunId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub produced_by_action_id: Option<ActionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub produced_by_school: Option<School>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone_id: Option<MilestoneId>,
    /// Only used to explain a pick, never offered as a target.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_chunk_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at_ms: Option<u64>,
}

impl Collectible {
    pub fn new(
        id: impl Into<String>,
        kind: CollectibleType,
        run_id: impl Into<String>,
        produced_by_school: Option<School>,
    ) -> Self {
        let id = id.into();
        Self {
            title: format!("{} {}", kind.code(), id),
            body: format!("Body for {id}"),
            id,
            kind,
            run_id: run_id.into(),
            produced_by_action_id: None,
            produced_by_school,
            milestone_id: None,
            source_chunk_ids: Vec::new(),
            created_at_ms: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunProgressLabel {
    Advanced,
    Partial,
    Stalled,
    Drift,
}

impl RunProgressLabel {
    /// Drift and stalls both call for consolidating before pushing on.
    pub fn is_unsteady(self) -> bool {
        matches!(self, Self::Drift | Self::Stalled)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MilestoneProgressLabel {
    Ready,
    SoftGap,
    Thin,
    Conflicted,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunProgress {
    pub progress_label: RunProgressLabel,
    #[serde(default)]
    pub progress_score: f64,
    #[serde(default)]
    pub in_scope: bool,
    #[serde(default)]
    pub next_best_move_hint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MilestoneProgress {
    pub progress_label: MilestoneProgressLabel,
    #[serde(default)]
    pub progress_score: f64,
    #[serde(default)]
    pub missing_fields: Vec<MilestoneField>,
    #[serde(default)]
    pub weak_fields: Vec<MilestoneField>,
    #[serde(default)]
    pub enrichment_hint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ProgressSignal {
    #[serde(rename = "P1_PROGRESS")]
    PerRun(RunProgress),
    #[serde(rename = "P_MILESTONE_PROGRESS")]
    PerMilestone(MilestoneProgress),
}

impl ProgressSignal {
    pub fn as_run(&self) -> Option<&RunProgress> {
        match self {
            Self::PerRun(progress) => Some(progress),
            Self::PerMilestone(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub run_id: RunId,
    pub action_id: ActionId,
    pub school: School,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone_id: Option<MilestoneId>,
    #[serde(default)]
    pub collectibles: Vec<Collectible>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_facet: Option<ProgressSignal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ActiveMilestoneSignals {
    pub id: MilestoneId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_fully_enriched: Option<bool>,
    /// Confidence per field in `0..=1`. `None` means nothing is known yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_confidence: Option<BTreeMap<MilestoneField, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_fields: Option<Vec<MilestoneField>>,
}

/// Pick counts per school, kept in the order the schools were first recorded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchoolCounts(Vec<(School, u32)>);

impl SchoolCounts {
    pub fn get(&self, school: School) -> Option<u32> {
        self.0
            .iter()
            .find(|(recorded, _)| *recorded == school)
            .map(|(_, count)| *count)
    }

    /// A repeated school updates its count in place.
    pub fn insert(&mut self, school: School, count: u32) {
        match self.0.iter_mut().find(|(recorded, _)| *recorded == school) {
            Some(entry) => entry.1 = count,
            None => self.0.push((school, count)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (School, u32)> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(School, u32)> for SchoolCounts {
    fn from_iter<I: IntoIterator<Item = (School, u32)>>(iter: I) -> Self {
        let mut counts = Self::default();
        for (school, count) in iter {
            counts.insert(school, count);
        }
        counts
    }
}

impl Serialize for SchoolCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(school, count)| (school, count)))
    }
}

impl<'de> Deserialize<'de> for SchoolCounts {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(SchoolCountsVisitor)
    }
}

struct SchoolCountsVisitor;

impl<'de> Visitor<'de> for SchoolCountsVisitor {
    type Value = SchoolCounts;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of school codes to pick counts")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut counts = SchoolCounts::default();
        while let Some((school, count)) = access.next_entry::<School, u32>()? {
            counts.insert(school, count);
        }
        Ok(counts)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    #[serde(default)]
    pub school_pick_counts: SchoolCounts,
    #[serde(default)]
    pub recently_picked_actions: Vec<ActionId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GameStateForRecs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_milestone: Option<ActiveMilestoneSignals>,
    #[serde(default)]
    pub completed_milestones: Vec<MilestoneId>,
    /// Chronological, oldest first.
    #[serde(default)]
    pub runs: Vec<RunRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_stats: Option<PlayerStats>,
    #[serde(default)]
    pub unavailable_action_ids: BTreeSet<ActionId>,
}

impl GameStateForRecs {
    pub fn is_unavailable(&self, action_id: &str) -> bool {
        self.unavailable_action_ids.contains(action_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HandItem<T> {
    pub item: T,
    pub basis_tag: BasisTag,
    pub basis_note: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActionHand {
    pub mode: ActionRecMode,
    pub snapshot_id: String,
    pub generated_at_ms: u64,
    pub actions: Vec<HandItem<ActionDef>>,
    pub hard_constraints: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TargetsHand {
    pub snapshot_id: String,
    pub generated_at_ms: u64,
    pub targets: Vec<HandItem<Collectible>>,
    pub hard_constraints: Vec<String>,
}
