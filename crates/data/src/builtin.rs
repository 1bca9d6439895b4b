use crate::load::{parse_catalog, parse_state};
use deckwright_core::{ActionDef, GameStateForRecs};

const BUILTIN_CATALOG: &[u8] = include_bytes!("../fixtures/catalog.json");
const DEMO_STATE: &[u8] = include_bytes!("../fixtures/demo_state.json");

/// Clock value the demo hands are generated at.
pub const DEMO_NOW_MS: u64 = 1_234_567_890;
/// Milestone composition used for the demo targets hand.
pub const DEMO_COMPOSITION_IDS: [&str; 1] = ["k1"];

/// The nine-action starter catalog shipped with the crate.
pub fn builtin_catalog() -> anyhow::Result<Vec<ActionDef>> {
    parse_catalog(BUILTIN_CATALOG, "built-in catalog.json")
}

/// Three runs into milestone `m1`, with three of its four fields still weak.
pub fn demo_state() -> anyhow::Result<GameStateForRecs> {
    parse_state(DEMO_STATE, "built-in demo_state.json")
}
