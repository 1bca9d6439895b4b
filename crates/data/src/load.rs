use anyhow::{bail, Context};
use deckwright_core::{ActionDef, GameStateForRecs, RecsConfig};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub fn load_catalog(path: &Path) -> anyhow::Result<Vec<ActionDef>> {
    let actions: Vec<ActionDef> = load_json(path)?;
    validate_catalog(&actions).with_context(|| format!("validate {}", path.display()))?;
    info!(path = %path.display(), actions = actions.len(), "loaded catalog");
    Ok(actions)
}

pub fn load_state(path: &Path) -> anyhow::Result<GameStateForRecs> {
    let state: GameStateForRecs = load_json(path)?;
    info!(path = %path.display(), runs = state.runs.len(), "loaded game state");
    Ok(state)
}

/// Reads engine settings, falling back to the defaults when the file is absent.
pub fn load_recs_config(path: &Path) -> anyhow::Result<RecsConfig> {
    if !path.exists() {
        warn!(path = %path.display(), "config not found, using defaults");
        return Ok(RecsConfig::default());
    }
    let config: RecsConfig = load_json(path)?;
    config
        .validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(config)
}

/// Rejects empty and duplicate action ids.
pub fn validate_catalog(actions: &[ActionDef]) -> anyhow::Result<()> {
    let mut seen = HashSet::new();
    for (index, action) in actions.iter().enumerate() {
        let id = action.id.trim();
        if id.is_empty() {
            bail!("action id cannot be empty (entry {index})");
        }
        if !seen.insert(id) {
            bail!("duplicate action id {id}");
        }
    }
    Ok(())
}

pub fn parse_catalog(raw: &[u8], origin: &str) -> anyhow::Result<Vec<ActionDef>> {
    let actions: Vec<ActionDef> =
        serde_json::from_slice(raw).with_context(|| format!("parse {origin}"))?;
    validate_catalog(&actions).with_context(|| format!("validate {origin}"))?;
    Ok(actions)
}

pub fn parse_state(raw: &[u8], origin: &str) -> anyhow::Result<GameStateForRecs> {
    let state = serde_json::from_slice(raw).with_context(|| format!("parse {origin}"))?;
    Ok(state)
}

fn load_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value = serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(value)
}
