use crate::{ActionHand, HandItem, RecsError, TargetsHand};
use serde::Serialize;
use std::fs;
use std::path::Path;

impl ActionHand {
    pub fn to_text_report(&self) -> String {
        let mut lines = vec![
            format!("snapshot: {}", self.snapshot_id),
            format!("mode: {}", self.mode.label()),
            format!("generated_at_ms: {}", self.generated_at_ms),
            String::new(),
            "actions:".to_string(),
        ];
        if self.actions.is_empty() {
            lines.push("  (none)".to_string());
        }
        for (idx, entry) in self.actions.iter().enumerate() {
            lines.push(format!(
                "  {:>2}. {:<8} [{}] {}",
                idx + 1,
                entry.item.id,
                entry.item.school.code(),
                entry.item.title
            ));
            lines.push(item_detail(entry));
        }
        push_constraints(&mut lines, &self.hard_constraints);
        lines.join("\n")
    }
}

impl TargetsHand {
    pub fn to_text_report(&self) -> String {
        let mut lines = vec![
            format!("snapshot: {}", self.snapshot_id),
            format!("generated_at_ms: {}", self.generated_at_ms),
            String::new(),
            "targets:".to_string(),
        ];
        if self.targets.is_empty() {
            lines.push("  (none)".to_string());
        }
        for (idx, entry) in self.targets.iter().enumerate() {
            let origin = entry
                .item
                .produced_by_school
                .map(|school| school.code())
                .unwrap_or("-");
            lines.push(format!(
                "  {:>2}. {:<8} {} run={} from={}",
                idx + 1,
                entry.item.id,
                entry.item.kind.code(),
                entry.item.run_id,
                origin
            ));
            lines.push(item_detail(entry));
        }
        push_constraints(&mut lines, &self.hard_constraints);
        lines.join("\n")
    }
}

fn item_detail<T>(entry: &HandItem<T>) -> String {
    format!(
        "      {} score={:.2} | {}",
        entry.basis_tag.label(),
        entry.score,
        entry.basis_note
    )
}

fn push_constraints(lines: &mut Vec<String>, constraints: &[String]) {
    if constraints.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push("constraints:".to_string());
    for constraint in constraints {
        lines.push(format!("  - {constraint}"));
    }
}

pub fn write_json<T: Serialize>(path: &Path, hand: &T) -> Result<(), RecsError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_string_pretty(hand)?;
    fs::write(path, body)?;
    Ok(())
}

pub fn write_text(path: &Path, report: &str) -> Result<(), RecsError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, report)?;
    Ok(())
}
