//! Output formatting helpers for CLI commands

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde_json::json;

use crate::registry::{Path, ProviderKind};
use crate::routing::RoutingDecision;

/// View model for path display
#[derive(Debug, Clone, serde::Serialize)]
pub struct PathView {
    pub id: String,
    pub provider: ProviderKind,
    pub provider_name: String,
    pub supports_tools: bool,
    pub supports_streaming: bool,
    pub max_tokens: u32,
    pub cost_per_unit: f64,
    pub latency_ms: u32,
}

impl From<&Path> for PathView {
    fn from(path: &Path) -> Self {
        Self {
            id: path.id.clone(),
            provider: path.provider,
            provider_name: path.provider_name.clone(),
            supports_tools: path.capabilities.supports_tools,
            supports_streaming: path.capabilities.supports_streaming,
            max_tokens: path.capabilities.max_tokens,
            cost_per_unit: path.cost_per_unit,
            latency_ms: path.effective_latency_ms(),
        }
    }
}

fn yes_no(flag: bool) -> String {
    if flag {
        "yes".green().to_string()
    } else {
        "no".dimmed().to_string()
    }
}

/// Format paths as a table
pub fn format_paths_table(paths: &[PathView]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Path", "Provider", "Upstream", "Tools", "Streaming", "Max Tokens", "Cost", "Latency",
    ]);

    for p in paths {
        table.add_row(vec![
            Cell::new(&p.id),
            Cell::new(p.provider),
            Cell::new(&p.provider_name),
            Cell::new(yes_no(p.supports_tools)),
            Cell::new(yes_no(p.supports_streaming)),
            Cell::new(p.max_tokens),
            Cell::new(format!("{:.2}", p.cost_per_unit)),
            Cell::new(format!("{}ms", p.latency_ms)),
        ]);
    }

    table.to_string()
}

/// Format paths as JSON
pub fn format_paths_json(paths: &[PathView]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&json!({ "paths": paths }))
}

/// Format a routing decision as a ranked table followed by exclusions
pub fn format_decision_table(decision: &RoutingDecision) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "#", "Path", "Provider", "Score", "Latency", "Cost", "Capability", "Affinity",
        "Priority", "Reliability",
    ]);

    for (i, c) in decision.candidates.iter().enumerate() {
        let rank = if i == 0 {
            "1".green().bold().to_string()
        } else {
            (i + 1).to_string()
        };
        let b = &c.breakdown;
        table.add_row(vec![
            Cell::new(rank),
            Cell::new(&c.path_id),
            Cell::new(c.provider),
            Cell::new(format!("{:.3}", c.score)),
            Cell::new(format!("{:.2}", b.latency)),
            Cell::new(format!("{:.2}", b.cost)),
            Cell::new(format!("{:.2}", b.capability)),
            Cell::new(format!("{:.2}", b.affinity)),
            Cell::new(format!("{:.2}", b.priority_order)),
            Cell::new(format!("{:.2}", b.reliability)),
        ]);
    }

    let mut out = table.to_string();
    for e in &decision.exclusions {
        out.push_str(&format!(
            "\n{} {} ({})",
            "excluded:".yellow(),
            e.path_id,
            e.reason
        ));
    }
    out.push_str(&format!("\n{}", decision.justification));
    out
}

/// Format a routing decision as JSON
pub fn format_decision_json(decision: &RoutingDecision) -> Result<String, serde_json::Error> {
    let exclusions: Vec<_> = decision
        .exclusions
        .iter()
        .map(|e| json!({ "path_id": e.path_id, "reason": e.reason }))
        .collect();
    serde_json::to_string_pretty(&json!({
        "decision": decision,
        "excluded": exclusions,
    }))
}
