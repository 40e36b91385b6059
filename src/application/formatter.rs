//! Output formatting for pinned items.
//!
//! Supports multiple output formats: table view, JSON, and Markdown.

use std::collections::BTreeMap;

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};

use crate::domain::{PinKind, PinnedStore, Ticket};

/// Output format options.
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    /// Table per kind.
    #[default]
    Table,
    /// JSON format for programmatic use.
    Json,
    /// Human-readable Markdown format.
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "markdown" | "md" => Ok(Self::Markdown),
            _ => Err(format!("Unknown format: {s}. Use: table, json, markdown")),
        }
    }
}

/// One display row: identity key, label, detail column.
type Row = (String, String, String);

fn rows_of(store: &PinnedStore, kind: PinKind) -> Vec<Row> {
    match kind {
        PinKind::Ticket => store
            .tickets
            .iter()
            .flatten()
            .map(|t| {
                let assignee = t
                    .assigned_to
                    .as_ref()
                    .map_or_else(|| "-".to_string(), |a| a.display_name());
                (t.id.clone(), t.title.clone(), format!("{} / {assignee}", t.status))
            })
            .collect(),
        PinKind::Conversation => store
            .conversations
            .iter()
            .flatten()
            .map(|c| {
                let channel = c.channel.clone().unwrap_or_else(|| "-".into());
                (c.id.clone(), c.subject.clone(), channel)
            })
            .collect(),
        PinKind::KnowledgeBase => store
            .knowledge_bases
            .iter()
            .flatten()
            .map(|k| {
                let category = k.category.clone().unwrap_or_else(|| "-".into());
                (k.id.clone(), k.title.clone(), category)
            })
            .collect(),
        PinKind::Agent => store
            .agents
            .iter()
            .flatten()
            .map(|a| {
                let email = a.email.clone().unwrap_or_else(|| "-".into());
                (a.document_id.clone(), a.display_name(), email)
            })
            .collect(),
    }
}

const fn detail_header(kind: PinKind) -> &'static str {
    match kind {
        PinKind::Ticket => "Status / Assignee",
        PinKind::Conversation => "Channel",
        PinKind::KnowledgeBase => "Category",
        PinKind::Agent => "Email",
    }
}

/// Formats pinned items of the given kinds as tables, one per kind.
pub fn format_pins_table(store: &PinnedStore, kinds: &[PinKind]) -> String {
    let mut out = String::new();

    for &kind in kinds {
        let rows = rows_of(store, kind);
        out.push_str(&format!("{} ({})\n", kind.plural().bold(), rows.len()));

        if rows.is_empty() {
            out.push_str(&format!("  {}\n\n", "nothing pinned".dimmed()));
            continue;
        }

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec![kind.identity_field(), "Title", detail_header(kind)]);
        for (key, label, detail) in rows {
            table.add_row(vec![key, truncate(&label, 40), truncate(&detail, 30)]);
        }

        out.push_str(&table.to_string());
        out.push_str("\n\n");
    }

    out.trim_end().to_string()
}

/// Formats pinned items of the given kinds as Markdown.
pub fn format_pins_markdown(store: &PinnedStore, kinds: &[PinKind]) -> String {
    let mut out = String::new();

    for &kind in kinds {
        out.push_str(&format!("## {}\n\n", kind.plural()));

        let rows = rows_of(store, kind);
        if rows.is_empty() {
            out.push_str("_Nothing pinned._\n\n");
            continue;
        }

        for (key, label, detail) in rows {
            out.push_str(&format!("- **{label}** (`{key}`) - {detail}\n"));
        }
        out.push('\n');
    }

    out
}

/// Formats the whole snapshot as JSON.
///
/// # Errors
/// Returns error if serialization fails.
pub fn format_pins_json(store: &PinnedStore) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(store)
}

/// Formats pin counts per kind for display.
pub fn format_summary(store: &PinnedStore) -> String {
    let mut out = format!("{}", "📌 Pinned items".bold());
    for kind in PinKind::ALL {
        out.push_str(&format!(
            "\n  {}: {}",
            kind.plural(),
            store.len_of(kind).to_string().cyan()
        ));
    }
    out.push_str(&format!("\n  Total: {}", store.total().to_string().green()));
    out
}

/// Formats a ticket listing.
pub fn format_tickets_table(tickets: &[&Ticket]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["ID", "Status", "Priority", "Assignee", "Title"]);

    for ticket in tickets {
        let assignee = ticket
            .assigned_to
            .as_ref()
            .map_or_else(|| "-".to_string(), |a| a.display_name());

        table.add_row(vec![
            ticket.id.clone(),
            ticket.status.to_string(),
            ticket.priority.clone().unwrap_or_else(|| "-".into()),
            truncate(&assignee, 20),
            truncate(&ticket.title, 40),
        ]);
    }

    table.to_string()
}

/// Formats tickets-per-agent counts.
pub fn format_workload(workload: &BTreeMap<String, usize>) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Agent", "Tickets"]);

    for (agent, count) in workload {
        table.add_row(vec![agent.clone(), count.to_string()]);
    }

    table.to_string()
}

/// Truncates a string to max characters with ellipsis.
fn truncate(s: &str, max_len: usize) -> String {
    let s = s.lines().next().unwrap_or(s);
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}
