//! Application layer - use cases and orchestration.
//!
//! This layer holds the pinned store itself, its persisted encoding,
//! the ticket helpers and output formatting.

pub mod codec;
pub mod formatter;
pub mod pin_board;
pub mod tickets;

pub use codec::{decode_entity, decode_snapshot, decode_tickets, encode_snapshot};
pub use formatter::{
    format_pins_json, format_pins_markdown, format_pins_table, format_summary,
    format_tickets_table, format_workload, OutputFormat,
};
pub use pin_board::{PinBoard, Snapshot};
pub use tickets::{
    search_agents, ticket_count, tickets_for_agent, tickets_with_status, unassigned_tickets,
    workload_by_agent,
};
