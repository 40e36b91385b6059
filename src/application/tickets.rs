//! Ticket and agent filtering helpers.

use std::collections::BTreeMap;

use crate::domain::{Agent, Ticket, TicketStatus};

/// Number of tickets assigned to the agent whose document id is `agent_id`.
///
/// `None` counts as no tickets.
#[must_use]
pub fn ticket_count(tickets: Option<&[Ticket]>, agent_id: &str) -> usize {
    tickets.map_or(0, |tickets| {
        tickets
            .iter()
            .filter(|t| t.assignee_id() == Some(agent_id))
            .count()
    })
}

/// Tickets assigned to `agent_id`, in input order.
///
/// The filters take any iterator of borrowed tickets so they can be chained.
pub fn tickets_for_agent<'a>(
    tickets: impl IntoIterator<Item = &'a Ticket>,
    agent_id: &str,
) -> Vec<&'a Ticket> {
    tickets
        .into_iter()
        .filter(|t| t.assignee_id() == Some(agent_id))
        .collect()
}

/// Tickets with the given status, in input order.
pub fn tickets_with_status<'a>(
    tickets: impl IntoIterator<Item = &'a Ticket>,
    status: &TicketStatus,
) -> Vec<&'a Ticket> {
    tickets
        .into_iter()
        .filter(|t| &t.status == status)
        .collect()
}

/// Tickets nobody is assigned to.
pub fn unassigned_tickets<'a>(tickets: impl IntoIterator<Item = &'a Ticket>) -> Vec<&'a Ticket> {
    tickets
        .into_iter()
        .filter(|t| t.assigned_to.is_none())
        .collect()
}

/// Count of tickets per assignee document id. Unassigned tickets are skipped.
#[must_use]
pub fn workload_by_agent(tickets: &[Ticket]) -> BTreeMap<String, usize> {
    let mut workload = BTreeMap::new();
    for id in tickets.iter().filter_map(Ticket::assignee_id) {
        *workload.entry(id.to_string()).or_insert(0) += 1;
    }
    workload
}

/// Agents whose name or email contains `query`, ignoring case.
///
/// An empty query matches every agent.
#[must_use]
pub fn search_agents<'a>(agents: &'a [Agent], query: &str) -> Vec<&'a Agent> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return agents.iter().collect();
    }

    agents
        .iter()
        .filter(|a| {
            a.display_name().to_lowercase().contains(&needle)
                || a
                    .email
                    .as_deref()
                    .is_some_and(|e| e.to_lowercase().contains(&needle))
        })
        .collect()
}
