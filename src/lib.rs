//! Helpdesk Pins - a persisted pinned-items store for helpdesk records.
//!
//! Tickets, conversations, knowledge-base articles and agents can be pinned
//! for quick access. [`application::PinBoard`] owns the current snapshot,
//! writes every change through a [`infrastructure::KeyValueStore`] and
//! publishes new snapshots to subscribers.

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
