//! JSON encoding of pinned snapshots and records.
//!
//! The persisted blob is one JSON object with the four collections as
//! top-level keys; unset collections are written as `null`.

use crate::domain::{
    Agent, AppError, Conversation, KnowledgeBase, PinKind, PinnedEntity, PinnedStore, Result,
    Ticket,
};

/// Serialize a snapshot to its persisted form.
///
/// # Errors
/// Returns error if serialization fails.
pub fn encode_snapshot(store: &PinnedStore) -> Result<String> {
    serde_json::to_string(store).map_err(AppError::json_parse)
}

/// Parse a persisted snapshot.
///
/// # Errors
/// Returns `AppError::JsonParse` if `raw` is not a valid snapshot.
pub fn decode_snapshot(raw: &str) -> Result<PinnedStore> {
    serde_json::from_str(raw).map_err(AppError::json_parse)
}

/// Parse a single record of the given kind.
///
/// # Errors
/// Returns `AppError::JsonParse` if `raw` does not describe a `kind` record,
/// or `AppError::InvalidData` if its identity key is empty.
pub fn decode_entity(kind: PinKind, raw: &str) -> Result<PinnedEntity> {
    let entity = match kind {
        PinKind::Ticket => PinnedEntity::Ticket(parse::<Ticket>(raw)?),
        PinKind::Conversation => PinnedEntity::Conversation(parse::<Conversation>(raw)?),
        PinKind::KnowledgeBase => PinnedEntity::KnowledgeBase(parse::<KnowledgeBase>(raw)?),
        PinKind::Agent => PinnedEntity::Agent(parse::<Agent>(raw)?),
    };

    if entity.identity_key().trim().is_empty() {
        return Err(AppError::InvalidData {
            message: format!("{kind} record has an empty '{}'", kind.identity_field()),
        });
    }

    Ok(entity)
}

/// Parse a JSON array of tickets, as returned by the tickets endpoint.
///
/// # Errors
/// Returns `AppError::JsonParse` if `raw` is not an array of tickets.
pub fn decode_tickets(raw: &str) -> Result<Vec<Ticket>> {
    parse(raw)
}

fn parse<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(AppError::json_parse)
}
