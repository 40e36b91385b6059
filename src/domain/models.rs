//! Domain models for helpdesk records that can be pinned.
//!
//! The records mirror what the content API returns. Fields the UI does not
//! read are kept in `extra` so a pinned record survives persistence intact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::error::{AppError, Result};

/// The four kinds of record that can be pinned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PinKind {
    Ticket,
    Conversation,
    KnowledgeBase,
    Agent,
}

impl PinKind {
    /// All kinds in display order.
    pub const ALL: [Self; 4] = [
        Self::Ticket,
        Self::Conversation,
        Self::KnowledgeBase,
        Self::Agent,
    ];

    /// Name of the identity field for this kind.
    #[must_use]
    pub const fn identity_field(self) -> &'static str {
        match self {
            Self::Agent => "documentId",
            Self::Ticket | Self::Conversation | Self::KnowledgeBase => "id",
        }
    }

    /// Plural label used in listings.
    #[must_use]
    pub const fn plural(self) -> &'static str {
        match self {
            Self::Ticket => "Tickets",
            Self::Conversation => "Conversations",
            Self::KnowledgeBase => "Knowledge bases",
            Self::Agent => "Agents",
        }
    }
}

impl std::fmt::Display for PinKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ticket => write!(f, "ticket"),
            Self::Conversation => write!(f, "conversation"),
            Self::KnowledgeBase => write!(f, "knowledgeBase"),
            Self::Agent => write!(f, "agent"),
        }
    }
}

impl std::str::FromStr for PinKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ticket" | "tickets" => Ok(Self::Ticket),
            "conversation" | "conversations" => Ok(Self::Conversation),
            "knowledgebase" | "knowledgebases" | "knowledge-base" | "knowledge_base" | "kb" => {
                Ok(Self::KnowledgeBase)
            }
            "agent" | "agents" => Ok(Self::Agent),
            _ => Err(AppError::unknown_kind(s)),
        }
    }
}

/// Lifecycle status of a ticket.
///
/// Statuses the UI does not know about are carried verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Pending,
    Resolved,
    Closed,
    Other(String),
}

impl TicketStatus {
    /// Whether the ticket still needs work.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Open | Self::InProgress | Self::Pending)
    }
}

impl From<String> for TicketStatus {
    fn from(value: String) -> Self {
        match value.to_lowercase().replace(['-', ' '], "_").as_str() {
            "open" => Self::Open,
            "in_progress" | "inprogress" => Self::InProgress,
            "pending" => Self::Pending,
            "resolved" => Self::Resolved,
            "closed" => Self::Closed,
            _ => Self::Other(value),
        }
    }
}

impl From<TicketStatus> for String {
    fn from(status: TicketStatus) -> Self {
        match status {
            TicketStatus::Open => "open".into(),
            TicketStatus::InProgress => "in_progress".into(),
            TicketStatus::Pending => "pending".into(),
            TicketStatus::Resolved => "resolved".into(),
            TicketStatus::Closed => "closed".into(),
            TicketStatus::Other(s) => s,
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&String::from(self.clone()))
    }
}

/// Organisation an agent belongs to.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organisation {
    #[serde(default, deserialize_with = "null_as_default")]
    pub document_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A support agent. Identity key is `documentId`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    /// Row id from the content API (not the identity key).
    #[serde(
        default,
        deserialize_with = "optional_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    pub document_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organisation: Option<Organisation>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Agent {
    /// Create an agent with only its identity key set.
    #[must_use]
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            ..Self::default()
        }
    }

    /// First and last name joined, or the document id when both are empty.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.document_id.clone()
        } else {
            full.to_string()
        }
    }
}

/// A support ticket. Identity key is `id`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: TicketStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Agent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Ticket {
    /// Create a ticket with an id and title.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    /// Builder-style assignee.
    #[must_use]
    pub fn assigned_to(mut self, agent: Agent) -> Self {
        self.assigned_to = Some(agent);
        self
    }

    /// Builder-style status.
    #[must_use]
    pub fn with_status(mut self, status: TicketStatus) -> Self {
        self.status = status;
        self
    }

    /// Document id of the assignee, if any.
    #[must_use]
    pub fn assignee_id(&self) -> Option<&str> {
        self.assigned_to.as_ref().map(|a| a.document_id.as_str())
    }
}

/// An inbox conversation. Identity key is `id`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Conversation {
    /// Create a conversation with an id and subject.
    #[must_use]
    pub fn new(id: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            ..Self::default()
        }
    }
}

/// A knowledge-base article. Identity key is `id`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBase {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl KnowledgeBase {
    /// Create an article with an id and title.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Any pinnable record, tagged by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum PinnedEntity {
    Ticket(Ticket),
    Conversation(Conversation),
    KnowledgeBase(KnowledgeBase),
    Agent(Agent),
}

impl PinnedEntity {
    /// Kind of the wrapped record.
    #[must_use]
    pub const fn kind(&self) -> PinKind {
        match self {
            Self::Ticket(_) => PinKind::Ticket,
            Self::Conversation(_) => PinKind::Conversation,
            Self::KnowledgeBase(_) => PinKind::KnowledgeBase,
            Self::Agent(_) => PinKind::Agent,
        }
    }

    /// Identity key of the wrapped record.
    #[must_use]
    pub fn identity_key(&self) -> &str {
        match self {
            Self::Ticket(t) => &t.id,
            Self::Conversation(c) => &c.id,
            Self::KnowledgeBase(k) => &k.id,
            Self::Agent(a) => &a.document_id,
        }
    }
}

/// Content API ids arrive as numbers or strings; both are stored as strings.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

/// Like `string_or_number`, with `null` read as `None`.
fn optional_string_or_number<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

/// Unset fields arrive as `null`; read them as the field's default.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
