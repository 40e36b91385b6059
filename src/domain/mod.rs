//! Domain layer - core records, snapshot transitions and error types.
//!
//! This layer contains pure domain models without any I/O.

pub mod error;
pub mod models;
pub mod pinned;
pub mod settings;

pub use error::{AppError, Result};
pub use models::{
    Agent, Conversation, KnowledgeBase, Organisation, PinKind, PinnedEntity, Ticket, TicketStatus,
};
pub use pinned::{PinPolicy, Pinnable, PinnedStore, PINNED_STORE_KEY};
pub use settings::{AppConfig, StorageBackend};
