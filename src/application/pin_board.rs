//! The session-wide pinned items store.
//!
//! `PinBoard` owns the current snapshot and the persistence adapter. Each
//! mutation builds a new `PinnedStore`, writes it to the adapter and then
//! publishes it to subscribers. Persistence is best effort: a failed write
//! is logged and the in-memory snapshot stays authoritative. Reads never
//! write.

use std::sync::Arc;

use tokio::sync::watch;

use crate::domain::{
    PinKind, PinPolicy, Pinnable, PinnedEntity, PinnedStore, Result, PINNED_STORE_KEY,
};
use crate::infrastructure::KeyValueStore;

use super::codec::{decode_entity, decode_snapshot, encode_snapshot};

/// Shared, immutable view of one snapshot.
pub type Snapshot = Arc<PinnedStore>;

/// Owner of the pinned snapshot for one application session.
pub struct PinBoard {
    storage: Box<dyn KeyValueStore>,
    policy: PinPolicy,
    tx: watch::Sender<Snapshot>,
    /// Set when the latest snapshot may not be in storage.
    dirty: bool,
}

impl PinBoard {
    /// Hydrate a board from `storage`.
    ///
    /// A missing, unreadable or malformed blob yields the empty store; this
    /// never fails.
    pub fn open(storage: Box<dyn KeyValueStore>, policy: PinPolicy) -> Self {
        let initial = load_snapshot(storage.as_ref());
        tracing::debug!(
            tickets = initial.len_of(PinKind::Ticket),
            conversations = initial.len_of(PinKind::Conversation),
            knowledge_bases = initial.len_of(PinKind::KnowledgeBase),
            agents = initial.len_of(PinKind::Agent),
            "Pinned store hydrated"
        );

        let (tx, _rx) = watch::channel(Arc::new(initial));
        Self {
            storage,
            policy,
            tx,
            dirty: false,
        }
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.tx.borrow().clone()
    }

    /// Receiver that observes every snapshot published after this call.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    /// Policy applied to pins.
    #[must_use]
    pub const fn policy(&self) -> PinPolicy {
        self.policy
    }

    /// Pin a record.
    pub fn pin<T: Pinnable>(&mut self, entity: T) {
        self.pin_entity(entity.into_entity());
    }

    /// Unpin every record of type `T` sharing `entity`'s identity key.
    pub fn unpin<T: Pinnable>(&mut self, entity: &T) {
        self.unpin_key(T::KIND, entity.identity_key());
    }

    /// Pin a kind-tagged record.
    pub fn pin_entity(&mut self, entity: PinnedEntity) {
        tracing::info!(kind = %entity.kind(), key = entity.identity_key(), "Pinning");
        let next = self.snapshot().with_pinned_entity(entity, self.policy);
        self.commit(next);
    }

    /// Unpin a kind-tagged record.
    pub fn unpin_entity(&mut self, entity: &PinnedEntity) {
        self.unpin_key(entity.kind(), entity.identity_key());
    }

    /// Unpin by kind and identity key.
    pub fn unpin_key(&mut self, kind: PinKind, key: &str) {
        tracing::info!(%kind, key, "Unpinning");
        let next = self.snapshot().without_key(kind, key);
        self.commit(next);
    }

    /// Pin a record given as a kind name and its JSON.
    ///
    /// # Errors
    /// Returns `AppError::UnknownKind` for a kind outside the four pinnable
    /// kinds and a parse error for an invalid record. The store is unchanged
    /// on error.
    pub fn pin_json(&mut self, kind: &str, raw: &str) -> Result<()> {
        let kind: PinKind = kind.parse()?;
        let entity = decode_entity(kind, raw)?;
        self.pin_entity(entity);
        Ok(())
    }

    /// Reset every collection to unset.
    pub fn clear(&mut self) {
        tracing::info!("Clearing all pins");
        self.commit(PinnedStore::empty());
    }

    /// Write the current snapshot, surfacing any failure.
    ///
    /// # Errors
    /// Returns error if encoding or the storage write fails.
    pub fn flush(&mut self) -> Result<()> {
        let snapshot = self.snapshot();
        let encoded = encode_snapshot(&snapshot)?;
        self.storage.set(PINNED_STORE_KEY, &encoded)?;
        self.dirty = false;
        Ok(())
    }

    /// Whether a mutation since open has not reached storage.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Release the board, flushing first if a write was missed.
    ///
    /// A board that was only read leaves storage untouched.
    pub fn shutdown(mut self) {
        if !self.dirty {
            return;
        }
        if let Err(e) = self.flush() {
            tracing::warn!("Failed to flush pinned store on shutdown: {}", e);
        }
    }

    fn commit(&mut self, next: PinnedStore) {
        let next = Arc::new(next);

        match encode_snapshot(&next) {
            Ok(encoded) => match self.storage.set(PINNED_STORE_KEY, &encoded) {
                Ok(()) => self.dirty = false,
                Err(e) => {
                    tracing::warn!("Failed to persist pinned store: {}", e);
                    self.dirty = true;
                }
            },
            Err(e) => {
                tracing::warn!("Failed to encode pinned store: {}", e);
                self.dirty = true;
            }
        }

        self.tx.send_replace(next);
    }
}

impl std::fmt::Debug for PinBoard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinBoard")
            .field("snapshot", &*self.tx.borrow())
            .field("policy", &self.policy)
            .field("dirty", &self.dirty)
            .field("subscriber_count", &self.tx.receiver_count())
            .finish_non_exhaustive()
    }
}

fn load_snapshot(storage: &dyn KeyValueStore) -> PinnedStore {
    let raw = match storage.get(PINNED_STORE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return PinnedStore::empty(),
        Err(e) => {
            tracing::warn!("Failed to read pinned store, starting empty: {}", e);
            return PinnedStore::empty();
        }
    };

    decode_snapshot(&raw).unwrap_or_else(|e| {
        tracing::warn!("Discarding malformed pinned store: {}", e);
        PinnedStore::empty()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Agent, AppError, Conversation, KnowledgeBase, Ticket};
    use crate::infrastructure::{LocalStorage, MemoryStore};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Store whose writes are visible to the test after the board owns it.
    #[derive(Clone, Default)]
    struct SharedStore(Rc<RefCell<MemoryStore>>);

    impl KeyValueStore for SharedStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.0.borrow().get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<()> {
            self.0.borrow_mut().set(key, value)
        }
    }

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(AppError::Config {
                message: "storage unavailable".into(),
            })
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(AppError::Config {
                message: "quota exceeded".into(),
            })
        }
    }

    fn board() -> PinBoard {
        PinBoard::open(Box::new(MemoryStore::new()), PinPolicy::default())
    }

    #[test]
    fn test_open_without_blob_is_unset() {
        let board = board();
        assert_eq!(*board.snapshot(), PinnedStore::empty());
    }

    #[test]
    fn test_open_with_malformed_blob_recovers() {
        let storage = MemoryStore::with_entry(PINNED_STORE_KEY, "{\"tickets\": [oops");
        let board = PinBoard::open(Box::new(storage), PinPolicy::default());

        let snapshot = board.snapshot();
        assert_eq!(snapshot.tickets, None);
        assert_eq!(snapshot.conversations, None);
        assert_eq!(snapshot.knowledge_bases, None);
        assert_eq!(snapshot.agents, None);
    }

    #[test]
    fn test_open_with_unreadable_storage_recovers() {
        let board = PinBoard::open(Box::new(FailingStore), PinPolicy::default());
        assert_eq!(board.snapshot().total(), 0);
    }

    #[test]
    fn test_pin_then_unpin() {
        let mut board = board();
        let t1 = Ticket::new("a", "Email bouncing");
        let t2 = Ticket::new("b", "Slow dashboard");

        board.pin(t1.clone());
        assert_eq!(board.snapshot().tickets, Some(vec![t1.clone()]));

        board.pin(t2.clone());
        board.unpin(&t1);
        assert_eq!(board.snapshot().tickets, Some(vec![t2]));
    }

    #[test]
    fn test_pin_ticket_leaves_other_kinds() {
        let mut board = board();
        board.pin(Agent::new("agent-1"));
        let before = board.snapshot();

        board.pin(Ticket::new("a", "Refund request"));
        let after = board.snapshot();

        assert_eq!(after.conversations, before.conversations);
        assert_eq!(after.knowledge_bases, before.knowledge_bases);
        assert_eq!(after.agents, before.agents);
    }

    #[test]
    fn test_unpin_unset_collection() {
        let mut board = board();
        board.unpin(&Conversation::new("c1", "Hello"));
        assert_eq!(board.snapshot().conversations, None);
    }

    #[test]
    fn test_mutations_are_persisted() {
        let shared = SharedStore::default();
        let mut board = PinBoard::open(Box::new(shared.clone()), PinPolicy::default());

        board.pin(KnowledgeBase::new("kb1", "Password reset"));
        let raw = shared.get(PINNED_STORE_KEY).unwrap().unwrap();
        assert_eq!(decode_snapshot(&raw).unwrap(), *board.snapshot());

        board.unpin_key(PinKind::KnowledgeBase, "kb1");
        let raw = shared.get(PINNED_STORE_KEY).unwrap().unwrap();
        assert_eq!(decode_snapshot(&raw).unwrap().knowledge_bases, Some(Vec::new()));
    }

    #[test]
    fn test_state_survives_new_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pins.db");

        let mut first = PinBoard::open(
            Box::new(LocalStorage::open(&path).unwrap()),
            PinPolicy::default(),
        );
        first.pin(Agent::new("agent-7"));
        first.pin(Ticket::new("t9", "Broken link"));
        let expected = first.snapshot();
        first.shutdown();

        let second = PinBoard::open(
            Box::new(LocalStorage::open(&path).unwrap()),
            PinPolicy::default(),
        );
        assert_eq!(second.snapshot(), expected);
    }

    #[test]
    fn test_write_failure_still_updates_memory() {
        let mut board = PinBoard::open(Box::new(FailingStore), PinPolicy::default());
        board.pin(Ticket::new("a", "Disk full"));

        assert_eq!(board.snapshot().len_of(PinKind::Ticket), 1);
        assert!(board.is_dirty());
        assert!(board.flush().is_err());
    }

    #[test]
    fn test_pin_json() {
        let mut board = board();
        board
            .pin_json("knowledge-base", r#"{"id": 3, "title": "VPN guide"}"#)
            .unwrap();
        assert!(board.snapshot().contains::<KnowledgeBase>("3"));
    }

    #[test]
    fn test_pin_json_accepts_nulls_and_string_agent_ids() {
        let mut board = board();
        board
            .pin_json("ticket", r#"{"id": 1, "title": null, "status": null}"#)
            .unwrap();
        board
            .pin_json("agent", r#"{"id": "5", "documentId": "a1", "firstName": null}"#)
            .unwrap();
        board
            .pin_json("ticket", r#"{"id": 2, "assignedTo": {"id": "9", "documentId": "a1"}}"#)
            .unwrap();

        let snapshot = board.snapshot();
        assert_eq!(snapshot.len_of(PinKind::Ticket), 2);
        assert!(snapshot.contains::<Agent>("a1"));
        assert_eq!(crate::application::ticket_count(snapshot.tickets.as_deref(), "a1"), 1);
    }

    #[test]
    fn test_read_only_session_leaves_storage_untouched() {
        let malformed = "{\"tickets\": [oops";
        let shared = SharedStore(Rc::new(RefCell::new(MemoryStore::with_entry(
            PINNED_STORE_KEY,
            malformed,
        ))));

        let board = PinBoard::open(Box::new(shared.clone()), PinPolicy::default());
        assert_eq!(board.snapshot().total(), 0);
        assert!(!board.is_dirty());
        board.shutdown();

        assert_eq!(shared.get(PINNED_STORE_KEY).unwrap().as_deref(), Some(malformed));
    }

    #[test]
    fn test_shutdown_retries_missed_write() {
        let shared = SharedStore::default();
        let mut board = PinBoard::open(Box::new(shared.clone()), PinPolicy::default());
        board.pin(Ticket::new("a", "Queued"));
        assert!(!board.is_dirty());

        // Simulate a missed write by dropping what was stored.
        *shared.0.borrow_mut() = MemoryStore::new();
        board.dirty = true;
        board.shutdown();

        let raw = shared.get(PINNED_STORE_KEY).unwrap().unwrap();
        assert!(decode_snapshot(&raw).unwrap().contains::<Ticket>("a"));
    }

    #[test]
    fn test_pin_json_unknown_kind_fails_fast() {
        let mut board = board();
        let err = board.pin_json("organisation", r#"{"id": "o1"}"#).unwrap_err();

        assert!(matches!(err, AppError::UnknownKind { .. }));
        assert_eq!(*board.snapshot(), PinnedStore::empty());
    }

    #[test]
    fn test_repin_dedupes_by_default() {
        let mut board = board();
        board.pin(Agent::new("x"));
        board.pin(Agent::new("y"));
        board.pin(Agent::new("x"));

        let keys: Vec<_> = board
            .snapshot()
            .agents
            .clone()
            .unwrap()
            .into_iter()
            .map(|a| a.document_id)
            .collect();
        assert_eq!(keys, vec!["y", "x"]);
    }

    #[test]
    fn test_repin_without_dedupe_appends() {
        let mut board = PinBoard::open(Box::new(MemoryStore::new()), PinPolicy { dedupe: false });
        board.pin(Agent::new("x"));
        board.pin(Agent::new("x"));
        assert_eq!(board.snapshot().len_of(PinKind::Agent), 2);

        board.unpin_entity(&PinnedEntity::Agent(Agent::new("x")));
        assert_eq!(board.snapshot().agents, Some(Vec::new()));
    }

    #[test]
    fn test_old_snapshots_are_immutable() {
        let mut board = board();
        board.pin(Ticket::new("a", "One"));
        let retained = board.snapshot();

        board.pin(Ticket::new("b", "Two"));
        board.clear();

        assert_eq!(retained.len_of(PinKind::Ticket), 1);
        assert_eq!(*board.snapshot(), PinnedStore::empty());
    }

    #[test]
    fn test_subscriber_sees_latest_snapshot() {
        let mut board = board();
        let mut rx = board.subscribe();
        assert!(!rx.has_changed().unwrap());

        board.pin(Conversation::new("c1", "Shipping delay"));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len_of(PinKind::Conversation), 1);

        board.unpin_key(PinKind::Conversation, "c1");
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len_of(PinKind::Conversation), 0);
    }

    #[tokio::test]
    async fn test_subscriber_wakes_on_change() {
        let mut board = board();
        let mut rx = board.subscribe();

        board.pin(Agent::new("agent-3"));
        rx.changed().await.unwrap();

        assert!(rx.borrow().contains::<Agent>("agent-3"));
    }
}
