//! The pinned-items snapshot and the pure transitions between snapshots.
//!
//! A `PinnedStore` is a value: every pin or unpin returns a new store and
//! leaves the receiver untouched.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::models::{Agent, Conversation, KnowledgeBase, PinKind, PinnedEntity, Ticket};

/// Storage key of the serialized snapshot.
pub const PINNED_STORE_KEY: &str = "pinned-store";

/// How pins treat an identity key that is already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinPolicy {
    /// Replace an existing entry with the same identity key instead of
    /// appending a duplicate.
    pub dedupe: bool,
}

impl Default for PinPolicy {
    fn default() -> Self {
        Self { dedupe: true }
    }
}

/// Full state of the pinned items at one point in time.
///
/// `None` collections have never been populated; they count as empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinnedStore {
    #[serde(default)]
    pub tickets: Option<Vec<Ticket>>,
    #[serde(default)]
    pub conversations: Option<Vec<Conversation>>,
    #[serde(default)]
    pub knowledge_bases: Option<Vec<KnowledgeBase>>,
    #[serde(default)]
    pub agents: Option<Vec<Agent>>,
}

/// A record type that has its own collection in `PinnedStore`.
pub trait Pinnable: Clone + Serialize + DeserializeOwned {
    /// Kind tag of this record type.
    const KIND: PinKind;

    /// Value that identifies the underlying record.
    fn identity_key(&self) -> &str;

    /// The collection holding records of this type.
    fn collection(store: &PinnedStore) -> &Option<Vec<Self>>;

    /// Mutable access to the collection holding records of this type.
    fn collection_mut(store: &mut PinnedStore) -> &mut Option<Vec<Self>>;

    /// Wrap into the kind-tagged enum.
    fn into_entity(self) -> PinnedEntity;
}

impl Pinnable for Ticket {
    const KIND: PinKind = PinKind::Ticket;

    fn identity_key(&self) -> &str {
        &self.id
    }

    fn collection(store: &PinnedStore) -> &Option<Vec<Self>> {
        &store.tickets
    }

    fn collection_mut(store: &mut PinnedStore) -> &mut Option<Vec<Self>> {
        &mut store.tickets
    }

    fn into_entity(self) -> PinnedEntity {
        PinnedEntity::Ticket(self)
    }
}

impl Pinnable for Conversation {
    const KIND: PinKind = PinKind::Conversation;

    fn identity_key(&self) -> &str {
        &self.id
    }

    fn collection(store: &PinnedStore) -> &Option<Vec<Self>> {
        &store.conversations
    }

    fn collection_mut(store: &mut PinnedStore) -> &mut Option<Vec<Self>> {
        &mut store.conversations
    }

    fn into_entity(self) -> PinnedEntity {
        PinnedEntity::Conversation(self)
    }
}

impl Pinnable for KnowledgeBase {
    const KIND: PinKind = PinKind::KnowledgeBase;

    fn identity_key(&self) -> &str {
        &self.id
    }

    fn collection(store: &PinnedStore) -> &Option<Vec<Self>> {
        &store.knowledge_bases
    }

    fn collection_mut(store: &mut PinnedStore) -> &mut Option<Vec<Self>> {
        &mut store.knowledge_bases
    }

    fn into_entity(self) -> PinnedEntity {
        PinnedEntity::KnowledgeBase(self)
    }
}

impl Pinnable for Agent {
    const KIND: PinKind = PinKind::Agent;

    fn identity_key(&self) -> &str {
        &self.document_id
    }

    fn collection(store: &PinnedStore) -> &Option<Vec<Self>> {
        &store.agents
    }

    fn collection_mut(store: &mut PinnedStore) -> &mut Option<Vec<Self>> {
        &mut store.agents
    }

    fn into_entity(self) -> PinnedEntity {
        PinnedEntity::Agent(self)
    }
}

impl PinnedStore {
    /// Store with all four collections unset.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            tickets: None,
            conversations: None,
            knowledge_bases: None,
            agents: None,
        }
    }

    /// Returns a new store with `entity` appended to its collection.
    #[must_use]
    pub fn with_pinned<T: Pinnable>(&self, entity: T, policy: PinPolicy) -> Self {
        let mut next = self.clone();
        let items = T::collection_mut(&mut next).get_or_insert_with(Vec::new);
        if policy.dedupe {
            items.retain(|item| item.identity_key() != entity.identity_key());
        }
        items.push(entity);
        next
    }

    /// Returns a new store without any `T` whose identity key equals `key`.
    ///
    /// An unset collection stays unset.
    #[must_use]
    pub fn without<T: Pinnable>(&self, key: &str) -> Self {
        let mut next = self.clone();
        if let Some(items) = T::collection_mut(&mut next) {
            items.retain(|item| item.identity_key() != key);
        }
        next
    }

    /// `with_pinned` for a kind-tagged record.
    #[must_use]
    pub fn with_pinned_entity(&self, entity: PinnedEntity, policy: PinPolicy) -> Self {
        match entity {
            PinnedEntity::Ticket(t) => self.with_pinned(t, policy),
            PinnedEntity::Conversation(c) => self.with_pinned(c, policy),
            PinnedEntity::KnowledgeBase(k) => self.with_pinned(k, policy),
            PinnedEntity::Agent(a) => self.with_pinned(a, policy),
        }
    }

    /// `without` dispatched on a runtime kind.
    #[must_use]
    pub fn without_key(&self, kind: PinKind, key: &str) -> Self {
        match kind {
            PinKind::Ticket => self.without::<Ticket>(key),
            PinKind::Conversation => self.without::<Conversation>(key),
            PinKind::KnowledgeBase => self.without::<KnowledgeBase>(key),
            PinKind::Agent => self.without::<Agent>(key),
        }
    }

    /// Whether a record of type `T` with `key` is pinned.
    #[must_use]
    pub fn contains<T: Pinnable>(&self, key: &str) -> bool {
        T::collection(self)
            .as_deref()
            .is_some_and(|items| items.iter().any(|item| item.identity_key() == key))
    }

    /// Number of pinned records of `kind`; unset counts as zero.
    #[must_use]
    pub fn len_of(&self, kind: PinKind) -> usize {
        match kind {
            PinKind::Ticket => self.tickets.as_ref().map_or(0, Vec::len),
            PinKind::Conversation => self.conversations.as_ref().map_or(0, Vec::len),
            PinKind::KnowledgeBase => self.knowledge_bases.as_ref().map_or(0, Vec::len),
            PinKind::Agent => self.agents.as_ref().map_or(0, Vec::len),
        }
    }

    /// Number of pinned records across all kinds.
    #[must_use]
    pub fn total(&self) -> usize {
        PinKind::ALL.iter().map(|kind| self.len_of(*kind)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tickets() -> PinnedStore {
        PinnedStore::empty()
            .with_pinned(Ticket::new("a", "First"), PinPolicy::default())
            .with_pinned(Ticket::new("b", "Second"), PinPolicy::default())
    }

    #[test]
    fn test_pin_appends_to_empty() {
        let t1 = Ticket::new("a", "VPN down");
        let store = PinnedStore::empty().with_pinned(t1.clone(), PinPolicy::default());

        assert_eq!(store.tickets, Some(vec![t1]));
    }

    #[test]
    fn test_pin_leaves_other_collections_alone() {
        let before = PinnedStore {
            conversations: Some(vec![Conversation::new("c1", "Refund")]),
            ..PinnedStore::empty()
        };
        let after = before.with_pinned(Ticket::new("a", "VPN down"), PinPolicy::default());

        assert_eq!(after.conversations, before.conversations);
        assert_eq!(after.knowledge_bases, None);
        assert_eq!(after.agents, None);
    }

    #[test]
    fn test_unpin_removes_by_identity() {
        let store = two_tickets();
        // Only the id matters; the title differs from the pinned record.
        let store = store.without::<Ticket>("a");

        let ids: Vec<_> = store.tickets.unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[test]
    fn test_unpin_unset_collection_is_noop() {
        let store = PinnedStore::empty().without::<Conversation>("anything");
        assert_eq!(store.conversations, None);
        assert_eq!(store, PinnedStore::empty());
    }

    #[test]
    fn test_unpin_removes_every_duplicate() {
        let naive = PinPolicy { dedupe: false };
        let store = PinnedStore::empty()
            .with_pinned(Agent::new("x"), naive)
            .with_pinned(Agent::new("y"), naive)
            .with_pinned(Agent::new("x"), naive);
        assert_eq!(store.len_of(PinKind::Agent), 3);

        let store = store.without_key(PinKind::Agent, "x");
        assert_eq!(store.agents, Some(vec![Agent::new("y")]));
    }

    #[test]
    fn test_dedupe_moves_repin_to_end() {
        let mut refreshed = Ticket::new("a", "First (edited)");
        refreshed.priority = Some("high".into());

        let store = two_tickets().with_pinned(refreshed.clone(), PinPolicy::default());
        let tickets = store.tickets.unwrap();

        assert_eq!(tickets.len(), 2);
        assert_eq!(tickets[0].id, "b");
        assert_eq!(tickets[1], refreshed);
    }

    #[test]
    fn test_previous_snapshot_untouched() {
        let before = two_tickets();
        let copy = before.clone();
        let _after = before
            .without::<Ticket>("a")
            .with_pinned(Agent::new("z"), PinPolicy::default());

        assert_eq!(before, copy);
    }

    #[test]
    fn test_counts() {
        let store = two_tickets().with_pinned_entity(
            PinnedEntity::KnowledgeBase(KnowledgeBase::new("kb1", "Billing FAQ")),
            PinPolicy::default(),
        );

        assert_eq!(store.len_of(PinKind::Ticket), 2);
        assert_eq!(store.len_of(PinKind::KnowledgeBase), 1);
        assert_eq!(store.len_of(PinKind::Agent), 0);
        assert_eq!(store.total(), 3);
        assert!(store.contains::<KnowledgeBase>("kb1"));
        assert!(!store.contains::<Ticket>("kb1"));
    }
}
