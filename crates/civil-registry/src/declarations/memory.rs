use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use super::domain::{DeclarationId, DocumentFields};
use super::store::{
    decode_snapshot, DeclarationStore, Snapshot, SnapshotSender, StoreError, Subscription,
    SubscriptionError,
};

/// Process-local document store that pushes a full snapshot to every live query after
/// each mutation. Documents keep their insertion order.
#[derive(Default, Clone)]
pub struct InMemoryDeclarationStore {
    state: Arc<Mutex<StoreState>>,
}

#[derive(Default)]
struct StoreState {
    documents: Vec<(DeclarationId, DocumentFields)>,
    subscribers: BTreeMap<u64, SnapshotSender>,
    next_subscriber: u64,
}

impl StoreState {
    fn snapshot(&self) -> Snapshot {
        decode_snapshot(self.documents.iter().cloned())
    }

    fn position(&self, id: &DeclarationId) -> Option<usize> {
        self.documents.iter().position(|(stored, _)| stored == id)
    }

    fn broadcast(&mut self) {
        let snapshot = self.snapshot();
        self.subscribers
            .retain(|_, sender| sender.send(Ok(snapshot.clone())).is_ok());
    }
}

impl InMemoryDeclarationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with documents under fixed identities.
    pub fn with_documents<I>(documents: I) -> Self
    where
        I: IntoIterator<Item = (DeclarationId, DocumentFields)>,
    {
        let store = Self::default();
        store.lock().documents.extend(documents);
        store
    }

    pub fn len(&self) -> usize {
        self.lock().documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw stored fields for `id`.
    pub fn document(&self, id: &DeclarationId) -> Option<DocumentFields> {
        let state = self.lock();
        state
            .position(id)
            .map(|index| state.documents[index].1.clone())
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Report a failure to every open live query and close them.
    pub fn fail_subscriptions(&self, error: SubscriptionError) {
        let mut state = self.lock();
        for sender in state.subscribers.values() {
            let _ = sender.send(Err(error.clone()));
        }
        state.subscribers.clear();
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl DeclarationStore for InMemoryDeclarationStore {
    async fn insert(&self, fields: DocumentFields) -> Result<DeclarationId, StoreError> {
        let id = DeclarationId(Uuid::new_v4().simple().to_string());
        let mut state = self.lock();
        if state.position(&id).is_some() {
            return Err(StoreError::Conflict);
        }
        state.documents.push((id.clone(), fields));
        state.broadcast();
        info!(declaration_id = %id, "declaration inserted");
        Ok(id)
    }

    async fn update(&self, id: &DeclarationId, fields: DocumentFields) -> Result<(), StoreError> {
        let mut state = self.lock();
        let index = state
            .position(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        state.documents[index].1 = fields;
        state.broadcast();
        info!(declaration_id = %id, "declaration updated");
        Ok(())
    }

    async fn delete(&self, id: &DeclarationId) -> Result<(), StoreError> {
        let mut state = self.lock();
        let index = state
            .position(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        state.documents.remove(index);
        state.broadcast();
        info!(declaration_id = %id, "declaration deleted");
        Ok(())
    }

    fn subscribe(&self) -> Subscription {
        let (sender, events) = mpsc::unbounded_channel();
        let key = {
            let mut state = self.lock();
            let key = state.next_subscriber;
            state.next_subscriber += 1;
            let _ = sender.send(Ok(state.snapshot()));
            state.subscribers.insert(key, sender);
            key
        };
        debug!(subscriber = key, "declaration subscription opened");

        let state = Arc::downgrade(&self.state);
        Subscription::new(events, move || {
            if let Some(state) = state.upgrade() {
                state
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .subscribers
                    .remove(&key);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declarations::domain::DeclarationDraft;

    fn draft(nom: &str) -> DocumentFields {
        let mut draft = DeclarationDraft::default();
        draft.nom = nom.to_string();
        draft.to_document("2024-01-06T08:00:00.000Z")
    }

    #[tokio::test]
    async fn subscription_receives_initial_and_follow_up_snapshots() {
        let store = InMemoryDeclarationStore::new();
        let mut subscription = store.subscribe();

        let initial = subscription.next().await.expect("initial").expect("ok");
        assert!(initial.is_empty());

        store.insert(draft("Rakoto")).await.expect("insert");
        let after_insert = subscription.next().await.expect("event").expect("ok");
        assert_eq!(after_insert.len(), 1);
        assert_eq!(after_insert[0].draft.nom, "Rakoto");
    }

    #[tokio::test]
    async fn snapshots_keep_insertion_order() {
        let store = InMemoryDeclarationStore::new();
        store.insert(draft("Zafy")).await.expect("insert");
        store.insert(draft("Andry")).await.expect("insert");

        let mut subscription = store.subscribe();
        let snapshot = subscription.next().await.expect("event").expect("ok");
        let names: Vec<&str> = snapshot.iter().map(|d| d.draft.nom.as_str()).collect();
        assert_eq!(names, vec!["Zafy", "Andry"]);
    }

    #[tokio::test]
    async fn dropping_subscription_unregisters_it() {
        let store = InMemoryDeclarationStore::new();
        let first = store.subscribe();
        let second = store.subscribe();
        assert_eq!(store.subscriber_count(), 2);

        first.cancel();
        assert_eq!(store.subscriber_count(), 1);
        drop(second);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn update_and_delete_require_existing_document() {
        let store = InMemoryDeclarationStore::new();
        let missing = DeclarationId("missing".to_string());

        assert_eq!(
            store.update(&missing, draft("x")).await,
            Err(StoreError::NotFound(missing.clone()))
        );
        assert_eq!(
            store.delete(&missing).await,
            Err(StoreError::NotFound(missing))
        );
    }

    #[tokio::test]
    async fn failed_subscriptions_report_error_then_close() {
        let store = InMemoryDeclarationStore::new();
        let mut subscription = store.subscribe();
        let _ = subscription.next().await;

        store.fail_subscriptions(SubscriptionError::PermissionDenied);
        assert_eq!(
            subscription.next().await,
            Some(Err(SubscriptionError::PermissionDenied))
        );
        assert!(subscription.next().await.is_none());
    }
}
