use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::domain::{Declaration, DeclarationId, DocumentFields};

/// Complete point-in-time copy of the `declarations` collection.
pub type Snapshot = Vec<Declaration>;

/// One emission of a live query.
pub type SnapshotEvent = Result<Snapshot, SubscriptionError>;

/// Sending half handed to store implementations for each subscriber.
pub type SnapshotSender = mpsc::UnboundedSender<SnapshotEvent>;

/// Collection-based document store with a push-based live query.
#[async_trait]
pub trait DeclarationStore: Send + Sync {
    /// Insert a new document and return the identity the store assigned to it.
    async fn insert(&self, fields: DocumentFields) -> Result<DeclarationId, StoreError>;
    /// Replace the document stored under `id`.
    async fn update(&self, id: &DeclarationId, fields: DocumentFields) -> Result<(), StoreError>;
    async fn delete(&self, id: &DeclarationId) -> Result<(), StoreError>;
    /// Open a live query over the whole collection. The first emission carries the
    /// current contents; each later one is a full replacement.
    fn subscribe(&self) -> Subscription;
}

/// Store mutation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("document already exists")]
    Conflict,
    #[error("document {0} not found")]
    NotFound(DeclarationId),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Failure reported by a live query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubscriptionError {
    #[error("permission denied")]
    PermissionDenied,
    #[error("{0}")]
    Unavailable(String),
}

/// Handle on a live query. Dropping or cancelling it unregisters the subscriber.
pub struct Subscription {
    events: mpsc::UnboundedReceiver<SnapshotEvent>,
    on_cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(
        events: mpsc::UnboundedReceiver<SnapshotEvent>,
        on_cancel: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            events,
            on_cancel: Some(Box::new(on_cancel)),
        }
    }

    /// Channel pair for a store that has nothing to release on cancel.
    pub fn channel() -> (SnapshotSender, Self) {
        let (sender, events) = mpsc::unbounded_channel();
        (
            sender,
            Self {
                events,
                on_cancel: None,
            },
        )
    }

    /// Wait for the next emission; `None` once the store closed the query.
    pub async fn next(&mut self) -> Option<SnapshotEvent> {
        self.events.recv().await
    }

    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        self.events.close();
        if let Some(on_cancel) = self.on_cancel.take() {
            debug!("declaration subscription cancelled");
            on_cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.on_cancel.is_some())
            .finish()
    }
}

/// Decode raw documents into a snapshot, skipping the ones that cannot be read.
pub fn decode_snapshot<I>(documents: I) -> Snapshot
where
    I: IntoIterator<Item = (DeclarationId, DocumentFields)>,
{
    documents
        .into_iter()
        .filter_map(|(id, fields)| match Declaration::from_document(id, fields) {
            Ok(declaration) => Some(declaration),
            Err(err) => {
                warn!(error = %err, "skipping unreadable declaration document");
                None
            }
        })
        .collect()
}
