use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{info, warn};

use super::domain::DeclarationId;
use super::draft::DeclarationForm;
use super::store::{DeclarationStore, StoreError};
use super::validation::{validate, ValidationErrors};

/// Source of the declaration timestamp stamped on every save.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Callbacks owned by whoever opened the form.
pub trait SubmissionListener: Send {
    /// The store accepted the declaration.
    fn on_saved(&mut self, outcome: &SubmitOutcome);
    /// The form should be dismissed. Always follows `on_saved`.
    fn on_closed(&mut self);
    /// Blocking notification for a failed save; the form stays open for a retry.
    fn on_error(&mut self, _message: &str) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created(DeclarationId),
    Updated(DeclarationId),
    /// Another submit of the same form was still pending; nothing was sent.
    AlreadyInFlight,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("declaration is incomplete: {0}")]
    Invalid(ValidationErrors),
    #[error("failed to save declaration: {0}")]
    Persistence(#[from] StoreError),
}

/// Validate-then-persist workflow for a single open form.
///
/// One submitter belongs to one form instance; its in-flight flag is what disables
/// the save control while a store call is pending.
pub struct DeclarationSubmitter<S: ?Sized> {
    store: Arc<S>,
    clock: Clock,
    in_flight: AtomicBool,
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S> DeclarationSubmitter<S>
where
    S: DeclarationStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self::with_clock(store, Arc::new(Utc::now))
    }

    pub fn with_clock(store: Arc<S>, clock: Clock) -> Self {
        Self {
            store,
            clock,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Validate the form and, when it is complete, insert or update it in the store.
    pub async fn submit<L>(
        &self,
        form: &DeclarationForm,
        listener: &mut L,
    ) -> Result<SubmitOutcome, SubmissionError>
    where
        L: SubmissionListener + ?Sized,
    {
        let errors = validate(form.draft());
        if !errors.is_empty() {
            return Err(SubmissionError::Invalid(errors));
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(SubmitOutcome::AlreadyInFlight);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let declared_at = (self.clock)().to_rfc3339_opts(SecondsFormat::Millis, true);
        let payload = form.draft().to_document(&declared_at);

        let result = match form.identity() {
            Some(id) => self
                .store
                .update(id, payload)
                .await
                .map(|()| SubmitOutcome::Updated(id.clone())),
            None => self.store.insert(payload).await.map(SubmitOutcome::Created),
        };

        match result {
            Ok(outcome) => {
                info!(?outcome, "declaration saved");
                listener.on_saved(&outcome);
                listener.on_closed();
                Ok(outcome)
            }
            Err(err) => {
                warn!(error = %err, "declaration save failed");
                listener.on_error(&format!("Erreur lors de l'enregistrement : {err}"));
                Err(SubmissionError::Persistence(err))
            }
        }
    }
}
