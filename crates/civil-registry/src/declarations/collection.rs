use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::domain::{Declaration, DeclarationId};
use super::draft::DeclarationForm;
use super::prompts::{Confirm, Notifier};
use super::store::{DeclarationStore, Subscription};
use super::submission::{DeclarationSubmitter, SubmissionError, SubmissionListener, SubmitOutcome};

pub const DELETE_CONFIRMATION: &str = "Voulez-vous vraiment supprimer cette déclaration ?";

/// Lifecycle of the live list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum ViewState {
    Loading,
    Loaded,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The user declined the confirmation.
    Cancelled,
    /// The store accepted the delete; the row leaves on the next snapshot.
    Requested,
    Failed(String),
}

/// Declarations mirrored from a live query, with client-side search and the form
/// currently opened from the list.
pub struct DeclarationCollectionView<S: DeclarationStore + ?Sized> {
    store: Arc<S>,
    subscription: Option<Subscription>,
    state: ViewState,
    declarations: Vec<Declaration>,
    search: String,
    form: Option<DeclarationForm>,
}

impl<S> DeclarationCollectionView<S>
where
    S: DeclarationStore + ?Sized,
{
    pub fn mount(store: Arc<S>) -> Self {
        let subscription = store.subscribe();
        Self {
            store,
            subscription: Some(subscription),
            state: ViewState::Loading,
            declarations: Vec::new(),
            search: String::new(),
            form: None,
        }
    }

    /// Wait for the next emission of the live query and apply it. Returns `None` once
    /// the query has ended; there is no automatic resubscription.
    pub async fn next_event(&mut self) -> Option<&ViewState> {
        let event = self.subscription.as_mut()?.next().await;
        match event {
            Some(Ok(snapshot)) => {
                debug!(count = snapshot.len(), "declaration snapshot applied");
                self.declarations = snapshot;
                self.state = ViewState::Loaded;
            }
            Some(Err(err)) => {
                warn!(error = %err, "declaration subscription failed");
                self.state = ViewState::Error(format!(
                    "Erreur lors du chargement des déclarations : {err}"
                ));
            }
            None => {
                self.subscription = None;
                return None;
            }
        }
        Some(&self.state)
    }

    /// Cancel the live query and drop the view.
    pub fn unmount(mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Every declaration in the latest snapshot, in snapshot order.
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    /// Declarations matching the current search term.
    pub fn filtered(&self) -> Vec<&Declaration> {
        filter_declarations(&self.declarations, &self.search)
    }

    /// Ask for confirmation, then delete `id` from the store. The local list is left
    /// alone until the store pushes the next snapshot.
    pub async fn delete<C, N>(&self, id: &DeclarationId, confirm: &C, notifier: &N) -> DeleteOutcome
    where
        C: Confirm + ?Sized,
        N: Notifier + ?Sized,
    {
        if !confirm.confirm(DELETE_CONFIRMATION) {
            return DeleteOutcome::Cancelled;
        }

        match self.store.delete(id).await {
            Ok(()) => DeleteOutcome::Requested,
            Err(err) => {
                let message = format!("Erreur lors de la suppression : {err}");
                notifier.notify(&message);
                DeleteOutcome::Failed(message)
            }
        }
    }

    pub fn open_new_form(&mut self) -> &mut DeclarationForm {
        self.form.insert(DeclarationForm::new())
    }

    /// Open the form on a declaration from the current list.
    pub fn open_edit_form(&mut self, id: &DeclarationId) -> Option<&mut DeclarationForm> {
        let declaration = self.declarations.iter().find(|d| &d.id == id)?;
        let form = DeclarationForm::edit(declaration);
        Some(self.form.insert(form))
    }

    pub fn open_form(&self) -> Option<&DeclarationForm> {
        self.form.as_ref()
    }

    pub fn open_form_mut(&mut self) -> Option<&mut DeclarationForm> {
        self.form.as_mut()
    }

    pub fn close_form(&mut self) {
        self.form = None;
    }

    /// Submit the open form. Validation errors are attached to the form; a successful
    /// save closes it; a failed save is reported through `notifier` and keeps it open.
    pub async fn submit_open_form<T, N>(
        &mut self,
        submitter: &DeclarationSubmitter<T>,
        notifier: &N,
    ) -> Option<Result<SubmitOutcome, SubmissionError>>
    where
        T: DeclarationStore + ?Sized,
        N: Notifier + ?Sized,
    {
        let form = self.form.as_ref()?;
        let mut listener = FormListener::default();
        let result = submitter.submit(form, &mut listener).await;

        if let Some(message) = &listener.error {
            notifier.notify(message);
        }
        match &result {
            Err(SubmissionError::Invalid(errors)) => {
                if let Some(form) = self.form.as_mut() {
                    form.set_errors(errors.clone());
                }
            }
            _ if listener.closed => self.close_form(),
            _ => {}
        }
        Some(result)
    }
}

#[derive(Default)]
struct FormListener {
    closed: bool,
    error: Option<String>,
}

impl SubmissionListener for FormListener {
    fn on_saved(&mut self, _outcome: &SubmitOutcome) {}

    fn on_closed(&mut self) {
        self.closed = true;
    }

    fn on_error(&mut self, message: &str) {
        self.error = Some(message.to_string());
    }
}

/// Case-insensitive substring match against the child's names and the parents' last
/// names. A blank term keeps every declaration.
pub fn filter_declarations<'a>(declarations: &'a [Declaration], term: &str) -> Vec<&'a Declaration> {
    if term.trim().is_empty() {
        return declarations.iter().collect();
    }
    let term = term.to_lowercase();
    declarations
        .iter()
        .filter(|declaration| matches_search(declaration, &term))
        .collect()
}

fn matches_search(declaration: &Declaration, lowered_term: &str) -> bool {
    let draft = &declaration.draft;
    [&draft.nom, &draft.prenom, &draft.nom_pere, &draft.nom_mere]
        .into_iter()
        .any(|value| value.to_lowercase().contains(lowered_term))
}
