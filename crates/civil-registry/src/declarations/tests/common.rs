use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use axum::response::Response;
use chrono::{TimeZone, Utc};
use serde_json::Value;
use tokio::sync::{Notify, Semaphore};

use crate::auth::{AuthProvider, InMemoryAuthProvider};
use crate::declarations::domain::{DeclarationDraft, DeclarationId, DocumentFields, DraftField};
use crate::declarations::draft::{DeclarationForm, FieldValue};
use crate::declarations::store::{DeclarationStore, StoreError, Subscription};
use crate::declarations::submission::{Clock, SubmissionListener, SubmitOutcome};
use crate::declarations::{
    declaration_router, DeclarationRoutesState, InMemoryDeclarationStore, TextCertificateRenderer,
};

pub(super) const DECLARED_AT: &str = "2024-01-06T08:30:00.000Z";

pub(super) fn fixed_clock() -> Clock {
    Arc::new(|| {
        Utc.with_ymd_and_hms(2024, 1, 6, 8, 30, 0)
            .single()
            .expect("valid timestamp")
    })
}

/// Complete unmarried-branch draft.
pub(super) fn unmarried_draft() -> DeclarationDraft {
    let mut draft = DeclarationDraft::default();
    draft.nom = "Rakoto".to_string();
    draft.prenom = "Jean".to_string();
    draft.date_naissance = "2024-01-05".to_string();
    draft.nom_mere = "Rasoa".to_string();
    draft.prenom_mere = "Marie".to_string();
    draft
}

/// Complete married-branch draft.
pub(super) fn married_draft() -> DeclarationDraft {
    let mut draft = unmarried_draft();
    draft.parents_maries = true;
    draft.statut_marital = "Marié".to_string();
    draft.nom_pere = "Rakoto".to_string();
    draft.prenom_pere = "Paul".to_string();
    draft.date_mariage_parents = "2020-06-12".to_string();
    draft.lieu_mariage_parents = "Antananarivo".to_string();
    draft
}

pub(super) fn form_with(edits: &[(DraftField, FieldValue)]) -> DeclarationForm {
    let mut form = DeclarationForm::new();
    for (field, value) in edits {
        form.set_field(*field, value.clone()).expect("field accepts value");
    }
    form
}

pub(super) fn stored(id: &str, draft: &DeclarationDraft) -> (DeclarationId, DocumentFields) {
    (DeclarationId(id.to_string()), draft.to_document(DECLARED_AT))
}

pub(super) fn draft_named(nom: &str, nom_mere: &str) -> DeclarationDraft {
    let mut draft = unmarried_draft();
    draft.nom = nom.to_string();
    draft.nom_mere = nom_mere.to_string();
    draft
}

/// Records listener callbacks in call order.
#[derive(Default)]
pub(super) struct RecordingListener {
    pub(super) events: Vec<String>,
}

impl SubmissionListener for RecordingListener {
    fn on_saved(&mut self, outcome: &SubmitOutcome) {
        self.events.push(format!("saved:{outcome:?}"));
    }

    fn on_closed(&mut self) {
        self.events.push("closed".to_string());
    }

    fn on_error(&mut self, message: &str) {
        self.events.push(format!("error:{message}"));
    }
}

/// Store whose inserts park until the test releases them.
pub(super) struct GatedStore {
    pub(super) entered: Notify,
    pub(super) release: Semaphore,
    inserts: AtomicUsize,
}

impl Default for GatedStore {
    fn default() -> Self {
        Self {
            entered: Notify::new(),
            release: Semaphore::new(0),
            inserts: AtomicUsize::new(0),
        }
    }
}

impl GatedStore {
    pub(super) fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeclarationStore for GatedStore {
    async fn insert(&self, _fields: DocumentFields) -> Result<DeclarationId, StoreError> {
        self.entered.notify_one();
        let _permit = self
            .release
            .acquire()
            .await
            .map_err(|_| StoreError::Unavailable("gate closed".to_string()))?;
        let count = self.inserts.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(DeclarationId(format!("gated-{count}")))
    }

    async fn update(&self, id: &DeclarationId, _fields: DocumentFields) -> Result<(), StoreError> {
        Err(StoreError::NotFound(id.clone()))
    }

    async fn delete(&self, id: &DeclarationId) -> Result<(), StoreError> {
        Err(StoreError::NotFound(id.clone()))
    }

    fn subscribe(&self) -> Subscription {
        Subscription::channel().1
    }
}

/// Store that rejects every mutation and records the payloads it was offered.
#[derive(Default)]
pub(super) struct UnavailableStore {
    pub(super) attempts: Mutex<Vec<DocumentFields>>,
}

#[async_trait]
impl DeclarationStore for UnavailableStore {
    async fn insert(&self, fields: DocumentFields) -> Result<DeclarationId, StoreError> {
        self.attempts.lock().expect("attempts lock").push(fields);
        Err(StoreError::Unavailable("network down".to_string()))
    }

    async fn update(&self, _id: &DeclarationId, fields: DocumentFields) -> Result<(), StoreError> {
        self.attempts.lock().expect("attempts lock").push(fields);
        Err(StoreError::Unavailable("network down".to_string()))
    }

    async fn delete(&self, _id: &DeclarationId) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("network down".to_string()))
    }

    fn subscribe(&self) -> Subscription {
        Subscription::channel().1
    }
}

/// Provider with one registered operator and the bearer token issued to them.
pub(super) async fn signed_in_auth() -> (Arc<InMemoryAuthProvider>, String) {
    let auth = Arc::new(InMemoryAuthProvider::new());
    let operator = auth
        .sign_up("agent@example.org", "secret-1")
        .await
        .expect("operator account created");
    let token = auth.issue_token(&operator).await.expect("token issued");
    (auth, token)
}

pub(super) fn bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        format!("Bearer {token}").parse().expect("header value"),
    );
    headers
}

pub(super) fn router_with(
    store: Arc<InMemoryDeclarationStore>,
    auth: Arc<InMemoryAuthProvider>,
) -> axum::Router {
    declaration_router(DeclarationRoutesState::new(
        store,
        auth,
        Arc::new(TextCertificateRenderer),
    ))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}
