use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use super::collection::{DeclarationCollectionView, ViewState};
use super::document::DeclarationRenderer;
use super::domain::{Declaration, DeclarationDraft, DeclarationId};
use super::draft::{DeclarationForm, FieldValue};
use super::statistics::DeclarationStatistics;
use super::store::{DeclarationStore, StoreError};
use super::submission::{DeclarationSubmitter, SubmissionError, SubmissionListener, SubmitOutcome};
use super::widgets::FormView;
use crate::auth::router::auth_error_response;
use crate::auth::{require_user, AuthProvider};

/// Collaborators shared by the declaration endpoints.
pub struct DeclarationRoutesState<S: ?Sized, A: ?Sized> {
    store: Arc<S>,
    auth: Arc<A>,
    renderer: Arc<dyn DeclarationRenderer>,
}

impl<S: ?Sized, A: ?Sized> Clone for DeclarationRoutesState<S, A> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            auth: Arc::clone(&self.auth),
            renderer: Arc::clone(&self.renderer),
        }
    }
}

impl<S: ?Sized, A: ?Sized> DeclarationRoutesState<S, A> {
    pub fn new(store: Arc<S>, auth: Arc<A>, renderer: Arc<dyn DeclarationRenderer>) -> Self {
        Self {
            store,
            auth,
            renderer,
        }
    }
}

/// Router builder exposing the declaration records, their documents and statistics.
/// Every route requires a bearer token issued by the auth routes.
pub fn declaration_router<S, A>(state: DeclarationRoutesState<S, A>) -> Router
where
    S: DeclarationStore + 'static,
    A: AuthProvider + 'static,
{
    Router::new()
        .route(
            "/api/v1/declarations",
            get(list_handler::<S, A>).post(create_handler::<S, A>),
        )
        .route(
            "/api/v1/declarations/:declaration_id",
            put(update_handler::<S, A>).delete(delete_handler::<S, A>),
        )
        .route(
            "/api/v1/declarations/:declaration_id/document",
            get(document_handler::<S, A>),
        )
        .route("/api/v1/declaration-form", post(form_view_handler::<S, A>))
        .route("/api/v1/statistics", get(statistics_handler::<S, A>))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    search: Option<String>,
}

/// One edit applied to the form, in order, before the view is built.
#[derive(Debug, Deserialize)]
pub(crate) struct FieldEdit {
    name: String,
    value: FieldValue,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FormViewRequest {
    #[serde(default)]
    id: Option<DeclarationId>,
    #[serde(default)]
    draft: DeclarationDraft,
    #[serde(default)]
    edits: Vec<FieldEdit>,
    #[serde(default)]
    tab: usize,
    #[serde(default)]
    validate: bool,
}

/// Logs the submission callbacks; HTTP callers learn the outcome from the response.
struct LoggingListener;

impl SubmissionListener for LoggingListener {
    fn on_saved(&mut self, _outcome: &SubmitOutcome) {}

    fn on_closed(&mut self) {}

    fn on_error(&mut self, message: &str) {
        warn!(%message, "declaration save reported to caller");
    }
}

pub(crate) async fn list_handler<S, A>(
    State(state): State<DeclarationRoutesState<S, A>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response
where
    S: DeclarationStore + 'static,
    A: AuthProvider + 'static,
{
    if let Err(err) = require_user(state.auth.as_ref(), &headers).await {
        return auth_error_response(&err);
    }

    let mut view = DeclarationCollectionView::mount(state.store);
    let loaded = view.next_event().await.cloned();
    let response = match loaded {
        Some(ViewState::Loaded) => {
            view.set_search(query.search.unwrap_or_default());
            let declarations: Vec<Declaration> = view.filtered().into_iter().cloned().collect();
            (StatusCode::OK, Json(declarations)).into_response()
        }
        Some(ViewState::Error(message)) => {
            error_response(StatusCode::SERVICE_UNAVAILABLE, &message)
        }
        Some(ViewState::Loading) | None => error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "declaration query closed before its first snapshot",
        ),
    };
    view.unmount();
    response
}

pub(crate) async fn create_handler<S, A>(
    State(state): State<DeclarationRoutesState<S, A>>,
    headers: HeaderMap,
    Json(draft): Json<DeclarationDraft>,
) -> Response
where
    S: DeclarationStore + 'static,
    A: AuthProvider + 'static,
{
    if let Err(err) = require_user(state.auth.as_ref(), &headers).await {
        return auth_error_response(&err);
    }
    let form = DeclarationForm::with_draft(draft);
    submit_form(state.store, &form).await
}

pub(crate) async fn update_handler<S, A>(
    State(state): State<DeclarationRoutesState<S, A>>,
    headers: HeaderMap,
    Path(declaration_id): Path<String>,
    Json(draft): Json<DeclarationDraft>,
) -> Response
where
    S: DeclarationStore + 'static,
    A: AuthProvider + 'static,
{
    if let Err(err) = require_user(state.auth.as_ref(), &headers).await {
        return auth_error_response(&err);
    }
    let form = DeclarationForm::hydrate(DeclarationId(declaration_id), draft);
    submit_form(state.store, &form).await
}

async fn submit_form<S>(store: Arc<S>, form: &DeclarationForm) -> Response
where
    S: DeclarationStore + 'static,
{
    let submitter = DeclarationSubmitter::new(store);
    match submitter.submit(form, &mut LoggingListener).await {
        Ok(SubmitOutcome::Created(id)) => {
            (StatusCode::CREATED, Json(json!({ "id": id }))).into_response()
        }
        Ok(SubmitOutcome::Updated(id)) => {
            (StatusCode::OK, Json(json!({ "id": id }))).into_response()
        }
        Err(SubmissionError::Invalid(errors)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "errors": errors })),
        )
            .into_response(),
        Err(SubmissionError::Persistence(StoreError::NotFound(id))) => {
            error_response(StatusCode::NOT_FOUND, &format!("declaration {id} not found"))
        }
        // A per-request submitter has no other save to wait on.
        Ok(SubmitOutcome::AlreadyInFlight) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "declaration save already in progress",
        ),
        Err(other) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &other.to_string()),
    }
}

pub(crate) async fn delete_handler<S, A>(
    State(state): State<DeclarationRoutesState<S, A>>,
    headers: HeaderMap,
    Path(declaration_id): Path<String>,
) -> Response
where
    S: DeclarationStore + 'static,
    A: AuthProvider + 'static,
{
    if let Err(err) = require_user(state.auth.as_ref(), &headers).await {
        return auth_error_response(&err);
    }
    let id = DeclarationId(declaration_id);
    match state.store.delete(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(StoreError::NotFound(_)) => {
            error_response(StatusCode::NOT_FOUND, &format!("declaration {id} not found"))
        }
        Err(other) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &other.to_string()),
    }
}

pub(crate) async fn document_handler<S, A>(
    State(state): State<DeclarationRoutesState<S, A>>,
    headers: HeaderMap,
    Path(declaration_id): Path<String>,
) -> Response
where
    S: DeclarationStore + 'static,
    A: AuthProvider + 'static,
{
    if let Err(err) = require_user(state.auth.as_ref(), &headers).await {
        return auth_error_response(&err);
    }
    let declarations = match load_snapshot(state.store).await {
        Ok(declarations) => declarations,
        Err(message) => return error_response(StatusCode::SERVICE_UNAVAILABLE, &message),
    };
    let id = DeclarationId(declaration_id);
    let Some(declaration) = declarations.iter().find(|d| d.id == id) else {
        return error_response(StatusCode::NOT_FOUND, &format!("declaration {id} not found"));
    };

    match state.renderer.render(declaration) {
        Ok(document) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, document.content_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("inline; filename=\"{}\"", document.file_name),
                ),
            ],
            document.body,
        )
            .into_response(),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string()),
    }
}

pub(crate) async fn form_view_handler<S, A>(
    State(state): State<DeclarationRoutesState<S, A>>,
    headers: HeaderMap,
    Json(request): Json<FormViewRequest>,
) -> Response
where
    S: DeclarationStore + 'static,
    A: AuthProvider + 'static,
{
    if let Err(err) = require_user(state.auth.as_ref(), &headers).await {
        return auth_error_response(&err);
    }

    let mut form = match request.id {
        Some(id) => DeclarationForm::hydrate(id, request.draft),
        None => DeclarationForm::with_draft(request.draft),
    };
    for edit in request.edits {
        if let Err(err) = form.set_field_by_name(&edit.name, edit.value) {
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, &err.to_string());
        }
    }
    if let Err(err) = form.switch_tab(request.tab) {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, &err.to_string());
    }
    if request.validate {
        form.validate();
    }

    (StatusCode::OK, Json(FormView::build(&form, false))).into_response()
}

pub(crate) async fn statistics_handler<S, A>(
    State(state): State<DeclarationRoutesState<S, A>>,
    headers: HeaderMap,
) -> Response
where
    S: DeclarationStore + 'static,
    A: AuthProvider + 'static,
{
    if let Err(err) = require_user(state.auth.as_ref(), &headers).await {
        return auth_error_response(&err);
    }
    match load_snapshot(state.store).await {
        Ok(declarations) => (
            StatusCode::OK,
            Json(DeclarationStatistics::from_declarations(&declarations)),
        )
            .into_response(),
        Err(message) => error_response(StatusCode::SERVICE_UNAVAILABLE, &message),
    }
}

/// First snapshot of a short-lived live query.
async fn load_snapshot<S>(store: Arc<S>) -> Result<Vec<Declaration>, String>
where
    S: DeclarationStore + ?Sized,
{
    let mut view = DeclarationCollectionView::mount(store);
    let result = match view.next_event().await.cloned() {
        Some(ViewState::Loaded) => Ok(view.declarations().to_vec()),
        Some(ViewState::Error(message)) => Err(message),
        Some(ViewState::Loading) | None => {
            Err("declaration query closed before its first snapshot".to_string())
        }
    };
    view.unmount();
    result
}

fn error_response(status: StatusCode, message: &str) -> Response {
    let payload = json!({
        "error": message,
    });
    (status, Json(payload)).into_response()
}
