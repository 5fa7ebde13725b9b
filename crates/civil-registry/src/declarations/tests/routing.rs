use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use axum::Json;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;

use crate::auth::{AuthProvider, InMemoryAuthProvider};
use crate::declarations::domain::DeclarationDraft;
use crate::declarations::router::{create_handler, update_handler};
use crate::declarations::{DeclarationRoutesState, InMemoryDeclarationStore, TextCertificateRenderer};

fn json_request(
    method: &str,
    uri: &str,
    token: &str,
    body: &impl serde::Serialize,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).expect("serializable body")))
        .expect("request builds")
}

fn get(uri: &str, token: &str) -> Request<Body> {
    Request::get(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request builds")
}

async fn create(router: &axum::Router, token: &str, draft: &DeclarationDraft) -> String {
    let response = router
        .clone()
        .oneshot(json_request("POST", "/api/v1/declarations", token, draft))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    payload
        .get("id")
        .and_then(Value::as_str)
        .expect("created id")
        .to_string()
}

#[tokio::test]
async fn routes_require_a_bearer_token() {
    let store = Arc::new(InMemoryDeclarationStore::new());
    let router = router_with(store.clone(), Arc::new(InMemoryAuthProvider::new()));

    let response = router
        .clone()
        .oneshot(
            Request::get("/api/v1/declarations")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/declarations",
            "forged-token",
            &unmarried_draft(),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(store.is_empty());
}

#[tokio::test]
async fn anonymous_requests_stay_rejected_while_another_client_is_signed_in() {
    let store = Arc::new(InMemoryDeclarationStore::new());
    let (auth, token) = signed_in_auth().await;
    assert!(auth.current_user().is_some());
    let router = router_with(store.clone(), auth.clone());

    let anonymous = |uri: &str| {
        Request::get(uri)
            .body(Body::empty())
            .expect("request builds")
    };
    for uri in ["/api/v1/declarations", "/api/v1/statistics"] {
        let response = router
            .clone()
            .oneshot(anonymous(uri))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
    let response = router
        .clone()
        .oneshot(
            Request::post("/api/v1/declarations")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::to_vec(&unmarried_draft()).expect("serializable body"),
                ))
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(store.is_empty());

    let response = router
        .clone()
        .oneshot(get("/api/v1/declarations", &token))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);

    auth.revoke_token(&token).await.expect("token revoked");
    let response = router
        .oneshot(get("/api/v1/declarations", &token))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn concurrent_posts_are_not_gated_across_requests() {
    let store = Arc::new(InMemoryDeclarationStore::new());
    let (auth, token) = signed_in_auth().await;
    let router = router_with(store.clone(), auth);
    let draft = unmarried_draft();

    let (first, second) = tokio::join!(
        router
            .clone()
            .oneshot(json_request("POST", "/api/v1/declarations", &token, &draft)),
        router
            .clone()
            .oneshot(json_request("POST", "/api/v1/declarations", &token, &draft)),
    );

    assert_eq!(first.expect("route executes").status(), StatusCode::CREATED);
    assert_eq!(second.expect("route executes").status(), StatusCode::CREATED);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn created_declarations_are_listed_and_searchable() {
    let store = Arc::new(InMemoryDeclarationStore::new());
    let (auth, token) = signed_in_auth().await;
    let router = router_with(store.clone(), auth);

    create(&router, &token, &draft_named("Rakoto", "Rasoa")).await;
    create(&router, &token, &draft_named("Rabe", "Vola")).await;
    assert_eq!(store.len(), 2);

    let response = router
        .clone()
        .oneshot(get("/api/v1/declarations?search=RAKOTO", &token))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let listed = payload.as_array().expect("array payload");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].get("nom"), Some(&json!("Rakoto")));
    assert_eq!(listed[0].get("parentsMaries"), Some(&json!(false)));

    let response = router
        .oneshot(get("/api/v1/declarations", &token))
        .await
        .expect("route executes");
    let payload = read_json_body(response).await;
    assert_eq!(payload.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn invalid_draft_returns_field_errors() {
    let store = Arc::new(InMemoryDeclarationStore::new());
    let (auth, token) = signed_in_auth().await;
    let router = router_with(store.clone(), auth);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/declarations",
            &token,
            &json!({ "nom": "Rakoto", "parentsMaries": true }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    let errors = payload.get("errors").expect("errors object");
    assert_eq!(errors.get("prenom"), Some(&json!("Prénom obligatoire")));
    assert_eq!(errors.get("nomPere"), Some(&json!("Nom du père obligatoire")));
    assert!(errors.get("nom").is_none());
    assert!(errors.get("nomMere").is_none());
    assert!(store.is_empty());
}

#[tokio::test]
async fn update_and_delete_follow_store_identity() {
    let store = Arc::new(InMemoryDeclarationStore::new());
    let (auth, token) = signed_in_auth().await;
    let router = router_with(store.clone(), auth);
    let id = create(&router, &token, &unmarried_draft()).await;

    let response = router
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/declarations/{id}"),
            &token,
            &married_draft(),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/v1/declarations/unknown",
            &token,
            &married_draft(),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let delete = || {
        Request::delete(format!("/api/v1/declarations/{id}"))
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .expect("request builds")
    };
    let response = router
        .clone()
        .oneshot(delete())
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(store.is_empty());

    let response = router.oneshot(delete()).await.expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn document_route_renders_certificate() {
    let store = Arc::new(InMemoryDeclarationStore::new());
    let (auth, token) = signed_in_auth().await;
    let router = router_with(store, auth);
    let id = create(&router, &token, &unmarried_draft()).await;

    let response = router
        .clone()
        .oneshot(get(&format!("/api/v1/declarations/{id}/document"), &token))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/plain"));
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(disposition.contains("declaration-rakoto-jean.txt"));
    let body = read_text_body(response).await;
    assert!(body.contains("Nom : Rakoto"));

    let response = router
        .oneshot(get("/api/v1/declarations/missing/document", &token))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn statistics_route_summarises_snapshot() {
    let store = Arc::new(InMemoryDeclarationStore::with_documents([
        stored("decl-1", &unmarried_draft()),
        stored("decl-2", &married_draft()),
    ]));
    let (auth, token) = signed_in_auth().await;
    let router = router_with(store, auth);

    let response = router
        .oneshot(get("/api/v1/statistics", &token))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("total"), Some(&json!(2)));
    assert_eq!(
        payload.pointer("/by_parents_status/0/percent"),
        Some(&json!("50.0%"))
    );
}

#[tokio::test]
async fn form_view_applies_edits_in_order() {
    let store = Arc::new(InMemoryDeclarationStore::new());
    let (auth, token) = signed_in_auth().await;
    let router = router_with(store, auth);

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/declaration-form",
            &token,
            &json!({
                "draft": married_draft(),
                "edits": [
                    { "name": "parentsMaries", "value": false },
                    { "name": "nomMere", "value": "" },
                ],
                "tab": 1,
                "validate": true,
            }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("title"), Some(&json!("Nouvelle déclaration")));
    let fields = payload
        .get("fields")
        .and_then(Value::as_array)
        .expect("fields");
    assert!(fields.iter().all(|f| f.get("name") != Some(&json!("nomPere"))));
    let nom_mere = fields
        .iter()
        .find(|f| f.get("name") == Some(&json!("nomMere")))
        .expect("mother name widget");
    assert_eq!(
        nom_mere.get("error"),
        Some(&json!("Nom de la mère obligatoire"))
    );

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/declaration-form",
            &token,
            &json!({ "edits": [{ "name": "surname", "value": "x" }] }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn create_handler_returns_internal_error_on_store_failure() {
    let (auth, token) = signed_in_auth().await;
    let state = DeclarationRoutesState::new(
        Arc::new(UnavailableStore::default()),
        auth,
        Arc::new(TextCertificateRenderer),
    );

    let response = create_handler::<UnavailableStore, InMemoryAuthProvider>(
        State(state),
        bearer(&token),
        Json(unmarried_draft()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert!(payload
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .contains("network down"));
}

#[tokio::test]
async fn update_handler_hydrates_timestamped_dates() {
    let store = Arc::new(InMemoryDeclarationStore::with_documents([stored(
        "decl-1",
        &unmarried_draft(),
    )]));
    let (auth, token) = signed_in_auth().await;
    let state = DeclarationRoutesState::new(
        store.clone(),
        auth,
        Arc::new(TextCertificateRenderer),
    );
    let mut draft = unmarried_draft();
    draft.date_naissance = "2024-01-05T10:00:00Z".to_string();

    let response = update_handler::<InMemoryDeclarationStore, InMemoryAuthProvider>(
        State(state),
        bearer(&token),
        Path("decl-1".to_string()),
        Json(draft),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let document = store
        .document(&crate::declarations::DeclarationId("decl-1".to_string()))
        .expect("document stored");
    assert_eq!(document.get("dateNaissance"), Some(&json!("2024-01-05")));
}
