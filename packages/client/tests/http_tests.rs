//! Client tests against an in-process document service

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use lexdraft_client::{ClientConfig, HttpDocumentApi};
use lexdraft_editor::{
    ApiError, DocumentApi, DocumentId, DocumentSettings, DownloadFormat, DraftUpdate,
    EditableDocument, EditorSession, LogoUpload, MemoryDocumentApi, PublishOutcome, PublishRecord,
    SaveOutcome, SequentialIds, SessionOptions,
};
use serde::Deserialize;
use std::sync::Arc;

const TOKEN: &str = "secret-token";

#[derive(Clone)]
struct Backend {
    store: Arc<MemoryDocumentApi>,
}

#[derive(Deserialize)]
struct DownloadParams {
    format: String,
}

fn authorize(headers: &HeaderMap) -> Result<(), Response> {
    let expected = format!("Bearer {}", TOKEN);
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err((StatusCode::UNAUTHORIZED, "missing or invalid token").into_response()),
    }
}

fn error_response(error: ApiError) -> Response {
    match error {
        ApiError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "detail": format!("Document {} not found", id) })),
        )
            .into_response(),
        ApiError::PaymentRequired {
            reason,
            message,
            payment_options,
        } => (
            StatusCode::PAYMENT_REQUIRED,
            Json(serde_json::json!({
                "detail": {
                    "reason": reason,
                    "message": message,
                    "payment_options": payment_options,
                }
            })),
        )
            .into_response(),
        ApiError::Status { status, message } => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            message,
        )
            .into_response(),
        other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()).into_response(),
    }
}

async fn fetch_document(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    match backend.store.fetch_document(&DocumentId::new(id)).await {
        Ok(document) => Json(document).into_response(),
        Err(error) => error_response(error),
    }
}

async fn fetch_content(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    match backend.store.fetch_content(&DocumentId::new(id)).await {
        Ok(content) => Json(content).into_response(),
        Err(error) => error_response(error),
    }
}

async fn update_content(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(update): Json<DraftUpdate>,
) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    match backend.store.update_content(&DocumentId::new(id), &update).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

async fn publish(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(record): Json<PublishRecord>,
) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    match backend.store.publish(&DocumentId::new(id), &record).await {
        Ok(document) => (StatusCode::CREATED, Json(document)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn download(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<DownloadParams>,
) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    let format: DownloadFormat = match params.format.parse() {
        Ok(format) => format,
        Err(message) => return (StatusCode::BAD_REQUEST, message).into_response(),
    };
    match backend.store.download(&DocumentId::new(id), format).await {
        Ok(file) => (
            [(header::CONTENT_TYPE, format.content_type().to_string())],
            file.bytes,
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

async fn spawn_server(store: Arc<MemoryDocumentApi>) -> String {
    let app = Router::new()
        .route("/documents/:id", get(fetch_document))
        .route("/documents/:id/content", get(fetch_content).put(update_content))
        .route("/documents/:id/publish", post(publish))
        .route("/documents/:id/download", get(download))
        .with_state(Backend { store });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

async fn setup() -> (Arc<MemoryDocumentApi>, HttpDocumentApi) {
    let store = Arc::new(MemoryDocumentApi::new());
    store.insert(
        EditableDocument::new("doc-1", "<p>Hello</p>")
            .with_type("lease_agreement")
            .with_version("v1"),
    );

    let base_url = spawn_server(store.clone()).await;
    let client = HttpDocumentApi::new(ClientConfig::new(base_url).with_auth_token(TOKEN)).unwrap();
    (store, client)
}

#[tokio::test]
async fn test_fetch_document_and_content() {
    let (_store, client) = setup().await;
    let id = DocumentId::new("doc-1");

    let document = client.fetch_document(&id).await.unwrap();
    assert_eq!(document.document_type, "lease_agreement");
    assert_eq!(document.version, "v1");
    assert!(document.content.is_none());

    let content = client.fetch_content(&id).await.unwrap();
    assert_eq!(content.content, "<p>Hello</p>");
}

#[tokio::test]
async fn test_missing_document_is_not_found() {
    let (_store, client) = setup().await;
    let result = client.fetch_document(&DocumentId::new("doc-404")).await;
    assert_eq!(result, Err(ApiError::NotFound("doc-404".into())));
}

#[tokio::test]
async fn test_requests_carry_bearer_token() {
    let (store, _client) = setup().await;
    let base_url = spawn_server(store).await;
    let anonymous = HttpDocumentApi::new(ClientConfig::new(base_url)).unwrap();

    let result = anonymous.fetch_document(&DocumentId::new("doc-1")).await;
    assert!(matches!(result, Err(ApiError::Status { status: 401, .. })));
}

#[tokio::test]
async fn test_cover_page_logo_survives_the_wire() {
    let (store, client) = setup().await;
    let id = DocumentId::new("doc-1");

    let update = DraftUpdate {
        content: "<p>Hello</p>".to_string(),
        settings: DocumentSettings {
            has_cover_page: true,
            cover_page_logo: Some(LogoUpload::new("seal.png", vec![0, 159, 255, 10])),
            ..DocumentSettings::default()
        },
    };
    client.update_content(&id, &update).await.unwrap();

    let stored = store.document(&id).unwrap().settings.unwrap();
    assert_eq!(stored, update.settings);
}

#[tokio::test]
async fn test_download_and_payment_required() {
    let (store, client) = setup().await;
    let id = DocumentId::new("doc-1");

    let file = client.download(&id, DownloadFormat::Html).await.unwrap();
    assert_eq!(file.bytes, b"<p>Hello</p>");
    assert_eq!(file.content_type.as_deref(), Some("text/html; charset=utf-8"));

    store.require_payment("doc-1");
    match client.download(&id, DownloadFormat::Pdf).await {
        Err(ApiError::PaymentRequired {
            message,
            payment_options,
            ..
        }) => {
            assert_eq!(message, "Payment is required to download this document");
            assert_eq!(payment_options.len(), 1);
        }
        other => panic!("expected payment required, got {:?}", other),
    }
}

#[tokio::test]
async fn test_session_saves_and_publishes_over_http() {
    let (store, client) = setup().await;
    let id = DocumentId::new("doc-1");

    let session = EditorSession::load(
        Arc::new(client),
        &id,
        SessionOptions::default().with_ids(Arc::new(SequentialIds::starting_at("doc", 2))),
    )
    .await
    .unwrap();
    assert_eq!(session.editor_content(), "<p>Hello</p>");

    session.content_changed("<p>Hello world</p>");
    assert_eq!(session.save().await, SaveOutcome::Saved);
    assert_eq!(store.document(&id).unwrap().content, "<p>Hello world</p>");

    let published = match session.publish().await {
        PublishOutcome::Published(published) => published,
        other => panic!("publish failed: {:?}", other),
    };
    assert_eq!(published.document_id.as_str(), "doc-2");
    assert_eq!(
        store.document(&published.document_id).unwrap().content,
        "<p>Hello world</p>"
    );
    assert_eq!(store.document(&id).unwrap().content, "<p>Hello world</p>");
}
