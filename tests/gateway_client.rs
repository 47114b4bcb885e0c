// tests/gateway_client.rs
use axum::body::Bytes;
use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use cv_builder::gateway::ListScope;
use cv_builder::types::response::{CvStatus, ListQuery, ReferenceKind, SaveCvRequest};
use cv_builder::{AggregatedCvData, CvApiClient, GatewayError, PersistenceGateway, SectionKey};
use serde_json::{json, Value};
use std::collections::HashMap;

const TOKEN: &str = "secret-token";

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", TOKEN))
}

async fn list_drafts(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "missing token").into_response();
    }
    let limit: u32 = params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(0);
    let offset: u32 = params.get("offset").and_then(|v| v.parse().ok()).unwrap_or(0);
    let search = params.get("search_string").cloned();
    Json(json!({
        "items": [{
            "id": "cv-7",
            "email": "jane.doe@example.org",
            "full_name": search,
            "version": 2,
            "status": "draft",
            "updated_at": "2026-03-01T10:00:00Z"
        }],
        "total": 21,
        "limit": limit,
        "offset": offset
    }))
    .into_response()
}

async fn information(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    if params.get("version").map(String::as_str) != Some("2") {
        return (StatusCode::NOT_FOUND, "version not found").into_response();
    }
    Json(json!({
        "email": params.get("email"),
        "version": 2,
        "status": "draft",
        "content": {
            "Languages": [{"Language": "Spanish", "Proficiency": "Fluent"}]
        }
    }))
    .into_response()
}

async fn save(Json(request): Json<Value>) -> Json<Value> {
    if request["file_base64"].as_str().unwrap_or_default().is_empty() {
        return Json(json!({
            "status": "error",
            "id": "",
            "version": 0,
            "message": "Missing document"
        }));
    }
    Json(json!({ "status": "success", "id": "cv-7", "version": 3 }))
}

async fn upload(headers: HeaderMap, body: Bytes) -> Json<Value> {
    let multipart = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));
    let text = String::from_utf8_lossy(&body);
    if !multipart || !text.contains("application/pdf") || !text.contains("name=\"file\"") {
        return Json(json!({ "status": "error", "cv_data": {}, "message": "Bad upload" }));
    }
    Json(json!({
        "status": "success",
        "cv_data": {
            "Personal Information": {"First Name": "Jane", "Last Name": "Doe"}
        }
    }))
}

async fn sites() -> Json<Value> {
    Json(json!([
        {"label": "North Campus", "value": "north"},
        {"label": "South Campus", "value": "south"}
    ]))
}

async fn countries() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "database offline")
}

async fn garbage() -> &'static str {
    "<html>not json</html>"
}

async fn spawn_backend() -> String {
    let app = Router::new()
        .route("/api/cv/drafts", get(list_drafts))
        .route("/api/cv/information", get(information))
        .route("/api/cv/save", post(save))
        .route("/api/cv/upload", post(upload))
        .route("/api/reference/sites", get(sites))
        .route("/api/reference/countries", get(countries))
        .route("/api/reference/credentials", get(garbage));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api/", addr)
}

#[tokio::test]
async fn test_list_sends_paging_and_token() {
    let client = CvApiClient::new(spawn_backend().await, 5).unwrap();
    let query = ListQuery {
        limit: 20,
        offset: 20,
        search_string: Some("Jane".to_string()),
    };

    let listing = client.list_cvs(TOKEN, ListScope::Drafts, &query).await.unwrap();
    assert_eq!(listing.total, 21);
    assert_eq!(listing.limit, 20);
    assert_eq!(listing.offset, 20);
    assert_eq!(listing.items[0].status, CvStatus::Draft);
    assert_eq!(listing.items[0].full_name.as_deref(), Some("Jane"));
}

#[tokio::test]
async fn test_list_surfaces_status_errors() {
    let client = CvApiClient::new(spawn_backend().await, 5).unwrap();
    let err = client
        .list_cvs("wrong", ListScope::Drafts, &ListQuery::default())
        .await
        .unwrap_err();
    match err {
        GatewayError::Status { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "missing token");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_information() {
    let client = CvApiClient::new(spawn_backend().await, 5).unwrap();
    let info = client
        .fetch_cv_information(TOKEN, "jane.doe@example.org", 2)
        .await
        .unwrap();
    assert_eq!(info.email, "jane.doe@example.org");
    assert!(info.content.has_content(SectionKey::Languages));

    let missing = client
        .fetch_cv_information(TOKEN, "jane.doe@example.org", 5)
        .await
        .unwrap_err();
    assert!(matches!(missing, GatewayError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_save_success_and_rejection() {
    let client = CvApiClient::new(spawn_backend().await, 5).unwrap();
    let mut request = SaveCvRequest {
        email: "jane.doe@example.org".to_string(),
        version: None,
        status: CvStatus::Complete,
        content: AggregatedCvData::new(),
        file_name: "Jane_Doe_CV_2026.pdf".to_string(),
        file_base64: "JVBERi0xLjc=".to_string(),
    };

    let saved = client.save_cv(TOKEN, &request).await.unwrap();
    assert_eq!(saved.version, 3);

    request.file_base64.clear();
    let err = client.save_cv(TOKEN, &request).await.unwrap_err();
    match err {
        GatewayError::Rejected(message) => assert_eq!(message, "Missing document"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_upload_sends_multipart_file() {
    let client = CvApiClient::new(spawn_backend().await, 5).unwrap();
    let data = client
        .upload_cv(TOKEN, "resume.pdf", b"%PDF-1.7".to_vec())
        .await
        .unwrap();
    assert_eq!(data.full_name().as_deref(), Some("Jane Doe"));
}

#[tokio::test]
async fn test_upload_refuses_unknown_extension_locally() {
    let client = CvApiClient::new("http://127.0.0.1:9", 5).unwrap();
    let err = client
        .upload_cv(TOKEN, "notes.txt", b"hello".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::UnsupportedFile(_)));
}

#[tokio::test]
async fn test_reference_lists() {
    let client = CvApiClient::new(spawn_backend().await, 5).unwrap();

    let sites = client
        .reference_options(TOKEN, ReferenceKind::Sites)
        .await
        .unwrap();
    assert_eq!(sites.len(), 2);
    assert_eq!(sites[1].value, "south");

    let err = client
        .reference_options(TOKEN, ReferenceKind::Countries)
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Status { status: 500, .. }));

    let err = client
        .reference_options(TOKEN, ReferenceKind::Credentials)
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Decode(_)));
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    let client = CvApiClient::new("http://127.0.0.1:9", 1).unwrap();
    let err = client
        .reference_options(TOKEN, ReferenceKind::Sites)
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Transport(_)));
}
