// src/web/mod.rs

pub mod handlers;
pub mod sessions;
pub mod types;

pub use sessions::{SessionStore, WebServices};
pub use types::*;

use anyhow::Result;
use rocket::data::{Limits, ToByteUnit};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::form::Form;
use rocket::http::Header;
use rocket::response::content::RawHtml;
use rocket::serde::json::Json;
use rocket::{catchers, delete, get, patch, post, routes, Build, Request, Response, Rocket, State};
use std::sync::Arc;
use std::time::Duration;

use crate::app_log;
use crate::auth::{AuthenticatedUser, TokenVerifier};
use crate::config::AppConfig;
use crate::document::{GeneratedDocument, TypstRenderer};
use crate::gateway::{CvApiClient, ListScope, ReferenceLookup};
use crate::types::cv_data::AggregatedCvData;
use crate::types::response::{CvListing, ListQuery};
use crate::web::handlers::session_handlers::{Navigation, SubmitFailure};
use crate::wizard::{GenerationKind, Notification};

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, PATCH, DELETE, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

// ===== Sessions =====

#[post("/sessions", data = "<request>")]
pub async fn create_session(
    request: Option<Json<CreateSessionRequest>>,
    auth: AuthenticatedUser,
    sessions: &State<SessionStore>,
    services: &State<WebServices>,
) -> ApiResult<DataResponse<SessionData>> {
    handlers::create_session_handler(request, auth, sessions, services).await
}

#[get("/sessions/<id>")]
pub async fn get_session(
    id: &str,
    auth: AuthenticatedUser,
    sessions: &State<SessionStore>,
) -> ApiResult<DataResponse<SessionData>> {
    handlers::get_session_handler(id, auth, sessions).await
}

#[delete("/sessions/<id>")]
pub async fn delete_session(
    id: &str,
    auth: AuthenticatedUser,
    sessions: &State<SessionStore>,
) -> ApiResult<ActionResponse> {
    handlers::delete_session_handler(id, auth, sessions).await
}

#[get("/sessions/<id>/sections/<step>")]
pub async fn get_section(
    id: &str,
    step: &str,
    auth: AuthenticatedUser,
    sessions: &State<SessionStore>,
) -> ApiResult<DataResponse<SectionFormData>> {
    handlers::get_section_handler(id, step, auth, sessions).await
}

#[patch("/sessions/<id>/sections/<step>", data = "<patch>")]
pub async fn patch_section(
    id: &str,
    step: &str,
    patch: Json<SectionPatch>,
    auth: AuthenticatedUser,
    sessions: &State<SessionStore>,
) -> ApiResult<DataResponse<SectionFormData>> {
    handlers::patch_section_handler(id, step, patch, auth, sessions).await
}

#[post("/sessions/<id>/sections/<step>/submit", data = "<request>")]
pub async fn submit_section(
    id: &str,
    step: &str,
    request: Option<Json<SubmitSectionRequest>>,
    auth: AuthenticatedUser,
    sessions: &State<SessionStore>,
) -> Result<Json<DataResponse<SubmitData>>, SubmitFailure> {
    handlers::submit_section_handler(id, step, request, auth, sessions).await
}

#[post("/sessions/<id>/back")]
pub async fn step_back(
    id: &str,
    auth: AuthenticatedUser,
    sessions: &State<SessionStore>,
) -> ApiResult<DataResponse<SessionData>> {
    handlers::navigate_handler(id, Navigation::Back, auth, sessions).await
}

#[post("/sessions/<id>/skip")]
pub async fn skip_step(
    id: &str,
    auth: AuthenticatedUser,
    sessions: &State<SessionStore>,
) -> ApiResult<DataResponse<SessionData>> {
    handlers::navigate_handler(id, Navigation::Skip, auth, sessions).await
}

#[post("/sessions/<id>/jump/<step>")]
pub async fn jump_to_step(
    id: &str,
    step: u32,
    auth: AuthenticatedUser,
    sessions: &State<SessionStore>,
) -> ApiResult<DataResponse<SessionData>> {
    handlers::navigate_handler(id, Navigation::Jump(step), auth, sessions).await
}

// ===== Preview & Generation =====

#[get("/sessions/<id>/preview")]
pub async fn preview(
    id: &str,
    auth: AuthenticatedUser,
    sessions: &State<SessionStore>,
) -> Result<RawHtml<String>, ApiError> {
    handlers::preview_handler(id, auth, sessions).await
}

#[delete("/sessions/<id>/preview")]
pub async fn close_preview(
    id: &str,
    auth: AuthenticatedUser,
    sessions: &State<SessionStore>,
) -> ApiResult<ActionResponse> {
    handlers::close_preview_handler(id, auth, sessions).await
}

#[post("/sessions/<id>/complete")]
pub async fn complete(
    id: &str,
    auth: AuthenticatedUser,
    sessions: &State<SessionStore>,
) -> ApiResult<DataResponse<GenerationData>> {
    handlers::start_generation_handler(id, GenerationKind::Final, auth, sessions).await
}

#[post("/sessions/<id>/draft")]
pub async fn save_draft(
    id: &str,
    auth: AuthenticatedUser,
    sessions: &State<SessionStore>,
) -> ApiResult<DataResponse<GenerationData>> {
    handlers::start_generation_handler(id, GenerationKind::Draft, auth, sessions).await
}

#[post("/sessions/<id>/cancel")]
pub async fn cancel_generation(
    id: &str,
    auth: AuthenticatedUser,
    sessions: &State<SessionStore>,
) -> ApiResult<ActionResponse> {
    handlers::cancel_generation_handler(id, auth, sessions).await
}

#[get("/sessions/<id>/document")]
pub async fn document(
    id: &str,
    auth: AuthenticatedUser,
    sessions: &State<SessionStore>,
) -> ApiResult<DataResponse<GeneratedDocument>> {
    handlers::document_handler(id, auth, sessions).await
}

#[get("/sessions/<id>/notifications")]
pub async fn notifications(
    id: &str,
    auth: AuthenticatedUser,
    sessions: &State<SessionStore>,
) -> ApiResult<DataResponse<Vec<Notification>>> {
    handlers::notifications_handler(id, auth, sessions).await
}

// ===== Stored CVs & Reference Data =====

fn list_query(limit: Option<u32>, offset: Option<u32>, search_string: Option<String>) -> ListQuery {
    let defaults = ListQuery::default();
    ListQuery {
        limit: limit.unwrap_or(defaults.limit),
        offset: offset.unwrap_or(defaults.offset),
        search_string: search_string.filter(|s| !s.trim().is_empty()),
    }
}

#[get("/cvs?<limit>&<offset>&<search_string>")]
pub async fn list_cvs(
    limit: Option<u32>,
    offset: Option<u32>,
    search_string: Option<String>,
    auth: AuthenticatedUser,
    services: &State<WebServices>,
) -> ApiResult<DataResponse<CvListing>> {
    let query = list_query(limit, offset, search_string);
    handlers::list_cvs_handler(ListScope::All, query, auth, services).await
}

#[get("/cvs/drafts?<limit>&<offset>&<search_string>")]
pub async fn list_drafts(
    limit: Option<u32>,
    offset: Option<u32>,
    search_string: Option<String>,
    auth: AuthenticatedUser,
    services: &State<WebServices>,
) -> ApiResult<DataResponse<CvListing>> {
    let query = list_query(limit, offset, search_string);
    handlers::list_cvs_handler(ListScope::Drafts, query, auth, services).await
}

#[get("/cvs/archived?<limit>&<offset>&<search_string>")]
pub async fn list_archived(
    limit: Option<u32>,
    offset: Option<u32>,
    search_string: Option<String>,
    auth: AuthenticatedUser,
    services: &State<WebServices>,
) -> ApiResult<DataResponse<CvListing>> {
    let query = list_query(limit, offset, search_string);
    handlers::list_cvs_handler(ListScope::Archived, query, auth, services).await
}

#[post("/cvs/upload", data = "<upload>")]
pub async fn upload_cv(
    upload: Form<CvUploadForm<'_>>,
    auth: AuthenticatedUser,
    services: &State<WebServices>,
) -> ApiResult<DataResponse<AggregatedCvData>> {
    handlers::upload_cv_handler(upload, auth, services).await
}

#[get("/reference/<kind>")]
pub async fn reference(
    kind: &str,
    auth: AuthenticatedUser,
    services: &State<WebServices>,
) -> ApiResult<DataResponse<ReferenceLookup>> {
    handlers::reference_handler(kind, auth, services).await
}

#[get("/health")]
pub async fn health(sessions: &State<SessionStore>) -> Json<TextResponse> {
    handlers::health_handler(sessions).await
}

// Error catchers
#[rocket::catch(400)]
pub fn bad_request() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Invalid request format".to_string(),
        "BAD_REQUEST".to_string(),
        vec![
            "Check your request JSON format".to_string(),
            "Verify all required fields are present".to_string(),
        ],
    ))
}

#[rocket::catch(401)]
pub fn unauthorized() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Authentication required".to_string(),
        "AUTHORIZATION_ERROR".to_string(),
        vec!["Sign in again to refresh your session".to_string()],
    ))
}

#[rocket::catch(404)]
pub fn not_found() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Resource not found".to_string(),
        "NOT_FOUND".to_string(),
        vec!["Check the request path".to_string()],
    ))
}

#[rocket::catch(422)]
pub fn unprocessable() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Request body could not be understood".to_string(),
        "UNPROCESSABLE_REQUEST".to_string(),
        vec!["Verify field names and value types".to_string()],
    ))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Internal server error".to_string(),
        "INTERNAL_ERROR".to_string(),
        vec![
            "Try again in a few moments".to_string(),
            "Contact support if the problem persists".to_string(),
        ],
    ))
}

/// Attaches state, catchers and every route under `/api`.
pub fn mount_api(rocket: Rocket<Build>, services: WebServices) -> Rocket<Build> {
    rocket
        .attach(Cors)
        .manage(SessionStore::new(services.session_idle_timeout))
        .manage(services)
        .register(
            "/api",
            catchers![bad_request, unauthorized, not_found, unprocessable, internal_error],
        )
        .mount(
            "/api",
            routes![
                create_session,
                get_session,
                delete_session,
                get_section,
                patch_section,
                submit_section,
                step_back,
                skip_step,
                jump_to_step,
                preview,
                close_preview,
                complete,
                save_draft,
                cancel_generation,
                document,
                notifications,
                list_cvs,
                list_drafts,
                list_archived,
                upload_cv,
                reference,
                health,
                handlers::universal_options_handler,
            ],
        )
}

// Main server start function
pub async fn start_web_server(config: AppConfig) -> Result<()> {
    config.ensure_directories().await?;

    let gateway = CvApiClient::new(config.cv_api_url.clone(), config.request_timeout_secs)?;
    let services = WebServices {
        auth: Arc::new(TokenVerifier::from_config(&config).await?),
        gateway: Arc::new(gateway),
        renderer: Arc::new(TypstRenderer::new(
            config.typst_bin.clone(),
            config.scratch_dir.clone(),
        )),
        max_sessions: config.max_sessions,
        session_idle_timeout: Duration::from_secs(config.session_idle_secs),
    };

    let limits = Limits::default()
        .limit("file", 12.mebibytes())
        .limit("data-form", 12.mebibytes());
    let figment = rocket::Config::figment()
        .merge(("address", config.address.clone()))
        .merge(("port", config.port))
        .merge(("limits", limits));

    app_log!(info, "Starting CV builder API server on port {}", config.port);
    app_log!(info, "CV backend: {}", config.cv_api_url);
    app_log!(info, "Typst binary: {}", config.typst_bin.display());

    mount_api(rocket::custom(figment), services)
        .launch()
        .await
        .map_err(|e| anyhow::anyhow!("Rocket server failed: {}", e))?;

    Ok(())
}
