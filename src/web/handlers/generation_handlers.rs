// src/web/handlers/generation_handlers.rs
//! Preview, document generation and notification endpoints

use rocket::http::Status;
use rocket::response::content::RawHtml;
use rocket::serde::json::Json;
use rocket::State;

use crate::app_log;
use crate::auth::AuthenticatedUser;
use crate::document::GeneratedDocument;
use crate::web::handlers::helpers::{api_error, session, wizard_error};
use crate::web::sessions::SessionStore;
use crate::web::types::*;
use crate::wizard::{GenerationKind, Notification};

pub async fn preview_handler(
    id: &str,
    auth: AuthenticatedUser,
    sessions: &State<SessionStore>,
) -> Result<RawHtml<String>, ApiError> {
    let context = session(sessions, id, &auth).await?;
    context.controller().lock().await.open_preview();
    Ok(RawHtml(context.preview_html().await))
}

pub async fn close_preview_handler(
    id: &str,
    auth: AuthenticatedUser,
    sessions: &State<SessionStore>,
) -> ApiResult<ActionResponse> {
    let context = session(sessions, id, &auth).await?;
    context.controller().lock().await.close_preview();
    Ok(Json(ActionResponse::success(
        "Preview closed".to_string(),
        "preview_closed".to_string(),
    )))
}

pub async fn start_generation_handler(
    id: &str,
    kind: GenerationKind,
    auth: AuthenticatedUser,
    sessions: &State<SessionStore>,
) -> ApiResult<DataResponse<GenerationData>> {
    let context = session(sessions, id, &auth).await?;

    let handle = match kind {
        GenerationKind::Final => context.complete().await,
        GenerationKind::Draft => context.save_draft().await,
    }
    .map_err(wizard_error)?;

    app_log!(
        info,
        "User {} started {} generation #{}",
        auth.email(),
        kind,
        handle.ticket.id
    );

    let snapshot = context.controller().lock().await.snapshot();
    let message = match kind {
        GenerationKind::Final => "Generating your CV",
        GenerationKind::Draft => "Saving your draft",
    };
    Ok(Json(DataResponse::success(
        message.to_string(),
        GenerationData {
            ticket: handle.ticket,
            snapshot,
        },
    )))
}

pub async fn cancel_generation_handler(
    id: &str,
    auth: AuthenticatedUser,
    sessions: &State<SessionStore>,
) -> ApiResult<ActionResponse> {
    let context = session(sessions, id, &auth).await?;
    let ticket = context.cancel().await.map_err(wizard_error)?;

    Ok(Json(ActionResponse::success(
        format!("Cancelled {} generation #{}", ticket.kind, ticket.id),
        "generation_cancelled".to_string(),
    )))
}

pub async fn document_handler(
    id: &str,
    auth: AuthenticatedUser,
    sessions: &State<SessionStore>,
) -> ApiResult<DataResponse<GeneratedDocument>> {
    let context = session(sessions, id, &auth).await?;
    let document = context.last_document().await.ok_or_else(|| {
        api_error(
            Status::NotFound,
            "No document has been generated in this session".to_string(),
            "NO_DOCUMENT",
            &["Complete the CV or save a draft first"],
        )
    })?;

    Ok(Json(DataResponse::success(
        document.file_name.clone(),
        document,
    )))
}

pub async fn notifications_handler(
    id: &str,
    auth: AuthenticatedUser,
    sessions: &State<SessionStore>,
) -> ApiResult<DataResponse<Vec<Notification>>> {
    let context = session(sessions, id, &auth).await?;
    let notifications = context.controller().lock().await.take_notifications();
    Ok(Json(DataResponse::success(
        format!("{} notification(s)", notifications.len()),
        notifications,
    )))
}
