// src/web/handlers/system_handlers.rs
use rocket::serde::json::Json;
use rocket::State;

use crate::app_log;
use crate::auth::AuthenticatedUser;
use crate::gateway::{lookup_options, ReferenceLookup};
use crate::types::response::ReferenceKind;
use crate::web::handlers::helpers::api_error;
use crate::web::sessions::{SessionStore, WebServices};
use crate::web::types::*;
use rocket::http::Status;

pub async fn reference_handler(
    kind: &str,
    auth: AuthenticatedUser,
    services: &State<WebServices>,
) -> ApiResult<DataResponse<ReferenceLookup>> {
    let kind: ReferenceKind = kind.parse().map_err(|e: String| {
        api_error(
            Status::NotFound,
            e,
            "UNKNOWN_REFERENCE_LIST",
            &["Available lists: credentials, sites, countries"],
        )
    })?;

    let lookup = lookup_options(services.gateway.as_ref(), auth.token(), kind).await;
    let message = match &lookup.notification {
        Some(notification) => notification.message.clone(),
        None => format!("{} {} option(s)", lookup.options.len(), kind),
    };
    Ok(Json(DataResponse::success(message, lookup)))
}

/// Also drops idle sessions.
pub async fn health_handler(sessions: &State<SessionStore>) -> Json<TextResponse> {
    let evicted = sessions.evict_idle().await;
    let open = sessions.len().await;
    app_log!(debug, "Health check, {} open session(s), {} evicted", open, evicted);
    Json(TextResponse::success(format!(
        "CV builder API is running ({} open session(s))",
        open
    )))
}
