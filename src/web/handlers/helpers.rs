// src/web/handlers/helpers.rs
//! Error envelopes shared by the handlers

use rocket::http::Status;
use rocket::serde::json::Json;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::{FormError, GatewayError, WizardError};
use crate::types::section::SectionKey;
use crate::web::sessions::SessionStore;
use crate::web::types::{ApiError, StandardErrorResponse};
use crate::wizard::WizardContext;

pub fn api_error(status: Status, error: String, code: &str, suggestions: &[&str]) -> ApiError {
    (
        status,
        Json(StandardErrorResponse::new(
            error,
            code.to_string(),
            suggestions.iter().map(|s| s.to_string()).collect(),
        )),
    )
}

pub fn wizard_error(err: WizardError) -> ApiError {
    match &err {
        WizardError::UnknownStep(_) => api_error(
            Status::NotFound,
            err.to_string(),
            "UNKNOWN_STEP",
            &["Steps are numbered 1 to 13"],
        ),
        WizardError::Incomplete { .. } => api_error(
            Status::Conflict,
            err.to_string(),
            "INCOMPLETE_CV",
            &["Complete the listed sections, then try again"],
        ),
        WizardError::GenerationInFlight { .. } => api_error(
            Status::Conflict,
            err.to_string(),
            "GENERATION_IN_PROGRESS",
            &["Wait for the current generation to finish or cancel it"],
        ),
        WizardError::NoGenerationInFlight => api_error(
            Status::Conflict,
            err.to_string(),
            "NO_GENERATION",
            &[],
        ),
    }
}

pub fn form_error(err: FormError) -> ApiError {
    api_error(
        Status::UnprocessableEntity,
        err.to_string(),
        "INVALID_FORM_CHANGE",
        &["Check the field name and record index"],
    )
}

pub fn gateway_error(err: GatewayError) -> ApiError {
    let status = match &err {
        GatewayError::UnsupportedFile(_) => Status::BadRequest,
        GatewayError::Status { status: 404, .. } => Status::NotFound,
        _ => Status::BadGateway,
    };
    api_error(
        status,
        err.to_string(),
        err.code(),
        &["Try again in a few moments"],
    )
}

pub fn parse_section(step: &str) -> Result<SectionKey, ApiError> {
    step.parse::<SectionKey>().map_err(|e| {
        api_error(
            Status::NotFound,
            e,
            "UNKNOWN_SECTION",
            &["Use a step number (1-13) or a section name"],
        )
    })
}

/// Resolves a session owned by the caller.
pub async fn session(
    sessions: &SessionStore,
    id: &str,
    auth: &AuthenticatedUser,
) -> Result<Arc<WizardContext>, ApiError> {
    let not_found = || {
        api_error(
            Status::NotFound,
            format!("Session not found: {}", id),
            "SESSION_NOT_FOUND",
            &["Start a new wizard session"],
        )
    };
    let id = Uuid::parse_str(id).map_err(|_| not_found())?;
    sessions.get(id, auth.email()).await.ok_or_else(not_found)
}
