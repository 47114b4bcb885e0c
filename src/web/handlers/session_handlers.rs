// src/web/handlers/session_handlers.rs
//! Session lifecycle, section forms and step navigation

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;

use crate::auth::AuthenticatedUser;
use crate::web::handlers::helpers::{
    api_error, form_error, gateway_error, parse_section, session, wizard_error,
};
use crate::web::sessions::{SessionStore, WebServices};
use crate::web::types::*;
use crate::wizard::{CvOwner, FocusRecorder, SectionForm, SubmitOutcome, WizardController};
use crate::app_log;

pub async fn create_session_handler(
    request: Option<Json<CreateSessionRequest>>,
    auth: AuthenticatedUser,
    sessions: &State<SessionStore>,
    services: &State<WebServices>,
) -> ApiResult<DataResponse<SessionData>> {
    let request = request.map(|r| r.into_inner()).unwrap_or_default();
    let controller = match request.data {
        Some(data) => WizardController::with_data(data),
        None => WizardController::new(),
    };
    let owner = CvOwner {
        email: auth.email().to_string(),
        version: None,
    };
    let context = SessionStore::create_context(services, controller, owner, auth.token());
    app_log!(info, "User {} opening a wizard session", auth.email());

    if let Some(version) = request.version {
        app_log!(info, "Prefilling session from stored version {}", version);
        context.load_version(version).await.map_err(gateway_error)?;
    }

    let context = sessions
        .insert(context, services.max_sessions)
        .await
        .map_err(|limit| {
            api_error(
                Status::ServiceUnavailable,
                format!("Too many open sessions (limit {})", limit.0),
                "TOO_MANY_SESSIONS",
                &["Close unused wizard sessions", "Try again later"],
            )
        })?;

    let snapshot = context.controller().lock().await.snapshot();
    Ok(Json(DataResponse::success(
        "Wizard session created".to_string(),
        SessionData {
            session_id: context.id(),
            snapshot,
        },
    )))
}

pub async fn get_session_handler(
    id: &str,
    auth: AuthenticatedUser,
    sessions: &State<SessionStore>,
) -> ApiResult<DataResponse<SessionData>> {
    let context = session(sessions, id, &auth).await?;
    let snapshot = context.controller().lock().await.snapshot();
    Ok(Json(DataResponse::success(
        "Wizard state".to_string(),
        SessionData {
            session_id: context.id(),
            snapshot,
        },
    )))
}

pub async fn delete_session_handler(
    id: &str,
    auth: AuthenticatedUser,
    sessions: &State<SessionStore>,
) -> ApiResult<ActionResponse> {
    let context = session(sessions, id, &auth).await?;
    // an in-flight generation must not persist after the session is gone
    let _ = context.cancel().await;
    sessions.remove(context.id(), auth.email()).await;

    Ok(Json(ActionResponse::success(
        "Wizard session closed".to_string(),
        "session_closed".to_string(),
    )))
}

// ===== Section Forms =====

pub async fn get_section_handler(
    id: &str,
    step: &str,
    auth: AuthenticatedUser,
    sessions: &State<SessionStore>,
) -> ApiResult<DataResponse<SectionFormData>> {
    let context = session(sessions, id, &auth).await?;
    let key = parse_section(step)?;

    let controller = context.controller().lock().await;
    let form = SectionForm::mount(key, &*controller);

    Ok(Json(DataResponse::success(
        format!("{} form", key),
        SectionFormData {
            section: key,
            step: key.position(),
            repeatable: key.is_repeatable(),
            fields: key.fields(),
            value: form.value(),
        },
    )))
}

pub async fn patch_section_handler(
    id: &str,
    step: &str,
    patch: Json<SectionPatch>,
    auth: AuthenticatedUser,
    sessions: &State<SessionStore>,
) -> ApiResult<DataResponse<SectionFormData>> {
    let context = session(sessions, id, &auth).await?;
    let key = parse_section(step)?;

    let mut controller = context.controller().lock().await;
    let mut form = SectionForm::mount(key, &*controller);

    match patch.into_inner() {
        SectionPatch::Replace { value } => form.replace(value, &mut controller),
        SectionPatch::SetField {
            index,
            field,
            value,
        } => form
            .set_field(index, &field, value, &mut controller)
            .map_err(form_error)?,
        SectionPatch::AddRecord => {
            form.add_record(&mut controller).map_err(form_error)?;
        }
        SectionPatch::RemoveRecord { index } => form
            .remove_record(index, &mut controller)
            .map_err(form_error)?,
    }

    Ok(Json(DataResponse::success(
        format!("{} updated", key),
        SectionFormData {
            section: key,
            step: key.position(),
            repeatable: key.is_repeatable(),
            fields: key.fields(),
            value: form.value(),
        },
    )))
}

#[derive(rocket::Responder)]
pub enum SubmitFailure {
    #[response(status = 422)]
    Invalid(Json<ValidationErrorResponse>),
    Error(ApiError),
}

impl From<ApiError> for SubmitFailure {
    fn from(err: ApiError) -> Self {
        SubmitFailure::Error(err)
    }
}

pub async fn submit_section_handler(
    id: &str,
    step: &str,
    request: Option<Json<SubmitSectionRequest>>,
    auth: AuthenticatedUser,
    sessions: &State<SessionStore>,
) -> Result<Json<DataResponse<SubmitData>>, SubmitFailure> {
    let context = session(sessions, id, &auth).await?;
    let key = parse_section(step)?;
    let request = request.map(|r| r.into_inner()).unwrap_or_default();

    let mut controller = context.controller().lock().await;
    if controller.current_section() != key {
        return Err(api_error(
            Status::Conflict,
            format!(
                "{} is not the active step (active: {})",
                key,
                controller.current_section()
            ),
            "STEP_NOT_ACTIVE",
            &["Jump to the step before submitting it"],
        )
        .into());
    }

    let mut form = SectionForm::mount(key, &*controller);
    if let Some(value) = request.value {
        form.replace(value, &mut controller);
    }

    let mut focus = FocusRecorder::default();
    match form.submit(&mut controller, &mut focus, request.is_draft_save) {
        SubmitOutcome::Submitted { section, .. } => Ok(Json(DataResponse::success(
            format!("{} saved", section),
            SubmitData {
                section,
                snapshot: controller.snapshot(),
            },
        ))),
        SubmitOutcome::Rejected { errors, focus } => {
            app_log!(debug, "Submit of {} rejected at {}", key, focus);
            Err(SubmitFailure::Invalid(Json(ValidationErrorResponse::new(
                errors,
                focus,
                controller.snapshot(),
            ))))
        }
    }
}

// ===== Navigation =====

pub enum Navigation {
    Back,
    Skip,
    Jump(u32),
}

pub async fn navigate_handler(
    id: &str,
    navigation: Navigation,
    auth: AuthenticatedUser,
    sessions: &State<SessionStore>,
) -> ApiResult<DataResponse<SessionData>> {
    let context = session(sessions, id, &auth).await?;
    let mut controller = context.controller().lock().await;

    match navigation {
        Navigation::Back => controller.retreat(),
        Navigation::Skip => controller.skip(),
        Navigation::Jump(step) => controller.jump_to_step(step).map_err(wizard_error)?,
    }

    Ok(Json(DataResponse::success(
        format!("Now on step {}", controller.current_step()),
        SessionData {
            session_id: context.id(),
            snapshot: controller.snapshot(),
        },
    )))
}
