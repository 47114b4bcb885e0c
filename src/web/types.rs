// src/web/types.rs
//! Request bodies and the standard JSON envelopes every endpoint answers with.

use rocket::form::FromForm;
use rocket::fs::TempFile;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::types::cv_data::{AggregatedCvData, SectionValue};
use crate::types::section::{FieldSpec, SectionKey};
use crate::wizard::{FieldPath, GenerationTicket, ValidationErrors, WizardSnapshot};

// ===== Standard Envelopes =====

#[derive(Serialize)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum ResponseType {
    Text,
    Data,
    Action,
    Error,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct TextResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct DataResponse<T> {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    pub data: T,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ActionResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    pub action: String,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct StandardErrorResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub suggestions: Vec<String>,
}

/// 422 body of a rejected section submit.
#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ValidationErrorResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub errors: ValidationErrors,
    pub focus: FieldPath,
    pub snapshot: WizardSnapshot,
}

pub type ApiError = (Status, Json<StandardErrorResponse>);
pub type ApiResult<T> = Result<Json<T>, ApiError>;

impl TextResponse {
    pub fn success(message: String) -> Self {
        Self {
            response_type: ResponseType::Text,
            success: true,
            message,
        }
    }
}

impl<T> DataResponse<T> {
    pub fn success(message: String, data: T) -> Self {
        Self {
            response_type: ResponseType::Data,
            success: true,
            message,
            data,
        }
    }
}

impl ActionResponse {
    pub fn success(message: String, action: String) -> Self {
        Self {
            response_type: ResponseType::Action,
            success: true,
            message,
            action,
        }
    }
}

impl StandardErrorResponse {
    pub fn new(error: String, error_code: String, suggestions: Vec<String>) -> Self {
        Self {
            response_type: ResponseType::Error,
            success: false,
            error,
            error_code,
            suggestions,
        }
    }
}

impl ValidationErrorResponse {
    pub fn new(errors: ValidationErrors, focus: FieldPath, snapshot: WizardSnapshot) -> Self {
        Self {
            response_type: ResponseType::Error,
            success: false,
            error: format!("{} field(s) need attention, starting with {}", errors.len(), focus),
            error_code: "VALIDATION_FAILED".to_string(),
            errors,
            focus,
            snapshot,
        }
    }
}

// ===== Requests =====

#[derive(Debug, Default, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct CreateSessionRequest {
    /// Prefill from an uploaded CV.
    #[serde(default)]
    pub data: Option<AggregatedCvData>,
    /// Prefill from a stored version of the caller's CV.
    #[serde(default)]
    pub version: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(crate = "rocket::serde", tag = "op", rename_all = "snake_case")]
pub enum SectionPatch {
    Replace { value: SectionValue },
    SetField {
        #[serde(default)]
        index: usize,
        field: String,
        value: Value,
    },
    AddRecord,
    RemoveRecord { index: usize },
}

#[derive(Debug, Default, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct SubmitSectionRequest {
    #[serde(default)]
    pub value: Option<SectionValue>,
    #[serde(default)]
    pub is_draft_save: bool,
}

#[derive(FromForm)]
pub struct CvUploadForm<'f> {
    pub file: TempFile<'f>,
}

// ===== Response Payloads =====

#[derive(Serialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct SessionData {
    pub session_id: Uuid,
    pub snapshot: WizardSnapshot,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct SectionFormData {
    pub section: SectionKey,
    pub step: u32,
    pub repeatable: bool,
    pub fields: &'static [FieldSpec],
    pub value: SectionValue,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct SubmitData {
    pub section: SectionKey,
    pub snapshot: WizardSnapshot,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct GenerationData {
    pub ticket: GenerationTicket,
    pub snapshot: WizardSnapshot,
}
