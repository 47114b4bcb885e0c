// src/web/handlers/cv_handlers.rs
//! Stored CV listings and upload

use rocket::form::Form;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use std::path::Path;

use crate::auth::AuthenticatedUser;
use crate::gateway::ListScope;
use crate::types::cv_data::AggregatedCvData;
use crate::types::response::{CvListing, ListQuery};
use crate::utils::{validate_file_extension, DOCX_CONTENT_TYPE, UPLOAD_EXTENSIONS};
use crate::web::handlers::helpers::{api_error, gateway_error};
use crate::web::sessions::WebServices;
use crate::web::types::*;
use crate::app_log;

pub const MAX_UPLOAD_SIZE: u64 = 10 * 1024 * 1024;

pub async fn list_cvs_handler(
    scope: ListScope,
    query: ListQuery,
    auth: AuthenticatedUser,
    services: &State<WebServices>,
) -> ApiResult<DataResponse<CvListing>> {
    let listing = services
        .gateway
        .list_cvs(auth.token(), scope, &query)
        .await
        .map_err(gateway_error)?;

    Ok(Json(DataResponse::success(
        format!("{} of {} CV(s)", listing.items.len(), listing.total),
        listing,
    )))
}

pub async fn upload_cv_handler(
    mut upload: Form<CvUploadForm<'_>>,
    auth: AuthenticatedUser,
    services: &State<WebServices>,
) -> ApiResult<DataResponse<AggregatedCvData>> {
    app_log!(info, "User {} uploading CV", auth.email());

    let content_type = upload.file.content_type();
    let is_pdf = content_type.is_some_and(|ct| ct.is_pdf());
    let is_docx = content_type.is_some_and(|ct| ct.to_string().contains(DOCX_CONTENT_TYPE));

    let file_name = upload
        .file
        .raw_name()
        .and_then(|n| {
            Path::new(n.dangerous_unsafe_unsanitized_raw().as_str())
                .file_name()
                .and_then(|f| f.to_str())
                .map(str::to_string)
        })
        .filter(|n| validate_file_extension(n, UPLOAD_EXTENSIONS).is_ok())
        .unwrap_or_else(|| {
            if is_pdf {
                "uploaded_cv.pdf".to_string()
            } else {
                "uploaded_cv.docx".to_string()
            }
        });

    if !is_pdf && !is_docx {
        let received_type = content_type
            .map(|ct| ct.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        return Err(api_error(
            Status::BadRequest,
            format!(
                "Only PDF and Word documents are supported. Received: {}",
                received_type
            ),
            "INVALID_FORMAT",
            &["Upload a PDF file (.pdf)", "Upload a Word document (.docx)"],
        ));
    }

    if upload.file.len() > MAX_UPLOAD_SIZE {
        return Err(api_error(
            Status::PayloadTooLarge,
            "File size exceeds 10MB limit".to_string(),
            "FILE_TOO_LARGE",
            &["Compress your CV file", "Use a smaller file size (max 10MB)"],
        ));
    }

    let temp_path = std::env::temp_dir().join(format!("cv_upload_{}", uuid::Uuid::new_v4()));
    if let Err(e) = upload.file.persist_to(&temp_path).await {
        app_log!(error, "Failed to save uploaded file: {}", e);
        return Err(api_error(
            Status::InternalServerError,
            "Failed to process uploaded file".to_string(),
            "FILE_SAVE_ERROR",
            &["Try uploading the file again"],
        ));
    }

    let content = tokio::fs::read(&temp_path).await;
    let _ = tokio::fs::remove_file(&temp_path).await;
    let content = content.map_err(|e| {
        app_log!(error, "Failed to read uploaded file: {}", e);
        api_error(
            Status::InternalServerError,
            "Failed to process uploaded file".to_string(),
            "FILE_SAVE_ERROR",
            &["Try uploading the file again"],
        )
    })?;

    let data = services
        .gateway
        .upload_cv(auth.token(), &file_name, content)
        .await
        .map_err(gateway_error)?;

    let sections = data.sections().filter(|(_, v)| !v.is_empty()).count();
    app_log!(info, "Parsed {} into {} section(s)", file_name, sections);

    Ok(Json(DataResponse::success(
        format!("CV parsed: {} section(s) found", sections),
        data,
    )))
}
