// src/gateway/client.rs
//! reqwest client for the CV REST backend

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;

use crate::app_log;
use crate::error::GatewayError;
use crate::gateway::{ListScope, PersistenceGateway};
use crate::types::cv_data::AggregatedCvData;
use crate::types::response::{
    CvInformation, CvListing, ListQuery, ReferenceKind, ReferenceOption, SaveCvRequest,
    SaveCvResponse, UploadCvResponse,
};
use crate::utils::{content_type_for, get_file_extension};

const UPLOAD_CV_ENDPOINT: &str = "/cv/upload";
const CV_INFORMATION_ENDPOINT: &str = "/cv/information";
const SAVE_CV_ENDPOINT: &str = "/cv/save";

pub const DEFAULT_TIMEOUT_SECS: u64 = 400;

const SUCCESS: &str = "success";

pub struct CvApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl CvApiClient {
    pub fn new(base_url: impl Into<String>, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Checks the status and decodes the body, keeping the raw text for
    /// error reports.
    async fn decode<R: DeserializeOwned>(response: reqwest::Response) -> Result<R, GatewayError> {
        let status = response.status();
        app_log!(trace, "Response status: {}", status);

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            app_log!(error, "CV backend error response: {}", error_text);
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let response_text = response.text().await?;
        serde_json::from_str(&response_text).map_err(|e| {
            app_log!(debug, "Undecodable CV backend response: {}", response_text);
            GatewayError::Decode(e.to_string())
        })
    }
}

#[async_trait]
impl PersistenceGateway for CvApiClient {
    async fn list_cvs(
        &self,
        token: &str,
        scope: ListScope,
        query: &ListQuery,
    ) -> Result<CvListing, GatewayError> {
        let url = self.url(scope.endpoint());
        app_log!(trace, "Listing CVs: {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn upload_cv(
        &self,
        token: &str,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<AggregatedCvData, GatewayError> {
        let content_type = get_file_extension(file_name)
            .and_then(|ext| content_type_for(&ext))
            .ok_or_else(|| GatewayError::UnsupportedFile(file_name.to_string()))?;
        let url = self.url(UPLOAD_CV_ENDPOINT);

        let part = Part::bytes(content)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = Form::new().part("file", part);

        app_log!(info, "Uploading CV {} to {}", file_name, url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;

        let upload: UploadCvResponse = Self::decode(response).await?;
        if upload.status == SUCCESS {
            Ok(upload.cv_data)
        } else {
            Err(GatewayError::Rejected(
                upload.message.unwrap_or(upload.status),
            ))
        }
    }

    async fn fetch_cv_information(
        &self,
        token: &str,
        email: &str,
        version: u32,
    ) -> Result<CvInformation, GatewayError> {
        let url = self.url(CV_INFORMATION_ENDPOINT);
        app_log!(trace, "Fetching CV information for {} v{}", email, version);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&[("email", email.to_string()), ("version", version.to_string())])
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn save_cv(
        &self,
        token: &str,
        request: &SaveCvRequest,
    ) -> Result<SaveCvResponse, GatewayError> {
        let url = self.url(SAVE_CV_ENDPOINT);
        app_log!(
            info,
            "Saving {} CV for {} ({})",
            request.status,
            request.email,
            request.file_name
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;

        let saved: SaveCvResponse = Self::decode(response).await?;
        if saved.status == SUCCESS {
            Ok(saved)
        } else {
            Err(GatewayError::Rejected(saved.message.unwrap_or(saved.status)))
        }
    }

    async fn reference_options(
        &self,
        token: &str,
        kind: ReferenceKind,
    ) -> Result<Vec<ReferenceOption>, GatewayError> {
        let url = self.url(kind.endpoint());
        app_log!(trace, "Fetching {} reference list", kind);

        let response = self.client.get(&url).bearer_auth(token).send().await?;
        Self::decode(response).await
    }
}
