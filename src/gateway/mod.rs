// src/gateway/mod.rs
//! Persistence gateway to the CV REST backend.

pub mod client;
pub mod reference;

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::types::cv_data::AggregatedCvData;
use crate::types::response::{
    CvInformation, CvListing, ListQuery, ReferenceKind, ReferenceOption, SaveCvRequest,
    SaveCvResponse,
};

pub use client::CvApiClient;
pub use reference::{lookup_options, ReferenceLookup};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    All,
    Drafts,
    Archived,
}

impl ListScope {
    pub fn endpoint(self) -> &'static str {
        match self {
            ListScope::All => "/cv",
            ListScope::Drafts => "/cv/drafts",
            ListScope::Archived => "/cv/archived",
        }
    }
}

/// Every call forwards the caller's SSO bearer token.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn list_cvs(
        &self,
        token: &str,
        scope: ListScope,
        query: &ListQuery,
    ) -> Result<CvListing, GatewayError>;

    /// Sends a PDF or DOCX for parsing and returns the extracted aggregate.
    async fn upload_cv(
        &self,
        token: &str,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<AggregatedCvData, GatewayError>;

    async fn fetch_cv_information(
        &self,
        token: &str,
        email: &str,
        version: u32,
    ) -> Result<CvInformation, GatewayError>;

    async fn save_cv(
        &self,
        token: &str,
        request: &SaveCvRequest,
    ) -> Result<SaveCvResponse, GatewayError>;

    async fn reference_options(
        &self,
        token: &str,
        kind: ReferenceKind,
    ) -> Result<Vec<ReferenceOption>, GatewayError>;
}
