// src/types/response.rs
//! Payloads exchanged with the CV REST backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::cv_data::AggregatedCvData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CvStatus {
    Draft,
    Complete,
    Archived,
}

impl fmt::Display for CvStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CvStatus::Draft => "draft",
            CvStatus::Complete => "complete",
            CvStatus::Archived => "archived",
        };
        f.write_str(s)
    }
}

// ===== Listings =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListQuery {
    pub limit: u32,
    pub offset: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_string: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            limit: 10,
            offset: 0,
            search_string: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvSummary {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub version: u32,
    pub status: CvStatus,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvListing {
    pub items: Vec<CvSummary>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
}

// ===== CV Content =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvInformation {
    pub email: String,
    pub version: u32,
    pub status: CvStatus,
    pub content: AggregatedCvData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveCvRequest {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    pub status: CvStatus,
    pub content: AggregatedCvData,
    pub file_name: String,
    pub file_base64: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveCvResponse {
    pub status: String,
    pub id: String,
    pub version: u32,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadCvResponse {
    pub status: String,
    pub cv_data: AggregatedCvData,
    #[serde(default)]
    pub message: Option<String>,
}

// ===== Reference Data =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceOption {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Credentials,
    Sites,
    Countries,
}

impl ReferenceKind {
    pub fn endpoint(self) -> &'static str {
        match self {
            ReferenceKind::Credentials => "/reference/credentials",
            ReferenceKind::Sites => "/reference/sites",
            ReferenceKind::Countries => "/reference/countries",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReferenceKind::Credentials => "credentials",
            ReferenceKind::Sites => "sites",
            ReferenceKind::Countries => "countries",
        };
        f.write_str(s)
    }
}

impl FromStr for ReferenceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "credentials" => Ok(ReferenceKind::Credentials),
            "sites" => Ok(ReferenceKind::Sites),
            "countries" => Ok(ReferenceKind::Countries),
            other => Err(format!("Unknown reference list: {}", other)),
        }
    }
}
