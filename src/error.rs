// src/error.rs
//! Domain errors. Application glue (CLI, startup) stays on `anyhow`.

use thiserror::Error;

use crate::types::section::SectionKey;
use crate::wizard::GenerationKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("Unknown step: {0}")]
    UnknownStep(u32),

    #[error(
        "Your CV is {progress}% complete. Complete these sections first: {}",
        .incomplete.join(", ")
    )]
    Incomplete { progress: u8, incomplete: Vec<String> },

    #[error("A {active} generation is already in progress")]
    GenerationInFlight { active: GenerationKind },

    #[error("No document generation is in progress")]
    NoGenerationInFlight,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("{section} has no record at index {index}")]
    RecordOutOfRange { section: SectionKey, index: usize },

    #[error("{section} has no field named '{field}'")]
    UnknownField { section: SectionKey, field: String },

    #[error("{0} holds a single record")]
    NotRepeatable(SectionKey),
}

#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("Document generation already in progress")]
    Busy,

    #[error("Document generation cancelled")]
    Cancelled,

    #[error("Document rendering failed: {0}")]
    Render(String),

    #[error("I/O error during document rendering: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Service returned error status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode service response: {0}")]
    Decode(String),

    #[error("Service rejected the request: {0}")]
    Rejected(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFile(String),
}

impl GatewayError {
    /// Short machine-readable code used in HTTP error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::Transport(_) => "BACKEND_UNREACHABLE",
            GatewayError::Status { .. } => "BACKEND_ERROR",
            GatewayError::Decode(_) => "BACKEND_DECODE_ERROR",
            GatewayError::Rejected(_) => "BACKEND_REJECTED",
            GatewayError::UnsupportedFile(_) => "INVALID_FORMAT",
        }
    }
}
