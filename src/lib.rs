// src/lib.rs
//! Healthcare CV builder: wizard state machine, section forms, document
//! assembly and persistence gateway, with an HTTP surface for the browser client.

pub mod auth;
pub mod config;
pub mod document;
pub mod error;
pub mod gateway;
pub mod types;
pub mod utils;
pub mod web;
pub mod wizard;

pub use config::AppConfig;
pub use document::{DocumentAssembly, GeneratedDocument};
pub use error::{AssemblyError, FormError, GatewayError, WizardError};
pub use gateway::{CvApiClient, PersistenceGateway};
pub use types::cv_data::{AggregatedCvData, Record, SectionValue};
pub use types::section::SectionKey;
pub use web::start_web_server;
pub use wizard::{SectionForm, WizardContext, WizardController};

/// Log through `tracing` with the level as first argument: `app_log!(info, "...")`.
#[macro_export]
macro_rules! app_log {
    (trace, $($arg:tt)+) => { ::tracing::trace!($($arg)+) };
    (debug, $($arg:tt)+) => { ::tracing::debug!($($arg)+) };
    (info, $($arg:tt)+) => { ::tracing::info!($($arg)+) };
    (warn, $($arg:tt)+) => { ::tracing::warn!($($arg)+) };
    (error, $($arg:tt)+) => { ::tracing::error!($($arg)+) };
}

/// Open an info-level span: `app_span!("name", field = %value)`.
#[macro_export]
macro_rules! app_span {
    ($($arg:tt)+) => { ::tracing::info_span!($($arg)+) };
}
