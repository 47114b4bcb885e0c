// src/gateway/reference.rs
use serde::Serialize;

use crate::app_log;
use crate::gateway::PersistenceGateway;
use crate::types::response::{ReferenceKind, ReferenceOption};
use crate::wizard::Notification;

/// Options for a select field. A failed lookup never blocks the form: it
/// yields no options plus an error notification for the user.
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceLookup {
    pub kind: String,
    pub options: Vec<ReferenceOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,
}

pub async fn lookup_options(
    gateway: &dyn PersistenceGateway,
    token: &str,
    kind: ReferenceKind,
) -> ReferenceLookup {
    match gateway.reference_options(token, kind).await {
        Ok(options) => ReferenceLookup {
            kind: kind.to_string(),
            options,
            notification: None,
        },
        Err(e) => {
            app_log!(error, "Failed to load {} reference list: {}", kind, e);
            ReferenceLookup {
                kind: kind.to_string(),
                options: Vec::new(),
                notification: Some(Notification::error(format!(
                    "Could not load {} options. Please try again later.",
                    kind
                ))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use crate::gateway::ListScope;
    use crate::types::cv_data::AggregatedCvData;
    use crate::types::response::{
        CvInformation, CvListing, ListQuery, SaveCvRequest, SaveCvResponse,
    };
    use crate::wizard::NotificationLevel;
    use async_trait::async_trait;

    struct ReferenceOnly(Result<Vec<ReferenceOption>, u16>);

    #[async_trait]
    impl PersistenceGateway for ReferenceOnly {
        async fn list_cvs(
            &self,
            _token: &str,
            _scope: ListScope,
            _query: &ListQuery,
        ) -> Result<CvListing, GatewayError> {
            unimplemented!()
        }

        async fn upload_cv(
            &self,
            _token: &str,
            _file_name: &str,
            _content: Vec<u8>,
        ) -> Result<AggregatedCvData, GatewayError> {
            unimplemented!()
        }

        async fn fetch_cv_information(
            &self,
            _token: &str,
            _email: &str,
            _version: u32,
        ) -> Result<CvInformation, GatewayError> {
            unimplemented!()
        }

        async fn save_cv(
            &self,
            _token: &str,
            _request: &SaveCvRequest,
        ) -> Result<SaveCvResponse, GatewayError> {
            unimplemented!()
        }

        async fn reference_options(
            &self,
            _token: &str,
            _kind: ReferenceKind,
        ) -> Result<Vec<ReferenceOption>, GatewayError> {
            match &self.0 {
                Ok(options) => Ok(options.clone()),
                Err(status) => Err(GatewayError::Status {
                    status: *status,
                    body: "down".to_string(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_lookup_success() {
        let gateway = ReferenceOnly(Ok(vec![ReferenceOption {
            label: "Doctor of Medicine".to_string(),
            value: "MD".to_string(),
        }]));
        let lookup = lookup_options(&gateway, "token", ReferenceKind::Credentials).await;
        assert_eq!(lookup.options.len(), 1);
        assert!(lookup.notification.is_none());
    }

    #[tokio::test]
    async fn test_lookup_failure_yields_empty_list_and_notification() {
        let gateway = ReferenceOnly(Err(503));
        let lookup = lookup_options(&gateway, "token", ReferenceKind::Sites).await;
        assert!(lookup.options.is_empty());
        let notification = lookup.notification.unwrap();
        assert_eq!(notification.level, NotificationLevel::Error);
        assert!(notification.message.contains("sites"));
    }
}
