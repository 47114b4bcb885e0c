// src/wizard/context.rs
//! One wizard session: the controller plus the collaborators the generation
//! lifecycle needs, passed explicitly instead of living in globals.

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::document::{DocumentAssembly, GeneratedDocument};
use crate::error::{AssemblyError, GatewayError, WizardError};
use crate::gateway::PersistenceGateway;
use crate::types::cv_data::AggregatedCvData;
use crate::types::response::{CvStatus, SaveCvRequest, SaveCvResponse};
use crate::wizard::controller::{GenerationKind, GenerationTicket, WizardController};
use crate::wizard::notification::Notification;
use crate::{app_log, app_span};

/// Whose CV this session edits. `version` is set once the backend has
/// stored a copy, so later saves update that version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CvOwner {
    pub email: String,
    pub version: Option<u32>,
}

#[derive(Debug)]
pub enum GenerationOutcome {
    Saved {
        document: GeneratedDocument,
        response: SaveCvResponse,
    },
    Cancelled,
    Failed(String),
}

pub struct GenerationHandle {
    pub ticket: GenerationTicket,
    pub task: JoinHandle<GenerationOutcome>,
}

#[derive(Clone)]
struct Shared {
    controller: Arc<Mutex<WizardController>>,
    assembly: Arc<DocumentAssembly>,
    gateway: Arc<dyn PersistenceGateway>,
    owner: Arc<Mutex<CvOwner>>,
    bearer_token: Arc<str>,
    last_document: Arc<Mutex<Option<GeneratedDocument>>>,
}

pub struct WizardContext {
    id: Uuid,
    shared: Shared,
    active: Mutex<Option<CancellationToken>>,
}

impl WizardContext {
    pub fn new(
        controller: WizardController,
        assembly: Arc<DocumentAssembly>,
        gateway: Arc<dyn PersistenceGateway>,
        owner: CvOwner,
        bearer_token: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            shared: Shared {
                controller: Arc::new(Mutex::new(controller)),
                assembly,
                gateway,
                owner: Arc::new(Mutex::new(owner)),
                bearer_token: bearer_token.into(),
                last_document: Arc::new(Mutex::new(None)),
            },
            active: Mutex::new(None),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn controller(&self) -> &Arc<Mutex<WizardController>> {
        &self.shared.controller
    }

    pub fn gateway(&self) -> &Arc<dyn PersistenceGateway> {
        &self.shared.gateway
    }

    pub fn bearer_token(&self) -> &str {
        &self.shared.bearer_token
    }

    pub async fn owner(&self) -> CvOwner {
        self.shared.owner.lock().await.clone()
    }

    pub async fn preview_html(&self) -> String {
        let data = self.shared.controller.lock().await.data().clone();
        self.shared.assembly.preview_html(&data)
    }

    /// Output of the last successful generation, if any.
    pub async fn last_document(&self) -> Option<GeneratedDocument> {
        self.shared.last_document.lock().await.clone()
    }

    /// Replaces the aggregate with a stored CV version and adopts it as the
    /// version later saves update.
    pub async fn load_version(&self, version: u32) -> Result<(), GatewayError> {
        let email = self.shared.owner.lock().await.email.clone();
        let info = self
            .shared
            .gateway
            .fetch_cv_information(&self.shared.bearer_token, &email, version)
            .await?;

        self.shared.controller.lock().await.load(info.content);
        self.shared.owner.lock().await.version = Some(info.version);
        Ok(())
    }

    pub async fn load(&self, data: AggregatedCvData) {
        self.shared.controller.lock().await.load(data);
    }

    // ===== Generation Lifecycle =====

    /// Final generation, refused while any section is incomplete.
    pub async fn complete(&self) -> Result<GenerationHandle, WizardError> {
        let ticket = self.shared.controller.lock().await.try_complete()?;
        Ok(self.spawn_generation(ticket).await)
    }

    pub async fn save_draft(&self) -> Result<GenerationHandle, WizardError> {
        let ticket = self.shared.controller.lock().await.save_draft()?;
        Ok(self.spawn_generation(ticket).await)
    }

    /// Stops the in-flight generation; its result is never persisted.
    pub async fn cancel(&self) -> Result<GenerationTicket, WizardError> {
        let ticket = self.shared.controller.lock().await.cancel_generation()?;
        if let Some(token) = self.active.lock().await.take() {
            token.cancel();
        }
        Ok(ticket)
    }

    async fn spawn_generation(&self, ticket: GenerationTicket) -> GenerationHandle {
        let token = CancellationToken::new();
        if let Some(previous) = self.active.lock().await.replace(token.clone()) {
            previous.cancel();
        }

        let shared = self.shared.clone();
        let session = self.id;
        let span = app_span!("generation", session = %session, ticket = ticket.id, kind = %ticket.kind);
        let task = tokio::spawn(run_generation(shared, ticket, token).instrument(span));

        GenerationHandle { ticket, task }
    }
}

async fn run_generation(
    shared: Shared,
    ticket: GenerationTicket,
    cancel: CancellationToken,
) -> GenerationOutcome {
    let data = shared.controller.lock().await.data().clone();

    let document = match shared.assembly.generate(&data, &cancel).await {
        Ok(document) => document,
        Err(AssemblyError::Cancelled) => {
            app_log!(info, "Generation #{} cancelled during rendering", ticket.id);
            return GenerationOutcome::Cancelled;
        }
        Err(e) => {
            app_log!(error, "Generation #{} failed: {}", ticket.id, e);
            let message = format!("Failed to generate your CV: {}", e);
            shared
                .controller
                .lock()
                .await
                .finish_generation(ticket.id, Notification::error(message.clone()));
            return GenerationOutcome::Failed(message);
        }
    };

    if cancel.is_cancelled() {
        app_log!(info, "Generation #{} cancelled before saving", ticket.id);
        return GenerationOutcome::Cancelled;
    }

    let owner = shared.owner.lock().await.clone();
    let request = SaveCvRequest {
        email: owner.email,
        version: owner.version,
        status: match ticket.kind {
            GenerationKind::Final => CvStatus::Complete,
            GenerationKind::Draft => CvStatus::Draft,
        },
        content: data,
        file_name: document.file_name.clone(),
        file_base64: document.base64.clone(),
    };

    let saved = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            app_log!(info, "Generation #{} cancelled while saving", ticket.id);
            return GenerationOutcome::Cancelled;
        }
        result = shared.gateway.save_cv(&shared.bearer_token, &request) => result,
    };

    // Results are only adopted while the ticket is still the active one.
    let mut controller = shared.controller.lock().await;
    if controller.generation().map(|active| active.id) != Some(ticket.id) {
        app_log!(info, "Generation #{} superseded, result dropped", ticket.id);
        return GenerationOutcome::Cancelled;
    }

    match saved {
        Ok(response) => {
            *shared.last_document.lock().await = Some(document.clone());
            shared.owner.lock().await.version = Some(response.version);
            let message = match ticket.kind {
                GenerationKind::Final => "Your CV has been completed and saved",
                GenerationKind::Draft => "Draft saved successfully",
            };
            controller.finish_generation(ticket.id, Notification::success(message));
            app_log!(
                info,
                "Saved {} CV {} version {}",
                request.status,
                response.id,
                response.version
            );
            GenerationOutcome::Saved { document, response }
        }
        Err(e) => {
            app_log!(error, "Failed to save CV: {}", e);
            let message = format!("Failed to save your CV: {}", e);
            controller.finish_generation(ticket.id, Notification::error(message.clone()));
            GenerationOutcome::Failed(message)
        }
    }
}
