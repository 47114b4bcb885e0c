// src/web/sessions.rs
//! Live wizard sessions, keyed by id and bound to the user who opened them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use uuid::Uuid;

use crate::app_log;
use crate::auth::TokenVerifier;
use crate::document::{DocumentAssembly, DocumentRenderer};
use crate::gateway::PersistenceGateway;
use crate::wizard::{CvOwner, WizardContext, WizardController};

/// Shared collaborators every new session is wired with.
#[derive(Clone)]
pub struct WebServices {
    pub auth: Arc<TokenVerifier>,
    pub gateway: Arc<dyn PersistenceGateway>,
    pub renderer: Arc<dyn DocumentRenderer>,
    pub max_sessions: usize,
    pub session_idle_timeout: Duration,
}

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

struct SessionEntry {
    email: String,
    context: Arc<WizardContext>,
    last_seen: Instant,
}

impl SessionEntry {
    fn is_idle(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() >= timeout
    }
}

/// Sessions untouched for longer than the idle timeout are dropped on the
/// next insert and no longer returned by `get`.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_TIMEOUT)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct SessionLimitReached(pub usize);

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    /// Builds a context for `owner`. Each session gets its own assembly so
    /// one user's render never blocks another's.
    pub fn create_context(
        services: &WebServices,
        controller: WizardController,
        owner: CvOwner,
        bearer_token: &str,
    ) -> WizardContext {
        let assembly = Arc::new(DocumentAssembly::new(services.renderer.clone()));
        WizardContext::new(
            controller,
            assembly,
            services.gateway.clone(),
            owner,
            bearer_token,
        )
    }

    pub async fn insert(
        &self,
        context: WizardContext,
        max_sessions: usize,
    ) -> Result<Arc<WizardContext>, SessionLimitReached> {
        let (result, evicted) = {
            let mut sessions = self.sessions.write().await;
            let evicted = Self::take_idle(&mut sessions, self.idle_timeout);

            if sessions.len() >= max_sessions {
                app_log!(warn, "Session limit of {} reached", max_sessions);
                (Err(SessionLimitReached(max_sessions)), evicted)
            } else {
                let email = context.owner().await.email;
                let context = Arc::new(context);
                sessions.insert(
                    context.id(),
                    SessionEntry {
                        email,
                        context: context.clone(),
                        last_seen: Instant::now(),
                    },
                );
                app_log!(info, "Opened wizard session {}", context.id());
                (Ok(context), evicted)
            }
        };

        stop_generations(evicted).await;
        result
    }

    /// Drops every idle session and returns how many were dropped.
    pub async fn evict_idle(&self) -> usize {
        let evicted = Self::take_idle(&mut *self.sessions.write().await, self.idle_timeout);
        let count = evicted.len();
        stop_generations(evicted).await;
        count
    }

    fn take_idle(
        sessions: &mut HashMap<Uuid, SessionEntry>,
        timeout: Duration,
    ) -> Vec<Arc<WizardContext>> {
        let idle: Vec<Uuid> = sessions
            .iter()
            .filter(|(_, entry)| entry.is_idle(timeout))
            .map(|(id, _)| *id)
            .collect();

        idle.into_iter()
            .filter_map(|id| {
                app_log!(info, "Evicting idle wizard session {}", id);
                sessions.remove(&id).map(|entry| entry.context)
            })
            .collect()
    }

    /// The session, if it exists, belongs to `email` and has not gone idle.
    /// A successful lookup counts as activity.
    pub async fn get(&self, id: Uuid, email: &str) -> Option<Arc<WizardContext>> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .get_mut(&id)
            .filter(|entry| entry.email == email && !entry.is_idle(self.idle_timeout))?;
        entry.last_seen = Instant::now();
        Some(entry.context.clone())
    }

    pub async fn remove(&self, id: Uuid, email: &str) -> Option<Arc<WizardContext>> {
        let mut sessions = self.sessions.write().await;
        if sessions.get(&id).is_some_and(|entry| entry.email == email) {
            app_log!(info, "Closed wizard session {}", id);
            sessions.remove(&id).map(|entry| entry.context)
        } else {
            None
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

async fn stop_generations(contexts: Vec<Arc<WizardContext>>) {
    for context in contexts {
        if let Ok(ticket) = context.cancel().await {
            app_log!(
                info,
                "Stopped {} generation #{} of evicted session {}",
                ticket.kind,
                ticket.id,
                context.id()
            );
        }
    }
}
