//! Page sessions.
//!
//! Every load of the form page opens a session with its own workflow and
//! directory snapshot. Sessions live until the page closes them or until they
//! have gone untouched for the configured idle timeout.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

use crate::backend::ReportBackend;
use crate::workflow::SubmissionWorkflow;

struct Session {
    workflow: Arc<SubmissionWorkflow>,
    last_seen: Instant,
}

pub struct SessionRegistry {
    backend: Arc<dyn ReportBackend>,
    reset_delay: Duration,
    idle_timeout: Duration,
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl SessionRegistry {
    pub fn new(
        backend: Arc<dyn ReportBackend>,
        reset_delay: Duration,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            reset_delay,
            idle_timeout,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Opens a session and starts its directory fetch in the background.
    pub async fn open(&self) -> (Uuid, Arc<SubmissionWorkflow>) {
        let id = Uuid::new_v4();
        let workflow = Arc::new(SubmissionWorkflow::new(
            Arc::clone(&self.backend),
            self.reset_delay,
        ));
        self.sessions.write().await.insert(
            id,
            Session {
                workflow: Arc::clone(&workflow),
                last_seen: Instant::now(),
            },
        );

        let pending = Arc::downgrade(&workflow);
        tokio::spawn(async move {
            // A session closed before the fetch starts never fetches.
            if let Some(workflow) = pending.upgrade() {
                workflow.load_directory().await;
            }
        });

        tracing::info!(session = %id, "page session opened");
        (id, workflow)
    }

    /// Looks a session up and marks it as used.
    pub async fn get(&self, id: &Uuid) -> Option<Arc<SubmissionWorkflow>> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(id)?;
        session.last_seen = Instant::now();
        Some(Arc::clone(&session.workflow))
    }

    /// Forgets a session. Its scheduled reset is cancelled once the last handle drops.
    pub async fn close(&self, id: &Uuid) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            tracing::info!(session = %id, "page session closed");
        }
        removed
    }

    /// Drops every session untouched for longer than the idle timeout.
    ///
    /// Returns how many sessions were dropped. A submission already in flight for a
    /// dropped session still runs to completion.
    pub async fn sweep(&self) -> usize {
        let idle_timeout = self.idle_timeout;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, session| {
            let keep = session.last_seen.elapsed() < idle_timeout;
            if !keep {
                tracing::info!(session = %id, "page session expired");
            }
            keep
        });
        before - sessions.len()
    }

    /// Sweeps idle sessions every `every` until the registry is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let registry: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let Some(registry) = registry.upgrade() else {
                    break;
                };
                registry.sweep().await;
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("reset_delay", &self.reset_delay)
            .field("idle_timeout", &self.idle_timeout)
            .finish_non_exhaustive()
    }
}
