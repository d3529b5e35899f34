use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use super::controller::FormController;
use crate::errors::AppError;

struct Session {
    form: FormController,
    touched: Instant,
}

type Sessions = HashMap<Uuid, Session>;

/// In-memory editing sessions, one controller each. Nothing outlives the process.
///
/// A session ends when it is discarded, when its form is delivered, or when it
/// has been idle for longer than `idle_timeout`. Idle sessions are swept
/// whenever a new one is opened.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<Sessions>>,
    capacity: usize,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(capacity: usize, idle_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            capacity,
            idle_timeout,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Sessions>, AppError> {
        self.inner
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Session store lock poisoned")))
    }

    fn sweep_idle(&self, sessions: &mut Sessions) {
        let before = sessions.len();
        sessions.retain(|_, session| session.touched.elapsed() < self.idle_timeout);
        let expired = before - sessions.len();
        if expired > 0 {
            info!(expired, open = sessions.len(), "Idle applicant sessions expired");
        }
    }

    /// Opens a session holding a fresh record.
    pub fn create(&self) -> Result<Uuid, AppError> {
        let mut sessions = self.lock()?;
        self.sweep_idle(&mut sessions);
        if sessions.len() >= self.capacity {
            return Err(AppError::Unavailable(format!(
                "Session limit of {} reached",
                self.capacity
            )));
        }
        let id = Uuid::new_v4();
        sessions.insert(
            id,
            Session {
                form: FormController::new(),
                touched: Instant::now(),
            },
        );
        info!(session_id = %id, open = sessions.len(), "Applicant session opened");
        Ok(id)
    }

    /// Runs `f` against the session's controller while holding the store lock.
    pub fn with_session<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut FormController) -> R,
    ) -> Result<R, AppError> {
        let mut sessions = self.lock()?;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
        session.touched = Instant::now();
        Ok(f(&mut session.form))
    }

    pub fn discard(&self, id: Uuid) -> Result<(), AppError> {
        let removed = self.lock()?.remove(&id);
        match removed {
            Some(_) => {
                debug!(session_id = %id, "Applicant session discarded");
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Session {id} not found"))),
        }
    }

    pub fn len(&self) -> Result<usize, AppError> {
        Ok(self.lock()?.len())
    }
}
