// ── Session store ──
//
// Holds the signed-in `Session`. Reads are wait-free (`ArcSwapOption`);
// only the authentication flow in `Dashboard` writes. Every change is
// broadcast on a `watch` channel so long-lived views can re-gate.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::permission::Session;

/// Shared, read-mostly holder of the current session.
pub struct SessionStore {
    current: ArcSwapOption<Session>,
    changes: watch::Sender<Option<Arc<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(None);
        Self {
            current: ArcSwapOption::const_empty(),
            changes,
        }
    }

    /// Snapshot of the current session, if signed in.
    pub fn current(&self) -> Option<Arc<Session>> {
        self.current.load_full()
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.load().is_some()
    }

    /// Install a fresh session (sign-in or refresh).
    pub(crate) fn replace(&self, session: Session) {
        let session = Arc::new(session);
        let previous = self.current.swap(Some(Arc::clone(&session)));
        match previous {
            Some(prev) if prev.user_id == session.user_id => {
                debug!(user = %session.email, grants = session.grants.len(), "session refreshed");
            }
            _ => info!(user = %session.email, "signed in"),
        }
        self.changes.send_replace(Some(session));
    }

    /// Drop the session (sign-out).
    pub(crate) fn clear(&self) {
        if let Some(prev) = self.current.swap(None) {
            info!(user = %prev.email, "signed out");
        }
        self.changes.send_replace(None);
    }

    /// Subscribe to sign-in / refresh / sign-out.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Session>>> {
        self.changes.subscribe()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
