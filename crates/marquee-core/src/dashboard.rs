// ── Dashboard facade ──
//
// Wires a configured API connection to the orchestration pieces: the
// session lifecycle (sign-in, periodic refresh, sign-out), per-resource
// ports and tables, form/confirm modals and upload pipelines.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use marquee_api::{CatalogClient, Credentials, TlsMode, TransportConfig};

use crate::config::{AuthCredentials, DashboardConfig, TlsVerification};
use crate::error::CoreError;
use crate::modal::{ConfirmModal, ModalController};
use crate::notify::{Notification, Notifier};
use crate::permission::{Action, PageAccess, Session, has_permission, page_access};
use crate::port::{RemotePort, Resource, ResourcePort};
use crate::query::QueryParams;
use crate::session::SessionStore;
use crate::table::TableController;
use crate::upload::{AcceptSet, RemoteBlobStore, UploadEvent, UploadPipeline};
use crate::validate::Validate;

/// Entry point for front ends.
///
/// Cheaply cloneable. Construction does not touch the network; call
/// [`sign_in`](Self::sign_in) before using anything permission-gated.
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<DashboardInner>,
}

struct DashboardInner {
    config: DashboardConfig,
    client: Arc<CatalogClient>,
    sessions: SessionStore,
    notifier: Notifier,
    refresh_task: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> Result<Self, CoreError> {
        Self::with_notifier(config, Notifier::detached())
    }

    pub fn with_notifier(config: DashboardConfig, notifier: Notifier) -> Result<Self, CoreError> {
        let transport = build_transport(&config);
        let credentials = match &config.auth {
            AuthCredentials::ApiKey(key) => Credentials::ApiKey { key: key.clone() },
            AuthCredentials::Password { email, password } => Credentials::Password {
                email: email.clone(),
                password: password.clone(),
            },
        };
        let client = CatalogClient::new(config.url.as_str(), &credentials, &transport)?;

        Ok(Self {
            inner: Arc::new(DashboardInner {
                config,
                client: Arc::new(client),
                sessions: SessionStore::new(),
                notifier,
                refresh_task: Mutex::new(None),
            }),
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    pub fn client(&self) -> &Arc<CatalogClient> {
        &self.inner.client
    }

    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    // ── Session lifecycle ────────────────────────────────────────────

    /// Authenticate, load the session and start the periodic refresh.
    pub async fn sign_in(&self) -> Result<Arc<Session>, CoreError> {
        if let AuthCredentials::Password { email, password } = &self.inner.config.auth {
            self.inner.client.login(email, password).await?;
            debug!(email, "password sign-in accepted");
        }

        let session = self.load_session().await?;
        info!(user = %session.email, grants = session.grants.len(), "session established");

        let interval = self.inner.config.session_refresh_interval;
        if !interval.is_zero() {
            let mut slot = self.inner.refresh_task.lock().await;
            // A task from an earlier sign-in may still run or may have
            // stopped after its session expired; start over either way.
            if let Some((cancel, handle)) = slot.take() {
                cancel.cancel();
                let _ = handle.await;
            }
            let cancel = CancellationToken::new();
            let handle = tokio::spawn(refresh_task(
                Arc::downgrade(&self.inner),
                interval,
                cancel.clone(),
            ));
            *slot = Some((cancel, handle));
        }
        Ok(session)
    }

    /// Rotate the bearer token (password auth) and reload the capability
    /// set. An authentication failure ends the session.
    pub async fn refresh_session(&self) -> Result<Arc<Session>, CoreError> {
        let result = async {
            if matches!(self.inner.config.auth, AuthCredentials::Password { .. }) {
                self.inner.client.refresh_token().await?;
            }
            self.load_session().await
        }
        .await;

        if let Err(err) = &result {
            if err.requires_sign_in() {
                warn!(error = %err, "session could not be refreshed");
                self.inner.sessions.clear();
                self.inner
                    .notifier
                    .send(Notification::warning("Session expired. Sign in again."));
            }
        }
        result
    }

    /// Stop the refresh task, revoke tokens and drop the session.
    pub async fn sign_out(&self) {
        if let Some((cancel, handle)) = self.inner.refresh_task.lock().await.take() {
            cancel.cancel();
            let _ = handle.await;
        }

        if matches!(self.inner.config.auth, AuthCredentials::Password { .. }) {
            if let Err(e) = self.inner.client.logout().await {
                warn!(error = %e, "logout failed (non-fatal)");
            }
        }
        self.inner.sessions.clear();
    }

    async fn load_session(&self) -> Result<Arc<Session>, CoreError> {
        let resp = self.inner.client.session().await?;
        self.inner.sessions.replace(Session::from(resp));
        self.inner.sessions.current().ok_or(CoreError::NotSignedIn)
    }

    pub fn session(&self) -> Option<Arc<Session>> {
        self.inner.sessions.current()
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.inner.sessions
    }

    // ── Permission shortcuts ─────────────────────────────────────────

    pub fn can<R: Resource>(&self, action: Action) -> bool {
        let session = self.session();
        has_permission(session.as_deref(), R::KIND.collection(), action.as_ref())
    }

    pub fn page_access<R: Resource>(&self) -> PageAccess {
        page_access(self.session().as_deref(), R::KIND.collection())
    }

    // ── Controllers ──────────────────────────────────────────────────

    pub fn port<R: Resource>(&self) -> Arc<dyn ResourcePort<R>> {
        Arc::new(RemotePort::<R>::new(Arc::clone(&self.inner.client)))
    }

    /// Table for `R` positioned at `location`. Nothing is fetched until
    /// the caller refreshes or navigates.
    pub fn table<R: Resource>(&self, location: QueryParams) -> TableController<R> {
        TableController::new(
            self.port::<R>(),
            self.inner.config.default_page_size,
            self.inner.config.max_page_size,
            location,
        )
    }

    /// A form modal reporting through this dashboard's notifier.
    pub fn form<V>(&self, title: impl Into<String>) -> ModalController<V>
    where
        V: Validate + Clone + Default + Send + 'static,
    {
        ModalController::new(title, self.inner.notifier.clone())
    }

    pub fn confirm(&self, title: impl Into<String>) -> ConfirmModal {
        ModalController::new(title, self.inner.notifier.clone())
    }

    /// Upload pipeline over the catalog blob store, filtered by the
    /// configured accept list.
    pub fn upload_pipeline(&self) -> (UploadPipeline, mpsc::UnboundedReceiver<UploadEvent>) {
        UploadPipeline::new(
            Arc::new(RemoteBlobStore::new(Arc::clone(&self.inner.client))),
            AcceptSet::new(&self.inner.config.upload_accept),
        )
    }
}

impl Drop for DashboardInner {
    fn drop(&mut self) {
        if let Some((cancel, _)) = self.refresh_task.get_mut().take() {
            cancel.cancel();
        }
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Holds only a weak handle so an abandoned dashboard is freed without
/// an explicit sign-out.
async fn refresh_task(dashboard: Weak<DashboardInner>, every: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(every);
    interval.tick().await; // the first tick fires immediately

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let Some(inner) = dashboard.upgrade() else { break };
                match (Dashboard { inner }).refresh_session().await {
                    Ok(_) => {}
                    Err(e) if e.requires_sign_in() => break,
                    Err(e) => warn!(error = %e, "periodic session refresh failed"),
                }
            }
        }
    }
    debug!("session refresh task stopped");
}

fn build_transport(config: &DashboardConfig) -> TransportConfig {
    TransportConfig {
        tls: match &config.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        },
        timeout: config.timeout,
    }
}
