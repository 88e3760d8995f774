// ── Modal form controller ──
//
// Owns one dialog's lifecycle: open/close, the form values it wraps, and a
// single-flight submit. Trigger code holds a cloned handle instead of the
// dialog itself, so a row action can open a form defined elsewhere.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::notify::{Notification, Notifier};
use crate::validate::{FieldErrors, Validate};

/// Observable dialog state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModalState {
    pub open: bool,
    /// A submission is in flight. The confirm control is disabled.
    pub pending: bool,
    /// Message from the last failed submit or validation, cleared on open.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ModalOptions {
    /// Refuse `close()` while a submission is in flight.
    pub lock_cancel_while_pending: bool,
    /// Notification text on success. Defaults to `"<title>: done"`.
    pub success_message: Option<String>,
}

/// What a call to [`ModalController::submit`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome<T> {
    /// The handler succeeded; the dialog closed and its values reset.
    Submitted(T),
    /// Validation failed; the handler was not called.
    Invalid(FieldErrors),
    /// The handler failed; the dialog stays open.
    Failed(String),
    /// Another submission is already in flight; nothing happened.
    Busy,
    /// The dialog is not open; nothing happened.
    Closed,
}

impl<T> SubmitOutcome<T> {
    pub fn is_submitted(&self) -> bool {
        matches!(self, Self::Submitted(_))
    }
}

/// Imperative `{open, close}` surface handed to trigger elements.
pub trait ModalHandle {
    fn open(&self);
    fn close(&self);
}

struct Inner<V> {
    title: String,
    state: watch::Sender<ModalState>,
    values: Mutex<V>,
    initial: V,
    /// Bumped each time a closed dialog opens. A submit only settles the
    /// lifecycle it started in.
    generation: AtomicU64,
    options: ModalOptions,
    notifier: Notifier,
}

/// Dialog + form lifecycle for values of type `V`.
///
/// Cloning yields another handle to the same dialog.
pub struct ModalController<V> {
    inner: Arc<Inner<V>>,
}

impl<V> Clone for ModalController<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// A body-less confirmation dialog (deletes).
pub type ConfirmModal = ModalController<()>;

impl<V> ModalController<V>
where
    V: Validate + Clone + Default + Send + 'static,
{
    pub fn new(title: impl Into<String>, notifier: Notifier) -> Self {
        Self::with_options(title, notifier, ModalOptions::default())
    }

    pub fn with_options(title: impl Into<String>, notifier: Notifier, options: ModalOptions) -> Self {
        let (state, _) = watch::channel(ModalState::default());
        Self {
            inner: Arc::new(Inner {
                title: title.into(),
                state,
                values: Mutex::new(V::default()),
                initial: V::default(),
                generation: AtomicU64::new(0),
                options,
                notifier,
            }),
        }
    }

    pub fn title(&self) -> &str {
        &self.inner.title
    }

    pub fn state(&self) -> ModalState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ModalState> {
        self.inner.state.subscribe()
    }

    /// Current form values.
    pub fn values(&self) -> V {
        self.inner.values.lock().expect("modal values lock poisoned").clone()
    }

    /// Mutate the form values in place.
    pub fn edit(&self, f: impl FnOnce(&mut V)) {
        f(&mut self.inner.values.lock().expect("modal values lock poisoned"));
    }

    /// Open pre-filled with `values` (edit dialogs).
    pub fn open_with(&self, values: V) {
        *self.inner.values.lock().expect("modal values lock poisoned") = values;
        ModalHandle::open(self);
    }

    /// Close the dialog. Returns `false` when refused because a submission
    /// is in flight and the options lock cancel.
    pub fn try_close(&self) -> bool {
        let locked = self.inner.options.lock_cancel_while_pending;
        let mut closed = false;
        self.inner.state.send_if_modified(|s| {
            if !s.open || (locked && s.pending) {
                return false;
            }
            s.open = false;
            s.error = None;
            closed = true;
            true
        });
        closed
    }

    /// Validate the current values and, if valid, run `handler` with them.
    ///
    /// Single-flight: while a submission is pending every further call
    /// returns [`SubmitOutcome::Busy`] without touching the handler. If the
    /// dialog is cancelled and reopened before the handler finishes, the
    /// result is still returned and notified but leaves the reopened
    /// dialog alone.
    pub async fn submit<F, Fut, T>(&self, handler: F) -> SubmitOutcome<T>
    where
        F: FnOnce(V) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let mut gate: Result<V, SubmitOutcome<T>> = Err(SubmitOutcome::Closed);
        let mut generation = 0;
        self.inner.state.send_if_modified(|s| {
            if !s.open {
                return false;
            }
            if s.pending {
                gate = Err(SubmitOutcome::Busy);
                return false;
            }
            let values = self.values();
            if let Err(errors) = values.validate() {
                s.error = Some(errors.to_string());
                gate = Err(SubmitOutcome::Invalid(errors));
                return true;
            }
            s.pending = true;
            s.error = None;
            generation = self.inner.generation.load(Ordering::SeqCst);
            gate = Ok(values);
            true
        });

        let values = match gate {
            Ok(values) => values,
            Err(outcome) => {
                debug!(modal = %self.inner.title, outcome = outcome_kind(&outcome), "submit refused");
                return outcome;
            }
        };

        let guard = PendingGuard {
            inner: &self.inner,
            generation,
            armed: true,
        };
        let result = handler(values).await;
        // The branches below clear `pending` together with the rest of the
        // state change.
        guard.disarm();

        match result {
            Ok(value) => {
                let settled = self.inner.settle(generation, |s| {
                    *self.inner.values.lock().expect("modal values lock poisoned") =
                        self.inner.initial.clone();
                    s.open = false;
                    s.pending = false;
                    s.error = None;
                });
                if !settled {
                    debug!(modal = %self.inner.title, "dialog reopened before submit finished");
                }
                let message = self
                    .inner
                    .options
                    .success_message
                    .clone()
                    .unwrap_or_else(|| format!("{}: done", self.inner.title));
                self.inner.notifier.send(Notification::success(message));
                SubmitOutcome::Submitted(value)
            }
            Err(err) => {
                let message = err.to_string();
                warn!(modal = %self.inner.title, error = %message, "submit failed");
                self.inner.settle(generation, |s| {
                    s.pending = false;
                    s.error = Some(message.clone());
                });
                self.inner.notifier.send(Notification::error(message.clone()));
                SubmitOutcome::Failed(message)
            }
        }
    }
}

impl<V> Inner<V> {
    /// Apply `f` if the dialog is still in lifecycle `generation`.
    fn settle(&self, generation: u64, f: impl FnOnce(&mut ModalState)) -> bool {
        self.state.send_if_modified(|s| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            f(s);
            true
        })
    }
}

impl ConfirmModal {
    /// Run `action` behind the same pending/success/failure contract as a
    /// form submit.
    pub async fn confirm<F, Fut, T>(&self, action: F) -> SubmitOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        self.submit(|()| action()).await
    }
}

impl<V> ModalHandle for ModalController<V>
where
    V: Validate + Clone + Default + Send + 'static,
{
    fn open(&self) {
        self.inner.state.send_modify(|s| {
            if !s.open {
                // New lifecycle: a submit left over from the last one no
                // longer blocks this dialog.
                self.inner.generation.fetch_add(1, Ordering::SeqCst);
                s.pending = false;
            }
            s.open = true;
            s.error = None;
        });
    }

    fn close(&self) {
        self.try_close();
    }
}

fn outcome_kind<T>(outcome: &SubmitOutcome<T>) -> &'static str {
    match outcome {
        SubmitOutcome::Submitted(_) => "submitted",
        SubmitOutcome::Invalid(_) => "invalid",
        SubmitOutcome::Failed(_) => "failed",
        SubmitOutcome::Busy => "busy",
        SubmitOutcome::Closed => "closed",
    }
}

/// Clears `pending` if the submit future is dropped mid-flight.
struct PendingGuard<'a, V> {
    inner: &'a Inner<V>,
    generation: u64,
    armed: bool,
}

impl<V> PendingGuard<'_, V> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<V> Drop for PendingGuard<'_, V> {
    fn drop(&mut self) {
        if self.armed {
            self.inner.settle(self.generation, |s| s.pending = false);
        }
    }
}
