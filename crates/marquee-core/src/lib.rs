//! CRUD orchestration layer between `marquee-api` and dashboard front ends.
//!
//! This crate owns the state machines that sit between a remote catalog
//! API and whatever renders it (the `marquee` CLI today):
//!
//! - **[`QueryCodec`]**: lenient, round-tripping translation between URL
//!   search parameters ([`QueryParams`]) and a typed [`PageRequest`].
//!
//! - **[`ResourcePort`]**: typed list / create / update / delete per
//!   [`Resource`], backed by [`RemotePort`] over the HTTP client.
//!
//! - **[`TableController`]**: keeps a paginated, sortable, filterable view
//!   in sync with the URL, shows a [`Skeleton`] while fetching, and drops
//!   responses that a newer navigation has superseded.
//!
//! - **[`ModalController`]**: open / close / submit lifecycle for a
//!   validated form with single-flight submission and notifications.
//!
//! - **Permission gate** ([`has_permission`], [`page_access`]): pure,
//!   fail-closed checks against a read-only [`Session`].
//!
//! - **[`UploadPipeline`]**: MIME-filtered, order-preserving blob uploads
//!   that stop writing once their owner is torn down.
//!
//! - **[`Dashboard`]**: facade wiring the above to a configured API
//!   connection and the session lifecycle.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod modal;
pub mod model;
pub mod notify;
pub mod permission;
pub mod port;
pub mod query;
pub mod session;
pub mod table;
pub mod upload;
pub mod validate;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{AuthCredentials, DashboardConfig, TlsVerification};
pub use dashboard::Dashboard;
pub use error::CoreError;
pub use modal::{ConfirmModal, ModalController, ModalHandle, ModalOptions, ModalState, SubmitOutcome};
pub use notify::{Notification, NotificationLevel, Notifier};
pub use permission::{
    Action, Capability, PageAccess, Session, has_page_permission, has_permission, page_access,
};
pub use port::{PageResult, RemotePort, Resource, ResourceKind, ResourcePort};
pub use query::{PageRequest, ParamValue, QueryCodec, QueryParams, SortDirection, SortSpec};
pub use session::SessionStore;
pub use table::{
    ColumnDescriptor, FetchOutcome, Pagination, Skeleton, TableController, TablePage, TableView,
};
pub use upload::{
    AcceptSet, BlobTransport, LocalFile, RemoteBlobStore, UploadBatch, UploadEvent, UploadJob,
    UploadPipeline, UploadStatus,
};
pub use validate::{FieldErrors, Validate};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    CreateGenreRequest, CreateMovieRequest, CreateRentalRequest, CreateTagRequest,
    CreateUserRequest, EntityId, Genre, Movie, Rental, RentalStatus, Tag, UpdateGenreRequest,
    UpdateMovieRequest, UpdateRentalRequest, UpdateTagRequest, UpdateUserRequest, User, UserRole,
};
