//! Async HTTP client for the marquee catalog API.
//!
//! One [`CatalogClient`] speaks to every resource collection (`genres`,
//! `tags`, `movies`, `rentals`, `users`) through generic list / create /
//! update / delete calls, handles bearer-token rotation for password
//! sign-in, reads the session capability set, and pushes files to the
//! blob store.

pub mod auth;
pub mod client;
pub mod error;
pub mod resources;
pub mod session;
pub mod transport;
pub mod upload;

pub use auth::{Credentials, TokenPair};
pub use client::CatalogClient;
pub use error::Error;
pub use resources::Page;
pub use session::{GrantResponse, SessionResponse, SessionUser};
pub use transport::{TlsMode, TransportConfig};
pub use upload::UploadResponse;
