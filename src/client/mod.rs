//! HTTP client for the complaint API, plus the list and chat helpers a
//! front-end needs on top of it.

pub mod api;
pub mod auth;
pub mod error;
pub mod listing;
pub mod poller;
pub mod session;

pub use api::ApiClient;
pub use auth::first_success;
pub use error::ClientError;
pub use poller::{ConversationPoller, MessageSource, POLL_INTERVAL};
pub use session::{Principal, Session};
