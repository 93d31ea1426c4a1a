//! # Grievance Client
//!
//! Authenticated API layer for the IT Grievance portal backend.
//!
//! [`ApiClient`] attaches the bearer published by the session manager to
//! every request and hands `401` responses back to the manager, which ends
//! the session and redirects to sign-in. The endpoint wrappers are thin: the
//! backend owns every business rule.
//!
//! ## Example
//!
//! ```no_run
//! use grievance_client::{ApiClient, Config};
//! use grievance_core::SystemClock;
//! use grievance_session::providers::{ChannelNavigator, HttpAuthApi};
//! use grievance_session::stores::FileStore;
//! use grievance_session::{SessionEnvironment, SessionManager};
//! use grievance_core::Credentials;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let (navigator, _redirects) = ChannelNavigator::new();
//!
//!     let manager = Arc::new(SessionManager::new(SessionEnvironment::new(
//!         FileStore::open_or_reset(&config.storage_path).await?,
//!         HttpAuthApi::new(&config.api_base_url, config.request_timeout)?,
//!         navigator,
//!         SystemClock,
//!     )));
//!     manager.initialize().await;
//!     manager.login(&Credentials::new("alice", "secret")).await?;
//!
//!     let api = ApiClient::new(
//!         &config.api_base_url,
//!         config.request_timeout,
//!         manager.bearer(),
//!         Arc::clone(&manager),
//!     )?;
//!     for complaint in api.my_complaints().await? {
//!         println!("#{} {} [{}]", complaint.id, complaint.title, complaint.status);
//!     }
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod types;

// Re-export main types for convenience
pub use client::{ApiClient, UnauthorizedHandler};
pub use config::{Config, ConfigError};
pub use error::{ApiError, Result};
pub use types::{
    Comment, CommentKind, Complaint, ComplaintStatus, CurrentUser, EscalationRequest,
    EscalationStats, EscalationTimeline, NewComment, NewComplaint, Priority, StatusUpdate,
    TimelineEntry, TimelineStage,
};
