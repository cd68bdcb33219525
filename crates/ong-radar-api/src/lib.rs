//! Backend-facing pieces of ong-radar.
//!
//! This crate owns everything that touches the organization search endpoint
//! (`GET /ongs/search`): the wire records, the request descriptor and the
//! HTTP client that executes it. The orchestration (geolocation, page state,
//! supersession of in-flight requests) lives in the `ong-radar` crate, which
//! re-exports this one.

pub mod client;
pub mod config;
pub mod query;
pub mod types;

mod error {
    use reqwest::StatusCode;
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum ApiError {
        #[error("HTTP error: {0}")]
        Http(#[from] reqwest::Error),
        #[error("Backend answered with status {0}")]
        Status(StatusCode),
        #[error("Request was cancelled")]
        Cancelled,
        #[error("Invalid base url: {0:?}")]
        InvalidBaseUrl(String),
        #[error("Unknown help type: {0:?}")]
        UnknownHelpType(String),
    }

    impl ApiError {
        /// Cancellation is not a failure; callers use this to keep it out of
        /// any user-visible error state.
        pub const fn is_cancelled(&self) -> bool {
            matches!(self, Self::Cancelled)
        }
    }

    pub type Result<T> = std::result::Result<T, ApiError>;
}

pub use client::{HttpSearchClient, OrganizationSearch};
pub use config::{ApiConfig, ApiConfigBuilder, DEFAULT_API_URL};
pub use error::{ApiError, Result};
pub use query::QueryDescriptor;
pub use reqwest::StatusCode;
pub use tokio_util::sync::CancellationToken;
pub use types::{HelpType, OrganizationSummary};
