//! Synchronous client for the account management API.
//!
//! # Overview
//! Models account resources in their JSON:API envelope and exposes create,
//! fetch, list and delete over HTTP, translating status codes into a typed
//! `ApiError`.
//!
//! # Design
//! - `AccountClient` is stateless; it holds only a `Transport`.
//! - `Transport` is a two-method seam (`create_request`, `execute`).
//!   `UreqTransport` is the network implementation; tests substitute stubs.
//! - Each operation is split into `build_*` and `parse_*`, so request shape
//!   and response handling can be checked without I/O.
//! - Every call takes a `Context` carrying a deadline and a cancellation flag.
//!   Nothing is retried.
//!
//! ```no_run
//! use account_client::{AccountClient, ClientConfig, Context, Pagination};
//! use std::time::Duration;
//!
//! let client = AccountClient::from_config(&ClientConfig::from_env()?)?;
//! let ctx = Context::with_timeout(Duration::from_secs(5));
//! let page = client.list(&ctx, &Pagination::new(0, 10))?;
//! println!("{} accounts", page.data.len());
//! # Ok::<(), account_client::ApiError>(())
//! ```

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use client::AccountClient;
pub use config::ClientConfig;
pub use context::Context;
pub use error::{ApiError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport};
pub use types::{
    Account, AccountData, AccountList, Actor, Attributes, Links, OrganisationIdentification,
    Pagination, PrivateIdentification, Relationship, Relationships, ResourceIdentifier,
};
