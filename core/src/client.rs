//! Account operations on top of a `Transport`.
//!
//! # Design
//! `AccountClient` holds only its transport and carries no state between
//! calls. Each operation is split into a `build_*` method producing an
//! `HttpRequest` and a `parse_*` method consuming an `HttpResponse`; the
//! composed method runs build, `Transport::execute`, parse.
//!
//! The shared classifier in `http` knows nothing about individual
//! operations. Create requires exactly 201. Delete inspects the raw status
//! before falling back to the classifier: 204 is success and 409 is a
//! version conflict. Only the delete path gives 409 that meaning.
//!
//! Account ids are opaque. An id always lands in exactly one path segment:
//! reserved characters are percent-encoded, and ids that no encoding can keep
//! in place (empty, `.`, `..`) are rejected before anything is sent.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use tracing::{instrument, warn};

use crate::config::ClientConfig;
use crate::context::Context;
use crate::error::{ApiError, Result};
use crate::http::{self, HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};
use crate::types::{Account, AccountList, Pagination};

const API_VERSION: &str = "v1";
const ACCOUNTS_PATH: &str = "organisation/accounts";

/// Characters that would end or split a path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Synchronous, stateless client for the account API.
#[derive(Debug, Clone)]
pub struct AccountClient<T> {
    transport: T,
}

impl AccountClient<UreqTransport> {
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Ok(Self::new(UreqTransport::new(config)?))
    }
}

impl<T: Transport> AccountClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Create `account`. Returns the server's representation of it.
    #[instrument(name = "accounts.create", skip_all, fields(id = %account.data.id))]
    pub fn create(&self, ctx: &Context, account: &Account) -> Result<Account> {
        let request = self.build_create(account)?;
        let response = self.transport.execute(ctx, request)?;
        self.parse_create(response)
    }

    #[instrument(name = "accounts.fetch", skip(self, ctx))]
    pub fn fetch(&self, ctx: &Context, id: &str) -> Result<Account> {
        let request = self.build_fetch(id)?;
        let response = self.transport.execute(ctx, request)?;
        self.parse_fetch(response)
    }

    #[instrument(
        name = "accounts.list",
        skip_all,
        fields(page = pagination.page, size = pagination.size)
    )]
    pub fn list(&self, ctx: &Context, pagination: &Pagination) -> Result<AccountList> {
        let request = self.build_list(pagination)?;
        let response = self.transport.execute(ctx, request)?;
        self.parse_list(response)
    }

    /// Delete `id` if the server still holds `version` of it.
    #[instrument(name = "accounts.delete", skip(self, ctx))]
    pub fn delete(&self, ctx: &Context, id: &str, version: u64) -> Result<()> {
        let request = self.build_delete(id, version)?;
        let response = self.transport.execute(ctx, request)?;
        self.parse_delete(response)
    }

    pub fn build_create(&self, account: &Account) -> Result<HttpRequest> {
        self.transport
            .create_request(HttpMethod::Post, &collection_path(), Some(account))
    }

    pub fn build_fetch(&self, id: &str) -> Result<HttpRequest> {
        self.transport
            .create_request::<()>(HttpMethod::Get, &resource_path(id)?, None)
    }

    pub fn build_list(&self, pagination: &Pagination) -> Result<HttpRequest> {
        let path = format!("{}?{}", collection_path(), pagination.query_string());
        self.transport
            .create_request::<()>(HttpMethod::Get, &path, None)
    }

    pub fn build_delete(&self, id: &str, version: u64) -> Result<HttpRequest> {
        let path = format!("{}?version={version}", resource_path(id)?);
        self.transport
            .create_request::<()>(HttpMethod::Delete, &path, None)
    }

    pub fn parse_create(&self, response: HttpResponse) -> Result<Account> {
        response.error_for_status()?;
        if response.status != 201 {
            warn!(status = response.status, "create answered without 201");
            return Err(ApiError::InternalServer {
                status: response.status,
            });
        }
        http::decode(&response.body)
    }

    pub fn parse_fetch(&self, response: HttpResponse) -> Result<Account> {
        response.json()
    }

    pub fn parse_list(&self, response: HttpResponse) -> Result<AccountList> {
        response.json()
    }

    pub fn parse_delete(&self, response: HttpResponse) -> Result<()> {
        match response.status {
            204 => Ok(()),
            409 => {
                warn!("delete rejected: version conflict");
                Err(ApiError::VersionConflict)
            }
            _ => response.error_for_status(),
        }
    }
}

fn collection_path() -> String {
    format!("{API_VERSION}/{ACCOUNTS_PATH}")
}

fn resource_path(id: &str) -> Result<String> {
    if matches!(id, "" | "." | "..") {
        return Err(ApiError::RequestConstruction(format!(
            "account id {id:?} cannot be used as a path segment"
        )));
    }
    let segment = utf8_percent_encode(id, PATH_SEGMENT);
    Ok(format!("{API_VERSION}/{ACCOUNTS_PATH}/{segment}"))
}
