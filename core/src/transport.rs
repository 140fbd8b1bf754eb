//! Transport capability and its `ureq`-backed implementation.
//!
//! # Design
//! `Transport` is the narrow seam the account client depends on: build a
//! request from a relative path, execute it under a `Context`. Tests swap in
//! a stub; production uses `UreqTransport`.
//!
//! `UreqTransport` runs each call on a short-lived worker thread and waits for
//! it with a bounded `recv_timeout`, checking the context between waits. A
//! cancelled or expired call returns immediately and the worker's eventual
//! result is dropped with the channel. The worker reads the whole body before
//! handing back an `HttpResponse`, so the wire response never outlives it.
//!
//! Each request also carries its own `ureq` timeout: the context's remaining
//! time, capped by `ClientConfig::timeout`. An abandoned worker therefore
//! closes its connection no later than the caller's deadline, and a
//! cancel-only call is still bounded by the configured timeout.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::context::Context;
use crate::error::{ApiError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// How often an in-flight call re-checks its context for cancellation.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Build and execute HTTP requests against a fixed base URL.
pub trait Transport: Send + Sync {
    /// Resolve `path` against the base URL and attach `body` as JSON.
    fn create_request<B>(&self, method: HttpMethod, path: &str, body: Option<&B>) -> Result<HttpRequest>
    where
        B: Serialize + ?Sized;

    /// Send `request` and return the raw response, whatever its status.
    ///
    /// Errors only when no response was obtained: transport failure,
    /// cancellation or deadline. Status classification is left to the caller
    /// via `HttpResponse::error_for_status` / `HttpResponse::json`.
    fn execute(&self, ctx: &Context, request: HttpRequest) -> Result<HttpResponse>;
}

impl<T: Transport> Transport for &T {
    fn create_request<B>(&self, method: HttpMethod, path: &str, body: Option<&B>) -> Result<HttpRequest>
    where
        B: Serialize + ?Sized,
    {
        (**self).create_request(method, path, body)
    }

    fn execute(&self, ctx: &Context, request: HttpRequest) -> Result<HttpResponse> {
        (**self).execute(ctx, request)
    }
}

/// Blocking HTTP transport over a shared `ureq::Agent`.
#[derive(Clone)]
pub struct UreqTransport {
    base_url: Url,
    agent: ureq::Agent,
    timeout: Duration,
}

impl std::fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UreqTransport")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl UreqTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ApiError::RequestConstruction(format!("invalid base url {:?}: {e}", config.base_url))
        })?;

        // Non-2xx answers are data here, not `Err`; the classifier handles them.
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(config.timeout))
            .build()
            .new_agent();

        Ok(Self {
            base_url,
            agent,
            timeout: config.timeout,
        })
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Self::new(&ClientConfig::new(base_url))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

impl Transport for UreqTransport {
    fn create_request<B>(&self, method: HttpMethod, path: &str, body: Option<&B>) -> Result<HttpRequest>
    where
        B: Serialize + ?Sized,
    {
        HttpRequest::new(&self.base_url, method, path, body)
    }

    fn execute(&self, ctx: &Context, request: HttpRequest) -> Result<HttpResponse> {
        ctx.check()?;
        debug!(method = request.method.as_str(), url = %request.url, "sending request");

        let agent = self.agent.clone();
        let timeout = request_timeout(ctx, self.timeout);
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("account-api-call".to_string())
            .spawn(move || {
                // Fails only when the caller already gave up on this call.
                let _ = tx.send(send(&agent, request, timeout));
            })
            .map_err(|e| ApiError::Transport(format!("spawning request worker: {e}")))?;

        loop {
            let wait = ctx
                .remaining()
                .map_or(CANCEL_POLL_INTERVAL, |left| left.min(CANCEL_POLL_INTERVAL));
            match rx.recv_timeout(wait) {
                Ok(result) => {
                    match &result {
                        Ok(response) => debug!(status = response.status, "response received"),
                        Err(err) => warn!(%err, "request failed"),
                    }
                    return result;
                }
                Err(RecvTimeoutError::Timeout) => {
                    if let Err(err) = ctx.check() {
                        warn!(%err, "abandoning in-flight request");
                        return Err(err);
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(ApiError::Transport(
                        "request worker exited without a result".to_string(),
                    ));
                }
            }
        }
    }
}

/// The context's remaining time, never more than `cap`.
fn request_timeout(ctx: &Context, cap: Duration) -> Duration {
    ctx.remaining().map_or(cap, |left| left.min(cap))
}

fn send(agent: &ureq::Agent, request: HttpRequest, timeout: Duration) -> Result<HttpResponse> {
    let HttpRequest {
        method,
        url,
        headers,
        body,
    } = request;

    let sent = match method {
        HttpMethod::Get => prepare(agent.get(&url), &headers, timeout).call(),
        HttpMethod::Delete => prepare(agent.delete(&url), &headers, timeout).call(),
        HttpMethod::Post => {
            let builder = prepare(agent.post(&url), &headers, timeout);
            match body {
                Some(body) => builder.send(body.as_bytes()),
                None => builder.send_empty(),
            }
        }
    };
    let mut response = sent.map_err(transport_error)?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(transport_error)?;

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

fn prepare<B>(
    builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
    timeout: Duration,
) -> ureq::RequestBuilder<B> {
    let builder = builder.config().timeout_global(Some(timeout)).build();
    headers
        .iter()
        .fold(builder, |builder, (name, value)| {
            builder.header(name.as_str(), value.as_str())
        })
}

fn transport_error(err: ureq::Error) -> ApiError {
    match err {
        ureq::Error::Timeout(_) => ApiError::DeadlineExceeded,
        other => ApiError::Transport(other.to_string()),
    }
}
