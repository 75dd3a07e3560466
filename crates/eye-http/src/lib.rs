//! Shared outbound HTTP pool.
//!
//! One [`HttpPool`] per process; every outbound JSON call (controller,
//! worker models, tool backends) goes through [`HttpPool::post_json`].
//! The pool reuses connections via a single [`reqwest::Client`].
//!
//! Two timeout classes exist: [`TimeoutClass::Call`] for controller and
//! short tool traffic, and [`TimeoutClass::Unbounded`] for long-running
//! synthesis, which has no deadline but still honors the cancellation
//! token. Cancellation interrupts an in-flight call at the next poll of
//! the underlying future.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Errors from outbound HTTP calls.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network-level failure: connect, DNS, TLS, or body I/O.
    #[error("transport error: {0}")]
    Transport(String),

    /// The per-call deadline elapsed.
    #[error("timeout")]
    Timeout,

    /// The endpoint answered with a non-2xx status.
    #[error("http status {code}: {body}")]
    Status {
        code: u16,
        /// Response body, lossily decoded for diagnostics.
        body: String,
    },

    /// The request-scoped cancellation token fired.
    #[error("canceled")]
    Canceled,
}

/// Deadline policy for a single call.
#[derive(Debug, Clone, Copy)]
pub enum TimeoutClass {
    /// Bounded call (controller, models, short tools).
    Call(Duration),
    /// No deadline; cancellable only.
    Unbounded,
}

impl TimeoutClass {
    /// The standard bounded class from a configured number of seconds.
    pub fn call_secs(secs: u64) -> Self {
        TimeoutClass::Call(Duration::from_secs(secs))
    }
}

/// Process-wide HTTP connection pool.
#[derive(Debug, Clone)]
pub struct HttpPool {
    client: reqwest::Client,
}

impl HttpPool {
    /// Build the pool. No global request timeout is set on the client;
    /// deadlines are applied per call so the unbounded class works.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .pool_idle_timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }

    /// POST a JSON body and read the full response body.
    ///
    /// Returns `(status, body)` for 2xx responses. Non-2xx becomes
    /// [`HttpError::Status`] with the drained body; transport failures
    /// become [`HttpError::Transport`]; an elapsed deadline becomes
    /// [`HttpError::Timeout`]; a fired token becomes [`HttpError::Canceled`].
    pub async fn post_json(
        &self,
        url: &str,
        body: &Value,
        timeout: TimeoutClass,
        cancel: &CancellationToken,
    ) -> Result<(u16, Vec<u8>), HttpError> {
        debug!(url, ?timeout, "outbound POST");
        let request = self.send_and_drain(url, body);
        match timeout {
            TimeoutClass::Call(deadline) => tokio::select! {
                _ = cancel.cancelled() => Err(HttpError::Canceled),
                outcome = tokio::time::timeout(deadline, request) => match outcome {
                    Err(_) => Err(HttpError::Timeout),
                    Ok(result) => result,
                },
            },
            TimeoutClass::Unbounded => tokio::select! {
                _ = cancel.cancelled() => Err(HttpError::Canceled),
                result = request => result,
            },
        }
    }

    async fn send_and_drain(&self, url: &str, body: &Value) -> Result<(u16, Vec<u8>), HttpError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(map_reqwest)?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(map_reqwest)?.to_vec();
        if !(200..300).contains(&status) {
            return Err(HttpError::Status {
                code: status,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        Ok((status, bytes))
    }
}

impl Default for HttpPool {
    fn default() -> Self {
        Self::new()
    }
}

fn map_reqwest(err: reqwest::Error) -> HttpError {
    if err.is_timeout() {
        HttpError::Timeout
    } else {
        HttpError::Transport(err.to_string())
    }
}
