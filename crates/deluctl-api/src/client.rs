// Deluge web JSON-RPC client
//
// Wraps `reqwest::Client` with the daemon's single-endpoint POST dialect,
// request-id assignment, and envelope interpretation. Typed RPC wrappers
// (config, status inquiries) are implemented as inherent methods in
// `methods.rs` to keep this module focused on transport mechanics.

use std::sync::atomic::{AtomicI64, Ordering};

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::rpc::{RpcRequest, RpcResponse, preview, truthy};
use crate::transport::TransportConfig;

/// Raw client for the Deluge web UI's `/json` endpoint.
///
/// One instance is one session: the cookie jar inside the HTTP client
/// carries the `_session_id` cookie that `auth.login` sets, so every
/// call after a successful login rides the same session. A fresh client
/// means a fresh session with no cookies.
pub struct DelugeClient {
    http: reqwest::Client,
    endpoint: Url,
    next_id: AtomicI64,
}

impl DelugeClient {
    /// Create a new client for `http://{host}:{port}/json`.
    ///
    /// If the transport doesn't already include a cookie jar, one is
    /// created automatically (session auth requires cookies).
    pub fn new(host: &str, port: u16, transport: &TransportConfig) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        Self::from_transport(host, port, &config)
    }

    /// Create a client from the transport exactly as given.
    ///
    /// Unlike [`DelugeClient::new`] this does not add a cookie jar, which
    /// is what the jarless fallback auth path wants.
    pub fn from_transport(host: &str, port: u16, transport: &TransportConfig) -> Result<Self, Error> {
        let endpoint = Url::parse(&format!("http://{host}:{port}/json"))?;
        let http = transport.build_client()?;
        Ok(Self {
            http,
            endpoint,
            next_id: AtomicI64::new(1),
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, endpoint: Url) -> Self {
        Self {
            http,
            endpoint,
            next_id: AtomicI64::new(1),
        }
    }

    /// The `/json` endpoint URL this client posts to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    // ── Request mechanics ────────────────────────────────────────────

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Post one RPC request and return the raw status and body.
    async fn execute(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<(reqwest::StatusCode, String), Error> {
        let request = RpcRequest {
            method,
            params,
            id: self.next_id(),
        };
        debug!("POST {} ({})", self.endpoint, method);

        let resp = self
            .http
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;
        Ok((status, body))
    }

    /// Issue an RPC call and deserialize its `result`.
    ///
    /// Failure conditions, in the order they are checked: non-200 status,
    /// a body that is not the JSON-RPC envelope, a populated `error`
    /// field. A `null` result deserializes into whatever `T` makes of
    /// `null` (set-style calls pass `Option<_>`; get-style calls fail
    /// with a protocol error, which is correct for them).
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, Error> {
        let (status, body) = self.execute(method, params).await?;

        if !status.is_success() {
            return Err(Error::Rpc {
                status: status.as_u16(),
                message: preview(&body).to_owned(),
            });
        }

        let envelope: RpcResponse =
            serde_json::from_str(&body).map_err(|e| Error::Protocol {
                message: e.to_string(),
                body: preview(&body).to_owned(),
            })?;

        if let Some(fault) = envelope.error {
            return Err(Error::Rpc {
                status: status.as_u16(),
                message: fault.message(),
            });
        }

        let result = envelope.result.unwrap_or(serde_json::Value::Null);
        serde_json::from_value(result).map_err(|e| Error::Protocol {
            message: format!("unexpected result shape for {method}: {e}"),
            body: preview(&body).to_owned(),
        })
    }

    // ── Authentication ───────────────────────────────────────────────

    /// Authenticate this session with the web UI password.
    ///
    /// A non-200 status or a falsy/missing `result` are both treated as
    /// authentication failure, matching the daemon's convention of
    /// answering `{"result": false}` for a wrong password. On success the
    /// session cookie lands in this client's jar.
    pub async fn login(&self, password: &SecretString) -> Result<(), Error> {
        let params = serde_json::json!([password.expose_secret()]);
        let (status, body) = self.execute("auth.login", params).await?;

        if !status.is_success() {
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {}", preview(&body)),
            });
        }

        let envelope: RpcResponse =
            serde_json::from_str(&body).map_err(|e| Error::Protocol {
                message: e.to_string(),
                body: preview(&body).to_owned(),
            })?;

        if let Some(fault) = envelope.error {
            return Err(Error::Authentication {
                message: fault.message(),
            });
        }

        match envelope.result {
            Some(ref value) if truthy(value) => Ok(()),
            _ => Err(Error::Authentication {
                message: "login rejected (check the daemon web password)".into(),
            }),
        }
    }
}
