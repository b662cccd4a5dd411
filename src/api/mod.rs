//! HTTP access to the question/voting service.
//!
//! [`ApiClient`] owns the session credential and the cookie jar holding the
//! refresh credential. Every authenticated call goes through the client's
//! `execute` core, which recovers from an expired bearer token by refreshing
//! once and resending; the control states live in [`RequestFlow`].

use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use log::{info, warn};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::TokenResponse;

mod auth;
mod flow;
mod question;

pub use flow::{RequestFlow, Step};
pub use question::QuestionService;

/// Holder of the bearer credential for one client session.
///
/// Login and refresh write it, logout and a failed refresh clear it, and
/// every authenticated request re-reads it just before sending. An explicit
/// per-client cell rather than process-global state, so independent sessions
/// can coexist.
#[derive(Debug, Default)]
pub struct Session {
    token: RwLock<Option<String>>,
}

impl Session {
    /// The currently held token, if any.
    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .expect("no writer panics while holding the session lock")
            .clone()
    }

    /// Replace the held token.
    pub fn set_token(&self, token: impl Into<String>) {
        *self
            .token
            .write()
            .expect("no writer panics while holding the session lock") = Some(token.into());
    }

    /// Discard the held token.
    pub fn clear_token(&self) {
        *self
            .token
            .write()
            .expect("no writer panics while holding the session lock") = None;
    }
}

/// A unique identifier for a particular outgoing request, for log
/// correlation.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub(crate) struct RequestId(usize);

impl RequestId {
    /// Atomically get the next ID. This wraps around back to zero if you
    /// somehow exceed a usize.
    pub(crate) fn next() -> RequestId {
        static REQUEST_ID_COUNTER: AtomicUsize = AtomicUsize::new(0);
        RequestId(REQUEST_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Body shape of every service error response.
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for the question/voting service.
pub struct ApiClient {
    http: Client,
    base: String,
    session: Session,
}

impl ApiClient {
    /// Build a client for the service rooted at `base`, e.g.
    /// `http://localhost:8080/api`.
    pub fn new(base: impl Into<String>) -> Result<Self> {
        Self::build(base.into(), None)
    }

    /// Build a client from configuration, applying its request deadline.
    pub fn with_config(config: &Config) -> Result<Self> {
        Self::build(config.api_url().to_string(), Some(config.request_timeout()))
    }

    fn build(base: String, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder().cookie_store(true);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base: base.trim_end_matches('/').to_string(),
            session: Session::default(),
        })
    }

    /// The session holding this client's bearer credential.
    pub fn session(&self) -> &Session {
        &self.session
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    pub(crate) async fn get<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.execute(Method::GET, path, None).await
    }

    pub(crate) async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute(Method::POST, path, Some(serde_json::to_value(body)?))
            .await
    }

    /// Issue an authenticated JSON request.
    ///
    /// The current bearer token (if any) is attached; on a 401 the refresh
    /// endpoint is called exactly once and the request resent with the new
    /// token. Any remaining failure carries the service's error message.
    pub(crate) async fn execute<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let id = RequestId::next();
        let url = self.endpoint(path);
        let mut flow = RequestFlow::Sent;
        let mut response = self.send(id, &method, &url, body.as_ref()).await?;

        loop {
            let status = response.status();
            match flow.on_response(status) {
                Step::Deliver => {
                    info!("<-rsp{id} {status}");
                    return Ok(response.json().await?);
                }
                Step::Refresh => {
                    warn!("<-rsp{id} {status}, refreshing credential");
                    flow = flow.refreshing();
                    self.refresh().await?;
                    flow = flow.resent();
                    response = self.send(id, &method, &url, body.as_ref()).await?;
                }
                Step::Fail => {
                    warn!("<-rsp{id} {status}");
                    return Err(self.failure(response).await);
                }
            }
        }
    }

    /// One raw send. The session token is re-read here so a refresh that
    /// happened since the previous attempt is picked up.
    async fn send(
        &self,
        id: RequestId,
        method: &Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<Response> {
        info!("->req{id} {method} {url}");
        let mut request = self.http.request(method.clone(), url);
        if let Some(token) = self.session.token() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    /// Exchange the cookie-carried refresh credential for a new bearer
    /// token. Any failure discards the held token and surfaces as
    /// `Unauthorized`; there is no second attempt.
    pub async fn refresh(&self) -> Result<()> {
        let response = match self.http.get(self.endpoint("/user/refresh")).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                self.session.clear_token();
                return Err(Error::Unauthorized(format!(
                    "credential refresh failed with status {}",
                    response.status()
                )));
            }
            Err(err) => {
                self.session.clear_token();
                return Err(Error::Unauthorized(format!(
                    "credential refresh failed: {err}"
                )));
            }
        };
        let token: TokenResponse = match response.json().await {
            Ok(token) => token,
            Err(err) => {
                self.session.clear_token();
                return Err(Error::Unauthorized(format!(
                    "credential refresh returned an unreadable body: {err}"
                )));
            }
        };
        self.session.set_token(token.access_token);
        Ok(())
    }

    /// Build the error for a non-2xx response, preferring the service's
    /// `{error}` message over a generic status line.
    async fn failure(&self, response: Response) -> Error {
        let status = response.status();
        let message = match response.json::<ErrorBody>().await {
            Ok(body) if !body.error.is_empty() => body.error,
            _ => format!("request failed with status {status}"),
        };
        Error::RequestFailed { status, message }
    }
}
