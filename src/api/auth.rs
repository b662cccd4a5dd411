use log::{info, warn};
use reqwest::{Method, Response};
use serde_json::Value;

use crate::error::Result;
use crate::model::{Credentials, Profile, RegisteredUser, TokenResponse};

use super::{ApiClient, RequestId};

impl ApiClient {
    /// Authenticate with the service. The issued bearer token is held in the
    /// session; the refresh credential arrives as an HTTP-only cookie and
    /// stays in the jar.
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self
            .send_public(
                Method::POST,
                "/user/login",
                Some(serde_json::to_value(&credentials)?),
            )
            .await?;
        let token: TokenResponse = response.json().await?;
        self.session.set_token(token.access_token);
        info!("logged in as {email}");
        Ok(())
    }

    /// Create an account. Does not log the new user in.
    pub async fn register(&self, email: &str, password: &str) -> Result<RegisteredUser> {
        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self
            .send_public(
                Method::POST,
                "/user/register",
                Some(serde_json::to_value(&credentials)?),
            )
            .await?;
        Ok(response.json().await?)
    }

    /// Invalidate the refresh cookie server-side, then drop the held token.
    pub async fn logout(&self) -> Result<()> {
        self.send_public(Method::GET, "/user/logout", None).await?;
        self.session.clear_token();
        info!("logged out");
        Ok(())
    }

    /// The logged-in user's profile.
    pub async fn profile(&self) -> Result<Profile> {
        self.get("/user/profile").await
    }

    /// Send a request that carries no bearer credential and is never
    /// retried: login, registration and logout failures are not recoverable
    /// by a token refresh.
    async fn send_public(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Response> {
        let id = RequestId::next();
        let url = self.endpoint(path);
        info!("->req{id} {method} {url}");
        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            info!("<-rsp{id} {status}");
            Ok(response)
        } else {
            warn!("<-rsp{id} {status}");
            Err(self.failure(response).await)
        }
    }
}
