//! HTTP-backed session provider. Asks the auth service who owns a bearer token.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::errors::CollaboratorError;
use crate::session::{Session, SessionProvider};

const SESSION_PATH: &str = "/v1/session";

#[derive(Clone)]
pub struct HttpSessionProvider {
    client: Client,
    base_url: String,
}

impl HttpSessionProvider {
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, CollaboratorError> {
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn session_url(&self) -> String {
        format!("{}{}", self.base_url, SESSION_PATH)
    }
}

#[async_trait]
impl SessionProvider for HttpSessionProvider {
    async fn current_session(
        &self,
        bearer: Option<&str>,
    ) -> Result<Option<Session>, CollaboratorError> {
        let Some(token) = bearer.filter(|t| !t.trim().is_empty()) else {
            debug!("No bearer token supplied; skipping session lookup");
            return Ok(None);
        };

        let response = self
            .client
            .get(self.session_url())
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let session: Option<Session> = response.json().await?;
        debug!(
            "Session resolved: identity_present={}",
            session.as_ref().and_then(Session::identity).is_some()
        );
        Ok(session)
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let value = header?.trim();
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
