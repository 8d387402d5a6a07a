//! Bearer-token session shared by every outbound request, plus the
//! authenticator that refreshes it through the server's login mutation.
//!
//! The token is replaced wholesale on a successful login and cleared on
//! invalidation; it is never patched. Requests that find no token present
//! must omit the authorization header entirely.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::{Error, Result};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

static LOGIN_MUTATION: &str =
    "mutation Login($input: LoginInput!) { login(input: $input) { accessToken } }";

/// The process-wide bearer credential. Cheap to clone; all clones share the
/// same underlying token.
#[derive(Clone, Debug, Default)]
pub struct Session {
    token: Arc<RwLock<Option<String>>>,
}

impl Session {
    /// Creates an empty session with no token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current bearer token, if any.
    pub async fn current_token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// Replaces the token wholesale.
    pub async fn set(&self, token: String) {
        *self.token.write().await = Some(token);
    }

    /// Clears the token, forcing the next refresh to re-authenticate.
    pub async fn invalidate(&self) {
        *self.token.write().await = None;
    }
}

/// Exchanges credentials for a fresh bearer token.
#[async_trait]
pub trait Authenticator: Send + Sync + 'static {
    /// Performs the credential exchange and stores the new token in the
    /// session. Failure leaves the session untouched.
    async fn refresh(&self) -> Result<()>;
}

/// Authenticator speaking the server's GraphQL login mutation over HTTP.
#[derive(Clone, Debug)]
pub struct GraphqlAuthenticator {
    client: reqwest::Client,
    endpoint: Url,
    username: String,
    password: String,
    session: Session,
}

impl GraphqlAuthenticator {
    /// Creates a new authenticator posting to the given GraphQL endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        endpoint: Url,
        username: impl Into<String>,
        password: impl Into<String>,
        session: Session,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(Error::ClientBuild)?;

        Ok(Self {
            client,
            endpoint,
            username: username.into(),
            password: password.into(),
            session,
        })
    }

    /// Builds the login POST. Like every other outbound request, it carries
    /// the session's current bearer token when one is present.
    async fn login_request(&self) -> Result<reqwest::Request> {
        let body = GraphqlRequest {
            query: LOGIN_MUTATION,
            variables: LoginVariables {
                input: LoginInput {
                    username: &self.username,
                    password: &self.password,
                },
            },
        };

        let mut builder = self.client.post(self.endpoint.clone()).json(&body);
        if let Some(token) = self.session.current_token().await {
            builder = builder.bearer_auth(token);
        }

        Ok(builder.build()?)
    }
}

#[async_trait]
impl Authenticator for GraphqlAuthenticator {
    async fn refresh(&self) -> Result<()> {
        let request = self.login_request().await?;
        let response = self.client.execute(request).await?.error_for_status()?;

        let parsed: GraphqlResponse = response.json().await?;
        if let Some(errors) = parsed.errors {
            return Err(Error::Rejected(errors.to_string()));
        }

        let token = parsed
            .data
            .map(|data| data.login.access_token)
            .ok_or(Error::MissingToken)?;

        self.session.set(token).await;
        info!("login succeeded, bearer token refreshed");

        Ok(())
    }
}

#[derive(Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: LoginVariables<'a>,
}

#[derive(Serialize)]
struct LoginVariables<'a> {
    input: LoginInput<'a>,
}

#[derive(Serialize)]
struct LoginInput<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<LoginData>,
    #[serde(default)]
    errors: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct LoginData {
    login: LoginResult,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResult {
    access_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_session_starts_empty() {
        let session = Session::new();
        assert_eq!(session.current_token().await, None);
    }

    #[tokio::test]
    async fn test_set_and_invalidate() {
        let session = Session::new();

        session.set("abc123".to_string()).await;
        assert_eq!(session.current_token().await.as_deref(), Some("abc123"));

        session.invalidate().await;
        assert_eq!(session.current_token().await, None);
    }

    #[tokio::test]
    async fn test_clones_share_token() {
        let session = Session::new();
        let clone = session.clone();

        session.set("shared".to_string()).await;
        assert_eq!(clone.current_token().await.as_deref(), Some("shared"));
    }

    #[test]
    fn test_login_request_shape() {
        let body = GraphqlRequest {
            query: LOGIN_MUTATION,
            variables: LoginVariables {
                input: LoginInput {
                    username: "user",
                    password: "pass",
                },
            },
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["variables"]["input"]["username"], "user");
        assert_eq!(json["variables"]["input"]["password"], "pass");
        assert!(json["query"].as_str().unwrap().contains("accessToken"));
    }

    #[tokio::test]
    async fn test_login_request_carries_existing_token() {
        let session = Session::new();
        session.set("stale".to_string()).await;

        let authenticator = GraphqlAuthenticator::new(
            Url::parse("http://localhost:4567/api/graphql").unwrap(),
            "user",
            "pass",
            session,
        )
        .unwrap();

        let request = authenticator.login_request().await.unwrap();
        let header = request.headers().get("authorization").unwrap();
        assert_eq!(header.to_str().unwrap(), "Bearer stale");
    }

    #[tokio::test]
    async fn test_login_request_omits_header_without_token() {
        let authenticator = GraphqlAuthenticator::new(
            Url::parse("http://localhost:4567/api/graphql").unwrap(),
            "user",
            "pass",
            Session::new(),
        )
        .unwrap();

        let request = authenticator.login_request().await.unwrap();
        assert!(request.headers().get("authorization").is_none());
    }

    #[test]
    fn test_login_response_shape() {
        let json = r#"{ "data": { "login": { "accessToken": "tok" } } }"#;
        let parsed: GraphqlResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.data.unwrap().login.access_token, "tok");

        let json = r#"{ "errors": [{ "message": "bad credentials" }] }"#;
        let parsed: GraphqlResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.data.is_none());
        assert!(parsed.errors.is_some());
    }
}
