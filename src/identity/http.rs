//! Hosted auth backend speaking the GoTrue REST dialect

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::debug;

use super::{AuthSession, IdentityError, IdentityProvider, SignUpRequest, UserInfo, UserUpdate};
use crate::config::IdentityConfig;

const PROVIDER_NAME: &str = "gotrue";

/// HTTP identity provider
pub struct HttpIdentityProvider {
    base_url: String,
    api_key: String,
    client: Client,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignUpBody<'a> {
    email: &'a str,
    password: &'a str,
    data: &'a super::UserMetadata,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    /// Autoconfirm enabled: a session is returned right away
    Session { user: UserInfo },
    /// Confirmation pending: only the user record
    User(UserInfo),
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: UserInfo,
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self, fallback: String) -> String {
        self.msg
            .or(self.message)
            .or(self.error_description)
            .or(self.error)
            .unwrap_or(fallback)
    }
}

impl HttpIdentityProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: Client::new(),
        }
    }

    /// Create from config.
    ///
    /// The API key is read from the environment variable named by
    /// `config.api_key_env`.
    pub fn from_config(config: &IdentityConfig) -> Result<Self, IdentityError> {
        if config.base_url.is_empty() {
            return Err(IdentityError::not_configured(PROVIDER_NAME));
        }
        match env::var(&config.api_key_env) {
            Ok(key) if !key.is_empty() => Ok(Self::new(config.base_url.clone(), key)),
            _ => Err(IdentityError::not_configured(PROVIDER_NAME)),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn with_key(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Content-Type", "application/json")
    }

    async fn send(request: RequestBuilder) -> Result<Response, IdentityError> {
        let response = request
            .send()
            .await
            .map_err(|e| IdentityError::network(PROVIDER_NAME, e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .unwrap_or_default()
            .into_message(body);

        Err(match status.as_u16() {
            401 | 403 => IdentityError::unauthorized(PROVIDER_NAME),
            400 | 422 => IdentityError::rejected(PROVIDER_NAME, message),
            429 => IdentityError::rate_limited(PROVIDER_NAME, retry_after),
            code => IdentityError::http(PROVIDER_NAME, code, message),
        })
    }

    async fn parse<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T, IdentityError> {
        response
            .json()
            .await
            .map_err(|e| IdentityError::http(PROVIDER_NAME, 0, format!("Parse error: {}", e)))
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn sign_up(&self, request: SignUpRequest) -> Result<UserInfo, IdentityError> {
        debug!(email = %request.email, "signing up");
        let mut builder = self.with_key(self.client.post(self.url("signup")));
        if let Some(redirect) = &request.email_redirect_to {
            builder = builder.query(&[("redirect_to", redirect)]);
        }
        let body = SignUpBody {
            email: &request.email,
            password: &request.password,
            data: &request.metadata,
        };

        let response = Self::send(builder.json(&body)).await?;
        Ok(match Self::parse::<SignUpResponse>(response).await? {
            SignUpResponse::Session { user } => user,
            SignUpResponse::User(user) => user,
        })
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, IdentityError> {
        debug!(%email, "signing in");
        let builder = self
            .with_key(self.client.post(self.url("token")))
            .query(&[("grant_type", "password")])
            .json(&Credentials { email, password });

        let token: TokenResponse = Self::parse(Self::send(builder).await?).await?;
        Ok(AuthSession {
            access_token: token.access_token,
            user: token.user,
        })
    }

    async fn update_user(
        &self,
        access_token: &str,
        update: UserUpdate,
    ) -> Result<UserInfo, IdentityError> {
        #[derive(Serialize)]
        struct UpdateBody<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            email: Option<&'a str>,
            data: &'a super::UserMetadata,
        }

        let builder = self
            .with_key(self.client.put(self.url("user")))
            .bearer_auth(access_token)
            .json(&UpdateBody {
                email: update.email.as_deref(),
                data: &update.metadata,
            });

        Self::parse(Self::send(builder).await?).await
    }
}
