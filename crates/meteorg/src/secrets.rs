//! Credentials for the upstream services.
//!
//! Deployed instances read them from Google Secret Manager with the identity
//! of the attached service account. Local runs read plain environment
//! variables named after the secret.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use std::{env, fmt, str::FromStr};

pub const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";
pub const SECRET_MANAGER_URL: &str = "https://secretmanager.googleapis.com/v1";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Secret {0} is not set")]
    Missing(String),
    #[error("Failed to obtain access token: {0}")]
    Token(String),
    #[error("Failed to access secret {name}: {message}")]
    Access { name: String, message: String },
    #[error("Secret {name} has an invalid payload: {reason}")]
    Payload { name: String, reason: String },
}

#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Latest value of the secret called `name`.
    async fn get_secret(&self, name: &str) -> Result<String, Error>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SecretsBackend {
    #[default]
    Gcp,
    Env,
}

impl FromStr for SecretsBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gcp" => Ok(SecretsBackend::Gcp),
            "env" => Ok(SecretsBackend::Env),
            other => Err(format!("unknown secrets backend: {}", other)),
        }
    }
}

impl fmt::Display for SecretsBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretsBackend::Gcp => write!(f, "gcp"),
            SecretsBackend::Env => write!(f, "env"),
        }
    }
}

#[derive(Deserialize)]
struct AccessToken {
    access_token: String,
}

#[derive(Deserialize)]
struct AccessSecretVersion {
    payload: SecretPayload,
}

#[derive(Deserialize)]
struct SecretPayload {
    /// Base64 of the secret bytes.
    data: String,
}

pub struct SecretManager {
    client: Client,
    project: String,
    token_url: String,
    api_url: String,
}

impl SecretManager {
    pub fn new(client: Client, project: impl Into<String>) -> Self {
        SecretManager {
            client,
            project: project.into(),
            token_url: METADATA_TOKEN_URL.to_string(),
            api_url: SECRET_MANAGER_URL.to_string(),
        }
    }

    pub fn with_endpoints(mut self, token_url: impl Into<String>, api_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn access_token(&self) -> Result<String, Error> {
        let token: AccessToken = self
            .client
            .get(&self.token_url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::Token(e.to_string()))?
            .json()
            .await
            .map_err(|e| Error::Token(e.to_string()))?;
        Ok(token.access_token)
    }

    fn secret_url(&self, name: &str) -> String {
        format!(
            "{}/projects/{}/secrets/{}/versions/latest:access",
            self.api_url, self.project, name
        )
    }
}

fn decode_payload(name: &str, data: &str) -> Result<String, Error> {
    let bytes = STANDARD.decode(data).map_err(|e| Error::Payload {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| Error::Payload {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl SecretStore for SecretManager {
    async fn get_secret(&self, name: &str) -> Result<String, Error> {
        let token = self.access_token().await?;
        debug!("accessing secret {} in project {}", name, self.project);

        let access_error = |e: reqwest::Error| Error::Access {
            name: name.to_string(),
            message: e.to_string(),
        };
        let version: AccessSecretVersion = self
            .client
            .get(self.secret_url(name))
            .bearer_auth(token)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(access_error)?
            .json()
            .await
            .map_err(access_error)?;

        decode_payload(name, &version.payload.data)
    }
}

/// Reads each secret from the environment variable of the same name.
#[derive(Debug, Default, Clone)]
pub struct EnvSecrets;

#[async_trait]
impl SecretStore for EnvSecrets {
    async fn get_secret(&self, name: &str) -> Result<String, Error> {
        env::var(name).map_err(|_| Error::Missing(name.to_string()))
    }
}
