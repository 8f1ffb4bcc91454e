use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Url};
use std::time::Duration;

use crate::{Error, FetchError};

/// Text transport used by every adapter.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<HttpFetcher, Error> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::Client(e.to_string()))?;
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        // paths and queries may carry credentials
        debug!("requesting from {}", url_host(url));
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout {
                        url: url.to_string(),
                    }
                } else {
                    FetchError::Transport {
                        url: url.to_string(),
                        message: e.to_string(),
                    }
                }
            })?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        response.text().await.map_err(|e| FetchError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

impl FetchError {
    /// Replaces every occurrence of `secret` in the error text, so credentials
    /// embedded in upstream URLs never reach logs or HTTP responses.
    pub fn redact(self, secret: &str) -> FetchError {
        if secret.is_empty() {
            return self;
        }
        let hide = |s: String| s.replace(secret, "***");
        match self {
            FetchError::Timeout { url } => FetchError::Timeout { url: hide(url) },
            FetchError::Transport { url, message } => FetchError::Transport {
                url: hide(url),
                message: hide(message),
            },
            FetchError::Status { url, status } => FetchError::Status {
                url: hide(url),
                status,
            },
            FetchError::Body { url, message } => FetchError::Body {
                url: hide(url),
                message: hide(message),
            },
        }
    }
}

fn url_host(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| String::from("<invalid url>"))
}
