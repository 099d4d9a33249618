//! HTTP access to the blog backend.
//!
//! One [`ApiClient`] is shared by every store. It owns the default request
//! configuration, including the bearer credential, so setting or clearing
//! the credential affects every request issued afterwards.

mod posts;
mod taxonomy;
mod user;

use crate::{config::ClientConfig, dto::ErrorBody, errors::ClientError, sync};
use reqwest::{Client, Method, RequestBuilder, Response, header};
use serde::de::DeserializeOwned;
use std::{
    sync::{Arc, RwLock},
    time::Duration,
};
use url::Url;

#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: Client,
    base_url: Url,
    bearer: RwLock<Option<String>>,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url,
                bearer: RwLock::new(None),
            }),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::new(config.base_url.clone(), config.request_timeout)
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Attach `token` as a bearer credential to all subsequent requests.
    pub fn set_bearer(&self, token: &str) {
        *sync::write(&self.inner.bearer) = Some(token.to_owned());
    }

    pub fn clear_bearer(&self) {
        *sync::write(&self.inner.bearer) = None;
    }

    pub fn bearer(&self) -> Option<String> {
        sync::read(&self.inner.bearer).clone()
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        // Keep any path prefix on the base URL (`https://host/blog/`).
        let base = self.inner.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}{path}"))
            .map_err(|e| ClientError::Config(format!("invalid endpoint `{path}`: {e}")))
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let url = self.endpoint(path)?;
        let builder = self
            .inner
            .http
            .request(method, url)
            .header(header::ACCEPT, "application/json");

        Ok(match self.bearer() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = checked(builder.send().await?).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn send_empty(&self, builder: RequestBuilder) -> Result<(), ClientError> {
        checked(builder.send().await?).await?;
        Ok(())
    }
}

/// Turns a non-success status into [`ClientError::Status`], keeping the
/// backend's `message` field when the body carries one.
async fn checked(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.bytes().await.unwrap_or_default();
    let message = serde_json::from_slice::<ErrorBody>(&body)
        .ok()
        .and_then(|body| body.message);

    Err(ClientError::Status { status, message })
}
