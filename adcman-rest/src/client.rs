//! HTTPS client for the device management interface.
//!
//! Basic-auth credentials and the TLS-validation toggle come from
//! [`DeviceConfig`]; timeout and retry behavior live here, not in the
//! reconcilers.

use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use serde::Deserialize;
use tracing::debug;

use adcman_state::{Error, Result};

/// Connection settings for a managed device.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Management host, optionally with port
    pub host: String,
    pub user: String,
    pub password: String,
    /// Verify the device TLS certificate (default true)
    pub validate_certs: bool,
    pub connect_timeout: Duration,
}

impl DeviceConfig {
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            password: password.into(),
            validate_certs: true,
            connect_timeout: Duration::from_secs(30),
        }
    }
}

/// REST client for one device.
#[derive(Clone)]
pub struct DeviceClient {
    http: reqwest::Client,
    config: DeviceConfig,
}

impl DeviceClient {
    pub fn connect(config: DeviceConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(!config.validate_certs)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| Error::remote("client setup", e.to_string()))?;

        debug!(host = %config.host, user = %config.user, "Device client ready");
        Ok(Self { http, config })
    }

    pub fn host(&self) -> &str {
        &self.config.host
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("https://{}{}", self.config.host, path)
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.authed(self.http.get(self.url(path)))
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.authed(self.http.post(self.url(path)))
    }

    pub(crate) fn patch(&self, path: &str) -> RequestBuilder {
        self.authed(self.http.patch(self.url(path)))
    }

    pub(crate) fn delete(&self, path: &str) -> RequestBuilder {
        self.authed(self.http.delete(self.url(path)))
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.basic_auth(&self.config.user, Some(&self.config.password))
    }
}

/// Issue a request and map transport failures to the operation name.
pub(crate) async fn send(operation: &'static str, builder: RequestBuilder) -> Result<Response> {
    builder
        .send()
        .await
        .map_err(|e| Error::remote(operation, e.to_string()))
}

/// Reject non-2xx responses with the device's own message when it has one.
pub(crate) async fn check(operation: &'static str, response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let message = match response.text().await {
        Ok(body) => device_message(&body).unwrap_or(body),
        Err(_) => String::new(),
    };
    Err(Error::RemoteOperationFailed {
        operation: operation.to_string(),
        message: format!("{}: {}", status, message),
    })
}

/// Decode a JSON response body, attributing decode failures to the operation.
pub(crate) async fn json<T: serde::de::DeserializeOwned>(
    operation: &'static str,
    response: Response,
) -> Result<T> {
    response
        .json()
        .await
        .map_err(|e| Error::remote(operation, e.to_string()))
}

#[derive(Deserialize)]
struct DeviceMessage {
    message: String,
}

fn device_message(body: &str) -> Option<String> {
    serde_json::from_str::<DeviceMessage>(body)
        .ok()
        .map(|m| m.message)
}
