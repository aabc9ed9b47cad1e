// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cloud service client.
//!
//! Talks to the Ayla-style REST API used by `NomaIQ` devices: a user service
//! for sign-in and token refresh, and a device service for devices and
//! property datapoints.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::RwLock;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::device::{Device, Properties, PropertyName, PropertyValue, Serial};
use crate::error::{AuthError, Error, ParseError, Result, TransportError};

use super::{DeviceSource, Session};

// ============================================================================
// CloudConfig
// ============================================================================

/// Configuration for the cloud service.
///
/// # Examples
///
/// ```
/// use nomaiq_lib::source::CloudConfig;
/// use std::time::Duration;
///
/// let config = CloudConfig::new("user@example.com", "secret", "app-id", "app-secret")
///     .with_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.username(), "user@example.com");
/// ```
#[derive(Clone)]
pub struct CloudConfig {
    username: String,
    password: String,
    app_id: String,
    app_secret: String,
    user_url: String,
    ads_url: String,
    timeout: Duration,
    auth_expiry_margin: Duration,
}

impl CloudConfig {
    /// Default user service (sign-in, token refresh).
    pub const DEFAULT_USER_URL: &'static str = "https://user-field.aylanetworks.com";
    /// Default device service.
    pub const DEFAULT_ADS_URL: &'static str = "https://ads-field.aylanetworks.com";
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
    /// How long before expiry a token is reported as expiring.
    pub const DEFAULT_AUTH_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

    /// Creates a configuration with account and application credentials.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            user_url: Self::DEFAULT_USER_URL.to_string(),
            ads_url: Self::DEFAULT_ADS_URL.to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
            auth_expiry_margin: Self::DEFAULT_AUTH_EXPIRY_MARGIN,
        }
    }

    /// Overrides the user service base URL.
    #[must_use]
    pub fn with_user_url(mut self, url: impl Into<String>) -> Self {
        self.user_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Overrides the device service base URL.
    #[must_use]
    pub fn with_ads_url(mut self, url: impl Into<String>) -> Self {
        self.ads_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets how long before expiry a token counts as expiring.
    #[must_use]
    pub fn with_auth_expiry_margin(mut self, margin: Duration) -> Self {
        self.auth_expiry_margin = margin;
        self
    }

    /// Returns the account username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the user service base URL.
    #[must_use]
    pub fn user_url(&self) -> &str {
        &self.user_url
    }

    /// Returns the device service base URL.
    #[must_use]
    pub fn ads_url(&self) -> &str {
        &self.ads_url
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl std::fmt::Debug for CloudConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudConfig")
            .field("username", &self.username)
            .field("app_id", &self.app_id)
            .field("user_url", &self.user_url)
            .field("ads_url", &self.ads_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct DeviceEnvelope {
    device: DeviceRecord,
}

#[derive(Debug, Deserialize)]
struct DeviceRecord {
    dsn: String,
    #[serde(default)]
    product_name: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    oem_model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PropertyEnvelope {
    property: PropertyRecord,
}

#[derive(Debug, Deserialize)]
struct PropertyRecord {
    name: String,
    #[serde(default)]
    value: serde_json::Value,
}

#[derive(Debug, Clone)]
struct AuthTokens {
    access_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

impl From<TokenResponse> for AuthTokens {
    fn from(response: TokenResponse) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at: Utc::now() + TimeDelta::try_seconds(response.expires_in).unwrap_or_default(),
        }
    }
}

// ============================================================================
// CloudClient
// ============================================================================

/// Client for the cloud service.
///
/// Implements [`Session`] and [`DeviceSource`]; call
/// [`sign_in`](Self::sign_in) before handing it to a coordinator.
///
/// # Examples
///
/// ```no_run
/// use nomaiq_lib::source::{CloudClient, CloudConfig, DeviceSource};
///
/// # async fn example() -> nomaiq_lib::Result<()> {
/// let client = CloudClient::new(CloudConfig::new("user", "pass", "id", "secret"))?;
/// client.sign_in().await?;
/// let devices = client.get_devices().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CloudClient {
    config: CloudConfig,
    http: Client,
    tokens: RwLock<Option<AuthTokens>>,
}

impl CloudClient {
    /// Creates a client. No request is made until [`sign_in`](Self::sign_in).
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new(config: CloudConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(TransportError::Http)?;

        Ok(Self {
            config,
            http,
            tokens: RwLock::new(None),
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &CloudConfig {
        &self.config
    }

    /// Returns `true` if an access token is held.
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.tokens.read().is_some()
    }

    /// Signs in with the configured credentials.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the service rejects the
    /// credentials, or a transport or parse error.
    pub async fn sign_in(&self) -> Result<()> {
        let url = format!("{}/users/sign_in.json", self.config.user_url);
        let body = json!({
            "user": {
                "email": self.config.username,
                "password": self.config.password,
                "application": {
                    "app_id": self.config.app_id,
                    "app_secret": self.config.app_secret,
                }
            }
        });

        tracing::debug!(username = %self.config.username, "Signing in");

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(TransportError::Http)?;
        let tokens: TokenResponse = parse_body(credential_status(response).await?).await?;

        *self.tokens.write() = Some(tokens.into());
        tracing::debug!("Signed in");
        Ok(())
    }

    /// Returns a copy of the current access token.
    fn access_token(&self) -> Result<String> {
        self.tokens
            .read()
            .as_ref()
            .map(|t| t.access_token.clone())
            .ok_or(Error::Auth(AuthError::NotSignedIn))
    }

    fn auth_header(token: &str) -> String {
        format!("auth_token {token}")
    }

    fn properties_url(&self, serial: &Serial) -> String {
        format!(
            "{}/apiv1/dsns/{}/properties.json",
            self.config.ads_url,
            urlencoding::encode(serial.as_str())
        )
    }

    fn datapoint_url(&self, serial: &Serial, name: &PropertyName) -> String {
        format!(
            "{}/apiv1/dsns/{}/properties/{}/datapoints.json",
            self.config.ads_url,
            urlencoding::encode(serial.as_str()),
            urlencoding::encode(name.as_str())
        )
    }

    async fn get(&self, url: &str) -> Result<Response> {
        let token = self.access_token()?;
        tracing::debug!(url = %url, "GET");
        let response = self
            .http
            .get(url)
            .header("Authorization", Self::auth_header(&token))
            .send()
            .await
            .map_err(TransportError::Http)?;
        data_status(response).await
    }
}

impl Session for CloudClient {
    fn check_auth(&self) -> Result<()> {
        let guard = self.tokens.read();
        let tokens = guard.as_ref().ok_or(AuthError::NotSignedIn)?;
        let margin =
            TimeDelta::from_std(self.config.auth_expiry_margin).unwrap_or_else(|_| TimeDelta::zero());
        if tokens.expires_at - Utc::now() <= margin {
            return Err(AuthError::Expiring.into());
        }
        Ok(())
    }

    async fn refresh_auth(&self) -> Result<()> {
        let refresh_token = self
            .tokens
            .read()
            .as_ref()
            .map(|t| t.refresh_token.clone())
            .ok_or(AuthError::NotSignedIn)?;

        let url = format!("{}/users/refresh_token.json", self.config.user_url);
        tracing::debug!("Refreshing access token");

        let response = self
            .http
            .post(&url)
            .json(&json!({ "user": { "refresh_token": refresh_token } }))
            .send()
            .await
            .map_err(TransportError::Http)?;
        let tokens: TokenResponse = parse_body(credential_status(response).await?).await?;

        *self.tokens.write() = Some(tokens.into());
        Ok(())
    }

    async fn sign_out(&self) -> Result<()> {
        let Some(token) = self.tokens.write().take().map(|t| t.access_token) else {
            return Ok(());
        };

        let url = format!("{}/users/sign_out.json", self.config.user_url);
        tracing::debug!("Signing out");

        let response = self
            .http
            .post(&url)
            .json(&json!({ "user": { "access_token": token } }))
            .send()
            .await
            .map_err(TransportError::Http)?;
        data_status(response).await?;
        Ok(())
    }
}

impl DeviceSource for CloudClient {
    async fn get_devices(&self) -> Result<Vec<Device>> {
        let url = format!("{}/apiv1/devices.json", self.config.ads_url);
        let envelopes: Vec<DeviceEnvelope> = parse_body(self.get(&url).await?).await?;

        Ok(envelopes
            .into_iter()
            .map(|DeviceEnvelope { device }| {
                let name = device.product_name.unwrap_or_else(|| device.dsn.clone());
                Device::new(device.dsn, name)
                    .with_model(device.model.unwrap_or_default())
                    .with_oem_model(device.oem_model.unwrap_or_default())
            })
            .collect())
    }

    async fn refresh_device(&self, device: &mut Device) -> Result<()> {
        let url = self.properties_url(device.serial());
        let envelopes: Vec<PropertyEnvelope> = parse_body(self.get(&url).await?).await?;

        let properties: Properties = envelopes
            .into_iter()
            .filter_map(|PropertyEnvelope { property }| {
                PropertyValue::from_json(&property.value)
                    .map(|value| (PropertyName::from(property.name.as_str()), value))
            })
            .collect();

        tracing::debug!(serial = %device.serial(), count = properties.len(), "Refreshed device");
        device.set_properties(properties);
        Ok(())
    }

    async fn set_property(
        &self,
        serial: &Serial,
        name: &PropertyName,
        value: &PropertyValue,
    ) -> Result<()> {
        let token = self.access_token()?;
        let url = self.datapoint_url(serial, name);

        tracing::debug!(%serial, property = %name, %value, "Setting property");

        let response = self
            .http
            .post(&url)
            .header("Authorization", Self::auth_header(&token))
            .json(&json!({ "datapoint": { "value": value.to_json() } }))
            .send()
            .await
            .map_err(TransportError::Http)?;
        data_status(response).await?;
        Ok(())
    }
}

// ============================================================================
// Response handling
// ============================================================================

/// Maps a sign-in or token refresh response; 401/403 mean bad credentials.
async fn credential_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::InvalidCredentials(body).into());
    }
    data_status(response).await
}

/// Maps a data response; 401 means the token is no longer accepted.
async fn data_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(AuthError::NotSignedIn.into());
    }
    let body = response.text().await.unwrap_or_default();
    Err(TransportError::Status {
        status: status.as_u16(),
        body,
    }
    .into())
}

async fn parse_body<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.text().await.map_err(TransportError::Http)?;
    serde_json::from_str(&body).map_err(|e| Error::Parse(ParseError::Json(e)))
}

// ============================================================================
// Credential validation
// ============================================================================

/// Outcome of checking a set of credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialCheck {
    /// The service accepted the credentials.
    Valid,
    /// The service rejected the credentials.
    InvalidAuth,
    /// The service could not be reached.
    CannotConnect,
    /// Something else went wrong.
    Unknown(String),
}

/// Checks credentials by signing in, then signing out again.
///
/// # Examples
///
/// ```no_run
/// use nomaiq_lib::source::{CloudConfig, CredentialCheck, validate_credentials};
///
/// # async fn example() {
/// let config = CloudConfig::new("user", "pass", "id", "secret");
/// match validate_credentials(&config).await {
///     CredentialCheck::Valid => println!("ok"),
///     other => println!("cannot use these credentials: {other:?}"),
/// }
/// # }
/// ```
pub async fn validate_credentials(config: &CloudConfig) -> CredentialCheck {
    let client = match CloudClient::new(config.clone()) {
        Ok(client) => client,
        Err(e) => return CredentialCheck::Unknown(e.to_string()),
    };

    match client.sign_in().await {
        Ok(()) => {
            if let Err(e) = client.sign_out().await {
                tracing::debug!(error = %e, "Sign-out after validation failed");
            }
            CredentialCheck::Valid
        }
        Err(Error::Auth(_)) => CredentialCheck::InvalidAuth,
        Err(Error::Transport(_)) => CredentialCheck::CannotConnect,
        Err(e) => {
            tracing::error!(error = %e, "Unexpected error while validating credentials");
            CredentialCheck::Unknown(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> CloudClient {
        CloudClient::new(
            CloudConfig::new("user", "pass", "id", "secret")
                .with_ads_url("https://ads.example.com/"),
        )
        .unwrap()
    }

    fn tokens(expires_in: TimeDelta) -> AuthTokens {
        AuthTokens {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: Utc::now() + expires_in,
        }
    }

    #[test]
    fn check_auth_without_sign_in() {
        let err = client().check_auth().unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::NotSignedIn)));
    }

    #[test]
    fn check_auth_reports_expiring_tokens() {
        let client = client();
        *client.tokens.write() = Some(tokens(TimeDelta::seconds(30)));
        assert!(matches!(
            client.check_auth(),
            Err(Error::Auth(AuthError::Expiring))
        ));

        *client.tokens.write() = Some(tokens(TimeDelta::hours(1)));
        assert!(client.check_auth().is_ok());
    }

    #[test]
    fn urls_are_encoded() {
        let client = client();
        assert_eq!(
            client.properties_url(&Serial::from("AC 1")),
            "https://ads.example.com/apiv1/dsns/AC%201/properties.json"
        );
        assert_eq!(
            client.datapoint_url(&Serial::from("AC1"), &PropertyName::DoorToggle),
            "https://ads.example.com/apiv1/dsns/AC1/properties/door_toggle/datapoints.json"
        );
    }

    #[test]
    fn debug_hides_secrets() {
        let config = CloudConfig::new("user", "hunter2", "id", "app-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("app-secret"));
    }
}
