// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `NomaIQ` library.
//!
//! Failures are grouped by where they come from: value conversion, the
//! authenticated session, the transport to the cloud service, response
//! parsing, and individual property writes issued by commands.

use std::sync::Arc;

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// A value could not be converted to or from its device scale.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// The session is not (or no longer) authenticated.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// The remote service could not be reached or answered with a failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A response from the remote service could not be understood.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// A single property write failed.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// No device with this serial is part of the roster.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// A configuration value is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The coordinator timer loop is already running.
    #[error("coordinator is already running")]
    AlreadyRunning,

    /// A coordinator tick was abandoned before it finished.
    #[error("coordinator tick was cancelled")]
    Cancelled,

    /// A coordinator tick failed; the cause is shared with event subscribers.
    #[error("update failed: {0}")]
    UpdateFailed(#[source] Arc<Error>),
}

impl Error {
    /// Returns `true` if the error comes from the authenticated session.
    ///
    /// Update failures are classified by their cause.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        match self {
            Self::Auth(_) => true,
            Self::UpdateFailed(cause) => cause.is_auth(),
            _ => false,
        }
    }

    /// Returns `true` if retrying later may succeed without user action.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Auth(AuthError::Expiring) => true,
            Self::UpdateFailed(cause) => cause.is_transient(),
            _ => false,
        }
    }
}

/// Errors raised while converting values between consumer and device scales.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: i64,
        /// Maximum allowed value.
        max: i64,
        /// The actual value that was provided.
        actual: i64,
    },

    /// A property holds a value of a different kind than expected.
    #[error("property {property} is not {expected}")]
    WrongKind {
        /// The property name.
        property: String,
        /// The kind that was expected.
        expected: &'static str,
    },
}

/// Errors raised by the authenticated session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Credentials were rejected. Not retried automatically.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The access token is about to expire and should be refreshed.
    #[error("access token is about to expire")]
    Expiring,

    /// No access token is held, or the service no longer accepts it.
    #[error("not signed in")]
    NotSignedIn,
}

/// Errors raised while talking to the remote service.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed.
    #[cfg(feature = "cloud")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The response body, possibly empty.
        body: String,
    },

    /// Request or tick timed out.
    #[error("timed out after {0} ms")]
    Timeout(u64),

    /// Internal channel was closed.
    #[error("channel closed: {0}")]
    ChannelClosed(String),
}

/// Errors related to parsing service responses.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the response.
    #[error("missing field in response: {0}")]
    MissingField(String),

    /// Unexpected response format.
    #[error("unexpected response format: {0}")]
    UnexpectedFormat(String),
}

/// A single property write that failed.
#[derive(Debug, Error)]
#[error("failed to set {property} on {serial}: {source}")]
pub struct CommandError {
    /// Serial of the device the write was sent to.
    pub serial: String,
    /// The property that could not be written.
    pub property: String,
    /// Why the write failed.
    #[source]
    pub source: Box<Error>,
}

impl CommandError {
    /// Wraps a write failure for `property` on `serial`.
    #[must_use]
    pub fn new(serial: impl Into<String>, property: impl Into<String>, source: Error) -> Self {
        Self {
            serial: serial.into(),
            property: property.into(),
            source: Box::new(source),
        }
    }
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
