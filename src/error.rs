//! The single reporting channel every builder failure goes through.
//!
//! A failure is always logged first; what happens afterwards is decided by the [`FailurePolicy`] of the client.
use std::fmt::{self, Debug, Display};
use std::str::FromStr;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::builder::Placeholder;

#[derive(Debug, Error)]
/// Every way a chain of builder calls can fail.
pub enum DiscordError {

    /// The builder was used in a way it does not allow, e.g. an unknown method or reading a result of a failed call.
    #[error("{0}")]
    Usage(String),

    /// An identifier was requested for a placeholder the uri does not contain.
    #[error("API call attempted to set {placeholder} id, but the requested path {uri} does not contain {token}", token = .placeholder.token())]
    ConfigurationMismatch {
        placeholder: Placeholder,
        uri: String,
    },

    /// An identifier was requested for a placeholder but none could be found.
    #[error("API call requested {placeholder} parameter, but no {placeholder} was provided, logged in or configured")]
    MissingIdentifier {
        placeholder: Placeholder,
    },

    /// The http call itself could not be completed.
    #[error("Fatal execution error")]
    Transport(#[source] anyhow::Error),

    /// The Discord api answered with anything other than 200.
    #[error("API returned non-OK status {status}")]
    Api {
        status: StatusCode,
        body: String,
    },

    /// The body of a successful call could not be decoded.
    #[error("Failed to decode API response body")]
    Decode(#[source] serde_json::Error),
}

impl DiscordError {

    /// Shorthand for a [`DiscordError::Usage`].
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
/// What happens to a failure after it has been logged.
pub enum FailurePolicy {

    /// Unwind the whole in-flight request cycle with a [`RequestAborted`] payload carrying a 500 status.
    /// Nothing after the failing call in the chain runs.
    #[default]
    Abort,

    /// Hand the [`DiscordError`] back to the caller as an `Err`.
    Propagate,
}

impl FailurePolicy {

    /// Logs `error` together with every diagnostic payload, then applies the policy.
    ///
    /// Payloads are rendered in their pretty debug form, one per line.
    /// Under [`FailurePolicy::Abort`] this never returns.
    pub fn escalate<T>(self, error: DiscordError, payloads: &[&dyn Debug]) -> Result<T, DiscordError> {

        let message = render(&error, payloads);
        tracing::error!(policy = ?self, "{message}");

        match self {
            FailurePolicy::Abort => std::panic::panic_any(RequestAborted {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error,
            }),
            FailurePolicy::Propagate => Err(error),
        }
    }
}

/// The logged text of a failure, its display text followed by each payload on its own tab indented line.
fn render(error: &DiscordError, payloads: &[&dyn Debug]) -> String {
    let mut message = error.to_string();
    for payload in payloads {
        message.push_str(&format!("\n\t{payload:#?}"));
    }
    message
}

impl FromStr for FailurePolicy {
    type Err = DiscordError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "abort" => Ok(Self::Abort),
            "propagate" => Ok(Self::Propagate),
            other => Err(DiscordError::usage(format!("Unknown failure policy: {other}"))),
        }
    }
}

#[derive(Debug)]
/// Panic payload used by [`FailurePolicy::Abort`].
///
/// A hosting web stack that catches panics can downcast to this type and answer with [`RequestAborted::status`].
pub struct RequestAborted {

    /// Always `500 Internal Server Error`.
    pub status: StatusCode,

    /// The failure which aborted the request.
    pub error: DiscordError,
}

impl Display for RequestAborted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request aborted with status {}: {}", self.status, self.error)
    }
}
