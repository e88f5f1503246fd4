use reqwest::{Client, Method, StatusCode};
use reqwest::header::*;
use serde::de;

use std::fmt;
use std::str::FromStr;

use anyhow::{Result, Context};
use async_trait::async_trait;

use crate::error::DiscordError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// The http methods a request builder is allowed to use.
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
}

impl HttpMethod {

    /// The lowercase name of the method as accepted by [`HttpMethod::from_str`]
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = DiscordError;

    /// Only the exact lowercase names `get`, `post` and `put` are accepted.
    fn from_str(method: &str) -> Result<Self, Self::Err> {
        match method {
            "get" => Ok(HttpMethod::Get),
            "post" => Ok(HttpMethod::Post),
            "put" => Ok(HttpMethod::Put),
            other => Err(DiscordError::usage(format!("Attempted to set unallowed API method: {other}"))),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
        }
    }
}

#[derive(Debug, Clone)]
/// Represents a single fully resolved request to the Discord Api
pub struct DiscordHttpRequest {

    /// The method to use for the request
    pub method: HttpMethod,

    /// The absolute url the request is sent to.
    pub url: String,

    /// Default headers (authorization & accept) plus any extra ones added afterwards.
    pub headers: HeaderMap,

}

impl DiscordHttpRequest {

    /// Constructs a new [`DiscordHttpRequest`] authorised with `"{scheme} {token}"` and accepting json.
    pub fn new(method: HttpMethod, url: impl Into<String>, scheme: &str, token: &str) -> Result<Self> {

        let mut headers = HeaderMap::new();

        // Every request is authorised, a token which isn't valid header text can never be sent.
        let authorization_header_value = HeaderValue::from_str(&format!("{scheme} {token}"))
            .context("Failed to create authorization header for Http Request, perhaps token inputted is not ASCII?")?;
        headers.append(AUTHORIZATION, authorization_header_value);

        let mut request = Self {
            method,
            url: url.into(),
            headers,
        };

        // Responses are always read as json.
        request.add_header("accept", "application/json")?;

        Ok(request)
    }

    /// Adds a header to the [`HeaderMap`] of the request.
    pub fn add_header(&mut self, header_key: &'static str, header_value: &str) -> Result<(), InvalidHeaderValue> {

        // Convert &str value into HeaderValue
        let header_value = HeaderValue::from_str(header_value)?;

        // Append new header to existing map
        self.headers
            .append(header_key, header_value);

        Result::Ok(())
    }
}

#[derive(Debug, Clone)]
/// The parts of a Discord Api response the builder keeps around after a call.
pub struct DiscordHttpResponse {

    /// The status the api answered with.
    pub status: StatusCode,

    /// The raw response body.
    pub body: String,
}

impl DiscordHttpResponse {

    /// Constructs a new [`DiscordHttpResponse`]
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Deserializes the body as json.
    pub fn json<T: de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Sends a [`DiscordHttpRequest`] and gives back the raw response.
///
/// Implementors never interpret the status code, that is left to the request builder.
#[async_trait]
pub trait DiscordHttpTransport: Send + Sync {
    async fn send(&self, request: DiscordHttpRequest) -> Result<DiscordHttpResponse>;
}

#[derive(Debug, Clone, Default)]
/// The production transport, backed by a shared reqwest [`Client`].
pub struct ReqwestTransport {

    // reqwest HTTP client used for requests on the Discord api.
    pub client: Client,
}

impl ReqwestTransport {

    pub fn new() -> Result<Self> {

        // Create the reqwest client utilised for https requests to discords api.
        let client = Client::builder()
            .build()
            .context("Should've created reqwest client for the Discord api")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl DiscordHttpTransport for ReqwestTransport {
    async fn send(&self, request: DiscordHttpRequest) -> Result<DiscordHttpResponse> {

        // Send the request to discord, a failure here means no response exists at all.
        let response = self.client.request(request.method.into(), &request.url)
            .headers(request.headers)
            .send()
            .await
            .context("Failed to send request to Discord Api")?;

        let status = response.status();
        let body = response.text()
            .await
            .context("Failed to read response body from Discord Api")?;

        Ok(DiscordHttpResponse::new(status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_lowercase_allowed_methods_parse() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("post".parse::<HttpMethod>().unwrap(), HttpMethod::Post);
        assert_eq!("put".parse::<HttpMethod>().unwrap(), HttpMethod::Put);

        for rejected in ["GET", "delete", "patch", ""] {
            let error = rejected.parse::<HttpMethod>().unwrap_err();
            assert!(matches!(&error, DiscordError::Usage(message) if message.ends_with(rejected)));
        }
    }

    #[test]
    fn request_carries_authorization_and_accept() {
        let request = DiscordHttpRequest::new(HttpMethod::Get, "https://discord.com/api/v10/users/@me", "Bearer", "abc").unwrap();
        assert_eq!(request.headers[AUTHORIZATION], "Bearer abc");
        assert_eq!(request.headers[ACCEPT], "application/json");
    }

    #[test]
    fn add_header_appends_to_defaults() {
        let mut request = DiscordHttpRequest::new(HttpMethod::Put, "https://discord.com", "Bot", "abc").unwrap();
        request.add_header("x-audit-log-reason", "cleanup").unwrap();

        assert_eq!(request.headers["x-audit-log-reason"], "cleanup");
        assert_eq!(request.headers.get_all(ACCEPT).iter().count(), 1);
        assert!(request.add_header("x-audit-log-reason", "two\nlines").is_err());
    }

    #[test]
    fn token_with_control_characters_is_rejected() {
        assert!(DiscordHttpRequest::new(HttpMethod::Get, "https://discord.com", "Bot", "abc\n").is_err());
    }

    #[test]
    fn response_body_decodes_as_json() {
        let response = DiscordHttpResponse::new(StatusCode::OK, r#"{"id":"42"}"#);
        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["id"], "42");
    }
}
