// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, Response};
use screendeck_app::{
    Credentials, LoginReply, ResultSet, ScreenDescriptor, ScreenService, ServiceError,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
enum Endpoint {
    Ready(String),
    Unusable(String),
}

/// Blocking client for the screen service.
///
/// A missing or invalid base URL does not fail construction; every call then
/// reports [`ServiceError::Connectivity`] so the app can still start.
#[derive(Debug, Clone)]
pub struct Client {
    endpoint: Endpoint,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: Option<&str>, timeout: Duration) -> Result<Self> {
        let endpoint = match base_url.map(str::trim).filter(|raw| !raw.is_empty()) {
            None => Endpoint::Unusable(
                "no base URL configured; set [api].base_url or SCREENDECK_API_URL".to_owned(),
            ),
            Some(raw) => match validate_base_url(raw) {
                Ok(base) => Endpoint::Ready(base),
                Err(reason) => Endpoint::Unusable(reason),
            },
        };

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            endpoint,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> Option<&str> {
        match &self.endpoint {
            Endpoint::Ready(base) => Some(base),
            Endpoint::Unusable(_) => None,
        }
    }

    /// Why the client cannot reach anything, if it cannot.
    pub fn endpoint_problem(&self) -> Option<&str> {
        match &self.endpoint {
            Endpoint::Ready(_) => None,
            Endpoint::Unusable(reason) => Some(reason),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Probes the service root. Any 2xx counts as reachable.
    pub fn ping(&self) -> Result<(), ServiceError> {
        let base = self.ready_base()?;
        let response = self
            .http
            .get(format!("{base}/"))
            .send()
            .map_err(|error| connection_error(base, &error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ServiceError::Connectivity(clean_error_response(
                status, &body,
            )));
        }
        Ok(())
    }

    fn ready_base(&self) -> Result<&str, ServiceError> {
        match &self.endpoint {
            Endpoint::Ready(base) => Ok(base),
            Endpoint::Unusable(reason) => Err(ServiceError::Connectivity(reason.clone())),
        }
    }
}

impl ScreenService for Client {
    fn login(&self, credentials: &Credentials) -> Result<LoginReply, ServiceError> {
        let base = self.ready_base()?;
        let response = self
            .http
            .post(format!("{base}/login"))
            .json(credentials)
            .send()
            .map_err(|error| connection_error(base, &error))?;

        // rejected logins arrive as 401 with a JSON envelope, so the body is
        // decoded regardless of status
        let (status, body) = read_body(base, response)?;
        debug!(status = status.as_u16(), "login reply received");
        decode_login_reply(status, &body)
    }

    fn list_screens(&self) -> Result<Vec<ScreenDescriptor>, ServiceError> {
        let base = self.ready_base()?;
        let response = self
            .http
            .get(format!("{base}/screens"))
            .send()
            .map_err(|error| connection_error(base, &error))?;

        let (status, body) = read_body(base, response)?;
        if !status.is_success() {
            return Err(ServiceError::Connectivity(clean_error_response(
                status, &body,
            )));
        }
        serde_json::from_str(&body)
            .map_err(|error| ServiceError::Malformed(format!("decode screen list: {error}")))
    }

    fn run_screen(&self, url: &str) -> Result<ResultSet, ServiceError> {
        let base = self.ready_base()?;
        let response = self
            .http
            .post(format!("{base}/run"))
            .json(&RunRequest { url })
            .send()
            .map_err(|error| connection_error(base, &error))?;

        let (status, body) = read_body(base, response)?;
        if !status.is_success() {
            return Err(ServiceError::RunFailed(clean_error_response(status, &body)));
        }
        decode_run_reply(&body)
    }
}

fn validate_base_url(raw: &str) -> std::result::Result<String, String> {
    let trimmed = raw.trim_end_matches('/');
    let parsed = Url::parse(trimmed)
        .map_err(|error| format!("base URL {raw:?} is not a valid URL: {error}"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(format!(
            "base URL {raw:?} must use http or https, got {}",
            parsed.scheme()
        ));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(format!("base URL {raw:?} has no host"));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(format!(
            "base URL {raw:?} must not carry a query or fragment"
        ));
    }
    Ok(trimmed.to_owned())
}

fn read_body(base: &str, response: Response) -> Result<(StatusCode, String), ServiceError> {
    let status = response.status();
    let body = response
        .text()
        .map_err(|error| connection_error(base, &error))?;
    Ok((status, body))
}

fn decode_login_reply(status: StatusCode, body: &str) -> Result<LoginReply, ServiceError> {
    let envelope: LoginEnvelope = serde_json::from_str(body).map_err(|error| {
        ServiceError::Malformed(format!(
            "decode login reply (HTTP {}): {error}",
            status.as_u16()
        ))
    })?;

    match (envelope.status, envelope.error) {
        (Some(status), error) => Ok(LoginReply {
            status,
            message: envelope.msg.or(error),
        }),
        (None, Some(error)) => Ok(LoginReply {
            status: "error".to_owned(),
            message: Some(error),
        }),
        (None, None) => Err(ServiceError::Malformed(format!(
            "login reply (HTTP {}) has no status",
            status.as_u16()
        ))),
    }
}

fn decode_run_reply(body: &str) -> Result<ResultSet, ServiceError> {
    match serde_json::from_str::<ResultSet>(body) {
        Ok(rows) => Ok(rows),
        Err(error) => {
            if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body)
                && let Some(message) = envelope.error
            {
                return Err(ServiceError::RunFailed(message));
            }
            Err(ServiceError::Malformed(format!("decode run result: {error}")))
        }
    }
}

fn connection_error(base_url: &str, error: &reqwest::Error) -> ServiceError {
    ServiceError::Connectivity(format!("{base_url} ({error})"))
}

fn clean_error_response(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(error) = parsed.error
        && !error.is_empty()
    {
        return format!("server error ({}): {}", status.as_u16(), error);
    }

    if body.len() < 100 && !body.contains('{') && !body.contains('<') {
        return format!("server error ({}): {}", status.as_u16(), body.trim());
    }

    format!("server returned {}", status.as_u16())
}

#[derive(Debug, Serialize)]
struct RunRequest<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginEnvelope {
    status: Option<String>,
    msg: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<String>,
}
