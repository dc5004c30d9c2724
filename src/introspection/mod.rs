//! The introspection client.
//!
//! Issues a single introspection request against an endpoint and parses
//! the result into a [`Schema`]. The client holds no cache and no state
//! beyond the underlying connection pool; retry and refresh policy live
//! in [`crate::fetch`].

pub(crate) mod response;

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::header::HeaderName;
use reqwest::header::HeaderValue;
use reqwest::header::ACCEPT;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use url::Url;

use self::response::IntrospectionResponse;
use crate::error::FetchError;
use crate::schema::Schema;

/// The standard introspection query, as sent by every mainstream GraphQL
/// client. Kept as a `.graphql` asset next to this module.
pub static INTROSPECTION_QUERY: &str = include_str!("query.graphql");

const OPERATION_NAME: &str = "IntrospectionQuery";

/// Issues introspection requests over HTTP.
#[derive(Clone, Default)]
pub struct IntrospectionClient {
    http: reqwest::Client,
}

/// Outcome of a connectivity probe against an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ConnectivityStatus {
    Connected,
    Disconnected { reason: String },
}

impl IntrospectionClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches the endpoint's schema.
    ///
    /// The request is sent as a JSON POST carrying the standard
    /// introspection query, with the caller's headers applied on top of
    /// the JSON content-type defaults. It fails with:
    /// - [`FetchError::Timeout`] when `timeout` elapses (the transfer is
    ///   aborted),
    /// - [`FetchError::Cancelled`] when `cancellation` fires first (the
    ///   in-flight request is dropped and nothing else runs),
    /// - [`FetchError::Transport`] on connection or HTTP-status failures,
    /// - [`FetchError::IntrospectionRejected`] when the service answers
    ///   with GraphQL-level errors,
    /// - [`FetchError::MalformedResponse`] when the payload is not an
    ///   introspection result.
    pub async fn fetch(
        &self,
        url: &Url,
        headers: &HashMap<String, String>,
        timeout: Duration,
        cancellation: &CancellationToken,
    ) -> Result<Schema, FetchError> {
        let headers = build_header_map(headers)?;

        tokio::select! {
            _ = cancellation.cancelled() => Err(FetchError::Cancelled),
            result = self.execute(url, headers, timeout) => result,
        }
    }

    async fn execute(
        &self,
        url: &Url,
        headers: HeaderMap,
        timeout: Duration,
    ) -> Result<Schema, FetchError> {
        tracing::debug!(url = %url, "sending introspection request");

        let response = self
            .http
            .post(url.clone())
            .headers(headers)
            .timeout(timeout)
            .json(&serde_json::json!({
                "query": INTROSPECTION_QUERY,
                "operationName": OPERATION_NAME,
            }))
            .send()
            .await
            .map_err(|err| classify_reqwest_error(err, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Transport {
                reason: format!("endpoint returned HTTP {status}"),
            });
        }

        let payload: IntrospectionResponse = response
            .json()
            .await
            .map_err(|err| classify_reqwest_error(err, timeout))?;

        if !payload.errors.is_empty() {
            let errors = payload
                .errors
                .iter()
                .map(|error| error.message.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(FetchError::IntrospectionRejected { errors });
        }

        let raw_schema = payload
            .data
            .and_then(|data| data.schema)
            .ok_or_else(|| FetchError::MalformedResponse {
                reason: "introspection data is missing __schema".to_string(),
            })?;

        Schema::from_introspection(raw_schema)
    }

    /// Probes whether the endpoint answers introspection at all.
    ///
    /// Any failure, including a rejected introspection, maps to
    /// `Disconnected` with a displayable reason.
    pub async fn check_connectivity(
        &self,
        url: &Url,
        headers: &HashMap<String, String>,
        timeout: Duration,
    ) -> ConnectivityStatus {
        let probe = CancellationToken::new();
        match self.fetch(url, headers, timeout, &probe).await {
            Ok(_) => ConnectivityStatus::Connected,
            Err(err) => {
                tracing::debug!(url = %url, error = %err, "connectivity probe failed");
                ConnectivityStatus::Disconnected {
                    reason: err.to_string(),
                }
            }
        }
    }
}

fn build_header_map(headers: &HashMap<String, String>) -> Result<HeaderMap, FetchError> {
    let mut map = HeaderMap::with_capacity(headers.len() + 1);
    map.insert(ACCEPT, HeaderValue::from_static("application/json"));

    for (name, value) in headers {
        let name = HeaderName::try_from(name.as_str()).map_err(|err| FetchError::Transport {
            reason: format!("invalid header name '{name}': {err}"),
        })?;
        let value = HeaderValue::try_from(value.as_str()).map_err(|err| FetchError::Transport {
            reason: format!("invalid value for header '{name}': {err}"),
        })?;
        map.insert(name, value);
    }
    Ok(map)
}

fn classify_reqwest_error(err: reqwest::Error, timeout: Duration) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            elapsed_ms: timeout.as_millis() as u64,
        }
    } else if err.is_decode() {
        FetchError::MalformedResponse {
            reason: format!("response body was not valid JSON: {err}"),
        }
    } else {
        FetchError::Transport {
            reason: err.to_string(),
        }
    }
}
