//! Errors raised while fetching a schema over introspection.

use displaydoc::Display;
use serde::Serialize;
use thiserror::Error;

/// Classified failures of an introspection fetch.
///
/// `Cancelled` is a control-flow signal rather than a user-facing failure:
/// the coordinator swallows it and never publishes it to subscribers.
#[derive(Error, Display, Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
#[ignore_extra_doc_attributes]
pub enum FetchError {
    /// introspection request timed out after {elapsed_ms}ms
    Timeout {
        /// The timeout budget that was exhausted, in milliseconds.
        elapsed_ms: u64,
    },

    /// introspection request was cancelled
    Cancelled,

    /// HTTP fetch failed: {reason}
    ///
    /// note that this relates to a transport error and not a GraphQL error
    Transport {
        /// The reason the fetch failed.
        reason: String,
    },

    /// introspection was rejected by the service: {errors}
    IntrospectionRejected {
        /// The joined messages of the GraphQL `errors` array.
        errors: String,
    },

    /// introspection response was malformed: {reason}
    MalformedResponse {
        /// The reason the response could not be used.
        reason: String,
    },
}

impl FetchError {
    /// Whether a retry can reasonably be expected to succeed.
    ///
    /// Timeouts and transport failures are transient; a rejected or
    /// malformed response will not improve by asking again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::Timeout { .. } | FetchError::Transport { .. }
        )
    }
}
