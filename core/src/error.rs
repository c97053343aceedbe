use std::time::Duration;

use portfind_common::error::PatternError;
use thiserror::Error;

use crate::api::JobKind;

/// Failure talking to the upstream API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },
    #[error("API still throttling after {attempts} attempts")]
    Throttled { attempts: u32 },
    #[error("request failed")]
    Transport(#[from] reqwest::Error),
    #[error("malformed response from {path}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("response from {path} is missing `{field}`")]
    MissingField { path: String, field: &'static str },
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("{path} did not complete within {after:?}")]
    Timeout { path: String, after: Duration },
    #[error("paging loop: {0} was already fetched")]
    PagingLoop(String),
}

/// A live-table job that produced no usable table.
///
/// Never fatal: callers move on to the next strategy.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("could not create {kind} job")]
    Create {
        kind: JobKind,
        #[source]
        source: ApiError,
    },
    #[error("polling {kind} job {id} failed")]
    Poll {
        kind: JobKind,
        id: String,
        #[source]
        source: ApiError,
    },
    #[error("{kind} job {id} reported failure")]
    Failed { kind: JobKind, id: String },
    #[error("{kind} job {id} still pending after {attempts} polls")]
    Exhausted {
        kind: JobKind,
        id: String,
        attempts: u32,
    },
}

/// Failure of a whole resolution run.
#[derive(Debug, Error)]
pub enum LocateError {
    #[error(transparent)]
    Input(#[from] PatternError),
    #[error(transparent)]
    Upstream(#[from] ApiError),
    #[error("no client with IP {0} found in the selected networks")]
    IpNotFound(String),
    #[error("no organizations visible to this API key")]
    NoOrganizations,
    #[error("organization not found: {0}")]
    OrganizationNotFound(String),
    #[error("multiple organizations available ({0}), choose one with --org")]
    AmbiguousOrganization(String),
    #[error("network not found: {0}")]
    NetworkNotFound(String),
}
