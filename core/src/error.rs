//! Error types for the CRM API client.
//!
//! # Design
//! Contract violations (`UnknownOperation`, `UnrecognizedParameter`,
//! `InvalidArgument`) are caller programming errors and are raised before any
//! network I/O happens. The remaining variants classify what went wrong with
//! a single round trip: the transport failed outright, the server returned a
//! non-200 status, the body was not JSON, or the envelope itself reported
//! failure. A call never yields a partial result — it either returns a
//! success-flagged envelope (or the narrowed field) or one of these errors.

use std::fmt;

/// Errors returned by `CrmClient` operations.
#[derive(Debug)]
pub enum ApiError {
    /// The operation name is not present in the method registry.
    UnknownOperation(String),

    /// A caller-supplied parameter key is outside the operation's declared
    /// parameter set. Raised before any request is sent.
    UnrecognizedParameter(String),

    /// An argument failed a pre-flight check other than the parameter
    /// contract (e.g. a group name containing spaces).
    InvalidArgument(String),

    /// The round trip never completed — connection refused, timeout, etc.
    Connection(String),

    /// The server answered with a non-200 status. The body is carried raw
    /// and is never parsed as an envelope.
    Transport { status: u16, body: String },

    /// The response body could not be parsed as JSON.
    MalformedResponse(String),

    /// The envelope reported failure. Carries the server's error description
    /// verbatim.
    RemoteOperation(String),

    /// The parameter bundle could not be serialized for the wire.
    Serialization(String),

    /// A stored credentials file exists but is empty or malformed.
    InvalidCredentialsFile(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::UnknownOperation(name) => {
                write!(f, "unknown API operation: {name}")
            }
            ApiError::UnrecognizedParameter(name) => {
                write!(f, "parameter {name:?} is not recognized by the API")
            }
            ApiError::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            ApiError::Connection(msg) => write!(f, "connection failed: {msg}"),
            ApiError::Transport { status, body } => {
                write!(f, "HTTP {status}: {body}")
            }
            ApiError::MalformedResponse(msg) => {
                write!(f, "response is not valid JSON: {msg}")
            }
            ApiError::RemoteOperation(msg) => {
                write!(f, "API call failed: {msg}")
            }
            ApiError::Serialization(msg) => {
                write!(f, "serialization failed: {msg}")
            }
            ApiError::InvalidCredentialsFile(msg) => {
                write!(f, "invalid credentials file: {msg}")
            }
        }
    }
}

impl std::error::Error for ApiError {}
