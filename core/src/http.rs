//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The core
//! crate builds `HttpRequest` values and interprets `HttpResponse` values but
//! never touches the network itself — the actual round trip goes through a
//! caller-supplied [`Transport`]. This keeps the core deterministic: unit
//! tests drive the full dispatch pipeline with canned responses, and the
//! integration tests plug in a real HTTP agent.
//!
//! All fields use owned types (`String`, `Vec`) so request and response
//! values can outlive whatever buffers they were built from.

use crate::error::ApiError;

/// HTTP method for a request. The CRM protocol only ever POSTs, but the
/// transport surface stays general so test doubles can assert on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// The "POST form, get JSON" primitive the client dispatches through.
///
/// Implementations execute exactly one round trip per call and report a
/// failure to complete it as [`ApiError::Connection`]. Status interpretation
/// belongs to the client, so a 4xx/5xx response must come back as an
/// `HttpResponse`, not an error.
pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}
