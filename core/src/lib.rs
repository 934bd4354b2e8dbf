//! Synchronous client core for a single-endpoint CRM REST API.
//!
//! # Overview
//! The remote CRM multiplexes every operation through one POST endpoint: a
//! form payload carries the credentials, a `Function` field selecting the
//! server-side behavior, and the operation's parameters JSON-serialized into
//! a single `Parameters` field. Responses are JSON envelopes with a boolean
//! `Success` flag, an `Error` description on failure, and operation-specific
//! fields on success.
//!
//! # Design
//! - Per-operation knowledge lives in a static method registry (`registry`);
//!   one generic dispatch routine (`CrmClient::invoke`) serves every
//!   operation.
//! - Parameter contracts are enforced before any I/O, so a rejected call
//!   never reaches the network.
//! - The actual HTTP round trip goes through the [`Transport`] trait
//!   (host-does-IO pattern), keeping the core deterministic and testable
//!   with canned responses.
//! - `get_all_pipeline_report` aggregates a paged report sequentially until
//!   a page comes back short of the fixed page size.

pub mod client;
pub mod credentials;
pub mod error;
pub mod http;
pub mod registry;

pub use client::{CallParameters, CrmClient, ENDPOINT_URL, REPORT_PAGE_SIZE};
pub use credentials::Credentials;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use registry::{MethodDescriptor, ParameterContract};
