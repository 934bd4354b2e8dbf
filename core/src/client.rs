//! Generic dispatch pipeline and typed operation wrappers.
//!
//! # Design
//! `CrmClient` holds only the credential pair and the endpoint URL and
//! carries no mutable state between calls. Every operation funnels through
//! one generic [`CrmClient::invoke`] routine driven by the method registry:
//! lookup, parameter validation, form-payload construction, a single round
//! trip through the caller-supplied [`Transport`], envelope classification,
//! and result extraction. The typed wrappers (`search`, `create_contact`,
//! ...) only assemble parameters and delegate.
//!
//! No retries happen here. The remote documents no idempotency guarantees
//! for mutating functions, so a retry policy belongs to the caller.

use serde_json::Value;

use crate::credentials::Credentials;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, Transport};
use crate::registry::{self, MethodDescriptor};

/// Production endpoint. Every function is multiplexed through this one URL.
pub const ENDPOINT_URL: &str = "https://api.lessannoyingcrm.com";

/// Rows requested per page when aggregating a full pipeline report.
pub const REPORT_PAGE_SIZE: usize = 500;

/// Status filters the report API recognizes.
const REPORT_STATUS_FILTERS: &[&str] = &["all", "closed"];

/// Caller-supplied parameter bundle for one call. Serialized into the single
/// `Parameters` form field as a JSON blob.
pub type CallParameters = serde_json::Map<String, Value>;

/// Synchronous client for the CRM's single-endpoint REST API.
///
/// The typed wrappers return the narrowed result for their operation. Every
/// operation also supports the unprocessed-envelope form per call: pass the
/// same operation name and parameters to [`invoke`](Self::invoke) with `raw`
/// set.
#[derive(Debug, Clone)]
pub struct CrmClient {
    credentials: Credentials,
    endpoint_url: String,
}

impl CrmClient {
    pub fn new(credentials: Credentials) -> Self {
        Self::with_endpoint(credentials, ENDPOINT_URL)
    }

    /// Point the client at a non-production endpoint (tests, proxies).
    pub fn with_endpoint(credentials: Credentials, endpoint_url: &str) -> Self {
        Self {
            credentials,
            endpoint_url: endpoint_url.trim_end_matches('/').to_string(),
        }
    }

    /// Invoke a registered operation by name.
    ///
    /// With `raw` set the full envelope comes back unprocessed; otherwise the
    /// result is narrowed to the operation's declared response field. The
    /// toggle is per call, so any operation can be inspected in envelope
    /// form. A contract violation (unknown operation, unrecognized parameter)
    /// fails before the transport is touched.
    pub fn invoke<T: Transport>(
        &self,
        transport: &T,
        operation: &str,
        parameters: CallParameters,
        raw: bool,
    ) -> Result<Value, ApiError> {
        let descriptor = registry::lookup(operation)?;
        registry::validate(parameters.keys().map(String::as_str), descriptor)?;

        let request = self.build_request(descriptor, &parameters)?;
        let response = transport.execute(request)?;

        if response.status != 200 {
            return Err(ApiError::Transport {
                status: response.status,
                body: response.body,
            });
        }

        let envelope: Value = serde_json::from_str(&response.body)
            .map_err(|e| ApiError::MalformedResponse(e.to_string()))?;

        // An envelope without a Success flag predates the current protocol
        // revision; treat it as failure rather than guessing.
        let succeeded = envelope
            .get("Success")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !succeeded {
            let description = envelope
                .get("Error")
                .and_then(Value::as_str)
                .unwrap_or("the server reported failure without a description")
                .to_string();
            return Err(ApiError::RemoteOperation(description));
        }

        Ok(extract(descriptor, envelope, response.status, raw))
    }

    /// Build the form-encoded wire payload for one call.
    ///
    /// The remote expects the parameter bundle as one JSON string in the
    /// `Parameters` field, not as individual form fields.
    fn build_request(
        &self,
        descriptor: &MethodDescriptor,
        parameters: &CallParameters,
    ) -> Result<HttpRequest, ApiError> {
        let blob = serde_json::to_string(parameters)
            .map_err(|e| ApiError::Serialization(e.to_string()))?;
        let form = serde_urlencoded::to_string([
            ("UserCode", self.credentials.user_code.as_str()),
            ("APIToken", self.credentials.api_token.as_str()),
            ("Function", descriptor.remote_function),
            ("Parameters", blob.as_str()),
        ])
        .map_err(|e| ApiError::Serialization(e.to_string()))?;

        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.endpoint_url.clone(),
            headers: vec![(
                "content-type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            )],
            body: Some(form),
        })
    }

    /// Search contacts for a term. Narrows to the `Results` field; for the
    /// raw envelope, go through [`invoke`](Self::invoke).
    pub fn search<T: Transport>(&self, transport: &T, term: &str) -> Result<Value, ApiError> {
        let mut params = CallParameters::new();
        params.insert("SearchTerms".to_string(), Value::from(term));
        self.invoke(transport, "SearchContacts", params, false)
    }

    /// Fetch everything stored for a contact (the `Contact` field; raw form
    /// via [`invoke`](Self::invoke)).
    pub fn get_contact<T: Transport>(
        &self,
        transport: &T,
        contact_id: &str,
    ) -> Result<Value, ApiError> {
        let mut params = CallParameters::new();
        params.insert("ContactId".to_string(), Value::from(contact_id));
        self.invoke(transport, "GetContact", params, false)
    }

    /// Create a contact from a field bundle. Returns the new contact's id;
    /// the raw envelope is available via [`invoke`](Self::invoke).
    pub fn create_contact<T: Transport>(
        &self,
        transport: &T,
        fields: CallParameters,
    ) -> Result<Value, ApiError> {
        self.invoke(transport, "CreateContact", fields, false)
    }

    /// Edit an existing contact. Raw form via [`invoke`](Self::invoke).
    pub fn edit_contact<T: Transport>(
        &self,
        transport: &T,
        contact_id: &str,
        mut fields: CallParameters,
    ) -> Result<Value, ApiError> {
        fields.insert("ContactId".to_string(), Value::from(contact_id));
        self.invoke(transport, "EditContact", fields, false)
    }

    /// Delete a contact. The success envelope carries no data field, so the
    /// narrowed result is the HTTP status code; the envelope itself is
    /// available via [`invoke`](Self::invoke).
    pub fn delete_contact<T: Transport>(
        &self,
        transport: &T,
        contact_id: &str,
    ) -> Result<Value, ApiError> {
        let mut params = CallParameters::new();
        params.insert("ContactId".to_string(), Value::from(contact_id));
        self.invoke(transport, "DeleteContact", params, false)
    }

    /// Add a contact to a named group.
    ///
    /// Group names may not contain spaces (the API expects underscores, e.g.
    /// `cool_group`); a name with spaces is rejected before any I/O. Raw
    /// form via [`invoke`](Self::invoke).
    pub fn add_contact_to_group<T: Transport>(
        &self,
        transport: &T,
        contact_id: &str,
        group_name: &str,
    ) -> Result<Value, ApiError> {
        if group_name.contains(' ') {
            return Err(ApiError::InvalidArgument(format!(
                "group name {group_name:?} contains spaces; replace them with underscores"
            )));
        }
        let mut params = CallParameters::new();
        params.insert("ContactId".to_string(), Value::from(contact_id));
        params.insert("GroupName".to_string(), Value::from(group_name));
        self.invoke(transport, "AddContactToGroup", params, false)
    }

    /// Attach a new pipeline item to a contact. Raw form via
    /// [`invoke`](Self::invoke).
    pub fn create_pipeline<T: Transport>(
        &self,
        transport: &T,
        contact_id: &str,
        mut fields: CallParameters,
    ) -> Result<Value, ApiError> {
        fields.insert("ContactId".to_string(), Value::from(contact_id));
        self.invoke(transport, "CreatePipeline", fields, false)
    }

    /// Update an existing pipeline item. Raw form via
    /// [`invoke`](Self::invoke).
    pub fn update_pipeline<T: Transport>(
        &self,
        transport: &T,
        pipeline_item_id: &str,
        mut fields: CallParameters,
    ) -> Result<Value, ApiError> {
        fields.insert("PipelineItemId".to_string(), Value::from(pipeline_item_id));
        self.invoke(transport, "UpdatePipelineItem", fields, false)
    }

    /// Attach a note to a contact. Raw form via [`invoke`](Self::invoke).
    pub fn create_note<T: Transport>(
        &self,
        transport: &T,
        contact_id: &str,
        note: &str,
    ) -> Result<Value, ApiError> {
        let mut params = CallParameters::new();
        params.insert("ContactId".to_string(), Value::from(contact_id));
        params.insert("Note".to_string(), Value::from(note));
        self.invoke(transport, "CreateNote", params, false)
    }

    /// Create a task from a field bundle (`DueDate` is `YYYY-MM-DD`). Raw
    /// form via [`invoke`](Self::invoke).
    pub fn create_task<T: Transport>(
        &self,
        transport: &T,
        fields: CallParameters,
    ) -> Result<Value, ApiError> {
        self.invoke(transport, "CreateTask", fields, false)
    }

    /// Create a calendar event. Times are 24-hour `HH:MM`. Raw form via
    /// [`invoke`](Self::invoke).
    pub fn create_event<T: Transport>(
        &self,
        transport: &T,
        date: &str,
        start_time: &str,
        end_time: &str,
        name: &str,
    ) -> Result<Value, ApiError> {
        let mut params = CallParameters::new();
        params.insert("Date".to_string(), Value::from(date));
        params.insert("StartTime".to_string(), Value::from(start_time));
        params.insert("EndTime".to_string(), Value::from(end_time));
        params.insert("Name".to_string(), Value::from(name));
        self.invoke(transport, "CreateEvent", params, false)
    }

    /// Fetch one page of a pipeline report, narrowed to the `Result` rows.
    /// `params` may carry paging and sorting fields from the report
    /// contract; the raw envelope is available via [`invoke`](Self::invoke).
    pub fn get_pipeline_report<T: Transport>(
        &self,
        transport: &T,
        pipeline_id: &str,
        mut params: CallParameters,
    ) -> Result<Value, ApiError> {
        params.insert("PipelineId".to_string(), Value::from(pipeline_id));
        self.invoke(transport, "GetPipelineReport", params, false)
    }

    /// Fetch every row of a pipeline report, page by page.
    ///
    /// Pages are requested sequentially at [`REPORT_PAGE_SIZE`] rows, sorted
    /// by status, and concatenated in returned order. The loop continues only
    /// while a page comes back exactly full, so it terminates even when the
    /// dataset size is a multiple of the page size (the final request then
    /// returns zero rows).
    ///
    /// A `status_filter` outside the recognized set is advisory, not fatal:
    /// it is dropped with a warning and the report is fetched unfiltered.
    pub fn get_all_pipeline_report<T: Transport>(
        &self,
        transport: &T,
        pipeline_id: &str,
        status_filter: Option<&str>,
    ) -> Result<Vec<Value>, ApiError> {
        let status_filter = status_filter.filter(|filter| {
            let recognized = REPORT_STATUS_FILTERS.contains(filter);
            if !recognized {
                tracing::warn!(
                    filter,
                    "unrecognized report status filter, fetching unfiltered"
                );
            }
            recognized
        });

        let mut output = Vec::new();
        let mut page: u64 = 1;
        loop {
            let mut params = CallParameters::new();
            params.insert("NumRows".to_string(), Value::from(REPORT_PAGE_SIZE));
            params.insert("Page".to_string(), Value::from(page));
            params.insert("SortBy".to_string(), Value::from("Status"));
            if let Some(filter) = status_filter {
                params.insert("StatusFilter".to_string(), Value::from(filter));
            }

            let rows = match self.get_pipeline_report(transport, pipeline_id, params)? {
                Value::Array(rows) => rows,
                other => {
                    return Err(ApiError::MalformedResponse(format!(
                        "expected report rows to be an array, got {other}"
                    )))
                }
            };

            let page_was_full = rows.len() == REPORT_PAGE_SIZE;
            output.extend(rows);
            if !page_was_full {
                return Ok(output);
            }
            page += 1;
        }
    }
}

/// Narrow an envelope to the caller's expected shape.
///
/// Raw mode returns the envelope untouched. Otherwise a declared response
/// key selects that field; if the key is declared but absent (pure
/// side-effect functions omit their data field) the HTTP status code stands
/// in as a no-content success marker. Operations with no declared key get
/// the full envelope.
fn extract(descriptor: &MethodDescriptor, mut envelope: Value, status: u16, raw: bool) -> Value {
    if raw {
        return envelope;
    }
    match descriptor.response_key {
        Some(key) => match envelope.get_mut(key) {
            Some(value) => value.take(),
            None => Value::from(status),
        },
        None => envelope,
    }
}
