//! Method registry: the declarative contract for every API operation.
//!
//! # Design
//! The remote API multiplexes every operation through one endpoint, selected
//! by a `Function` form field, so the per-operation knowledge reduces to
//! three facts: the remote function name, which parameter keys the function
//! accepts, and which envelope field carries the interesting part of the
//! response. Each operation is one [`MethodDescriptor`] row in a `'static`
//! table consumed by the generic dispatch routine in `client`, instead of one
//! bespoke wrapper per operation.
//!
//! The table is immutable after compilation and shared by every client
//! instance, so concurrent lookups need no synchronization.

use crate::error::ApiError;

/// Declared parameter set for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterContract {
    /// Only the listed keys may be sent. Anything else is a caller bug.
    Checked(&'static [&'static str]),
    /// No contract is published for this function; send anything.
    Unchecked,
}

/// One row of the method registry.
#[derive(Debug, Clone, Copy)]
pub struct MethodDescriptor {
    /// Logical operation name used for lookup.
    pub name: &'static str,
    /// Value of the `Function` form field on the wire.
    pub remote_function: &'static str,
    /// Which parameter keys the remote function accepts.
    pub expected_parameters: ParameterContract,
    /// Envelope field holding the operation's result. `None` means the
    /// caller gets the full envelope.
    pub response_key: Option<&'static str>,
}

/// Fields accepted when creating a contact. `EditContact` takes the same set
/// plus the id of the contact being edited.
const CONTACT_FIELDS: &[&str] = &[
    "FullName",
    "Salutation",
    "FirstName",
    "MiddleName",
    "LastName",
    "Suffix",
    "CompanyName",
    "CompanyId",
    "Title",
    "Industry",
    "NumEmployees",
    "BackgroundInfo",
    "Email",
    "Phone",
    "Address",
    "Website",
    "Birthday",
    "CustomFields",
    "assignedTo",
];

const EDIT_CONTACT_FIELDS: &[&str] = &[
    "ContactId",
    "FullName",
    "Salutation",
    "FirstName",
    "MiddleName",
    "LastName",
    "Suffix",
    "CompanyName",
    "CompanyId",
    "Title",
    "Industry",
    "NumEmployees",
    "BackgroundInfo",
    "Email",
    "Phone",
    "Address",
    "Website",
    "Birthday",
    "CustomFields",
    "assignedTo",
];

static METHODS: &[MethodDescriptor] = &[
    MethodDescriptor {
        name: "SearchContacts",
        remote_function: "SearchContacts",
        expected_parameters: ParameterContract::Unchecked,
        response_key: Some("Results"),
    },
    MethodDescriptor {
        name: "GetContact",
        remote_function: "GetContact",
        expected_parameters: ParameterContract::Unchecked,
        response_key: Some("Contact"),
    },
    MethodDescriptor {
        name: "CreateContact",
        remote_function: "CreateContact",
        expected_parameters: ParameterContract::Checked(CONTACT_FIELDS),
        response_key: Some("ContactId"),
    },
    MethodDescriptor {
        name: "EditContact",
        remote_function: "EditContact",
        expected_parameters: ParameterContract::Checked(EDIT_CONTACT_FIELDS),
        response_key: None,
    },
    MethodDescriptor {
        name: "DeleteContact",
        remote_function: "DeleteContact",
        expected_parameters: ParameterContract::Unchecked,
        // Deletion is a pure side effect; the envelope omits the id field,
        // so narrow extraction falls back to the status-code sentinel.
        response_key: Some("ContactId"),
    },
    MethodDescriptor {
        name: "AddContactToGroup",
        remote_function: "AddContactToGroup",
        expected_parameters: ParameterContract::Unchecked,
        response_key: None,
    },
    MethodDescriptor {
        name: "CreatePipeline",
        remote_function: "CreatePipeline",
        expected_parameters: ParameterContract::Checked(&[
            "ContactId",
            "Note",
            "PipelineId",
            "StatusId",
            "Priority",
            "CustomFields",
        ]),
        response_key: None,
    },
    MethodDescriptor {
        name: "UpdatePipelineItem",
        remote_function: "UpdatePipelineItem",
        expected_parameters: ParameterContract::Checked(&[
            "PipelineItemId",
            "Note",
            "StatusId",
            "Priority",
            "CustomFields",
        ]),
        response_key: None,
    },
    MethodDescriptor {
        name: "CreateNote",
        remote_function: "CreateNote",
        expected_parameters: ParameterContract::Checked(&["ContactId", "Note"]),
        response_key: None,
    },
    MethodDescriptor {
        name: "CreateTask",
        remote_function: "CreateTask",
        expected_parameters: ParameterContract::Checked(&[
            "ContactId",
            "DueDate",
            "Description",
            "AssignedTo",
        ]),
        response_key: None,
    },
    MethodDescriptor {
        name: "CreateEvent",
        remote_function: "CreateEvent",
        expected_parameters: ParameterContract::Checked(&[
            "Date",
            "StartTime",
            "EndTime",
            "Name",
            "Description",
            "Contacts",
            "Users",
        ]),
        response_key: None,
    },
    MethodDescriptor {
        name: "GetPipelineReport",
        remote_function: "GetPipelineReport",
        expected_parameters: ParameterContract::Checked(&[
            "PipelineId",
            "SortBy",
            "NumRows",
            "Page",
            "SortDirection",
            "UserFilter",
            "StatusFilter",
        ]),
        response_key: Some("Result"),
    },
];

/// Look up an operation by logical name.
pub fn lookup(name: &str) -> Result<&'static MethodDescriptor, ApiError> {
    METHODS
        .iter()
        .find(|m| m.name == name)
        .ok_or_else(|| ApiError::UnknownOperation(name.to_string()))
}

/// Check a caller-supplied key set against a descriptor's contract.
///
/// Fails on the first key outside the declared set; a no-op for
/// [`ParameterContract::Unchecked`]. Runs before any request is built, so a
/// rejected call performs zero I/O.
pub fn validate<'a, I>(keys: I, descriptor: &MethodDescriptor) -> Result<(), ApiError>
where
    I: IntoIterator<Item = &'a str>,
{
    let expected = match descriptor.expected_parameters {
        ParameterContract::Checked(expected) => expected,
        ParameterContract::Unchecked => return Ok(()),
    };
    for key in keys {
        if !expected.contains(&key) {
            return Err(ApiError::UnrecognizedParameter(key.to_string()));
        }
    }
    Ok(())
}
