//! In-memory mock of the CRM's single-endpoint API.
//!
//! Every operation arrives as a POST to `/` with four form fields: the
//! credential pair, a `Function` selector, and a `Parameters` field holding
//! one JSON blob. Responses are always HTTP 200 with a JSON envelope; errors
//! are reported envelope-level via `{"Success": false, "Error": ...}`, which
//! matches the remote service's convention.

use std::{collections::HashMap, sync::Arc};

use axum::{extract::State, routing::post, Form, Json, Router};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};

/// The four form fields every call carries.
#[derive(Deserialize)]
pub struct ApiCall {
    #[serde(rename = "UserCode")]
    pub user_code: String,
    #[serde(rename = "APIToken")]
    pub api_token: String,
    #[serde(rename = "Function")]
    pub function: String,
    #[serde(rename = "Parameters")]
    pub parameters: String,
}

type Record = Map<String, Value>;

#[derive(Default)]
pub struct Store {
    next_id: u64,
    contacts: HashMap<String, Record>,
    groups: HashMap<String, Vec<String>>,
    pipeline_items: Vec<Record>,
    notes: Vec<Record>,
    tasks: Vec<Record>,
    events: Vec<Record>,
}

impl Store {
    fn fresh_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new().route("/", post(dispatch)).with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn failure(message: impl Into<String>) -> Value {
    json!({"Success": false, "Error": message.into()})
}

fn success(fields: Vec<(&str, Value)>) -> Value {
    let mut envelope = Record::new();
    envelope.insert("Success".to_string(), Value::Bool(true));
    for (key, value) in fields {
        envelope.insert(key.to_string(), value);
    }
    Value::Object(envelope)
}

fn str_param<'a>(params: &'a Record, key: &str) -> Option<&'a str> {
    params.get(key).and_then(Value::as_str)
}

async fn dispatch(State(db): State<Db>, Form(call): Form<ApiCall>) -> Json<Value> {
    if call.user_code.is_empty() || call.api_token.is_empty() {
        return Json(failure("invalid credentials"));
    }
    let params: Record = match serde_json::from_str(&call.parameters) {
        Ok(params) => params,
        Err(e) => return Json(failure(format!("Parameters is not a JSON object: {e}"))),
    };

    let mut store = db.write().await;
    let envelope = match call.function.as_str() {
        "CreateContact" => create_contact(&mut store, params),
        "GetContact" => get_contact(&store, &params),
        "EditContact" => edit_contact(&mut store, params),
        "DeleteContact" => delete_contact(&mut store, &params),
        "SearchContacts" => search_contacts(&store, &params),
        "AddContactToGroup" => add_contact_to_group(&mut store, &params),
        "CreatePipeline" => create_pipeline(&mut store, params),
        "UpdatePipelineItem" => update_pipeline_item(&mut store, params),
        "CreateNote" => append_record(&mut store, params, Section::Notes),
        "CreateTask" => append_record(&mut store, params, Section::Tasks),
        "CreateEvent" => append_record(&mut store, params, Section::Events),
        "GetPipelineReport" => get_pipeline_report(&store, &params),
        other => failure(format!("unknown function: {other}")),
    };
    Json(envelope)
}

fn create_contact(store: &mut Store, mut params: Record) -> Value {
    let id = store.fresh_id("contact");
    params.insert("ContactId".to_string(), Value::from(id.as_str()));
    store.contacts.insert(id.clone(), params);
    success(vec![("ContactId", Value::from(id))])
}

fn get_contact(store: &Store, params: &Record) -> Value {
    let Some(id) = str_param(params, "ContactId") else {
        return failure("ContactId is required");
    };
    match store.contacts.get(id) {
        Some(contact) => success(vec![("Contact", Value::Object(contact.clone()))]),
        None => failure(format!("no contact with id {id}")),
    }
}

fn edit_contact(store: &mut Store, params: Record) -> Value {
    let Some(id) = str_param(&params, "ContactId").map(str::to_string) else {
        return failure("ContactId is required");
    };
    match store.contacts.get_mut(&id) {
        Some(contact) => {
            for (key, value) in params {
                contact.insert(key, value);
            }
            success(Vec::new())
        }
        None => failure(format!("no contact with id {id}")),
    }
}

fn delete_contact(store: &mut Store, params: &Record) -> Value {
    let Some(id) = str_param(params, "ContactId") else {
        return failure("ContactId is required");
    };
    match store.contacts.remove(id) {
        // Deletion has no data field in its envelope.
        Some(_) => success(Vec::new()),
        None => failure(format!("no contact with id {id}")),
    }
}

fn search_contacts(store: &Store, params: &Record) -> Value {
    let term = str_param(params, "SearchTerms")
        .unwrap_or_default()
        .to_lowercase();
    let mut hits: Vec<Value> = store
        .contacts
        .values()
        .filter(|contact| {
            contact
                .values()
                .filter_map(Value::as_str)
                .any(|field| field.to_lowercase().contains(&term))
        })
        .map(|contact| Value::Object(contact.clone()))
        .collect();
    // HashMap iteration order is arbitrary; stabilize on ContactId.
    hits.sort_by(|a, b| {
        a["ContactId"]
            .as_str()
            .unwrap_or_default()
            .cmp(b["ContactId"].as_str().unwrap_or_default())
    });
    success(vec![("Results", Value::Array(hits))])
}

fn add_contact_to_group(store: &mut Store, params: &Record) -> Value {
    let (Some(id), Some(group)) = (
        str_param(params, "ContactId"),
        str_param(params, "GroupName"),
    ) else {
        return failure("ContactId and GroupName are required");
    };
    if !store.contacts.contains_key(id) {
        return failure(format!("no contact with id {id}"));
    }
    store
        .groups
        .entry(group.to_string())
        .or_default()
        .push(id.to_string());
    success(Vec::new())
}

fn create_pipeline(store: &mut Store, mut params: Record) -> Value {
    let id = store.fresh_id("pipeline-item");
    params.insert("PipelineItemId".to_string(), Value::from(id.as_str()));
    store.pipeline_items.push(params);
    success(vec![("PipelineItemId", Value::from(id))])
}

fn update_pipeline_item(store: &mut Store, params: Record) -> Value {
    let Some(id) = str_param(&params, "PipelineItemId").map(str::to_string) else {
        return failure("PipelineItemId is required");
    };
    let item = store
        .pipeline_items
        .iter_mut()
        .find(|item| str_param(item, "PipelineItemId") == Some(id.as_str()));
    match item {
        Some(item) => {
            for (key, value) in params {
                item.insert(key, value);
            }
            success(Vec::new())
        }
        None => failure(format!("no pipeline item with id {id}")),
    }
}

enum Section {
    Notes,
    Tasks,
    Events,
}

fn append_record(store: &mut Store, params: Record, section: Section) -> Value {
    let rows = match section {
        Section::Notes => &mut store.notes,
        Section::Tasks => &mut store.tasks,
        Section::Events => &mut store.events,
    };
    rows.push(params);
    success(Vec::new())
}

fn get_pipeline_report(store: &Store, params: &Record) -> Value {
    let Some(pipeline_id) = str_param(params, "PipelineId") else {
        return failure("PipelineId is required");
    };
    let num_rows = params
        .get("NumRows")
        .and_then(Value::as_u64)
        .unwrap_or(500)
        .max(1) as usize;
    let page = params.get("Page").and_then(Value::as_u64).unwrap_or(1).max(1) as usize;
    let status_filter = str_param(params, "StatusFilter").filter(|f| *f != "all");

    let matching: Vec<&Record> = store
        .pipeline_items
        .iter()
        .filter(|item| str_param(item, "PipelineId") == Some(pipeline_id))
        .filter(|item| match status_filter {
            Some(filter) => str_param(item, "Status") == Some(filter),
            None => true,
        })
        .collect();

    let start = (page - 1) * num_rows;
    let rows: Vec<Value> = matching
        .into_iter()
        .skip(start)
        .take(num_rows)
        .map(|item| Value::Object((*item).clone()))
        .collect();
    success(vec![("Result", Value::Array(rows))])
}
