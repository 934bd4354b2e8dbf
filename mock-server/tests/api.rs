use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::app;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn api_request(function: &str, parameters: Value) -> Request<String> {
    api_request_as("1234", "ABCDEF", function, parameters)
}

fn api_request_as(
    user_code: &str,
    api_token: &str,
    function: &str,
    parameters: Value,
) -> Request<String> {
    let parameters = parameters.to_string();
    let body = serde_urlencoded::to_string([
        ("UserCode", user_code),
        ("APIToken", api_token),
        ("Function", function),
        ("Parameters", parameters.as_str()),
    ])
    .unwrap();
    Request::builder()
        .method("POST")
        .uri("/")
        .header(
            http::header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        )
        .body(body)
        .unwrap()
}

#[tokio::test]
async fn unknown_function_fails_envelope_level() {
    let app = app();
    let resp = app
        .oneshot(api_request("MergeContacts", json!({})))
        .await
        .unwrap();

    // Protocol errors still ride an HTTP 200.
    assert_eq!(resp.status(), StatusCode::OK);
    let envelope = body_json(resp).await;
    assert_eq!(envelope["Success"], json!(false));
    assert!(envelope["Error"].as_str().unwrap().contains("MergeContacts"));
}

#[tokio::test]
async fn blank_credentials_are_rejected() {
    let app = app();
    let resp = app
        .oneshot(api_request_as("", "", "SearchContacts", json!({})))
        .await
        .unwrap();

    let envelope = body_json(resp).await;
    assert_eq!(envelope["Success"], json!(false));
}

#[tokio::test]
async fn non_json_parameters_blob_is_rejected() {
    let app = app();
    let resp = app
        .oneshot(api_request_as(
            "1234",
            "ABCDEF",
            "SearchContacts",
            Value::String("not an object".to_string()),
        ))
        .await
        .unwrap();

    let envelope = body_json(resp).await;
    assert_eq!(envelope["Success"], json!(false));
}

#[tokio::test]
async fn contact_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // create
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(api_request(
            "CreateContact",
            json!({"FullName": "Ada Lovelace", "Email": "ada@example.com"}),
        ))
        .await
        .unwrap();
    let envelope = body_json(resp).await;
    assert_eq!(envelope["Success"], json!(true));
    let id = envelope["ContactId"].as_str().unwrap().to_string();

    // get
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(api_request("GetContact", json!({"ContactId": id})))
        .await
        .unwrap();
    let envelope = body_json(resp).await;
    assert_eq!(envelope["Contact"]["FullName"], json!("Ada Lovelace"));

    // edit
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(api_request(
            "EditContact",
            json!({"ContactId": id, "Title": "Analyst"}),
        ))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["Success"], json!(true));

    // search finds the edited contact
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(api_request("SearchContacts", json!({"SearchTerms": "lovelace"})))
        .await
        .unwrap();
    let envelope = body_json(resp).await;
    let results = envelope["Results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["Title"], json!("Analyst"));

    // group membership
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(api_request(
            "AddContactToGroup",
            json!({"ContactId": id, "GroupName": "customers"}),
        ))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["Success"], json!(true));

    // delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(api_request("DeleteContact", json!({"ContactId": id})))
        .await
        .unwrap();
    let envelope = body_json(resp).await;
    assert_eq!(envelope, json!({"Success": true}));

    // get after delete fails envelope-level
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(api_request("GetContact", json!({"ContactId": id})))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["Success"], json!(false));
}

#[tokio::test]
async fn pipeline_report_pages_until_exhausted() {
    use tower::Service;

    let mut app = app().into_service();

    for i in 0..5 {
        let resp = ServiceExt::ready(&mut app)
            .await
            .unwrap()
            .call(api_request(
                "CreatePipeline",
                json!({"PipelineId": "p1", "Note": format!("deal {i}"), "StatusId": "2"}),
            ))
            .await
            .unwrap();
        assert_eq!(body_json(resp).await["Success"], json!(true));
    }

    // page 1 of 2 rows
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(api_request(
            "GetPipelineReport",
            json!({"PipelineId": "p1", "NumRows": 2, "Page": 1, "SortBy": "Status"}),
        ))
        .await
        .unwrap();
    let envelope = body_json(resp).await;
    assert_eq!(envelope["Result"].as_array().unwrap().len(), 2);
    assert_eq!(envelope["Result"][0]["Note"], json!("deal 0"));

    // page 3 holds the remainder
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(api_request(
            "GetPipelineReport",
            json!({"PipelineId": "p1", "NumRows": 2, "Page": 3}),
        ))
        .await
        .unwrap();
    let envelope = body_json(resp).await;
    assert_eq!(envelope["Result"].as_array().unwrap().len(), 1);

    // page 4 is empty, terminating an aggregation loop
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(api_request(
            "GetPipelineReport",
            json!({"PipelineId": "p1", "NumRows": 2, "Page": 4}),
        ))
        .await
        .unwrap();
    let envelope = body_json(resp).await;
    assert!(envelope["Result"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn notes_tasks_and_events_are_accepted() {
    use tower::Service;

    let mut app = app().into_service();

    for (function, parameters) in [
        ("CreateNote", json!({"ContactId": "c1", "Note": "called"})),
        (
            "CreateTask",
            json!({"ContactId": "c1", "DueDate": "2026-09-01", "Description": "follow up"}),
        ),
        (
            "CreateEvent",
            json!({"Date": "2026-09-02", "StartTime": "09:00", "EndTime": "10:00", "Name": "demo"}),
        ),
    ] {
        let resp = ServiceExt::ready(&mut app)
            .await
            .unwrap()
            .call(api_request(function, parameters))
            .await
            .unwrap();
        assert_eq!(body_json(resp).await["Success"], json!(true), "{function}");
    }
}
