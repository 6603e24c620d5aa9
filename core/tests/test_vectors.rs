//! Verify `prepare`/`parse` against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector names a todo operation, its call arguments, the expected
//! request, a simulated response and the expected decoded result or error.
//! Bodies are compared as parsed JSON so field order does not matter.

use std::sync::Arc;

use http_services::proxy::GroupClient;
use http_services::services::todo_descriptor;
use http_services::{
    ApiError, CallArgs, GroupConfig, HttpMethod, HttpRequest, HttpResponse, Payload,
    ServiceProxy, Transport,
};
use serde_json::Value;

struct Offline;

impl Transport for Offline {
    fn send(&self, _request: &HttpRequest) -> http_services::Result<HttpResponse> {
        panic!("test vectors never touch the network");
    }
}

fn proxy(base_url: &str) -> ServiceProxy {
    let group = GroupConfig::new("vectors", base_url, std::iter::empty::<(String, String)>())
        .unwrap();
    ServiceProxy::new(
        Arc::new(todo_descriptor().unwrap()),
        Arc::new(GroupClient::new(group, Arc::new(Offline))),
    )
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        "PATCH" => HttpMethod::Patch,
        other => panic!("unknown method: {other}"),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn call_args(args: &Value) -> CallArgs {
    let mut call = CallArgs::new();
    if let Some(path) = args.get("path").and_then(Value::as_object) {
        for (name, value) in path {
            call = call.path(name, scalar(value));
        }
    }
    if let Some(query) = args.get("query").and_then(Value::as_object) {
        for (name, value) in query {
            call = call.query(name, scalar(value));
        }
    }
    if let Some(body) = args.get("body") {
        call = call.json(body).unwrap();
    }
    call
}

fn payload_json(payload: Payload) -> Value {
    match payload {
        Payload::Single(value) => value,
        Payload::List(values) => Value::Array(values),
        Payload::Empty => Value::Null,
    }
}

#[test]
fn todo_test_vectors() {
    let raw = include_str!("../../test-vectors/todos.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let base_url = vectors["base_url"].as_str().unwrap();
    let p = proxy(base_url);

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let operation = case["operation"].as_str().unwrap();
        let expected_req = &case["expected_request"];

        // Verify prepare
        let req = p.prepare(operation, &call_args(&case["args"])).unwrap();
        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.url, format!("{base_url}{}", expected_req["path"].as_str().unwrap()), "{name}: url");

        let expected_headers: Vec<(String, String)> = expected_req["headers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| {
                let arr = h.as_array().unwrap();
                (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
            })
            .collect();
        assert_eq!(req.headers, expected_headers, "{name}: headers");

        match req.body.as_deref() {
            Some(body) => {
                let body: Value = serde_json::from_str(body).unwrap();
                assert_eq!(body, expected_req["body"], "{name}: body");
            }
            None => assert!(expected_req["body"].is_null(), "{name}: body should be None"),
        }

        // Verify parse
        let sim = &case["simulated_response"];
        let response = HttpResponse {
            status: sim["status"].as_u64().unwrap() as u16,
            headers: Vec::new(),
            body: sim["body"].as_str().unwrap().to_string(),
        };
        let result = p.parse(operation, response);

        if let Some(expected_error) = case.get("expected_error") {
            match result.unwrap_err() {
                ApiError::HttpError { status, body } => {
                    assert_eq!(u64::from(status), expected_error["status"].as_u64().unwrap(), "{name}: status");
                    assert_eq!(body, expected_error["body"].as_str().unwrap(), "{name}: error body");
                }
                other => panic!("{name}: expected HttpError, got {other:?}"),
            }
        } else {
            let payload = result.unwrap();
            assert_eq!(payload_json(payload), case["expected_result"], "{name}: parsed result");
        }
    }
}
