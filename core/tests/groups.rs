//! Routing of services across several client groups.
//!
//! A recording transport stands in for the network: every group gets its own
//! recorder, so each request can be traced back to the client that sent it.

use std::sync::{Arc, Mutex};

use http_services::{
    ApiError, CallArgs, GroupConfig, GroupRule, HttpRequest, HttpResponse, Operation,
    ResponseShape, ServiceDescriptor, ServiceRegistry, ServicesConfig, TodoService, Transport,
};

#[derive(Default)]
struct Recorder {
    group: String,
    requests: Mutex<Vec<HttpRequest>>,
}

impl Transport for Recorder {
    fn send(&self, request: &HttpRequest) -> http_services::Result<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let body = if request.url.contains("/repos") || request.url.ends_with("/todos") {
            "[]"
        } else {
            r#"{"userId":1,"id":42,"title":"t","completed":false}"#
        };
        Ok(HttpResponse {
            status: 200,
            headers: vec![("x-served-by".to_string(), self.group.clone())],
            body: body.to_string(),
        })
    }
}

type Recorders = Arc<Mutex<Vec<Arc<Recorder>>>>;

fn recording_registry() -> (ServiceRegistry, Recorders) {
    let recorders: Recorders = Arc::default();
    let sink = recorders.clone();
    let registry = ServiceRegistry::with_transport_factory(Arc::new(move |group: &GroupConfig| {
        let recorder = Arc::new(Recorder {
            group: group.name.clone(),
            requests: Mutex::default(),
        });
        sink.lock().unwrap().push(recorder.clone());
        recorder as Arc<dyn Transport>
    }));
    (registry, recorders)
}

fn requests_for(recorders: &Recorders, group: &str) -> Vec<HttpRequest> {
    recorders
        .lock()
        .unwrap()
        .iter()
        .filter(|r| r.group == group)
        .flat_map(|r| r.requests.lock().unwrap().clone())
        .collect()
}

fn repo_descriptor() -> ServiceDescriptor {
    ServiceDescriptor::builder("repos")
        .operation(
            Operation::get("list_for_user", "/users/{user}/repos")
                .path_param("user")
                .returns(ResponseShape::List),
        )
        .build()
        .unwrap()
}

fn two_groups() -> (ServiceRegistry, Recorders) {
    let (mut registry, recorders) = recording_registry();
    registry
        .register(
            "github",
            "https://api.github.com",
            [("Accept", "application/vnd.github.v3+json")],
        )
        .unwrap();
    registry
        .register(
            "jsonplaceholder",
            "https://jsonplaceholder.typicode.com/",
            [("X-Client", "placeholder")],
        )
        .unwrap();
    registry.bind(repo_descriptor(), Some("github")).unwrap();
    registry
        .bind(
            http_services::services::todo_descriptor().unwrap(),
            Some("jsonplaceholder"),
        )
        .unwrap();
    (registry, recorders)
}

#[test]
fn each_group_receives_only_its_own_calls() {
    let (registry, recorders) = two_groups();
    let services = registry.build().unwrap();

    services
        .proxy("repos")
        .unwrap()
        .invoke("list_for_user", CallArgs::new().path("user", "octocat"))
        .unwrap();
    let todos = TodoService::resolve(&services).unwrap();
    todos.find_all().unwrap();
    let todo = todos.find_by_id(42).unwrap();
    assert_eq!(todo.id, 42);

    let github = requests_for(&recorders, "github");
    assert_eq!(github.len(), 1);
    assert_eq!(github[0].url, "https://api.github.com/users/octocat/repos");
    assert_eq!(github[0].header("accept"), Some("application/vnd.github.v3+json"));
    assert_eq!(github[0].header("x-client"), None);

    let placeholder = requests_for(&recorders, "jsonplaceholder");
    assert_eq!(placeholder.len(), 2);
    for request in &placeholder {
        assert!(request.url.starts_with("https://jsonplaceholder.typicode.com/"));
        assert_eq!(request.header("x-client"), Some("placeholder"));
        assert_eq!(request.header("accept"), Some("application/json"));
    }
    assert_eq!(placeholder[1].url, "https://jsonplaceholder.typicode.com/todos/42");
}

#[test]
fn one_transport_per_group() {
    let (registry, recorders) = two_groups();
    registry.build().unwrap();
    let names: Vec<String> = recorders
        .lock()
        .unwrap()
        .iter()
        .map(|r| r.group.clone())
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"github".to_string()));
    assert!(names.contains(&"jsonplaceholder".to_string()));
}

#[test]
fn binding_to_unregistered_group_fails_before_any_request() {
    let (mut registry, recorders) = recording_registry();
    let err = registry.bind(repo_descriptor(), Some("github")).unwrap_err();
    assert!(matches!(err, ApiError::Configuration(_)));
    assert!(recorders.lock().unwrap().is_empty());
}

#[test]
fn shared_rule_applies_to_every_group() {
    let (mut registry, recorders) = two_groups();
    registry
        .apply_rule(&GroupRule::for_groups("*").header("User-Agent", "groups-test"))
        .unwrap();
    let services = registry.build().unwrap();

    services
        .proxy("repos")
        .unwrap()
        .invoke("list_for_user", CallArgs::new().path("user", "a"))
        .unwrap();
    TodoService::resolve(&services).unwrap().find_all().unwrap();

    for group in ["github", "jsonplaceholder"] {
        let requests = requests_for(&recorders, group);
        assert_eq!(requests[0].header("user-agent"), Some("groups-test"), "{group}");
    }
}

#[test]
fn config_file_wires_the_same_topology() {
    let config = ServicesConfig::from_toml_str(
        r#"
        [[group]]
        name = "github"
        base_url = "https://api.github.com"
        headers = { Accept = "application/vnd.github.v3+json" }

        [[group]]
        name = "jsonplaceholder"
        base_url = "https://jsonplaceholder.typicode.com/"

        [bindings]
        repos = "github"
        todos = "jsonplaceholder"
        "#,
    )
    .unwrap();

    let (mut registry, recorders) = recording_registry();
    config
        .configure(
            &mut registry,
            [
                repo_descriptor(),
                http_services::services::todo_descriptor().unwrap(),
            ],
        )
        .unwrap();
    let services = registry.build().unwrap();
    TodoService::resolve(&services).unwrap().find_by_id(1).unwrap();

    let placeholder = requests_for(&recorders, "jsonplaceholder");
    assert_eq!(placeholder[0].url, "https://jsonplaceholder.typicode.com/todos/1");
    assert_eq!(placeholder[0].header("accept"), Some("application/json"));
    assert!(requests_for(&recorders, "github").is_empty());
}
