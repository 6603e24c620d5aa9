//! Table-driven invocation of descriptor operations.
//!
//! # Design
//! A `ServiceProxy` pairs a descriptor with its group's client. One generic
//! `invoke` handles every operation of every service: `prepare` turns the
//! operation and its `CallArgs` into an `HttpRequest`, the group transport
//! sends it, and `parse` decodes the response into the declared
//! `ResponseShape`. Argument problems are reported before the transport is
//! touched.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::descriptor::{OperationSpec, ResponseShape, ServiceDescriptor};
use crate::error::{ApiError, Result};
use crate::group::{check_header, GroupConfig};
use crate::http::{merge_headers, HttpRequest, HttpResponse};
use crate::template::is_dot_segment;
use crate::transport::Transport;

const JSON: &str = "application/json";

/// Arguments for one call: path values, query values, JSON body and extra
/// headers.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    path: Vec<(String, String)>,
    query: Vec<(String, String)>,
    body: Option<String>,
    headers: Vec<(String, String)>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(mut self, name: &str, value: impl fmt::Display) -> Self {
        self.path.push((name.to_string(), value.to_string()));
        self
    }

    pub fn query(mut self, name: &str, value: impl fmt::Display) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    /// Serialize `body` to JSON now; failures are `SerializationError`.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        let json =
            serde_json::to_string(body).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        self.body = Some(json);
        Ok(self)
    }

    /// Attach a header for this call only; it overrides the group default.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    fn path_value(&self, name: &str) -> Option<String> {
        self.path
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }
}

/// A decoded response body in the operation's declared shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Single(serde_json::Value),
    List(Vec<serde_json::Value>),
    Empty,
}

impl Payload {
    pub fn into_record<T: DeserializeOwned>(self) -> Result<T> {
        match self {
            Payload::Single(value) => serde_json::from_value(value)
                .map_err(|e| ApiError::DeserializationError(e.to_string())),
            other => Err(ApiError::DeserializationError(format!(
                "expected a single record, operation returns {}",
                other.kind()
            ))),
        }
    }

    pub fn into_records<T: DeserializeOwned>(self) -> Result<Vec<T>> {
        match self {
            Payload::List(values) => values
                .into_iter()
                .map(|v| {
                    serde_json::from_value(v)
                        .map_err(|e| ApiError::DeserializationError(e.to_string()))
                })
                .collect(),
            other => Err(ApiError::DeserializationError(format!(
                "expected a list of records, operation returns {}",
                other.kind()
            ))),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Payload::Single(_) => "a single value",
            Payload::List(_) => "a list",
            Payload::Empty => "no body",
        }
    }
}

/// One group's configuration together with the transport built for it.
pub struct GroupClient {
    config: GroupConfig,
    transport: Arc<dyn Transport>,
}

impl GroupClient {
    pub fn new(config: GroupConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &GroupConfig {
        &self.config
    }
}

impl fmt::Debug for GroupClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Callable implementation of a descriptor, bound to one group client.
#[derive(Debug, Clone)]
pub struct ServiceProxy {
    descriptor: Arc<ServiceDescriptor>,
    client: Arc<GroupClient>,
}

impl ServiceProxy {
    pub fn new(descriptor: Arc<ServiceDescriptor>, client: Arc<GroupClient>) -> Self {
        Self { descriptor, client }
    }

    pub fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    pub fn group(&self) -> &GroupConfig {
        &self.client.config
    }

    /// Run `operation` end to end.
    pub fn invoke(&self, operation: &str, args: CallArgs) -> Result<Payload> {
        let request = self.prepare(operation, &args)?;
        tracing::debug!(
            service = self.descriptor.name(),
            operation,
            method = %request.method,
            url = %request.url,
            "sending request"
        );
        let response = self.client.transport.send(&request)?;
        tracing::debug!(
            service = self.descriptor.name(),
            operation,
            status = response.status,
            "received response"
        );
        self.parse(operation, response)
    }

    /// Build the request for `operation` without sending it.
    pub fn prepare(&self, operation: &str, args: &CallArgs) -> Result<HttpRequest> {
        let op = self.operation(operation)?;
        check_args(op, args)?;

        let path = op
            .path
            .expand(|name| args.path_value(name))
            .map_err(|name| missing(op, &name))?;
        let url = join_url(&self.client.config.base_url, &path, &op_query(op, args))?;

        let mut headers = merge_headers(&self.client.config.headers, &args.headers);
        if args.body.is_some() && !has_header(&headers, "content-type") {
            headers.push(("content-type".to_string(), JSON.to_string()));
        }
        if op.response != ResponseShape::Empty && !has_header(&headers, "accept") {
            headers.push(("accept".to_string(), JSON.to_string()));
        }

        Ok(HttpRequest {
            method: op.method,
            url,
            headers,
            body: args.body.clone(),
        })
    }

    /// Decode `response` according to `operation`'s declared shape.
    pub fn parse(&self, operation: &str, response: HttpResponse) -> Result<Payload> {
        let op = self.operation(operation)?;
        check_status(&response)?;
        decode(op.response, &response.body)
    }

    fn operation(&self, name: &str) -> Result<&OperationSpec> {
        self.descriptor.operation(name).ok_or_else(|| {
            ApiError::config(format!(
                "service `{}` has no operation `{name}`",
                self.descriptor.name()
            ))
        })
    }
}

fn missing(op: &OperationSpec, name: &str) -> ApiError {
    ApiError::MissingArgument {
        operation: op.name.clone(),
        name: name.to_string(),
    }
}

fn unexpected(op: &OperationSpec, name: &str) -> ApiError {
    ApiError::UnexpectedArgument {
        operation: op.name.clone(),
        name: name.to_string(),
    }
}

fn invalid(op: &OperationSpec, name: &str, reason: impl Into<String>) -> ApiError {
    ApiError::InvalidArgument {
        operation: op.name.clone(),
        name: name.to_string(),
        reason: reason.into(),
    }
}

fn check_args(op: &OperationSpec, args: &CallArgs) -> Result<()> {
    for (i, (name, value)) in args.path.iter().enumerate() {
        if !op.binds_path(name) || args.path[..i].iter().any(|(k, _)| k == name) {
            return Err(unexpected(op, name));
        }
        // An empty segment routes to a different resource.
        if value.is_empty() {
            return Err(missing(op, name));
        }
        if is_dot_segment(value) {
            return Err(invalid(op, name, format!("`{value}` is a dot segment")));
        }
    }
    if let Some((name, _)) = args.query.iter().find(|(k, _)| op.query_param(k).is_none()) {
        return Err(unexpected(op, name));
    }
    for q in op.query_params.iter().filter(|q| q.required) {
        if !args.query.iter().any(|(k, _)| *k == q.name) {
            return Err(missing(op, &q.name));
        }
    }
    match (op.json_body, args.body.is_some()) {
        (true, false) => return Err(missing(op, "body")),
        (false, true) => return Err(unexpected(op, "body")),
        _ => {}
    }
    for (name, value) in &args.headers {
        check_header(name, value).map_err(|reason| invalid(op, name, reason))?;
    }
    Ok(())
}

/// Query pairs in the order the operation declares them.
fn op_query<'a>(op: &'a OperationSpec, args: &'a CallArgs) -> Vec<(&'a str, &'a str)> {
    op.query_params
        .iter()
        .flat_map(|q| {
            args.query
                .iter()
                .filter(move |(k, _)| *k == q.name)
                .map(|(k, v)| (k.as_str(), v.as_str()))
        })
        .collect()
}

/// Appends the expanded path to the base and always reparses, so the
/// request URL is normalized the same way with or without a query.
fn join_url(base: &Url, path: &str, query: &[(&str, &str)]) -> Result<String> {
    let joined = format!("{}{}", base.as_str().trim_end_matches('/'), path);
    let mut url = Url::parse(&joined)
        .map_err(|e| ApiError::config(format!("cannot build URL `{joined}`: {e}")))?;
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url.to_string())
}

fn has_header(headers: &[(String, String)], name: &str) -> bool {
    headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
}

/// Map non-2xx status codes to `HttpError`, keeping the raw body.
fn check_status(response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }
    tracing::warn!(status = response.status, "request failed");
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}

fn decode(shape: ResponseShape, body: &str) -> Result<Payload> {
    match shape {
        ResponseShape::Empty => Ok(Payload::Empty),
        ResponseShape::Single => serde_json::from_str(body)
            .map(Payload::Single)
            .map_err(|e| ApiError::DeserializationError(e.to_string())),
        ResponseShape::List => serde_json::from_str(body)
            .map(Payload::List)
            .map_err(|e| ApiError::DeserializationError(e.to_string())),
    }
}
