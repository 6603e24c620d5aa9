//! Service descriptors: the operation table for one REST resource.
//!
//! # Design
//! A descriptor is plain data. Each `Operation` records the verb, the path
//! template, which call arguments fill placeholders or the query string,
//! whether a JSON body is sent, and what shape the response decodes into.
//! `ServiceDescriptorBuilder::build` validates the whole table, so a
//! placeholder without a binding is rejected when the service is declared
//! rather than when it is first called.

use std::collections::BTreeSet;

use crate::error::{ApiError, Result};
use crate::http::HttpMethod;
use crate::template::PathTemplate;

/// What a successful response body decodes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseShape {
    /// A single JSON value, usually one record.
    Single,
    /// A JSON array of records.
    List,
    /// No body is expected; whatever arrives is ignored.
    #[default]
    Empty,
}

/// A query string binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParam {
    pub name: String,
    pub required: bool,
}

/// One operation of a service, declared with the builder-style methods.
#[derive(Debug, Clone)]
pub struct Operation {
    name: String,
    method: HttpMethod,
    path: String,
    path_params: Vec<String>,
    query_params: Vec<QueryParam>,
    json_body: bool,
    response: ResponseShape,
}

impl Operation {
    pub fn new(method: HttpMethod, name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            method,
            path: path.to_string(),
            path_params: Vec::new(),
            query_params: Vec::new(),
            json_body: false,
            response: ResponseShape::Empty,
        }
    }

    pub fn get(name: &str, path: &str) -> Self {
        Self::new(HttpMethod::Get, name, path)
    }

    pub fn post(name: &str, path: &str) -> Self {
        Self::new(HttpMethod::Post, name, path)
    }

    pub fn put(name: &str, path: &str) -> Self {
        Self::new(HttpMethod::Put, name, path)
    }

    pub fn delete(name: &str, path: &str) -> Self {
        Self::new(HttpMethod::Delete, name, path)
    }

    pub fn patch(name: &str, path: &str) -> Self {
        Self::new(HttpMethod::Patch, name, path)
    }

    /// Bind a call argument to the `{name}` placeholder of the path.
    pub fn path_param(mut self, name: &str) -> Self {
        self.path_params.push(name.to_string());
        self
    }

    /// Bind an optional call argument to the query string.
    pub fn query_param(mut self, name: &str) -> Self {
        self.query_params.push(QueryParam {
            name: name.to_string(),
            required: false,
        });
        self
    }

    pub fn required_query_param(mut self, name: &str) -> Self {
        self.query_params.push(QueryParam {
            name: name.to_string(),
            required: true,
        });
        self
    }

    /// The call must supply a body, sent as JSON.
    pub fn json_body(mut self) -> Self {
        self.json_body = true;
        self
    }

    pub fn returns(mut self, shape: ResponseShape) -> Self {
        self.response = shape;
        self
    }
}

/// A validated operation, as stored in a `ServiceDescriptor`.
#[derive(Debug, Clone)]
pub struct OperationSpec {
    pub name: String,
    pub method: HttpMethod,
    pub path: PathTemplate,
    pub path_params: Vec<String>,
    pub query_params: Vec<QueryParam>,
    pub json_body: bool,
    pub response: ResponseShape,
}

impl OperationSpec {
    fn validate(service: &str, op: Operation) -> Result<Self> {
        let path = PathTemplate::parse(&op.path)?;
        let context = format!("{service}.{}", op.name);

        if op.name.trim().is_empty() {
            return Err(ApiError::config(format!(
                "service `{service}` declares an operation without a name"
            )));
        }

        let mut declared = BTreeSet::new();
        for param in &op.path_params {
            if !declared.insert(param.as_str()) {
                return Err(ApiError::config(format!(
                    "{context}: path parameter `{param}` bound twice"
                )));
            }
        }
        let placeholders: BTreeSet<&str> = path.placeholders().collect();
        if let Some(missing) = placeholders.difference(&declared).next() {
            return Err(ApiError::config(format!(
                "{context}: placeholder `{{{missing}}}` in `{}` has no matching argument",
                path.as_str()
            )));
        }
        if let Some(unused) = declared.difference(&placeholders).next() {
            return Err(ApiError::config(format!(
                "{context}: path parameter `{unused}` does not appear in `{}`",
                path.as_str()
            )));
        }

        let mut query_names = BTreeSet::new();
        for q in &op.query_params {
            if !query_names.insert(q.name.as_str()) || declared.contains(q.name.as_str()) {
                return Err(ApiError::config(format!(
                    "{context}: argument `{}` bound twice",
                    q.name
                )));
            }
        }

        if op.json_body && !op.method.allows_body() {
            return Err(ApiError::config(format!(
                "{context}: {} requests cannot carry a body",
                op.method
            )));
        }

        Ok(Self {
            name: op.name,
            method: op.method,
            path,
            path_params: op.path_params,
            query_params: op.query_params,
            json_body: op.json_body,
            response: op.response,
        })
    }

    pub fn binds_path(&self, name: &str) -> bool {
        self.path_params.iter().any(|p| p == name)
    }

    pub fn query_param(&self, name: &str) -> Option<&QueryParam> {
        self.query_params.iter().find(|q| q.name == name)
    }
}

/// Immutable operation table for one REST resource.
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    name: String,
    operations: Vec<OperationSpec>,
}

impl ServiceDescriptor {
    pub fn builder(name: &str) -> ServiceDescriptorBuilder {
        ServiceDescriptorBuilder {
            name: name.to_string(),
            operations: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operation(&self, name: &str) -> Option<&OperationSpec> {
        self.operations.iter().find(|op| op.name == name)
    }

    pub fn operations(&self) -> &[OperationSpec] {
        &self.operations
    }
}

#[derive(Debug)]
pub struct ServiceDescriptorBuilder {
    name: String,
    operations: Vec<Operation>,
}

impl ServiceDescriptorBuilder {
    pub fn operation(mut self, op: Operation) -> Self {
        self.operations.push(op);
        self
    }

    pub fn build(self) -> Result<ServiceDescriptor> {
        if self.name.trim().is_empty() {
            return Err(ApiError::config("service name is empty"));
        }
        if self.operations.is_empty() {
            return Err(ApiError::config(format!(
                "service `{}` declares no operations",
                self.name
            )));
        }

        let mut names = BTreeSet::new();
        let mut operations = Vec::with_capacity(self.operations.len());
        for op in self.operations {
            if !names.insert(op.name.clone()) {
                return Err(ApiError::config(format!(
                    "service `{}` declares operation `{}` twice",
                    self.name, op.name
                )));
            }
            operations.push(OperationSpec::validate(&self.name, op)?);
        }

        Ok(ServiceDescriptor {
            name: self.name,
            operations,
        })
    }
}
