//! Declarative HTTP service clients resolved against named client groups.
//!
//! # Overview
//! A REST resource is described once as a `ServiceDescriptor`: a table of
//! operations (verb, path template, argument bindings, response shape).
//! Descriptors are bound to client groups (base URL + default headers) in a
//! `ServiceRegistry`, which builds one HTTP client per group and one
//! `ServiceProxy` per descriptor. Each proxy call is a single synchronous
//! HTTP exchange.
//!
//! # Design
//! - One generic `ServiceProxy::invoke` serves every operation; typed
//!   services such as `TodoService` are thin wrappers around it.
//! - Requests are built and responses decoded without I/O (`prepare` /
//!   `parse`); the `Transport` trait is the only network seam.
//! - Group configuration is plain data (`GroupRule`, `ServicesConfig`)
//!   applied by iteration.
//! - All configuration problems surface as `ApiError::Configuration` before
//!   the first request.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod group;
pub mod http;
pub mod proxy;
pub mod registry;
pub mod services;
pub mod template;
pub mod transport;
pub mod types;

pub use config::{GroupSettings, ServicesConfig};
pub use descriptor::{Operation, ResponseShape, ServiceDescriptor};
pub use error::{ApiError, Result};
pub use group::{GroupConfig, GroupPattern, GroupRule, DEFAULT_GROUP};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use proxy::{CallArgs, Payload, ServiceProxy};
pub use registry::{HttpServices, ServiceRegistry, TransportFactory};
pub use services::{placeholder_registry, PostService, TodoService};
pub use transport::{Transport, UreqTransport};
pub use types::{CreatePost, CreateTodo, Post, Todo, UpdatePost, UpdateTodo};
