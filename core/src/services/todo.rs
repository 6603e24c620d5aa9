//! Typed client for `/todos`.

use crate::descriptor::{Operation, ResponseShape, ServiceDescriptor};
use crate::error::Result;
use crate::proxy::{CallArgs, ServiceProxy};
use crate::registry::HttpServices;
use crate::types::{CreateTodo, Todo, UpdateTodo};

pub const TODO_SERVICE: &str = "todos";

/// Operation table for the todo resource.
pub fn todo_descriptor() -> Result<ServiceDescriptor> {
    ServiceDescriptor::builder(TODO_SERVICE)
        .operation(Operation::get("find_all", "/todos").returns(ResponseShape::List))
        .operation(
            Operation::get("find_by_user", "/todos")
                .required_query_param("userId")
                .returns(ResponseShape::List),
        )
        .operation(
            Operation::get("find_by_id", "/todos/{id}")
                .path_param("id")
                .returns(ResponseShape::Single),
        )
        .operation(
            Operation::post("create", "/todos")
                .json_body()
                .returns(ResponseShape::Single),
        )
        .operation(
            Operation::put("update", "/todos/{id}")
                .path_param("id")
                .json_body()
                .returns(ResponseShape::Single),
        )
        .operation(
            Operation::patch("patch", "/todos/{id}")
                .path_param("id")
                .json_body()
                .returns(ResponseShape::Single),
        )
        .operation(Operation::delete("delete", "/todos/{id}").path_param("id"))
        .build()
}

#[derive(Debug, Clone)]
pub struct TodoService {
    proxy: ServiceProxy,
}

impl TodoService {
    pub fn new(proxy: ServiceProxy) -> Self {
        Self { proxy }
    }

    pub fn resolve(services: &HttpServices) -> Result<Self> {
        services.proxy(TODO_SERVICE).map(Self::new)
    }

    pub fn proxy(&self) -> &ServiceProxy {
        &self.proxy
    }

    pub fn find_all(&self) -> Result<Vec<Todo>> {
        self.proxy.invoke("find_all", CallArgs::new())?.into_records()
    }

    pub fn find_by_user(&self, user_id: u32) -> Result<Vec<Todo>> {
        self.proxy
            .invoke("find_by_user", CallArgs::new().query("userId", user_id))?
            .into_records()
    }

    pub fn find_by_id(&self, id: u32) -> Result<Todo> {
        self.proxy
            .invoke("find_by_id", CallArgs::new().path("id", id))?
            .into_record()
    }

    pub fn create(&self, input: &CreateTodo) -> Result<Todo> {
        self.proxy
            .invoke("create", CallArgs::new().json(input)?)?
            .into_record()
    }

    pub fn update(&self, id: u32, input: &UpdateTodo) -> Result<Todo> {
        self.proxy
            .invoke("update", CallArgs::new().path("id", id).json(input)?)?
            .into_record()
    }

    pub fn patch(&self, id: u32, input: &UpdateTodo) -> Result<Todo> {
        self.proxy
            .invoke("patch", CallArgs::new().path("id", id).json(input)?)?
            .into_record()
    }

    pub fn delete(&self, id: u32) -> Result<()> {
        self.proxy.invoke("delete", CallArgs::new().path("id", id))?;
        Ok(())
    }
}
