//! Typed client for `/posts`.

use crate::descriptor::{Operation, ResponseShape, ServiceDescriptor};
use crate::error::Result;
use crate::proxy::{CallArgs, ServiceProxy};
use crate::registry::HttpServices;
use crate::types::{CreatePost, Post, UpdatePost};

pub const POST_SERVICE: &str = "posts";

/// Operation table for the post resource.
pub fn post_descriptor() -> Result<ServiceDescriptor> {
    ServiceDescriptor::builder(POST_SERVICE)
        .operation(Operation::get("find_all", "/posts").returns(ResponseShape::List))
        .operation(
            Operation::get("find_by_user", "/posts")
                .required_query_param("userId")
                .returns(ResponseShape::List),
        )
        .operation(
            Operation::get("find_by_id", "/posts/{id}")
                .path_param("id")
                .returns(ResponseShape::Single),
        )
        .operation(
            Operation::post("create", "/posts")
                .json_body()
                .returns(ResponseShape::Single),
        )
        .operation(
            Operation::put("update", "/posts/{id}")
                .path_param("id")
                .json_body()
                .returns(ResponseShape::Single),
        )
        .operation(
            Operation::patch("patch", "/posts/{id}")
                .path_param("id")
                .json_body()
                .returns(ResponseShape::Single),
        )
        .operation(Operation::delete("delete", "/posts/{id}").path_param("id"))
        .build()
}

#[derive(Debug, Clone)]
pub struct PostService {
    proxy: ServiceProxy,
}

impl PostService {
    pub fn new(proxy: ServiceProxy) -> Self {
        Self { proxy }
    }

    pub fn resolve(services: &HttpServices) -> Result<Self> {
        services.proxy(POST_SERVICE).map(Self::new)
    }

    pub fn proxy(&self) -> &ServiceProxy {
        &self.proxy
    }

    pub fn find_all(&self) -> Result<Vec<Post>> {
        self.proxy.invoke("find_all", CallArgs::new())?.into_records()
    }

    pub fn find_by_user(&self, user_id: u32) -> Result<Vec<Post>> {
        self.proxy
            .invoke("find_by_user", CallArgs::new().query("userId", user_id))?
            .into_records()
    }

    pub fn find_by_id(&self, id: u32) -> Result<Post> {
        self.proxy
            .invoke("find_by_id", CallArgs::new().path("id", id))?
            .into_record()
    }

    pub fn create(&self, input: &CreatePost) -> Result<Post> {
        self.proxy
            .invoke("create", CallArgs::new().json(input)?)?
            .into_record()
    }

    pub fn update(&self, id: u32, input: &UpdatePost) -> Result<Post> {
        self.proxy
            .invoke("update", CallArgs::new().path("id", id).json(input)?)?
            .into_record()
    }

    pub fn patch(&self, id: u32, input: &UpdatePost) -> Result<Post> {
        self.proxy
            .invoke("patch", CallArgs::new().path("id", id).json(input)?)?
            .into_record()
    }

    pub fn delete(&self, id: u32) -> Result<()> {
        self.proxy.invoke("delete", CallArgs::new().path("id", id))?;
        Ok(())
    }
}
