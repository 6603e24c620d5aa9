//! Typed services for the JSON placeholder API.

mod post;
mod todo;

pub use post::{post_descriptor, PostService, POST_SERVICE};
pub use todo::{todo_descriptor, TodoService, TODO_SERVICE};

use crate::descriptor::ServiceDescriptor;
use crate::error::Result;
use crate::group::DEFAULT_GROUP;
use crate::registry::ServiceRegistry;

/// Public placeholder API host.
pub const PLACEHOLDER_BASE_URL: &str = "https://jsonplaceholder.typicode.com/";

/// Registry with the default group pointed at `base_url` and both services
/// bound to it.
pub fn placeholder_registry(base_url: &str) -> Result<ServiceRegistry> {
    let mut registry = ServiceRegistry::new();
    registry.register(
        DEFAULT_GROUP,
        base_url,
        std::iter::empty::<(String, String)>(),
    )?;
    registry.bind(todo_descriptor()?, None)?;
    registry.bind(post_descriptor()?, None)?;
    Ok(registry)
}

/// Both descriptors, for binding through `ServicesConfig::configure`.
pub fn placeholder_descriptors() -> Result<Vec<ServiceDescriptor>> {
    Ok(vec![todo_descriptor()?, post_descriptor()?])
}
