use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub user_id: u32,
    pub id: u32,
    pub title: String,
    pub completed: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub user_id: u32,
    pub id: u32,
    pub title: String,
    pub body: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodo {
    pub user_id: u32,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodo {
    pub user_id: Option<u32>,
    pub title: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePost {
    pub user_id: u32,
    pub title: String,
    pub body: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePost {
    pub user_id: Option<u32>,
    pub title: Option<String>,
    pub body: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub user_id: Option<u32>,
}

/// In-memory records; ids are assigned sequentially from 1.
#[derive(Debug, Default)]
pub struct Store {
    todos: BTreeMap<u32, Todo>,
    posts: BTreeMap<u32, Post>,
    next_id: u32,
}

impl Store {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn insert_todo(&mut self, user_id: u32, title: &str, completed: bool) -> Todo {
        let todo = Todo {
            user_id,
            id: self.next_id(),
            title: title.to_string(),
            completed,
        };
        self.todos.insert(todo.id, todo.clone());
        todo
    }

    pub fn insert_post(&mut self, user_id: u32, title: &str, body: &str) -> Post {
        let post = Post {
            user_id,
            id: self.next_id(),
            title: title.to_string(),
            body: body.to_string(),
        };
        self.posts.insert(post.id, post.clone());
        post
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    app_with(Store::default())
}

pub fn app_with(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route(
            "/todos/{id}",
            get(get_todo)
                .put(update_todo)
                .patch(update_todo)
                .delete(delete_todo),
        )
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/{id}",
            get(get_post)
                .put(update_post)
                .patch(update_post)
                .delete(delete_post),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

// --- todos ---

async fn list_todos(State(db): State<Db>, Query(filter): Query<Filter>) -> Json<Vec<Todo>> {
    let store = db.read().await;
    Json(
        store
            .todos
            .values()
            .filter(|t| filter.user_id.map_or(true, |u| t.user_id == u))
            .cloned()
            .collect(),
    )
}

async fn create_todo(
    State(db): State<Db>,
    Json(input): Json<CreateTodo>,
) -> (StatusCode, Json<Todo>) {
    let todo = db
        .write()
        .await
        .insert_todo(input.user_id, &input.title, input.completed);
    tracing::debug!(id = todo.id, "created todo");
    (StatusCode::CREATED, Json(todo))
}

async fn get_todo(State(db): State<Db>, Path(id): Path<u32>) -> Result<Json<Todo>, StatusCode> {
    let store = db.read().await;
    store.todos.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn update_todo(
    State(db): State<Db>,
    Path(id): Path<u32>,
    Json(input): Json<UpdateTodo>,
) -> Result<Json<Todo>, StatusCode> {
    let mut store = db.write().await;
    let todo = store.todos.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(user_id) = input.user_id {
        todo.user_id = user_id;
    }
    if let Some(title) = input.title {
        todo.title = title;
    }
    if let Some(completed) = input.completed {
        todo.completed = completed;
    }
    Ok(Json(todo.clone()))
}

async fn delete_todo(State(db): State<Db>, Path(id): Path<u32>) -> Result<StatusCode, StatusCode> {
    let mut store = db.write().await;
    store
        .todos
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(StatusCode::NOT_FOUND)
}

// --- posts ---

async fn list_posts(State(db): State<Db>, Query(filter): Query<Filter>) -> Json<Vec<Post>> {
    let store = db.read().await;
    Json(
        store
            .posts
            .values()
            .filter(|p| filter.user_id.map_or(true, |u| p.user_id == u))
            .cloned()
            .collect(),
    )
}

async fn create_post(
    State(db): State<Db>,
    Json(input): Json<CreatePost>,
) -> (StatusCode, Json<Post>) {
    let post = db
        .write()
        .await
        .insert_post(input.user_id, &input.title, &input.body);
    tracing::debug!(id = post.id, "created post");
    (StatusCode::CREATED, Json(post))
}

async fn get_post(State(db): State<Db>, Path(id): Path<u32>) -> Result<Json<Post>, StatusCode> {
    let store = db.read().await;
    store.posts.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn update_post(
    State(db): State<Db>,
    Path(id): Path<u32>,
    Json(input): Json<UpdatePost>,
) -> Result<Json<Post>, StatusCode> {
    let mut store = db.write().await;
    let post = store.posts.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(user_id) = input.user_id {
        post.user_id = user_id;
    }
    if let Some(title) = input.title {
        post.title = title;
    }
    if let Some(body) = input.body {
        post.body = body;
    }
    Ok(Json(post.clone()))
}

async fn delete_post(State(db): State<Db>, Path(id): Path<u32>) -> Result<StatusCode, StatusCode> {
    let mut store = db.write().await;
    store
        .posts
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(StatusCode::NOT_FOUND)
}
