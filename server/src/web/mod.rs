mod about;
mod auth;
mod comment;
pub mod error;
pub mod extract;
mod follow;
mod group;
pub mod middleware;
mod post;
mod profile;
mod upload;

pub use error::{AppError, AppResult};

use crate::app::AppState;
use crate::auth::Client;
use crate::model::enums::ResourceType;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::http::header::LOCATION;
use axum::response::{Html, IntoResponse, Response};
use axum::{Router, middleware as axum_middleware};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::Serialize;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Routes of the whole site. Paths are matched after trailing slashes have been trimmed.
pub fn routes(state: AppState) -> Router {
    let media = ServeDir::new(&state.config.media_root);
    Router::new()
        .merge(about::routes())
        .merge(auth::routes())
        .merge(group::routes())
        .merge(post::routes())
        .merge(follow::routes())
        .merge(profile::routes())
        .merge(comment::routes())
        .nest_service("/media", media)
        .fallback(not_found)
        .layer(axum_middleware::from_fn_with_state(state.clone(), middleware::auth))
        .layer(axum_middleware::from_fn_with_state(state.clone(), middleware::error_pages))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::NotFound(ResourceType::Page)
}

/// Context shared by every page: the client viewing it and the page's own fields.
#[derive(Serialize)]
struct PageContext<'a, T> {
    client: &'a Client,
    #[serde(flatten)]
    page: T,
}

/// Context of pages without fields of their own.
#[derive(Serialize)]
struct EmptyPage {}

/// Renders `template` for `client` with the fields of `page`.
fn render<T: Serialize>(state: &AppState, client: &Client, template: &str, page: T) -> AppResult<Html<String>> {
    state
        .render(template, PageContext { client, page })
        .map_err(AppError::from)
}

/// A `302 Found` redirect to `location`. Characters that aren't allowed in headers are percent-encoded.
pub fn redirect(location: &str) -> Response {
    let location = utf8_percent_encode(location, LOCATION_ENCODE_SET).to_string();
    (StatusCode::FOUND, [(LOCATION, location)]).into_response()
}

/// Path of the page of the post `post_id` by `username`.
fn post_path(username: &str, post_id: i64) -> String {
    format!("/{username}/{post_id}/")
}

fn profile_path(username: &str) -> String {
    format!("/{username}/")
}

const LOCATION_ENCODE_SET: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'<').add(b'>').add(b'`');
