use crate::app::AppState;
use crate::auth::Client;
use crate::model::enums::ResourceType;
use crate::pagination::{Page, PageQuery};
use crate::resource::post::{self as post_resource, PostFilter, PostInfo};
use crate::resource::user::{self as user_resource, ProfileInfo};
use crate::web::extract::{Path, Query};
use crate::web::{self, AppError, AppResult};
use axum::extract::{Extension, State};
use axum::response::Html;
use axum::{Router, routing};
use diesel::prelude::*;
use serde::Serialize;

pub fn routes() -> Router<AppState> {
    Router::new().route("/{username}", routing::get(profile))
}

#[derive(Serialize)]
struct ProfilePage {
    author: ProfileInfo,
    following: bool,
    page: Page<PostInfo>,
}

async fn profile(
    State(state): State<AppState>,
    Extension(client): Extension<Client>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<String>> {
    let page = state.get_connection()?.transaction(|conn| {
        let user = user_resource::by_name(conn, &username)?.ok_or(AppError::NotFound(ResourceType::User))?;
        let author = ProfileInfo::new(conn, user)?;
        let following = author.followed_by(conn, client.id)?;
        let per_page = state.config.pagination.profile;
        let filter = PostFilter::Author(author.id);
        let page = post_resource::load_page(conn, &state.config, filter, per_page, query.requested())?;
        Ok::<_, AppError>(ProfilePage { author, following, page })
    })?;
    web::render(&state, &client, "posts/profile.html", page)
}
