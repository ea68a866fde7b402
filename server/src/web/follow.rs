use crate::app::AppState;
use crate::model::enums::ResourceType;
use crate::model::follow;
use crate::pagination::{Page, PageQuery};
use crate::resource::post::{self as post_resource, PostFilter, PostInfo};
use crate::resource::user as user_resource;
use crate::web::extract::{LoggedIn, Path, Query};
use crate::web::{self, AppError, AppResult};
use axum::extract::State;
use axum::response::{Html, Response};
use axum::{Router, routing};
use serde::Serialize;
use tracing::info;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/follow", routing::get(feed))
        .route("/{username}/follow", routing::get(subscribe).post(subscribe))
        .route("/{username}/unfollow", routing::get(unsubscribe).post(unsubscribe))
}

#[derive(Serialize)]
struct FeedPage {
    page: Page<PostInfo>,
}

/// Posts of every author the client follows.
async fn feed(State(state): State<AppState>, user: LoggedIn, Query(query): Query<PageQuery>) -> AppResult<Html<String>> {
    let page = {
        let mut conn = state.get_connection()?;
        let per_page = state.config.pagination.follow;
        let filter = PostFilter::FollowedBy(user.id);
        post_resource::load_page(&mut conn, &state.config, filter, per_page, query.requested())?
    };
    web::render(&state, &user.client(), "posts/follow.html", FeedPage { page })
}

/// Following oneself is silently ignored, as is following an author twice.
async fn subscribe(State(state): State<AppState>, user: LoggedIn, Path(username): Path<String>) -> AppResult<Response> {
    let mut conn = state.get_connection()?;
    let author = user_resource::by_name(&mut conn, &username)?.ok_or(AppError::NotFound(ResourceType::User))?;
    if author.id != user.id && follow::follow(&mut conn, user.id, author.id)? {
        info!("{} followed {}", user.name, author.name);
    }
    Ok(web::redirect(&web::profile_path(&username)))
}

async fn unsubscribe(State(state): State<AppState>, user: LoggedIn, Path(username): Path<String>) -> AppResult<Response> {
    let mut conn = state.get_connection()?;
    let author = user_resource::by_name(&mut conn, &username)?.ok_or(AppError::NotFound(ResourceType::User))?;
    if follow::unfollow(&mut conn, user.id, author.id)? {
        info!("{} unfollowed {}", user.name, author.name);
    }
    Ok(web::redirect(&web::profile_path(&username)))
}
