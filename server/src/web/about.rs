use crate::app::AppState;
use crate::auth::Client;
use crate::web::{self, AppResult};
use axum::extract::{Extension, State};
use axum::response::Html;
use axum::{Router, routing};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/about/author", routing::get(author))
        .route("/about/tech", routing::get(tech))
}

async fn author(State(state): State<AppState>, Extension(client): Extension<Client>) -> AppResult<Html<String>> {
    web::render(&state, &client, "about/author.html", web::EmptyPage {})
}

async fn tech(State(state): State<AppState>, Extension(client): Extension<Client>) -> AppResult<Html<String>> {
    web::render(&state, &client, "about/tech.html", web::EmptyPage {})
}
