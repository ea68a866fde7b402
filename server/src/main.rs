#![warn(clippy::pedantic)]
// Gives warnings for every diesel::prelude::* import
#![allow(clippy::wildcard_imports)]
// Too subjective
#![allow(clippy::similar_names, clippy::too_many_lines)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::match_bool)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::single_match_else)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::doc_markdown)]

mod admin;
mod app;
mod auth;
mod cache;
mod config;
mod db;
mod error;
mod filesystem;
mod form;
mod model;
mod pagination;
mod resource;
mod schema;
mod string;
mod template;
mod time;
mod web;

#[tokio::main]
async fn main() {
    app::enable_tracing();
    let state = match app::create_state().and_then(|state| app::initialize(&state).map(|()| state)) {
        Ok(state) => state,
        Err(err) => {
            tracing::error!("An error occurred during initialization. Details:\n{err}");
            std::process::exit(1);
        }
    };

    if admin::enabled() {
        if let Err(err) = admin::command_line_mode(&state) {
            tracing::error!("Admin mode failed. Details:\n{err}");
            std::process::exit(1);
        }
        return;
    }
    if let Err(err) = app::run(state).await {
        tracing::error!("Server stopped unexpectedly. Details:\n{err}");
        std::process::exit(1);
    }
}
