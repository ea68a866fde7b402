use crate::app::AppState;
use crate::auth::header::{self, AuthenticationError};
use crate::auth::{Client, password, session};
use crate::form::{FormErrors, LoginForm, SignupForm};
use crate::model::enums::ResourceProperty;
use crate::model::user::{NewUser, User};
use crate::schema::user;
use crate::web::extract::{Form, Query};
use crate::web::{self, AppResult, error};
use axum::extract::{Extension, State};
use axum::http::HeaderMap;
use axum::http::header::SET_COOKIE;
use axum::response::{Html, IntoResponse, Response};
use axum::{Router, routing};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", routing::get(login_form).post(login))
        .route("/auth/logout", routing::get(logout).post(logout))
        .route("/auth/signup", routing::get(signup_form).post(signup))
}

#[derive(Serialize)]
struct FormPage<'a, T> {
    form: &'a T,
    errors: &'a FormErrors,
}

#[derive(Deserialize)]
struct LoginQuery {
    #[serde(default)]
    next: String,
}

async fn login_form(
    State(state): State<AppState>,
    Extension(client): Extension<Client>,
    Query(query): Query<LoginQuery>,
) -> AppResult<Html<String>> {
    let form = LoginForm {
        next: query.next,
        ..Default::default()
    };
    let page = FormPage {
        form: &form,
        errors: &FormErrors::default(),
    };
    web::render(&state, &client, "auth/login.html", page)
}

async fn login(
    State(state): State<AppState>,
    Extension(client): Extension<Client>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let mut errors = form.validate();
    if errors.is_empty() {
        let mut conn = state.get_connection()?;
        match header::verify_credentials(&mut conn, &state.config, form.username.trim(), &form.password) {
            Ok(client) => {
                let user_id = client.id.ok_or(AuthenticationError::InvalidSession)?;
                let token = session::start(&mut conn, &state.config, user_id)?;
                info!("{} logged in", form.username.trim());
                return Ok(redirect_with_session(&state, form.redirect_target(), &token));
            }
            Err(AuthenticationError::UsernamePasswordMismatch) => {
                errors.add("form", "Please enter a correct username and password.");
            }
            Err(err) => return Err(err.into()),
        }
    }

    let page = FormPage {
        form: &form,
        errors: &errors,
    };
    web::render(&state, &client, "auth/login.html", page).map(IntoResponse::into_response)
}

/// Ends the client's session, if any, and clears the session cookie.
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    if let Some(token) = session::token_from_headers(&headers) {
        let mut conn = state.get_connection()?;
        session::end(&mut conn, token)?;
    }

    let html = web::render(&state, &Client::anonymous(), "auth/logged_out.html", web::EmptyPage {})?;
    Ok(([(SET_COOKIE, session::expired_cookie())], html).into_response())
}

async fn signup_form(State(state): State<AppState>, Extension(client): Extension<Client>) -> AppResult<Html<String>> {
    let page = FormPage {
        form: &SignupForm::default(),
        errors: &FormErrors::default(),
    };
    web::render(&state, &client, "auth/signup.html", page)
}

/// Registers a new user and logs them in.
async fn signup(
    State(state): State<AppState>,
    Extension(client): Extension<Client>,
    Form(form): Form<SignupForm>,
) -> AppResult<Response> {
    let mut conn = state.get_connection()?;
    let errors = form.validate(&mut conn, &state.config)?;
    if !errors.is_empty() {
        drop(conn);
        let page = FormPage {
            form: &form,
            errors: &errors,
        };
        return web::render(&state, &client, "auth/signup.html", page).map(IntoResponse::into_response);
    }

    let username = form.username.trim();
    let password_hash = password::hash_password(&state.config, &form.password1)?;
    let new_user = NewUser::new(username, &password_hash);
    let result = new_user.insert_into(user::table).returning(User::as_returning()).get_result(&mut conn);
    let user = error::map_unique_violation(result, ResourceProperty::Username)?;
    let token = session::start(&mut conn, &state.config, user.id)?;
    info!("{} signed up", user.name);
    Ok(redirect_with_session(&state, "/", &token))
}

fn redirect_with_session(state: &AppState, location: &str, token: &str) -> Response {
    let mut response = web::redirect(location);
    if let Ok(cookie) = session::cookie(&state.config, token).parse() {
        response.headers_mut().insert(SET_COOKIE, cookie);
    }
    response
}
