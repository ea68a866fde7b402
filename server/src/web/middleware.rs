use crate::app::AppState;
use crate::auth::{Client, header, session};
use crate::web::AppResult;
use crate::web::error::ErrorPage;
use crate::web::extract;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

/// Identifies the client by the `Authorization` header if present, otherwise by the session cookie.
/// Unknown or expired sessions are treated as anonymous.
pub async fn auth(State(state): State<AppState>, mut request: Request, next: Next) -> AppResult<Response> {
    let client = {
        let auth_header = request.headers().get(AUTHORIZATION);
        let session_token = session::token_from_headers(request.headers());
        if let Some(auth_value) = auth_header {
            let auth_str = auth_value.to_str()?;
            let mut conn = state.get_connection()?;
            header::authenticate_user(&mut conn, &state.config, auth_str)?
        } else if let Some(token) = session_token {
            let mut conn = state.get_connection()?;
            session::resolve(&mut conn, token)?.unwrap_or_default()
        } else {
            Client::anonymous()
        }
    };

    // The response carries the client too, so that error pages can be rendered for them
    request.extensions_mut().insert(client.clone());
    let mut response = next.run(request).await;
    response.extensions_mut().insert(client);
    Ok(response)
}

#[derive(Serialize)]
struct ErrorContext<'a> {
    client: &'a Client,
    path: &'a str,
    status: u16,
    title: &'static str,
    message: &'a str,
}

/// Renders error responses as html pages.
pub async fn error_pages(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let path = extract::request_path(&parts).to_owned();
    let response = next.run(Request::from_parts(parts, body)).await;

    let Some(error_page) = response.extensions().get::<ErrorPage>() else {
        return response;
    };

    let status = response.status();
    let template = match status {
        StatusCode::NOT_FOUND => "misc/404.html",
        StatusCode::SERVICE_UNAVAILABLE => "misc/503.html",
        status if status.is_server_error() => "misc/500.html",
        _ => "misc/400.html",
    };
    let client = response.extensions().get::<Client>().cloned().unwrap_or_default();
    let path = path.split('?').next().unwrap_or_default();
    let context = ErrorContext {
        client: &client,
        path,
        status: status.as_u16(),
        title: error_page.title,
        message: &error_page.message,
    };
    match state.render(template, context) {
        Ok(html) => (status, html).into_response(),
        Err(err) => {
            error!("Could not render error page {template}. Details:\n{err:#}");
            response
        }
    }
}

#[cfg(test)]
mod test {
    use crate::auth::header;
    use crate::test::*;
    use axum::http::HeaderValue;
    use axum::http::header::{AUTHORIZATION, COOKIE};

    #[tokio::test]
    async fn client_identification() {
        let state = test_state();
        let (_, cookie) = create_logged_in_user(&state, TEST_USERNAME);
        let server = test_server(&state);
        let profile_link = format!(r#"<a href="/{TEST_USERNAME}/">{TEST_USERNAME}</a>"#);

        assert!(!server.get("/about/author/").await.text().contains(&profile_link));

        let response = server.get("/about/author/").add_header(COOKIE, cookie.clone()).await;
        response.assert_status_ok();
        assert!(response.text().contains(&profile_link));

        let credentials = format!("Basic {}", header::credentials_for(TEST_USERNAME, TEST_PASSWORD));
        let response = server
            .get("/about/tech/")
            .add_header(AUTHORIZATION, HeaderValue::from_str(&credentials).unwrap())
            .await;
        response.assert_status_ok();
        assert!(response.text().contains("<title>Technologies | Yatube</title>"));
        assert!(response.text().contains(&profile_link));

        let credentials = format!("Basic {}", header::credentials_for(TEST_USERNAME, "wrong_password"));
        let response = server
            .get("/about/tech/")
            .add_header(AUTHORIZATION, HeaderValue::from_str(&credentials).unwrap())
            .await;
        response.assert_status_unauthorized();
        assert!(response.text().contains("<title>Bad request | Yatube</title>"));

        // Unknown sessions are anonymous
        let response = server
            .get("/about/author/")
            .add_header(COOKIE, HeaderValue::from_static("sessionid=unknown"))
            .await;
        response.assert_status_ok();
        assert!(response.text().contains("<title>About the author | Yatube</title>"));
        assert!(!response.text().contains(&profile_link));

        // Error pages are rendered for the client too
        let response = server.get("/nobody/").add_header(COOKIE, cookie).await;
        response.assert_status_not_found();
        assert!(response.text().contains(&profile_link));
    }
}
