use crate::auth::Client;
use crate::config::Config;
use crate::model::user::NewUserSession;
use crate::schema::{user, user_session};
use crate::string::SmallString;
use crate::time::DateTime;
use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use diesel::prelude::*;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "sessionid";

/// Creates a new session for `user_id` and bumps their last login time.
/// Returns the session token.
pub fn start(conn: &mut SqliteConnection, config: &Config, user_id: i64) -> QueryResult<String> {
    let token = Uuid::new_v4().simple().to_string();
    let now = DateTime::now();
    let new_session = NewUserSession {
        id: &token,
        user_id,
        creation_time: now,
        expiration_time: DateTime::days_from_now(config.session_lifetime_days),
    };
    new_session.insert_into(user_session::table).execute(conn)?;
    diesel::update(user::table.find(user_id))
        .set(user::last_login_time.eq(now))
        .execute(conn)?;
    Ok(token)
}

/// Returns the client a session `token` belongs to, or [`None`] if the token is unknown or expired.
pub fn resolve(conn: &mut SqliteConnection, token: &str) -> QueryResult<Option<Client>> {
    let session: Option<(i64, SmallString, DateTime)> = user_session::table
        .inner_join(user::table)
        .select((user::id, user::name, user_session::expiration_time))
        .filter(user_session::id.eq(token))
        .first(conn)
        .optional()?;
    Ok(session
        .filter(|&(_, _, expiration_time)| expiration_time > DateTime::now())
        .map(|(id, name, _)| Client::new(id, name)))
}

/// Ends the session identified by `token`, if it exists.
pub fn end(conn: &mut SqliteConnection, token: &str) -> QueryResult<()> {
    diesel::delete(user_session::table.find(token)).execute(conn).map(|_| ())
}

/// Deletes all expired sessions. Returns the number of sessions removed.
pub fn purge_expired(conn: &mut SqliteConnection) -> QueryResult<usize> {
    diesel::delete(user_session::table.filter(user_session::expiration_time.le(DateTime::now()))).execute(conn)
}

/// Extracts the session token from the request's cookies.
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|&(name, _)| name == SESSION_COOKIE)
        .map(|(_, value)| value.trim_matches('"'))
}

/// Value of the `Set-Cookie` header that stores `token` in the client's browser.
pub fn cookie(config: &Config, token: &str) -> String {
    let max_age = config.session_lifetime_days * 24 * 60 * 60;
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}")
}

/// Value of the `Set-Cookie` header that removes the session cookie.
pub fn expired_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config;
    use crate::test::*;
    use axum::http::HeaderValue;

    #[test]
    fn session_lifecycle() -> QueryResult<()> {
        let state = test_state();
        let mut conn = state.get_connection().unwrap_or_else(|err| panic!("{err}"));
        let user = create_test_user(&mut conn, &state.config, TEST_USERNAME)?;

        let token = start(&mut conn, &state.config, user.id)?;
        let client = resolve(&mut conn, &token)?.unwrap_or_else(|| panic!("Session should be valid"));
        assert_eq!(client.id, Some(user.id));
        assert_eq!(client.name.as_deref(), Some(TEST_USERNAME));

        end(&mut conn, &token)?;
        assert!(resolve(&mut conn, &token)?.is_none());
        assert!(resolve(&mut conn, "not-a-token")?.is_none());
        Ok(())
    }

    #[test]
    fn expired_sessions() -> QueryResult<()> {
        let mut config = config::test_config();
        config.session_lifetime_days = -1;
        let state = test_state_with_config(config);
        let mut conn = state.get_connection().unwrap_or_else(|err| panic!("{err}"));
        let user = create_test_user(&mut conn, &state.config, TEST_USERNAME)?;

        let token = start(&mut conn, &state.config, user.id)?;
        assert!(resolve(&mut conn, &token)?.is_none());
        assert_eq!(purge_expired(&mut conn)?, 1);
        Ok(())
    }

    #[test]
    fn cookie_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(token_from_headers(&headers), None);

        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; sessionid=abc123; lang=en"));
        assert_eq!(token_from_headers(&headers), Some("abc123"));

        headers.insert(COOKIE, HeaderValue::from_static("csrftoken=xyz"));
        assert_eq!(token_from_headers(&headers), None);
    }
}
