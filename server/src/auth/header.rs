use crate::auth::{self, Client};
use crate::config::Config;
use crate::schema::user;
use crate::string::SmallString;
use base64::prelude::BASE64_STANDARD;
use base64::{DecodeError, Engine};
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, RunQueryDsl, SqliteConnection};
use std::str::Utf8Error;
use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub enum AuthenticationError {
    FailedConnection(#[from] diesel::r2d2::PoolError),
    FailedQuery(#[from] diesel::result::Error),
    #[error("Invalid authentication type")]
    InvalidAuthType,
    InvalidEncoding(#[from] DecodeError),
    #[error("Session is invalid or has expired")]
    InvalidSession,
    #[error("Authentication credentials are malformed")]
    MalformedCredentials,
    #[error("Invalid username and password combination")]
    UsernamePasswordMismatch,
    Utf8Conversion(#[from] Utf8Error),
}

/// Authentication can either be done by sending a session token or by sending
/// the password as plaintext. Browsers use the session cookie instead.
pub fn authenticate_user(conn: &mut SqliteConnection, config: &Config, auth: &str) -> Result<Client, AuthenticationError> {
    let (auth_type, credentials) = auth.split_once(' ').ok_or(AuthenticationError::MalformedCredentials)?;
    match auth_type {
        "Basic" => basic_access_authentication(conn, config, credentials),
        "Token" => token_authentication(conn, credentials),
        _ => Err(AuthenticationError::InvalidAuthType),
    }
}

/// Checks a username/password combination and returns the matching client.
pub fn verify_credentials(
    conn: &mut SqliteConnection,
    config: &Config,
    username: &str,
    password: &str,
) -> Result<Client, AuthenticationError> {
    // For security reasons, don't give any indication to the user if it was the password
    // or the username that was incorrect.
    let (user_id, name, password_hash): (i64, SmallString, String) = user::table
        .select((user::id, user::name, user::password_hash))
        .filter(user::name.eq(username))
        .first(conn)
        .optional()?
        .ok_or(AuthenticationError::UsernamePasswordMismatch)?;
    auth::password::is_valid_password(config, &password_hash, password)
        .map(|()| Client::new(user_id, name))
        .map_err(|_| AuthenticationError::UsernamePasswordMismatch)
}

#[cfg(test)]
pub fn credentials_for(username: &str, password: &str) -> String {
    let credentials = format!("{username}:{password}");
    BASE64_STANDARD.encode(credentials)
}

/// `credentials` are sent base64 encoded, so this function decodes them to utf-8.
fn decode_credentials(credentials: &str) -> Result<(String, String), AuthenticationError> {
    let decoded_credentials = BASE64_STANDARD.decode(credentials)?;
    let utf8_encoded_credentials = std::str::from_utf8(&decoded_credentials)?;
    utf8_encoded_credentials
        .split_once(':')
        .map(|(username, pass)| (username.to_owned(), pass.to_owned()))
        .ok_or(AuthenticationError::MalformedCredentials)
}

/// Checks that the given `credentials` are of the form "username:password"
/// and that the username/password combination is valid.
fn basic_access_authentication(
    conn: &mut SqliteConnection,
    config: &Config,
    credentials: &str,
) -> Result<Client, AuthenticationError> {
    let (username, password) = decode_credentials(credentials)?;
    verify_credentials(conn, config, &username, &password)
}

/// Checks that the given `credentials` are of the form "username:token"
/// and that the token belongs to a live session of that user.
fn token_authentication(conn: &mut SqliteConnection, credentials: &str) -> Result<Client, AuthenticationError> {
    let (username, token) = decode_credentials(credentials)?;
    auth::session::resolve(conn, &token)?
        .filter(|client| client.name.as_deref() == Some(username.as_str()))
        .ok_or(AuthenticationError::InvalidSession)
}
