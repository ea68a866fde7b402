use crate::auth::header::AuthenticationError;
use crate::error::ErrorKind;
use crate::model::enums::{ResourceProperty, ResourceType};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use diesel::QueryResult;
use tracing::error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub enum AppError {
    #[error("{0} already exists")]
    AlreadyExists(ResourceProperty),
    FailedAuthentication(#[from] AuthenticationError),
    FailedConnection(#[from] diesel::r2d2::PoolError),
    FailedQuery(#[from] diesel::result::Error),
    FormRejection(#[from] axum::extract::rejection::FormRejection),
    HeaderDeserialization(#[from] axum::http::header::ToStrError),
    Multipart(#[from] axum::extract::multipart::MultipartError),
    MultipartRejection(#[from] axum::extract::multipart::MultipartRejection),
    #[error("{0} not found")]
    NotFound(ResourceType),
    Password(#[from] argon2::password_hash::Error),
    PathRejection(#[from] axum::extract::rejection::PathRejection),
    QueryRejection(#[from] axum::extract::rejection::QueryRejection),
    StdIo(#[from] std::io::Error),
    Template(#[from] minijinja::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        type QueryError = diesel::result::Error;

        let query_error_status_code = |err: &QueryError| match err {
            QueryError::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        match self {
            Self::FormRejection(err) => err.status(),
            Self::Multipart(err) => err.status(),
            Self::MultipartRejection(err) => err.status(),
            Self::QueryRejection(err) => err.status(),
            // Path parameters that don't parse name a page that doesn't exist
            Self::PathRejection(_) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::HeaderDeserialization(_) => StatusCode::BAD_REQUEST,
            Self::AlreadyExists(_) => StatusCode::CONFLICT,
            Self::FailedConnection(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::FailedAuthentication(err) => match err {
                AuthenticationError::FailedConnection(_) => StatusCode::SERVICE_UNAVAILABLE,
                AuthenticationError::FailedQuery(err) => query_error_status_code(err),
                _ => StatusCode::UNAUTHORIZED,
            },
            Self::FailedQuery(err) => query_error_status_code(err),
            Self::Password(_) | Self::StdIo(_) | Self::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn category(&self) -> &'static str {
        match self {
            Self::AlreadyExists(_) => "Already Exists",
            Self::FailedAuthentication(_) => "Failed Authentication",
            Self::FailedConnection(_) => "Failed Connection",
            Self::FailedQuery(_) => "Failed Query",
            Self::FormRejection(_) => "Form Rejection",
            Self::HeaderDeserialization(_) => "Header Deserialization",
            Self::Multipart(_) => "Multipart/Form-Data Error",
            Self::MultipartRejection(_) => "Multipart Rejection",
            Self::NotFound(_) => "Resource Not Found",
            Self::Password(_) => "Password Error",
            Self::PathRejection(_) => "Path Rejection",
            Self::QueryRejection(_) => "Query Rejection",
            Self::StdIo(_) => "IO Error",
            Self::Template(_) => "Template Error",
        }
    }
}

impl ErrorKind for AppError {
    fn kind(&self) -> &'static str {
        match self {
            Self::AlreadyExists(_) => "AlreadyExists",
            Self::FailedAuthentication(err) => err.kind(),
            Self::FailedConnection(err) => err.kind(),
            Self::FailedQuery(err) => err.kind(),
            Self::FormRejection(_) => "FormRejection",
            Self::HeaderDeserialization(_) => "HeaderDeserialization",
            Self::Multipart(_) => "MultipartError",
            Self::MultipartRejection(_) => "MultipartRejection",
            Self::NotFound(_) => "NotFound",
            Self::Password(err) => err.kind(),
            Self::PathRejection(_) => "PathRejection",
            Self::QueryRejection(_) => "QueryRejection",
            Self::StdIo(err) => ErrorKind::kind(err),
            Self::Template(err) => ErrorKind::kind(err),
        }
    }
}

/// Attached to error responses so that the error page middleware can render them.
#[derive(Debug, Clone)]
pub struct ErrorPage {
    pub title: &'static str,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}: {self}", self.kind());
        }

        let error_page = ErrorPage {
            title: self.category(),
            message: self.to_string(),
        };
        let mut response = (status, error_page.message.clone()).into_response();
        response.extensions_mut().insert(error_page);
        response
    }
}

pub fn map_unique_violation<T>(result: QueryResult<T>, property: ResourceProperty) -> AppResult<T> {
    use diesel::result::DatabaseErrorKind;
    use diesel::result::Error as DieselError;

    match result {
        Ok(value) => Ok(value),
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => Err(AppError::AlreadyExists(property)),
        Err(err) => Err(err.into()),
    }
}
