use crate::auth::Client;
use crate::string::SmallString;
use crate::web::{self, AppError};
use axum::extract::multipart::{Multipart as AxumMultipart, MultipartRejection};
use axum::extract::rejection::{FormRejection, PathRejection, QueryRejection};
use axum::extract::{Form as AxumForm, FromRequest, FromRequestParts, OriginalUri, Path as AxumPath, Query as AxumQuery, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

// Wrappers over fallible extractors to provide error handling.

pub struct Form<T>(pub T);

impl<S, T> FromRequest<S> for Form<T>
where
    AxumForm<T>: FromRequest<S, Rejection = FormRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        AxumForm::<T>::from_request(req, state)
            .await
            .map(|value| Self(value.0))
            .map_err(AppError::from)
    }
}

/// Used for bodies which can either be expressed as an urlencoded or a multipart form, like posts with images.
pub enum FormOrMultipart<T> {
    Form(T),
    Multipart(AxumMultipart),
}

impl<S, T> FromRequest<S> for FormOrMultipart<T>
where
    AxumForm<T>: FromRequest<S, Rejection = FormRejection>,
    AxumMultipart: FromRequest<S, Rejection = MultipartRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type_header = req.headers().get(CONTENT_TYPE);
        let content_type = content_type_header.map(|value| value.to_str()).transpose()?;

        if content_type.is_some_and(|content_type| content_type.starts_with("multipart/form-data")) {
            return AxumMultipart::from_request(req, state)
                .await
                .map(Self::Multipart)
                .map_err(AppError::from);
        }
        AxumForm::<T>::from_request(req, state)
            .await
            .map(|value| Self::Form(value.0))
            .map_err(AppError::from)
    }
}

pub struct Path<T>(pub T);

impl<S, T> FromRequestParts<S> for Path<T>
where
    AxumPath<T>: FromRequestParts<S, Rejection = PathRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        AxumPath::<T>::from_request_parts(parts, state)
            .await
            .map(|value| Self(value.0))
            .map_err(AppError::from)
    }
}

pub struct Query<T>(pub T);

impl<S, T> FromRequestParts<S> for Query<T>
where
    AxumQuery<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        AxumQuery::from_request_parts(parts, state)
            .await
            .map(|value| Self(value.0))
            .map_err(AppError::from)
    }
}

/// A client that is logged in. Anonymous clients are redirected to the login page,
/// which sends them back here afterwards.
pub struct LoggedIn {
    pub id: i64,
    pub name: SmallString,
}

impl LoggedIn {
    pub fn client(&self) -> Client {
        Client::new(self.id, self.name.clone())
    }
}

impl<S> FromRequestParts<S> for LoggedIn
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let client = parts.extensions.get::<Client>();
        match client.and_then(|client| client.id.zip(client.name.clone())) {
            Some((id, name)) => Ok(Self { id, name }),
            None => {
                let next = utf8_percent_encode(request_path(parts), NEXT_ENCODE_SET);
                Err(web::redirect(&format!("/auth/login/?next={next}")).into_response())
            }
        }
    }
}

/// Path and query of the request as the client sent it, before trailing slashes were trimmed.
pub fn request_path(parts: &Parts) -> &str {
    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map_or(&parts.uri, |original_uri| &original_uri.0);
    uri.path_and_query().map_or("/", |path| path.as_str())
}

const NEXT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'/').remove(b'-').remove(b'_').remove(b'.').remove(b'~');
