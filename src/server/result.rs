use super::errors::ApiError;
use crate::model::LookupError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use utoipa::ToSchema;

pub type HttpResult<T> = Result<T, ApiError>;

pub const FETCH_FAILED: &str = "Failed fetching weather data";
pub const REQUEST_TIMED_OUT: &str = "Request timed out";

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        HttpError::from_error(&self).into_response()
    }
}

/// Error body served for every failed request.
#[derive(Debug, Clone, PartialEq, Eq, ToSchema, Serialize, Deserialize)]
pub struct ErrorReport {
    pub status: String,
    pub message: String,
}

impl ErrorReport {
    pub fn new(message: impl Into<String>) -> Self {
        Self { status: "error".to_string(), message: message.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    BadRequest { message: Cow<'static, str> },
    NotFound { message: Cow<'static, str> },
    RequestTimeout,
    Internal,
}

impl HttpError {
    pub fn from_error(error: &ApiError) -> Self {
        match error {
            ApiError::Lookup(
                lookup @ (LookupError::MissingLocation
                | LookupError::InvalidZipCode
                | LookupError::CitySearchFailed
                | LookupError::CityNotFound),
            ) => {
                let message = lookup.to_string();
                if matches!(lookup, LookupError::MissingLocation) {
                    tracing::warn!("rejecting weather request: {message}");
                    Self::BadRequest { message: message.into() }
                } else {
                    tracing::info!("weather lookup missed: {message}");
                    Self::NotFound { message: message.into() }
                }
            },

            ApiError::Query(rejection) => {
                tracing::warn!("rejecting weather request: {rejection}");
                Self::BadRequest { message: rejection.body_text().into() }
            },

            // consideration in explicit list rt. short circuit is compiler-enforced review of how
            // to respond to new variants
            ApiError::Lookup(_)
            | ApiError::Provider(_)
            | ApiError::CorsOrigin(_)
            | ApiError::IO(_)
            | ApiError::HttpEngine(_)
            | ApiError::Join(_) => {
                tracing::error!("HTTP handler error: {error}");
                Self::Internal
            },
        }
    }

    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn report(self) -> ErrorReport {
        match self {
            Self::BadRequest { message } | Self::NotFound { message } => ErrorReport::new(message),
            Self::RequestTimeout => ErrorReport::new(REQUEST_TIMED_OUT),
            Self::Internal => ErrorReport::new(FETCH_FAILED),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.report())).into_response()
    }
}
