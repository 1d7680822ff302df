use crate::model::LookupError;
use crate::services::openweather::OpenWeatherError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Lookup(#[from] LookupError),

    #[error("Invalid query parameters: {0}")]
    Query(#[from] axum::extract::rejection::QueryRejection),

    #[error("failed to initialize weather provider: {0}")]
    Provider(#[from] OpenWeatherError),

    #[error("invalid CORS allowed origin: {0}")]
    CorsOrigin(#[from] axum::http::header::InvalidHeaderValue),

    #[error("{0}")]
    IO(#[from] std::io::Error),

    #[error("HTTP engine error: {0}")]
    HttpEngine(#[from] hyper::Error),

    #[error("failed joining with thread: {0}")]
    Join(#[from] tokio::task::JoinError),
}
