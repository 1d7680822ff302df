mod errors;
mod health_routes;
mod result;
mod state;
mod weather_routes;

use crate::settings::{CorsSettings, HttpApiSettings, ProviderSettings};
use crate::Settings;
pub use errors::ApiError;
use result::{ErrorReport, HttpError};

use axum::error_handling::HandleErrorLayer;
use axum::extract::OriginalUri;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::{BoxError, Json, Router};
use std::net::TcpListener;
use tokio::signal;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::PropagateRequestIdLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::{SwaggerUi, Url as SwaggerUrl};

pub type HttpJoinHandle = JoinHandle<Result<(), ApiError>>;

pub struct Server {
    port: u16,
    server_handle: HttpJoinHandle,
}

impl Server {
    #[tracing::instrument(level = "debug", skip(settings))]
    pub async fn build(settings: &Settings) -> Result<Self, ApiError> {
        let address = settings.api.server.address();
        let listener = tokio::net::TcpListener::bind(&address).await?;
        tracing::info!(
            "{:?} API listening on {address}: {listener:?}",
            std::env::current_exe()
        );
        let std_listener = listener.into_std()?;
        let port = std_listener.local_addr()?.port();

        let server_handle =
            run_http_server(std_listener, &RunParameters::from_settings(settings)).await?;

        Ok(Self { port, server_handle })
    }

    pub const fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), ApiError> {
        self.server_handle.await?
    }
}

#[derive(Debug, Clone)]
pub struct RunParameters {
    pub http_api: HttpApiSettings,
    pub provider: ProviderSettings,
}

impl RunParameters {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            http_api: settings.api.clone(),
            provider: settings.provider.clone(),
        }
    }
}

#[tracing::instrument(level = "trace")]
pub async fn run_http_server(
    listener: TcpListener, params: &RunParameters,
) -> Result<HttpJoinHandle, ApiError> {
    let state = state::initialize_app_state(&params.provider)?;
    let cors = cors_layer(&params.http_api.cors)?;

    let middleware_stack = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(handle_api_error))
        .timeout(params.http_api.timeout)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(PropagateRequestIdLayer::x_request_id());

    let api_routes = Router::new()
        .merge(weather_routes::api())
        .nest("/health", health_routes::api())
        .nest("/test", health_routes::api())
        .with_state(state);

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").urls(vec![
            (
                SwaggerUrl::with_primary("weather_api", "/api-doc/weather-openapi.json", true),
                weather_routes::WeatherApiDoc::openapi(),
            ),
            (
                SwaggerUrl::new("health_api", "/api-doc/health-openapi.json"),
                health_routes::HealthApiDoc::openapi(),
            ),
        ]))
        .nest("/api", api_routes)
        .fallback(fallback)
        .layer(middleware_stack);

    let handle = tokio::spawn(async move {
        tracing::debug!(app_routes=?app, "starting API server...");
        let builder = axum::Server::from_tcp(listener)?;
        let server = builder.serve(app.into_make_service());
        let graceful = server.with_graceful_shutdown(shutdown_signal());
        graceful.await?;
        tracing::info!("{:?} API shutting down", std::env::current_exe());
        Ok::<(), ApiError>(())
    });

    Ok(handle)
}

fn cors_layer(settings: &CorsSettings) -> Result<CorsLayer, ApiError> {
    let allow_origin = if settings.allows_any_origin() {
        AllowOrigin::any()
    } else {
        let origins = settings
            .allowed_origins
            .iter()
            .map(|origin| HeaderValue::from_str(origin))
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any))
}

async fn fallback(OriginalUri(uri): OriginalUri) -> (StatusCode, Json<ErrorReport>) {
    (StatusCode::NOT_FOUND, Json(ErrorReport::new(format!("No route found for {uri}"))))
}

async fn handle_api_error(error: BoxError) -> HttpError {
    if error.is::<tower::timeout::error::Elapsed>() {
        tracing::warn!("request timed out: {error}");
        HttpError::RequestTimeout
    } else {
        tracing::error!("unhandled middleware error: {error}");
        HttpError::Internal
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!(%error, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            },
            Err(error) => {
                tracing::error!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("signal received, starting graceful shutdown");
}
