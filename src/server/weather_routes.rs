use super::result::{ErrorReport, HttpResult};
use super::state::AppState;
use crate::model::{
    FormattedResponse, LocationResolver, ResolvedLocation, Temperature, WeatherQuery,
    WeatherReading, WindReading,
};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::{routing, Json, Router};
use serde::Deserialize;
use utoipa::{IntoParams, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(get_weather),
    components(schemas(
        FormattedResponse,
        ResolvedLocation,
        WeatherReading,
        Temperature,
        WindReading,
        ErrorReport
    )),
    tags((name = "weather", description = "Current weather lookup"))
)]
pub struct WeatherApiDoc;

pub fn api() -> Router<AppState> {
    Router::new().route("/get_weather", routing::get(get_weather))
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GetWeatherParams {
    /// City name or zip code.
    pub location: Option<String>,

    /// `zip` searches by zip code; any other value, or none, searches by city name.
    #[serde(rename = "type")]
    pub search_type: Option<String>,
}

#[utoipa::path(
    get,
    path = "/get_weather",
    context_path = "/api",
    tag = "weather",
    params(GetWeatherParams),
    responses(
        (status = 200, description = "Current weather at the location", body = FormattedResponse),
        (status = 400, description = "Location is missing", body = ErrorReport),
        (status = 404, description = "Unknown zip code or city", body = ErrorReport),
        (status = 500, description = "Weather provider failed", body = ErrorReport),
    ),
)]
#[axum::debug_handler(state = AppState)]
#[tracing::instrument(level = "debug", skip(resolver))]
async fn get_weather(
    State(resolver): State<LocationResolver>,
    params: Result<Query<GetWeatherParams>, QueryRejection>,
) -> HttpResult<Json<FormattedResponse>> {
    let Query(params) = params?;
    let query = WeatherQuery::new(params.location, params.search_type.as_deref())?;
    let weather = resolver.lookup(&query).await?;
    Ok(Json(weather))
}
