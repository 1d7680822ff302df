use super::errors::ApiError;
use crate::model::LocationResolver;
use crate::services::openweather::{OpenWeatherApi, WeatherProviderApi};
use crate::settings::ProviderSettings;
use axum::extract::FromRef;
use std::fmt;
use std::sync::Arc;

#[tracing::instrument(level = "trace")]
pub fn initialize_app_state(provider: &ProviderSettings) -> Result<AppState, ApiError> {
    let openweather = OpenWeatherApi::new(
        provider.base_url.clone(),
        provider.api_key.clone(),
        provider.timeout,
    )?;
    let provider: Arc<dyn WeatherProviderApi> = Arc::new(openweather);

    Ok(AppState { resolver: LocationResolver::new(provider) })
}

#[derive(Clone)]
pub struct AppState {
    pub resolver: LocationResolver,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish()
    }
}

impl FromRef<AppState> for LocationResolver {
    fn from_ref(app: &AppState) -> Self {
        app.resolver.clone()
    }
}
