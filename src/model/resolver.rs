use super::{FormattedResponse, LookupError, ResolvedLocation, SearchType, WeatherQuery};
use crate::services::openweather::{OpenWeatherError, WeatherProviderApi};
use std::sync::Arc;

/// Turns a [`WeatherQuery`] into a location and its current weather. Zip searches need one
/// provider call; city searches geocode first and then fetch weather at the coordinates.
#[derive(Debug, Clone)]
pub struct LocationResolver {
    provider: Arc<dyn WeatherProviderApi>,
}

impl LocationResolver {
    pub fn new(provider: Arc<dyn WeatherProviderApi>) -> Self {
        Self { provider }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn lookup(&self, query: &WeatherQuery) -> Result<FormattedResponse, LookupError> {
        match query.search_type {
            SearchType::Zip => self.lookup_zip(&query.location).await,
            SearchType::City => self.lookup_city(&query.location).await,
        }
    }

    async fn lookup_zip(&self, zip: &str) -> Result<FormattedResponse, LookupError> {
        let current = self
            .provider
            .current_weather_by_zip(zip)
            .await
            .map_err(|err| rejection_or(err, LookupError::InvalidZipCode))?;

        let coord = current.coord.ok_or_else(|| LookupError::MissingCoordinates(zip.to_string()))?;
        let location = ResolvedLocation { name: current.name.clone(), lat: coord.lat, lon: coord.lon };
        FormattedResponse::from_provider(location, current)
    }

    async fn lookup_city(&self, city: &str) -> Result<FormattedResponse, LookupError> {
        let places = self
            .provider
            .geocode(city)
            .await
            .map_err(|err| rejection_or(err, LookupError::CitySearchFailed))?;

        let place = places.into_iter().next().ok_or(LookupError::CityNotFound)?;
        tracing::debug!(?place, "geocoded {city}");

        let current = self.provider.current_weather_at(place.lat, place.lon).await?;

        // reported under the name the caller searched for, not the geocoded name
        let location = ResolvedLocation { name: city.to_string(), lat: place.lat, lon: place.lon };
        FormattedResponse::from_provider(location, current)
    }
}

fn rejection_or(error: OpenWeatherError, rejected: LookupError) -> LookupError {
    if error.is_rejection() {
        tracing::info!(%error, "provider rejected lookup");
        rejected
    } else {
        error.into()
    }
}
