use crate::services::openweather::OpenWeatherError;
use thiserror::Error;

/// Outcomes of a weather lookup that end the request without a reading.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LookupError {
    #[error("Location is missing!")]
    MissingLocation,

    #[error("Invalid zip code")]
    InvalidZipCode,

    #[error("Failed to search city")]
    CitySearchFailed,

    #[error("Invalid city")]
    CityNotFound,

    #[error("weather payload for {0} carried no coordinates")]
    MissingCoordinates(String),

    #[error("weather payload for {0} carried no conditions")]
    MissingConditions(String),

    #[error("{0}")]
    Provider(#[from] OpenWeatherError),
}
