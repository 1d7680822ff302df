mod errors;
mod formatter;
mod resolver;

pub use errors::LookupError;
pub use formatter::{FormattedResponse, ResolvedLocation, Temperature, WeatherReading, WindReading};
pub use resolver::LocationResolver;

use strum_macros::{Display, IntoStaticStr};

const ZIP_SEARCH: &str = "zip";

#[derive(Debug, Display, IntoStaticStr, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
pub enum SearchType {
    Zip,
    City,
}

impl SearchType {
    /// Only the literal `zip` selects a zip search; anything else, including no flag, is a
    /// free-text city search.
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            Some(ZIP_SEARCH) => Self::Zip,
            _ => Self::City,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherQuery {
    pub location: String,
    pub search_type: SearchType,
}

impl WeatherQuery {
    pub fn new(location: Option<String>, search_type: Option<&str>) -> Result<Self, LookupError> {
        let location = location
            .filter(|loc| !loc.trim().is_empty())
            .ok_or(LookupError::MissingLocation)?;

        Ok(Self { location, search_type: SearchType::from_flag(search_type) })
    }
}
