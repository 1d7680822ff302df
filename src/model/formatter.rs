use super::LookupError;
use crate::services::openweather::CurrentWeather;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, ToSchema, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, ToSchema, Serialize, Deserialize)]
pub struct Temperature {
    pub current: f64,
    pub feels_like: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, ToSchema, Serialize, Deserialize)]
pub struct WindReading {
    pub speed: f64,
    pub direction: u32,
}

/// Current conditions in metric units, as reported by the provider.
#[derive(Debug, Clone, PartialEq, ToSchema, Serialize, Deserialize)]
pub struct WeatherReading {
    pub main: String,
    pub description: String,
    pub icon: String,
    pub temperature: Temperature,
    pub humidity: u32,
    pub wind: WindReading,
}

#[derive(Debug, Clone, PartialEq, ToSchema, Serialize, Deserialize)]
pub struct FormattedResponse {
    pub location: ResolvedLocation,
    pub weather: WeatherReading,
}

impl FormattedResponse {
    pub fn from_provider(
        location: ResolvedLocation, current: CurrentWeather,
    ) -> Result<Self, LookupError> {
        let CurrentWeather { weather, main, wind, .. } = current;
        let conditions = weather
            .into_iter()
            .next()
            .ok_or_else(|| LookupError::MissingConditions(location.name.clone()))?;

        Ok(Self {
            location,
            weather: WeatherReading {
                main: conditions.main,
                description: conditions.description,
                icon: conditions.icon,
                temperature: Temperature {
                    current: main.temp,
                    feels_like: main.feels_like,
                    min: main.temp_min,
                    max: main.temp_max,
                },
                humidity: main.humidity,
                wind: WindReading { speed: wind.speed, direction: wind.deg },
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    fn london() -> ResolvedLocation {
        ResolvedLocation { name: "London".to_string(), lat: 51.5, lon: -0.12 }
    }

    fn payload(weather: serde_json::Value) -> CurrentWeather {
        serde_json::from_value(serde_json::json!({
            "weather": weather,
            "main": { "temp": 15, "feels_like": 14, "temp_min": 13, "temp_max": 17, "humidity": 70 },
            "wind": { "speed": 3.1, "deg": 200 }
        }))
        .unwrap()
    }

    #[test]
    fn test_maps_provider_fields() {
        let current = payload(serde_json::json!([
            { "main": "Clouds", "description": "overcast clouds", "icon": "04d" },
            { "main": "Mist", "description": "mist", "icon": "50d" }
        ]));

        let actual = FormattedResponse::from_provider(london(), current).unwrap();
        assert_eq!(actual.location, london());
        assert_eq!(actual.weather.main, "Clouds");
        assert_eq!(actual.weather.description, "overcast clouds");
        assert_eq!(actual.weather.icon, "04d");
        assert_relative_eq!(actual.weather.temperature.current, 15.0);
        assert_relative_eq!(actual.weather.temperature.feels_like, 14.0);
        assert_relative_eq!(actual.weather.temperature.min, 13.0);
        assert_relative_eq!(actual.weather.temperature.max, 17.0);
        assert_eq!(actual.weather.humidity, 70);
        assert_relative_eq!(actual.weather.wind.speed, 3.1);
        assert_eq!(actual.weather.wind.direction, 200);
    }

    #[test]
    fn test_serialized_shape() {
        let current = payload(serde_json::json!([
            { "main": "Clouds", "description": "overcast clouds", "icon": "04d" }
        ]));
        let actual = FormattedResponse::from_provider(london(), current).unwrap();

        assert_eq!(
            serde_json::to_value(actual).unwrap(),
            serde_json::json!({
                "location": { "name": "London", "lat": 51.5, "lon": -0.12 },
                "weather": {
                    "main": "Clouds",
                    "description": "overcast clouds",
                    "icon": "04d",
                    "temperature": { "current": 15.0, "feels_like": 14.0, "min": 13.0, "max": 17.0 },
                    "humidity": 70,
                    "wind": { "speed": 3.1, "direction": 200 }
                }
            })
        );
    }

    #[test]
    fn test_empty_conditions_is_malformed() {
        let current = payload(serde_json::json!([]));
        let error = FormattedResponse::from_provider(london(), current).unwrap_err();
        assert!(matches!(error, LookupError::MissingConditions(name) if name == "London"));
    }
}
