use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::time;
use thiserror::Error;
use url::Url;

const CURRENT_WEATHER_PATH: [&str; 3] = ["data", "2.5", "weather"];
const GEOCODING_PATH: [&str; 3] = ["geo", "1.0", "direct"];
const METRIC_UNITS: (&str, &str) = ("units", "metric");

/// Outbound calls the location resolver makes against the weather provider.
#[async_trait]
pub trait WeatherProviderApi: fmt::Debug + Send + Sync {
    async fn current_weather_by_zip(&self, zip: &str) -> Result<CurrentWeather, OpenWeatherError>;

    /// Free-text geocoding lookup, limited to the single best match.
    async fn geocode(&self, query: &str) -> Result<Vec<GeocodedPlace>, OpenWeatherError>;

    async fn current_weather_at(
        &self, latitude: f64, longitude: f64,
    ) -> Result<CurrentWeather, OpenWeatherError>;
}

#[derive(Debug, Error)]
pub enum OpenWeatherError {
    #[error("supplied Weather API url is not a base url to query: {0}")]
    NotABaseUrl(Url),

    #[error("Weather API call failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("Weather API {label} call responded with status {status}")]
    UnexpectedStatus { label: &'static str, status: StatusCode },

    #[error("failed to parse Weather API JSON response: {0}")]
    Json(#[from] serde_json::Error),
}

impl OpenWeatherError {
    /// True when the provider answered but refused the request, as opposed to a transport or
    /// decoding fault.
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::UnexpectedStatus { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Conditions {
    pub main: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Wind {
    pub speed: f64,
    pub deg: u32,
}

/// Current weather payload, as served by `/data/2.5/weather` in metric units.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CurrentWeather {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub coord: Option<Coordinates>,

    pub weather: Vec<Conditions>,
    pub main: MainReadings,
    pub wind: Wind,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeocodedPlace {
    pub lat: f64,
    pub lon: f64,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub country: Option<String>,

    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Clone)]
pub struct OpenWeatherApi {
    client: reqwest::Client,
    base_url: Url,
    api_key: Secret<String>,
}

impl fmt::Debug for OpenWeatherApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenWeatherApi")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl OpenWeatherApi {
    pub fn new(
        base_url: impl Into<Url>, api_key: Secret<String>, timeout: time::Duration,
    ) -> Result<Self, OpenWeatherError> {
        let base_url = base_url.into();
        if base_url.cannot_be_a_base() {
            return Err(OpenWeatherError::NotABaseUrl(base_url));
        }

        let client = Self::make_http_client(timeout)?;

        Ok(Self { client, base_url, api_key })
    }

    fn make_http_client(timeout: time::Duration) -> Result<reqwest::Client, OpenWeatherError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .pool_idle_timeout(time::Duration::from_secs(60))
            .pool_max_idle_per_host(5)
            .build()?;

        Ok(client)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, OpenWeatherError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| OpenWeatherError::NotABaseUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    #[tracing::instrument(level = "debug", skip(self, params))]
    async fn fetch_json<T: DeserializeOwned>(
        &self, label: &'static str, url: Url, params: &[(&str, String)],
    ) -> Result<T, OpenWeatherError> {
        let response = self
            .client
            .get(url.clone())
            .query(params)
            .query(&[("appid", self.api_key.expose_secret())])
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        log_response(label, &url, &response);

        let status = response.status();
        if !status.is_success() {
            return Err(OpenWeatherError::UnexpectedStatus { label, status });
        }

        let body = response.text().await.map_err(reqwest::Error::without_url)?;
        tracing::debug!(%body, ?status, %url, "{label} response body");

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl WeatherProviderApi for OpenWeatherApi {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn current_weather_by_zip(&self, zip: &str) -> Result<CurrentWeather, OpenWeatherError> {
        let url = self.endpoint(&CURRENT_WEATHER_PATH)?;
        let params = [
            ("zip", zip.to_string()),
            (METRIC_UNITS.0, METRIC_UNITS.1.to_string()),
        ];
        self.fetch_json("weather_by_zip", url, &params).await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn geocode(&self, query: &str) -> Result<Vec<GeocodedPlace>, OpenWeatherError> {
        let url = self.endpoint(&GEOCODING_PATH)?;
        let params = [("q", query.to_string()), ("limit", "1".to_string())];
        self.fetch_json("geocode", url, &params).await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn current_weather_at(
        &self, latitude: f64, longitude: f64,
    ) -> Result<CurrentWeather, OpenWeatherError> {
        let url = self.endpoint(&CURRENT_WEATHER_PATH)?;
        let params = [
            ("lat", latitude.to_string()),
            ("lon", longitude.to_string()),
            (METRIC_UNITS.0, METRIC_UNITS.1.to_string()),
        ];
        self.fetch_json("weather_by_coordinates", url, &params).await
    }
}

// the request url carries the api key, so only the endpoint without query is logged and
// reqwest errors are stripped of their url
fn log_response(label: &str, endpoint: &Url, response: &reqwest::Response) {
    const MESSAGE: &str = "response recd from openweathermap.org";
    let status = response.status();
    if status.is_success() || status.is_informational() {
        tracing::debug!(%endpoint, %status, "{label}: {MESSAGE}");
    } else if status.is_client_error() {
        tracing::info!(%endpoint, %status, "{label}: {MESSAGE}");
    } else {
        tracing::warn!(%endpoint, %status, "{label}: {MESSAGE}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api_for(server: &MockServer) -> OpenWeatherApi {
        let base_url = Url::parse(&server.uri()).unwrap();
        OpenWeatherApi::new(
            base_url,
            Secret::new("test-key".to_string()),
            time::Duration::from_secs(2),
        )
        .unwrap()
    }

    fn weather_body() -> serde_json::Value {
        serde_json::json!({
            "coord": { "lon": -73.99, "lat": 40.73 },
            "weather": [{ "id": 800, "main": "Clear", "description": "clear sky", "icon": "01d" }],
            "main": {
                "temp": 21.4, "feels_like": 20.9, "temp_min": 19.8, "temp_max": 22.6,
                "pressure": 1016, "humidity": 48
            },
            "wind": { "speed": 4.6, "deg": 250 },
            "name": "New York"
        })
    }

    #[test]
    fn test_rejects_non_base_url() {
        let url = Url::parse("mailto:weather@example.com").unwrap();
        let result = OpenWeatherApi::new(url, Secret::new("k".into()), time::Duration::from_secs(1));
        assert!(matches!(result, Err(OpenWeatherError::NotABaseUrl(_))));
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let base_url = Url::parse("http://localhost:8080/proxy/").unwrap();
        let api = OpenWeatherApi::new(base_url, Secret::new("k".into()), time::Duration::from_secs(1))
            .unwrap();
        let url = api.endpoint(&GEOCODING_PATH).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/proxy/geo/1.0/direct");
    }

    #[test]
    fn test_debug_does_not_expose_api_key() {
        let base_url = Url::parse("http://localhost:8080").unwrap();
        let api = OpenWeatherApi::new(
            base_url,
            Secret::new("super-secret".into()),
            time::Duration::from_secs(1),
        )
        .unwrap();
        assert!(!format!("{api:?}").contains("super-secret"));
    }

    #[tokio::test]
    async fn test_current_weather_by_zip_sends_metric_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("zip", "10001"))
            .and(query_param("units", "metric"))
            .and(query_param("appid", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(weather_body()))
            .expect(1)
            .mount(&server)
            .await;

        let actual = api_for(&server).current_weather_by_zip("10001").await.unwrap();
        assert_eq!(actual.name, "New York");
        assert_eq!(actual.coord, Some(Coordinates { lat: 40.73, lon: -73.99 }));
        assert_eq!(actual.main.humidity, 48);
        assert_eq!(actual.wind.deg, 250);
    }

    #[tokio::test]
    async fn test_geocode_limits_to_single_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .and(query_param("q", "Paris"))
            .and(query_param("limit", "1"))
            .and(query_param("appid", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "name": "Paris", "lat": 48.8588897, "lon": 2.3200410, "country": "FR" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let places = api_for(&server).geocode("Paris").await.unwrap();
        assert_eq!(places.len(), 1);
        assert_eq!(places[0].country.as_deref(), Some("FR"));
        assert_eq!(places[0].state, None);
    }

    #[tokio::test]
    async fn test_current_weather_at_sends_coordinates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("lat", "51.5"))
            .and(query_param("lon", "-0.12"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(weather_body()))
            .expect(1)
            .mount(&server)
            .await;

        let actual = api_for(&server).current_weather_at(51.5, -0.12).await;
        assert!(actual.is_ok());
    }

    #[tokio::test]
    async fn test_non_success_status_is_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({ "cod": "404", "message": "city not found" })),
            )
            .mount(&server)
            .await;

        let error = api_for(&server).current_weather_by_zip("00000").await.unwrap_err();
        assert!(error.is_rejection());
        assert!(matches!(
            error,
            OpenWeatherError::UnexpectedStatus { label, status }
                if label == "weather_by_zip" && status == StatusCode::NOT_FOUND
        ));
    }

    #[tokio::test]
    async fn test_malformed_body_is_fault() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let error = api_for(&server).geocode("Paris").await.unwrap_err();
        assert!(!error.is_rejection());
        assert!(matches!(error, OpenWeatherError::Json(_)));
    }

    #[tokio::test]
    async fn test_transport_error_does_not_expose_api_key() {
        let unused = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = Url::parse(&format!("http://{}", unused.local_addr().unwrap())).unwrap();
        drop(unused);

        let api = OpenWeatherApi::new(
            base_url,
            Secret::new("TOP-SECRET-KEY".to_string()),
            time::Duration::from_secs(1),
        )
        .unwrap();

        let error = api.current_weather_by_zip("10001").await.unwrap_err();
        assert!(matches!(error, OpenWeatherError::HttpRequest(_)));
        assert!(!error.to_string().contains("TOP-SECRET-KEY"));
        assert!(!format!("{error:?}").contains("TOP-SECRET-KEY"));
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(weather_body())
                    .set_delay(time::Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let api = OpenWeatherApi::new(
            Url::parse(&server.uri()).unwrap(),
            Secret::new("test-key".to_string()),
            time::Duration::from_millis(200),
        )
        .unwrap();

        let error = api.current_weather_at(1.0, 2.0).await.unwrap_err();
        assert!(matches!(&error, OpenWeatherError::HttpRequest(err) if err.is_timeout()));
        assert!(!error.to_string().contains("test-key"));
    }
}
