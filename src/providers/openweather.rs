//! OpenWeatherMap API client.
//!
//! Covers the three endpoints the gateway consumes: current conditions
//! (`/weather`), UV index (`/uvi`), and air pollution (`/air_pollution`).
//! Conditions are always requested with `units=metric`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::traits::WeatherProvider;
use crate::types::{AirQuality, CurrentConditions, PollutionResponse, UvIndexResponse};
use crate::{Result, VedrfolnirError};

/// Default base URL for the OpenWeatherMap API.
const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Client-side timeout for every upstream call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the OpenWeatherMap API.
#[derive(Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    http: Client,
    base_url: String,
}

impl OpenWeatherClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client with a custom base URL (for testing with wiremock).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");

        Self {
            api_key: api_key.into(),
            http,
            base_url: base_url.into(),
        }
    }

    async fn fetch_conditions(&self, city: &str) -> Result<CurrentConditions> {
        let url = format!("{}/weather", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(|e| VedrfolnirError::Http(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(VedrfolnirError::CityNotFound(city.to_string()));
        }
        if !status.is_success() {
            return Err(VedrfolnirError::Api {
                status: status.as_u16(),
                message: format!("weather API returned status {status}"),
            });
        }

        response
            .json()
            .await
            .map_err(|e| VedrfolnirError::Http(e.to_string()))
    }

    async fn fetch_uv_index(&self, lat: f64, lon: f64) -> Result<f64> {
        let url = format!("{}/uvi", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("lat", lat), ("lon", lon)])
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| VedrfolnirError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VedrfolnirError::Api {
                status: status.as_u16(),
                message: format!("UV API returned status {status}"),
            });
        }

        let uv: UvIndexResponse = response
            .json()
            .await
            .map_err(|e| VedrfolnirError::Http(e.to_string()))?;
        Ok(uv.value)
    }

    async fn fetch_air_quality(&self, lat: f64, lon: f64) -> Result<AirQuality> {
        let url = format!("{}/air_pollution", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("lat", lat), ("lon", lon)])
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| VedrfolnirError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VedrfolnirError::Api {
                status: status.as_u16(),
                message: format!("air quality API returned status {status}"),
            });
        }

        let pollution: PollutionResponse = response
            .json()
            .await
            .map_err(|e| VedrfolnirError::Http(e.to_string()))?;

        // An empty sample list is a valid response, not an error.
        let Some(sample) = pollution.list.first() else {
            return Ok(AirQuality {
                index: 0,
                category: "Unknown".to_string(),
            });
        };

        Ok(AirQuality {
            index: sample.main.aqi,
            category: aqi_category(sample.main.aqi).to_string(),
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    fn name(&self) -> &str {
        "openweathermap"
    }

    async fn current_conditions(&self, city: &str) -> Result<CurrentConditions> {
        self.fetch_conditions(city).await
    }

    async fn uv_index(&self, lat: f64, lon: f64) -> Result<f64> {
        self.fetch_uv_index(lat, lon).await
    }

    async fn air_quality(&self, lat: f64, lon: f64) -> Result<AirQuality> {
        self.fetch_air_quality(lat, lon).await
    }
}

/// Map the 1-5 air quality index to its category label.
pub fn aqi_category(aqi: i32) -> &'static str {
    match aqi {
        1 => "Good",
        2 => "Fair",
        3 => "Moderate",
        4 => "Poor",
        5 => "Very Poor",
        _ => "Unknown",
    }
}
