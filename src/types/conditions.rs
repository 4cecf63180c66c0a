//! Wire types for the OpenWeatherMap API.
//!
//! Field names mirror the upstream JSON; only the fields the gateway
//! consumes are deserialized, unknown fields are ignored.

use serde::Deserialize;

/// Current weather conditions as reported by the `/weather` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentConditions {
    pub name: String,
    pub coord: Coordinates,
    #[serde(default)]
    pub weather: Vec<ConditionSummary>,
    pub main: MainReadings,
    #[serde(default)]
    pub visibility: u32,
    #[serde(default)]
    pub wind: WindReading,
    #[serde(default)]
    pub clouds: CloudCover,
    #[serde(default)]
    pub sys: SysBlock,
    /// Shift in seconds from UTC for the observed location.
    #[serde(default)]
    pub timezone: i32,
}

/// Geographic coordinates of the observed location.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// One weather condition summary (there may be several, e.g. "Rain" + "Mist").
#[derive(Debug, Clone, Deserialize)]
pub struct ConditionSummary {
    pub main: String,
    pub description: String,
    pub icon: String,
}

/// Temperature, pressure and humidity block. Temperatures arrive in
/// Celsius because the client always requests `units=metric`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub pressure: u32,
    pub humidity: u8,
}

/// Wind speed (m/s) and direction (degrees).
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct WindReading {
    pub speed: f64,
    #[serde(default)]
    pub deg: i32,
}

/// Cloud cover percentage.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CloudCover {
    pub all: u8,
}

/// Country and sun times block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SysBlock {
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub sunrise: i64,
    #[serde(default)]
    pub sunset: i64,
}

/// Response of the `/uvi` endpoint.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct UvIndexResponse {
    pub value: f64,
}

/// Response of the `/air_pollution` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PollutionResponse {
    #[serde(default)]
    pub list: Vec<PollutionSample>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PollutionSample {
    pub main: PollutionIndex,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PollutionIndex {
    pub aqi: i32,
}
