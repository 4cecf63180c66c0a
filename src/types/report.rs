//! The enriched weather report returned to callers.

use serde::{Deserialize, Serialize};

use super::conditions::Coordinates;

/// Sentinel UV index substituted when the enrichment fetch failed.
pub const UV_INDEX_UNAVAILABLE: f64 = -1.0;

/// Sentinel air quality index substituted when the enrichment fetch failed.
pub const AQI_UNAVAILABLE: i32 = -1;

/// A temperature expressed in the three common scales.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TemperatureScales {
    pub celsius: f64,
    pub kelvin: f64,
    pub fahrenheit: f64,
}

/// Wind data with both raw and derived fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WindReport {
    /// Speed in metres per second, as reported upstream.
    pub speed_ms: f64,
    pub speed_kmh: f64,
    /// Cardinal direction derived from `degrees` (16-point compass).
    pub direction: String,
    pub degrees: i32,
}

/// One weather condition line (e.g. "Rain, light rain").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    pub main: String,
    pub description: String,
    pub icon: String,
}

/// Air quality index plus its human-readable category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirQuality {
    /// 1 (good) to 5 (very poor); `-1` when the fetch failed.
    pub index: i32,
    pub category: String,
}

/// Weather for one city, enriched with UV index and air quality.
///
/// Built by the gateway from a primary conditions fetch plus two
/// concurrent enrichment fetches; this is also the value stored in the
/// cache. `from_cache` is stamped by the gateway on every return, never
/// persisted as `true`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherReport {
    pub city: String,
    pub country: String,
    /// Shift in seconds from UTC.
    pub timezone_offset: i32,
    /// Clock time at the observed location when the report was built.
    pub local_time: String,
    pub coordinates: ReportCoordinates,

    pub temperature: TemperatureScales,
    pub feels_like: TemperatureScales,
    pub temp_min: TemperatureScales,
    pub temp_max: TemperatureScales,
    /// Relative humidity percentage.
    pub humidity: u8,
    /// Pressure in hPa.
    pub pressure: u32,

    pub wind: WindReport,
    /// Cloud cover percentage.
    pub cloudiness: u8,
    pub conditions: Vec<Condition>,
    /// Visibility in metres.
    pub visibility_m: u32,

    pub sunrise: i64,
    pub sunset: i64,
    pub sunrise_time: String,
    pub sunset_time: String,

    /// UV index; `-1.0` when the enrichment fetch failed.
    pub uv_index: f64,
    pub air_quality: AirQuality,

    pub last_updated: String,
    pub from_cache: bool,
}

/// Coordinates in the report, named for the public API rather than the
/// upstream wire format.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ReportCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Coordinates> for ReportCoordinates {
    fn from(c: Coordinates) -> Self {
        Self {
            latitude: c.lat,
            longitude: c.lon,
        }
    }
}
