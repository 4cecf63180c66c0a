//! Provider capability trait.

use async_trait::async_trait;

use crate::Result;
use crate::types::{AirQuality, CurrentConditions};

/// An upstream source of weather data.
///
/// The gateway consumes exactly this surface: one primary fetch keyed by
/// city name and two enrichment fetches keyed by coordinates. Each call
/// is expected to enforce its own client-side timeout; the gateway adds
/// none of its own.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &str;

    /// Fetch current conditions for a city.
    ///
    /// A missing city must surface as
    /// [`CityNotFound`](crate::VedrfolnirError::CityNotFound) so callers
    /// can distinguish it from an unavailable upstream.
    async fn current_conditions(&self, city: &str) -> Result<CurrentConditions>;

    /// Fetch the UV index at the given coordinates.
    async fn uv_index(&self, lat: f64, lon: f64) -> Result<f64>;

    /// Fetch the air quality index and category at the given coordinates.
    async fn air_quality(&self, lat: f64, lon: f64) -> Result<AirQuality>;
}
