//! Vedrfolnir - caching weather data gateway
//!
//! This crate fronts the OpenWeatherMap API with a TTL cache, a request
//! metrics aggregator, and an orchestration layer that enriches every
//! fresh fetch with UV index and air quality data fetched concurrently.
//!
//! # Example
//!
//! ```rust,no_run
//! use vedrfolnir::Vedrfolnir;
//!
//! #[tokio::main]
//! async fn main() -> vedrfolnir::Result<()> {
//!     let gateway = Vedrfolnir::builder()
//!         .api_key("your-openweathermap-key")
//!         .build()?;
//!
//!     let report = gateway.get_weather("London").await?;
//!     println!("{} {:.1}°C", report.city, report.temperature.celsius);
//!
//!     // A second call for the same city is served from the cache.
//!     let cached = gateway.get_weather("london").await?;
//!     assert!(cached.from_cache);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod clock;
pub mod convert;
pub mod error;
pub mod gateway;
pub mod providers;
#[cfg(feature = "server")]
pub mod server;
pub mod stats;
pub mod telemetry;
pub mod types;

// Re-export main types at crate root
pub use cache::{CacheStats, SweeperHandle, WeatherCache};
pub use clock::{Clock, SystemClock};
pub use error::{Result, VedrfolnirError};
pub use gateway::{Vedrfolnir, VedrfolnirBuilder, WeatherGateway};
pub use providers::{OpenWeatherClient, WeatherProvider};
pub use stats::{CityCount, MetricsSnapshot, RequestMetrics};
pub use types::{AirQuality, CurrentConditions, WeatherReport};

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");
