//! Builder for configuring gateway instances

use std::sync::Arc;
use std::time::Duration;

use super::WeatherGateway;
use crate::cache::DEFAULT_SWEEP_INTERVAL;
use crate::clock::{Clock, SystemClock};
use crate::providers::{OpenWeatherClient, WeatherProvider};
use crate::{Result, VedrfolnirError};

/// How long a cached report stays valid by default.
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(10 * 60);

/// Main entry point for creating gateway instances.
pub struct Vedrfolnir;

impl Vedrfolnir {
    /// Create a new builder for configuring the gateway.
    pub fn builder() -> VedrfolnirBuilder {
        VedrfolnirBuilder::new()
    }
}

/// Builder for configuring gateway instances.
pub struct VedrfolnirBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    cache_ttl: Duration,
    sweep_interval: Duration,
    provider: Option<Arc<dyn WeatherProvider>>,
    clock: Option<Arc<dyn Clock>>,
}

impl VedrfolnirBuilder {
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: None,
            cache_ttl: DEFAULT_CACHE_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            provider: None,
            clock: None,
        }
    }

    /// Set the OpenWeatherMap API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Override the upstream base URL (testing, proxies).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set how long cached reports stay valid (default: 10 minutes).
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Set the interval of the background expiry sweep (default: 5 minutes).
    pub fn sweep_interval(mut self, every: Duration) -> Self {
        self.sweep_interval = every;
        self
    }

    /// Inject a custom upstream provider instead of the OpenWeatherMap
    /// client. Takes precedence over `api_key`/`base_url`.
    pub fn provider(mut self, provider: Arc<dyn WeatherProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Inject a custom time source (deterministic expiry in tests).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the gateway.
    ///
    /// Fails with [`VedrfolnirError::Configuration`] when neither an API
    /// key nor a provider is configured. When called inside a tokio
    /// runtime this also starts the cache's background sweep; without a
    /// runtime the cache still works, relying on lazy expiry.
    pub fn build(self) -> Result<WeatherGateway> {
        let provider: Arc<dyn WeatherProvider> = match (self.provider, self.api_key) {
            (Some(provider), _) => provider,
            (None, Some(key)) => match self.base_url {
                Some(url) => Arc::new(OpenWeatherClient::with_base_url(key, url)),
                None => Arc::new(OpenWeatherClient::new(key)),
            },
            (None, None) => {
                return Err(VedrfolnirError::Configuration(
                    "no upstream configured; set an API key or inject a provider".to_string(),
                ));
            }
        };

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        Ok(WeatherGateway::new(
            provider,
            self.cache_ttl,
            self.sweep_interval,
            clock,
        ))
    }
}

impl Default for VedrfolnirBuilder {
    fn default() -> Self {
        Self::new()
    }
}
