//! Conversion from the upstream wire format into [`WeatherReport`].
//!
//! Pure functions, no I/O. The gateway fills in the enrichment fields
//! (UV index, air quality) after the concurrent fetches complete.

use std::time::SystemTime;

use chrono::{DateTime, FixedOffset, Utc};

use crate::types::{
    AQI_UNAVAILABLE, AirQuality, Condition, CurrentConditions, TemperatureScales,
    UV_INDEX_UNAVAILABLE, WeatherReport, WindReport,
};

/// 16-point compass rose, clockwise from north.
const COMPASS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// Express a Celsius reading in all three scales.
pub fn temperature_scales(celsius: f64) -> TemperatureScales {
    TemperatureScales {
        celsius,
        kelvin: celsius + 273.15,
        fahrenheit: celsius * 9.0 / 5.0 + 32.0,
    }
}

/// Convert metres per second to kilometres per hour.
pub fn kmh_from_ms(speed_ms: f64) -> f64 {
    speed_ms * 3.6
}

/// Map wind degrees to a 16-point cardinal direction.
///
/// Each sector covers 22.5 degrees; degrees outside `0..360` are
/// normalized first, so `-90` reads as `W`.
pub fn wind_direction(degrees: i32) -> &'static str {
    let normalized = degrees.rem_euclid(360);
    let index = ((normalized as f64 + 11.25) / 22.5) as usize % 16;
    COMPASS[index]
}

/// Render a unix timestamp as `HH:MM:SS` in the location's fixed offset.
///
/// Returns an empty string for timestamps chrono cannot represent.
pub fn format_unix_time(offset_seconds: i32, timestamp: i64) -> String {
    let offset = fixed_offset(offset_seconds);
    match DateTime::<Utc>::from_timestamp(timestamp, 0) {
        Some(utc) => utc.with_timezone(&offset).format("%H:%M:%S").to_string(),
        None => String::new(),
    }
}

/// Render the current clock time at the given offset, with the offset shown.
pub fn local_time(offset_seconds: i32, now: SystemTime) -> String {
    let offset = fixed_offset(offset_seconds);
    DateTime::<Utc>::from(now)
        .with_timezone(&offset)
        .format("%H:%M:%S %:z")
        .to_string()
}

/// Render a last-updated stamp in UTC.
pub fn last_updated(now: SystemTime) -> String {
    DateTime::<Utc>::from(now)
        .format("%Y-%m-%d %H:%M:%S UTC")
        .to_string()
}

fn fixed_offset(offset_seconds: i32) -> FixedOffset {
    // Offsets beyond +/-24h are invalid; fall back to UTC rather than panic.
    FixedOffset::east_opt(offset_seconds)
        .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"))
}

/// Build a report from primary conditions.
///
/// Enrichment fields start at their sentinel values; `from_cache` is
/// false. The gateway overwrites all of these before returning.
pub fn report_from_conditions(conditions: &CurrentConditions, now: SystemTime) -> WeatherReport {
    WeatherReport {
        city: conditions.name.clone(),
        country: conditions.sys.country.clone(),
        timezone_offset: conditions.timezone,
        local_time: local_time(conditions.timezone, now),
        coordinates: conditions.coord.into(),

        temperature: temperature_scales(conditions.main.temp),
        feels_like: temperature_scales(conditions.main.feels_like),
        temp_min: temperature_scales(conditions.main.temp_min),
        temp_max: temperature_scales(conditions.main.temp_max),
        humidity: conditions.main.humidity,
        pressure: conditions.main.pressure,

        wind: WindReport {
            speed_ms: conditions.wind.speed,
            speed_kmh: kmh_from_ms(conditions.wind.speed),
            direction: wind_direction(conditions.wind.deg).to_string(),
            degrees: conditions.wind.deg,
        },
        cloudiness: conditions.clouds.all,
        conditions: conditions
            .weather
            .iter()
            .map(|w| Condition {
                main: w.main.clone(),
                description: w.description.clone(),
                icon: w.icon.clone(),
            })
            .collect(),
        visibility_m: conditions.visibility,

        sunrise: conditions.sys.sunrise,
        sunset: conditions.sys.sunset,
        sunrise_time: format_unix_time(conditions.timezone, conditions.sys.sunrise),
        sunset_time: format_unix_time(conditions.timezone, conditions.sys.sunset),

        uv_index: UV_INDEX_UNAVAILABLE,
        air_quality: AirQuality {
            index: AQI_UNAVAILABLE,
            category: "Unknown".to_string(),
        },

        last_updated: last_updated(now),
        from_cache: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn celsius_converts_to_kelvin_and_fahrenheit() {
        let t = temperature_scales(0.0);
        assert_eq!(t.kelvin, 273.15);
        assert_eq!(t.fahrenheit, 32.0);

        let t = temperature_scales(100.0);
        assert_eq!(t.kelvin, 373.15);
        assert_eq!(t.fahrenheit, 212.0);

        let t = temperature_scales(-40.0);
        assert_eq!(t.fahrenheit, -40.0);
    }

    #[test]
    fn wind_speed_converts_to_kmh() {
        assert_eq!(kmh_from_ms(10.0), 36.0);
    }

    #[test]
    fn wind_direction_cardinal_points() {
        assert_eq!(wind_direction(0), "N");
        assert_eq!(wind_direction(90), "E");
        assert_eq!(wind_direction(180), "S");
        assert_eq!(wind_direction(270), "W");
    }

    #[test]
    fn wind_direction_sector_boundaries() {
        // Sectors are centred on the cardinal, 11.25° either side.
        assert_eq!(wind_direction(11), "N");
        assert_eq!(wind_direction(12), "NNE");
        assert_eq!(wind_direction(349), "NNW");
        assert_eq!(wind_direction(350), "N");
    }

    #[test]
    fn wind_direction_normalizes_out_of_range() {
        assert_eq!(wind_direction(360), "N");
        assert_eq!(wind_direction(450), "E");
        assert_eq!(wind_direction(-90), "W");
    }

    #[test]
    fn unix_time_respects_offset() {
        // 2021-01-01 00:00:00 UTC
        let ts = 1609459200;
        assert_eq!(format_unix_time(0, ts), "00:00:00");
        assert_eq!(format_unix_time(3600, ts), "01:00:00");
        assert_eq!(format_unix_time(-5 * 3600, ts), "19:00:00");
        // Half-hour offset (e.g. India is +5:30)
        assert_eq!(format_unix_time(5 * 3600 + 1800, ts), "05:30:00");
    }

    #[test]
    fn unix_time_tolerates_invalid_offset() {
        let ts = 1609459200;
        // Offsets beyond a day fall back to UTC instead of panicking.
        assert_eq!(format_unix_time(100_000, ts), "00:00:00");
    }

    #[test]
    fn last_updated_is_utc_stamp() {
        let now = UNIX_EPOCH + Duration::from_secs(1609459200);
        assert_eq!(last_updated(now), "2021-01-01 00:00:00 UTC");
    }
}
