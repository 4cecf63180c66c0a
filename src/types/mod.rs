//! Public types for the Vedrfolnir API.

mod conditions;
mod report;

pub use conditions::{
    CloudCover, ConditionSummary, Coordinates, CurrentConditions, MainReadings, PollutionIndex,
    PollutionResponse, PollutionSample, SysBlock, UvIndexResponse, WindReading,
};
pub use report::{
    AQI_UNAVAILABLE, AirQuality, Condition, ReportCoordinates, TemperatureScales,
    UV_INDEX_UNAVAILABLE, WeatherReport, WindReport,
};
