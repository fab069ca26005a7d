use std::ops::Deref;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting values outside [-90, 90] / [-180, 180].
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self { latitude, longitude })
    }

    /// `lat,lon` as expected by the provider's `location` query parameter.
    pub fn as_query(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

/// Weather attributes for one instant or one aggregation window.
///
/// The provider omits or nulls attributes freely (daily samples carry
/// `*Avg`/`*Max`/`*Min` aggregates instead of the bare names), so every
/// attribute is optional.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForecastValue {
    pub cloud_base: Option<f64>,
    pub cloud_ceiling: Option<f64>,
    pub cloud_cover: Option<f64>,
    pub dew_point: Option<f64>,
    pub freezing_rain_intensity: Option<f64>,
    pub humidity: Option<f64>,
    pub precipitation_probability: Option<f64>,
    pub pressure_surface_level: Option<f64>,
    pub rain_intensity: Option<f64>,
    pub sleet_intensity: Option<f64>,
    pub snow_intensity: Option<f64>,
    pub temperature: Option<f64>,
    pub temperature_apparent: Option<f64>,
    pub uv_health_concern: Option<f64>,
    pub uv_index: Option<f64>,
    pub visibility: Option<f64>,
    pub weather_code: Option<f64>,
    pub wind_direction: Option<f64>,
    pub wind_gust: Option<f64>,
    pub wind_speed: Option<f64>,
}

/// [`ForecastValue`] plus the apparent temperature summary of a whole day.
///
/// Derefs to the base value, so anything taking `&ForecastValue` accepts a
/// daily value as well. Only `temperatureApparentAvg` is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyForecastValue {
    #[serde(flatten)]
    pub base: ForecastValue,
    pub temperature_apparent_avg: f64,
    #[serde(default)]
    pub temperature_apparent_max: Option<f64>,
    #[serde(default)]
    pub temperature_apparent_min: Option<f64>,
}

impl Deref for DailyForecastValue {
    type Target = ForecastValue;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

/// One timestamped sample.
///
/// `time` is kept as the provider sent it; see [`TimelineValue::timestamp`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineValue<V = ForecastValue> {
    pub time: String,
    pub values: V,
}

pub type DailyTimelineValue = TimelineValue<DailyForecastValue>;

impl<V> TimelineValue<V> {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.time)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Calendar day of month of this sample, if `time` parses.
    ///
    /// Taken in UTC, not the host's local time zone.
    pub fn day_of_month(&self) -> Option<u32> {
        self.timestamp().map(|dt| dt.day())
    }
}

/// The three resolutions returned by the provider, each ordered by time.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Timelines {
    pub hourly: Vec<TimelineValue>,
    pub minutely: Vec<TimelineValue>,
    pub daily: Vec<DailyTimelineValue>,
}

impl Timelines {
    /// Decode each resolution on its own, sample by sample.
    ///
    /// A sample that does not decode (no `time`, or a daily sample without
    /// `temperatureApparentAvg`) is skipped with a warning; the rest of its
    /// sequence and the other sequences are kept in provider order.
    fn from_json(raw: Value) -> Option<Self> {
        let Value::Object(mut obj) = raw else {
            return None;
        };

        Some(Self {
            hourly: decode_sequence(obj.remove("hourly"), "hourly"),
            minutely: decode_sequence(obj.remove("minutely"), "minutely"),
            daily: decode_sequence(obj.remove("daily"), "daily"),
        })
    }
}

fn decode_sequence<T: DeserializeOwned>(raw: Option<Value>, timeline: &str) -> Vec<T> {
    let entries = match raw {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            tracing::warn!(timeline, "timeline is not an array; ignoring it");
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value(entry) {
            Ok(sample) => Some(sample),
            Err(e) => {
                tracing::warn!(timeline, index, error = %e, "skipping undecodable sample");
                None
            }
        })
        .collect()
}

/// Location echo included in the provider response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastLocation {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// Parsed forecast response.
///
/// `Empty` means "no data": either nothing was fetched yet, the fetch failed,
/// or the provider answered without usable timelines.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Forecast {
    #[default]
    Empty,
    Loaded {
        timelines: Timelines,
        location: Option<ForecastLocation>,
    },
}

impl Forecast {
    pub fn is_empty(&self) -> bool {
        matches!(self, Forecast::Empty)
    }

    pub fn timelines(&self) -> Option<&Timelines> {
        match self {
            Forecast::Empty => None,
            Forecast::Loaded { timelines, .. } => Some(timelines),
        }
    }

    pub fn location(&self) -> Option<&ForecastLocation> {
        match self {
            Forecast::Empty => None,
            Forecast::Loaded { location, .. } => location.as_ref(),
        }
    }

    /// Daily entries in provider order; empty slice when there is no data.
    pub fn daily(&self) -> &[DailyTimelineValue] {
        self.timelines().map(|t| t.daily.as_slice()).unwrap_or_default()
    }

    /// Sample describing current conditions: the first minutely entry, falling
    /// back to the first hourly, then the first daily entry.
    pub fn current(&self) -> Option<&ForecastValue> {
        let timelines = self.timelines()?;
        timelines
            .minutely
            .first()
            .or_else(|| timelines.hourly.first())
            .map(|t| &t.values)
            .or_else(|| timelines.daily.first().map(|t| &*t.values))
    }

    /// Permissive decode of a provider JSON document.
    ///
    /// Only the top level must be JSON. A missing or non-object `timelines`
    /// member yields [`Forecast::Empty`]; an undecodable `location` is dropped.
    pub fn from_json(doc: Value) -> Self {
        let Value::Object(mut obj) = doc else {
            tracing::warn!("forecast body is not a JSON object; treating as no data");
            return Forecast::Empty;
        };

        let Some(raw_timelines) = obj.remove("timelines") else {
            tracing::warn!("forecast body has no timelines; treating as no data");
            return Forecast::Empty;
        };

        let Some(timelines) = Timelines::from_json(raw_timelines) else {
            tracing::warn!("forecast timelines is not an object; treating as no data");
            return Forecast::Empty;
        };

        let location = obj
            .remove("location")
            .and_then(|raw| match serde_json::from_value::<ForecastLocation>(raw) {
                Ok(loc) => Some(loc),
                Err(e) => {
                    tracing::debug!(error = %e, "ignoring undecodable location echo");
                    None
                }
            });

        Forecast::Loaded { timelines, location }
    }
}

/// Condition category for a provider `weatherCode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherCondition {
    Clear,
    MostlyClear,
    PartlyCloudy,
    MostlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    HeavyRain,
    Snow,
    FreezingRain,
    IcePellets,
    Thunderstorm,
    Unknown,
}

impl WeatherCondition {
    /// See https://docs.tomorrow.io/reference/data-layers-weather-codes
    pub fn from_code(code: f64) -> Self {
        match code as i64 {
            1000 => Self::Clear,
            1100 => Self::MostlyClear,
            1101 => Self::PartlyCloudy,
            1102 => Self::MostlyCloudy,
            1001 => Self::Cloudy,
            2000 | 2100 => Self::Fog,
            4000 => Self::Drizzle,
            4001 | 4200 => Self::Rain,
            4201 => Self::HeavyRain,
            5000 | 5001 | 5100 | 5101 => Self::Snow,
            6000 | 6001 | 6200 | 6201 => Self::FreezingRain,
            7000 | 7101 | 7102 => Self::IcePellets,
            8000 => Self::Thunderstorm,
            _ => Self::Unknown,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::MostlyClear => "Mostly Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::MostlyCloudy => "Mostly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::HeavyRain => "Heavy Rain",
            Self::Snow => "Snow",
            Self::FreezingRain => "Freezing Rain",
            Self::IcePellets => "Ice Pellets",
            Self::Thunderstorm => "Thunderstorm",
            Self::Unknown => "Unknown",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Clear | Self::MostlyClear => "☀",
            Self::PartlyCloudy | Self::MostlyCloudy => "⛅",
            Self::Cloudy => "☁",
            Self::Fog => "🌫",
            Self::Drizzle | Self::Rain | Self::HeavyRain => "🌧",
            Self::Snow | Self::FreezingRain | Self::IcePellets => "🌨",
            Self::Thunderstorm => "⛈",
            Self::Unknown => "?",
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn values_json(temperature_apparent: f64) -> serde_json::Value {
        json!({
            "cloudBase": 0.5,
            "cloudCeiling": 1.2,
            "cloudCover": 40,
            "dewPoint": 2.1,
            "freezingRainIntensity": 0,
            "humidity": 81,
            "precipitationProbability": 10,
            "pressureSurfaceLevel": 1012.4,
            "rainIntensity": 0,
            "sleetIntensity": 0,
            "snowIntensity": 0,
            "temperature": 6.3,
            "temperatureApparent": temperature_apparent,
            "uvHealthConcern": 0,
            "uvIndex": 1,
            "visibility": 16,
            "weatherCode": 1101,
            "windDirection": 230,
            "windGust": 7.4,
            "windSpeed": 4.2
        })
    }

    pub(crate) fn daily_json(time: &str, avg: f64) -> serde_json::Value {
        let mut values = values_json(avg);
        let obj = values.as_object_mut().expect("values is an object");
        obj.insert("temperatureApparentAvg".into(), json!(avg));
        obj.insert("temperatureApparentMax".into(), json!(avg + 3.0));
        obj.insert("temperatureApparentMin".into(), json!(avg - 3.0));
        json!({ "time": time, "values": values })
    }

    #[test]
    fn coordinate_rejects_out_of_range() {
        assert!(Coordinate::new(51.5, -0.12).is_some());
        assert!(Coordinate::new(90.0, 180.0).is_some());
        assert!(Coordinate::new(90.1, 0.0).is_none());
        assert!(Coordinate::new(0.0, -180.5).is_none());
    }

    #[test]
    fn coordinate_query_format() {
        let c = Coordinate::new(51.5, -0.12).unwrap();
        assert_eq!(c.as_query(), "51.5,-0.12");
    }

    #[test]
    fn daily_value_derefs_to_base() {
        let entry: DailyTimelineValue =
            serde_json::from_value(daily_json("2024-01-01T00:00:00Z", 5.2)).unwrap();

        fn humidity(v: &ForecastValue) -> Option<f64> {
            v.humidity
        }

        assert_eq!(humidity(&entry.values), Some(81.0));
        assert_eq!(entry.values.temperature_apparent_avg, 5.2);
        assert_eq!(entry.values.temperature_apparent_max, Some(8.2));
    }

    #[test]
    fn from_json_without_timelines_is_empty() {
        let doc = json!({ "code": 401001, "type": "Invalid Auth", "message": "bad key" });
        assert_eq!(Forecast::from_json(doc), Forecast::Empty);
        assert_eq!(Forecast::from_json(json!([1, 2, 3])), Forecast::Empty);
    }

    #[test]
    fn non_object_timelines_is_empty() {
        assert!(Forecast::from_json(json!({ "timelines": [] })).is_empty());
        assert!(Forecast::from_json(json!({ "timelines": null })).is_empty());
    }

    #[test]
    fn null_hourly_attribute_keeps_every_sample() {
        let mut hourly = values_json(3.0);
        hourly["cloudBase"] = Value::Null;
        hourly["cloudCeiling"] = Value::Null;

        let doc = json!({
            "timelines": {
                "hourly": [{ "time": "2024-01-01T10:00:00Z", "values": hourly }],
                "daily": [daily_json("2024-01-01T00:00:00Z", 5.2)]
            }
        });

        let forecast = Forecast::from_json(doc);
        let timelines = forecast.timelines().expect("timelines decoded");

        assert_eq!(timelines.hourly.len(), 1);
        assert_eq!(timelines.hourly[0].values.cloud_base, None);
        assert_eq!(timelines.hourly[0].values.temperature_apparent, Some(3.0));
        assert_eq!(forecast.daily().len(), 1);
    }

    #[test]
    fn daily_sample_with_aggregate_fields_only() {
        let doc = json!({
            "timelines": {
                "daily": [{
                    "time": "2024-01-01T11:00:00Z",
                    "values": {
                        "cloudBaseAvg": 0.9,
                        "humidityAvg": 84.2,
                        "temperatureAvg": 6.0,
                        "temperatureApparentAvg": 5.2,
                        "temperatureApparentMax": 8.1,
                        "weatherCodeMax": 4000,
                        "windSpeedAvg": 4.4
                    }
                }]
            }
        });

        let forecast = Forecast::from_json(doc);
        let day = &forecast.daily()[0];

        assert_eq!(day.day_of_month(), Some(1));
        assert_eq!(day.values.temperature_apparent_avg, 5.2);
        assert_eq!(day.values.temperature_apparent_min, None);
        assert_eq!(day.values.temperature, None);
    }

    #[test]
    fn undecodable_sample_only_drops_itself() {
        let doc = json!({
            "timelines": {
                "hourly": [
                    { "values": values_json(1.0) },
                    { "time": "2024-01-01T11:00:00Z", "values": { "temperature": "warm" } },
                    { "time": "2024-01-01T12:00:00Z", "values": values_json(2.0) }
                ],
                "minutely": { "unexpected": true },
                "daily": [
                    { "time": "2024-01-01T00:00:00Z", "values": { "humidity": 3 } },
                    daily_json("2024-01-02T00:00:00Z", 4.0)
                ]
            }
        });

        let forecast = Forecast::from_json(doc);
        let timelines = forecast.timelines().expect("timelines decoded");

        assert_eq!(timelines.hourly.len(), 1);
        assert_eq!(timelines.hourly[0].time, "2024-01-01T12:00:00Z");
        assert!(timelines.minutely.is_empty());
        assert_eq!(forecast.daily().len(), 1);
        assert_eq!(forecast.daily()[0].values.temperature_apparent_avg, 4.0);
    }

    #[test]
    fn from_json_keeps_order_and_optional_location() {
        let doc = json!({
            "timelines": {
                "daily": [
                    daily_json("2024-01-03T00:00:00Z", 1.0),
                    daily_json("2024-01-01T00:00:00Z", 2.0),
                ]
            }
        });

        let forecast = Forecast::from_json(doc);
        let days: Vec<_> = forecast.daily().iter().map(|d| d.day_of_month()).collect();

        assert_eq!(days, vec![Some(3), Some(1)]);
        assert!(forecast.location().is_none());
        assert!(forecast.timelines().unwrap().hourly.is_empty());
    }

    #[test]
    fn from_json_reads_location_echo() {
        let doc = json!({
            "timelines": { "hourly": [], "minutely": [], "daily": [] },
            "location": { "lat": 51.5, "lon": -0.12, "name": "London", "type": "city" }
        });

        let forecast = Forecast::from_json(doc);
        let loc = forecast.location().expect("location echo");

        assert_eq!(loc.name.as_deref(), Some("London"));
        assert_eq!(loc.kind.as_deref(), Some("city"));
        assert!(!forecast.is_empty());
        assert!(forecast.daily().is_empty());
    }

    #[test]
    fn current_prefers_minutely_then_hourly() {
        let doc = json!({
            "timelines": {
                "hourly": [{ "time": "2024-01-01T10:00:00Z", "values": values_json(2.0) }],
                "minutely": [{ "time": "2024-01-01T10:01:00Z", "values": values_json(1.0) }]
            }
        });
        let forecast = Forecast::from_json(doc);
        assert_eq!(forecast.current().unwrap().temperature_apparent, Some(1.0));

        let doc = json!({
            "timelines": { "daily": [daily_json("2024-01-01T00:00:00Z", 7.0)] }
        });
        let forecast = Forecast::from_json(doc);
        assert_eq!(forecast.current().unwrap().temperature_apparent, Some(7.0));

        assert!(Forecast::Empty.current().is_none());
    }

    #[test]
    fn unparseable_time_has_no_day() {
        let entry = TimelineValue { time: "soon".to_string(), values: () };
        assert_eq!(entry.day_of_month(), None);
    }

    #[test]
    fn weather_codes_map_to_conditions() {
        assert_eq!(WeatherCondition::from_code(1000.0), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_code(1101.0), WeatherCondition::PartlyCloudy);
        assert_eq!(WeatherCondition::from_code(4201.0), WeatherCondition::HeavyRain);
        assert_eq!(WeatherCondition::from_code(8000.0), WeatherCondition::Thunderstorm);
        assert_eq!(WeatherCondition::from_code(0.0), WeatherCondition::Unknown);
        assert_eq!(WeatherCondition::Rain.description(), "Rain");
    }
}
