//! Wire types for the metrics API.
//!
//! The backend serializes decimals inconsistently (sometimes numbers,
//! sometimes strings) and pipeline timestamps may be naive or null. The
//! deserializers here coerce leniently; unparseable numerics become NaN and
//! are caught by the formatters downstream.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OverviewMetrics {
    pub total_users: i64,
    pub total_events: i64,
    #[serde(deserialize_with = "de::lenient_f64")]
    pub total_revenue: f64,
    #[serde(deserialize_with = "de::lenient_f64")]
    pub conversion_rate: f64,
    pub events_last_hour: i64,
    #[serde(deserialize_with = "de::lenient_f64")]
    pub revenue_today: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimeSeriesPoint {
    #[serde(deserialize_with = "de::timestamp")]
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeSeries {
    pub data: Vec<TimeSeriesPoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopProduct {
    pub product_id: String,
    pub product_name: String,
    #[serde(deserialize_with = "de::lenient_f64")]
    pub revenue: f64,
    pub quantity: i64,
    pub orders: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopProducts {
    pub products: Vec<TopProduct>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QualityCheck {
    pub checkpoint_name: String,
    #[serde(deserialize_with = "de::timestamp")]
    pub run_time: DateTime<Utc>,
    pub success: bool,
    pub expectations_passed: i64,
    pub expectations_failed: i64,
    #[serde(default)]
    pub failed_expectations: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineStatus {
    pub pipeline_name: String,
    #[serde(default, deserialize_with = "de::opt_timestamp")]
    pub last_run_ts: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub rows_processed: Option<i64>,
    #[serde(default)]
    pub lag_seconds: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthStatus {
    pub pipelines: Vec<PipelineStatus>,
    #[serde(default)]
    pub table_counts: HashMap<String, i64>,
    #[serde(default, deserialize_with = "de::opt_timestamp")]
    pub last_dbt_run: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de::opt_timestamp")]
    pub last_ge_run: Option<DateTime<Utc>>,
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // FastAPI emits naive datetimes for tz-unaware columns; treat as UTC.
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

mod de {
    use super::parse_timestamp;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
            Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
            _ => f64::NAN,
        })
    }

    pub fn timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse_timestamp(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unparseable timestamp: {}", raw)))
    }

    pub fn opt_timestamp<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Ok(Option::<String>::deserialize(d)?
            .as_deref()
            .and_then(parse_timestamp))
    }
}
