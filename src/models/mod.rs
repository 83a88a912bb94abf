use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::error::AppResult;

pub mod analytics;
pub mod query;
pub mod rule;
pub mod transaction;

pub use analytics::{AnalyticsResult, PriceRange, PriceStatistics, ProductStats};
pub use query::{
    GroupSummary, GroupTotals, GroupTypes, GroupView, RecommendParams, RecommendationResult,
};
pub use rule::{
    AssociationRule, FrequentItemset, MiningResult, MiningSummary, Recommendation, RuleMatch,
};
pub use transaction::{GroupProduct, TransactionGroup, TransactionMatrix, TransactionSet};

/// Wall-clock time of a click, second resolution, as emitted by the producer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventTimestamp {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl EventTimestamp {
    pub fn new(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    /// Builds a timestamp from the producer's array form `[y, m, d, h, min, s, ...]`.
    ///
    /// Returns `None` when fewer than six fields are present or the fields do not
    /// describe a real calendar time.
    pub fn from_parts(parts: &[i64]) -> Option<Self> {
        if parts.len() < 6 {
            return None;
        }
        let year = i32::try_from(parts[0]).ok()?;
        let mut rest = [0u32; 5];
        for (slot, value) in rest.iter_mut().zip(&parts[1..6]) {
            *slot = u32::try_from(*value).ok()?;
        }
        let [month, day, hour, minute, second] = rest;
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        let datetime = date.and_hms_opt(hour, minute, second)?;
        Some(Self::from(datetime))
    }

    /// Parses an ISO-8601 date-time, with or without offset
    pub fn parse(text: &str) -> Option<Self> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(Self::from(dt.naive_local()));
        }
        NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(Self::from)
    }

    pub fn to_parts(self) -> [i64; 6] {
        [
            self.year as i64,
            self.month as i64,
            self.day as i64,
            self.hour as i64,
            self.minute as i64,
            self.second as i64,
        ]
    }
}

impl From<NaiveDateTime> for EventTimestamp {
    fn from(dt: NaiveDateTime) -> Self {
        Self::new(
            dt.year(),
            dt.month(),
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second(),
        )
    }
}

impl Display for EventTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{:02}-{:02}T{:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Serde glue for `Option<EventTimestamp>`: reads the array or string form,
/// always writes the six-field array. Any other shape, or an array holding
/// non-integer parts, reads as no timestamp.
mod timestamp_format {
    use super::EventTimestamp;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S>(value: &Option<EventTimestamp>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.collect_seq(ts.to_parts()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<EventTimestamp>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => items
                .iter()
                .map(Value::as_i64)
                .collect::<Option<Vec<_>>>()
                .and_then(|parts| EventTimestamp::from_parts(&parts)),
            Value::String(text) => EventTimestamp::parse(&text),
            _ => None,
        })
    }
}

fn unknown() -> String {
    "unknown".to_string()
}

/// A single product click as stored in the event log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClickEvent {
    #[serde(default = "unknown")]
    pub product_name: String,
    #[serde(default = "unknown")]
    pub category: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default, with = "timestamp_format")]
    pub timestamp: Option<EventTimestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl ClickEvent {
    /// Creates a click event without the optional producer fields
    pub fn new(
        product_name: impl Into<String>,
        category: impl Into<String>,
        price: f64,
        timestamp: Option<EventTimestamp>,
    ) -> Self {
        Self {
            product_name: product_name.into(),
            category: category.into(),
            price,
            timestamp,
            event_type: None,
            user_id: None,
            product_id: None,
            session_id: None,
        }
    }

    /// Decodes a raw JSON payload from the feed or the store
    pub fn from_payload(payload: &str) -> AppResult<Self> {
        Ok(serde_json::from_str(payload)?)
    }

    pub fn to_payload(&self) -> AppResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
