//! Daily snapshot records.
//!
//! Field names and timestamp formats match the JSON the store's reporting
//! stack already consumes: customer files hold `Age`/`Gender`/`DateTime`/
//! `InStoreDuration` objects, zone-visit files hold per-customer maps of
//! zone label to dwell seconds, and day folders are keyed `ddMMyyyy`.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, TimeZone};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::demographics::{AgeBracket, Gender};
use crate::zone::ZoneLabel;

/// One customer row in a daily `customer/<day>/<day>.json` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CustomerRecord {
    #[serde(rename = "Age")]
    pub age: AgeBracket,
    #[serde(rename = "Gender")]
    pub gender: Gender,
    /// First time this customer was seen, formatted `%d%m%Y %H:%M:%S`
    #[serde(rename = "DateTime")]
    pub date_time: String,
    /// Total in-store dwell in seconds, rounded to 2 decimals
    #[serde(rename = "InStoreDuration")]
    pub in_store_duration: f64,
}

/// One customer row in a daily `visit_zone/<day>/<day>.json` file: dwell
/// seconds per zone, rounded to 2 decimals.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ZoneVisitRecord(pub BTreeMap<ZoneLabel, f64>);

impl ZoneVisitRecord {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn set(&mut self, zone: ZoneLabel, secs: f64) {
        self.0.insert(zone, secs);
    }

    pub fn get(&self, zone: ZoneLabel) -> f64 {
        self.0.get(&zone).copied().unwrap_or(0.0)
    }
}

/// Day-folder key for a timestamp (`%d%m%Y`, e.g. `23082026`).
pub fn day_key<Tz: TimeZone>(t: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    t.format("%d%m%Y").to_string()
}

/// Parse a day-folder key back into a date. Returns `None` for names that
/// are not `%d%m%Y` keys.
pub fn parse_day_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, "%d%m%Y").ok()
}

/// Format a first-seen timestamp for the `DateTime` snapshot field.
pub fn format_first_seen<Tz: TimeZone>(t: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    t.format("%d%m%Y %H:%M:%S").to_string()
}

/// Round a dwell accumulator to 2 decimals for serialization.
pub fn round2(secs: f64) -> f64 {
    (secs * 100.0).round() / 100.0
}
