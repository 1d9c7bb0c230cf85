//! Audit record models

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;
use validator::Validate;

/// Storage and wire format for instants: fixed-width UTC with milliseconds
pub const INSTANT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// A stored audit event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    #[serde(rename = "_id")]
    pub id: Uuid,
    /// When the audited event happened, which is not necessarily when it was stored
    #[serde(serialize_with = "serialize_instant", deserialize_with = "deserialize_instant")]
    pub time_stamp: DateTime<Utc>,
    pub user_id: String,
    pub source: String,
    pub method: String,
    pub data: String,
    #[serde(serialize_with = "serialize_instant", deserialize_with = "deserialize_instant")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_instant", deserialize_with = "deserialize_instant")]
    pub updated_at: DateTime<Utc>,
}

/// Ingestion request body
///
/// `timeStamp` is an ISO 8601 string or a number of epoch milliseconds.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewAuditRecord {
    /// Accepted for compatibility and ignored: the store assigns ids
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(deserialize_with = "deserialize_instant")]
    pub time_stamp: DateTime<Utc>,
    #[validate(length(min = 1, max = 25, message = "userId must be between 1 and 25 characters"))]
    pub user_id: String,
    #[validate(length(min = 5, max = 30, message = "source must be between 5 and 30 characters"))]
    pub source: String,
    #[validate(length(min = 3, max = 7, message = "method must be between 3 and 7 characters"))]
    pub method: String,
    #[validate(length(max = 4000, message = "data must be at most 4000 characters"))]
    pub data: String,
}

/// Query parameters for `POST /audit`
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateAuditParams {
    /// Return the stored record instead of `Success`
    pub return_new: Option<String>,
}

/// Query parameters for `GET /audit`
///
/// Numbers are kept as strings so malformed values produce a descriptive
/// 400 instead of a generic extractor rejection.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    pub page_size: Option<String>,
    pub page_number: Option<String>,
    /// Accepted but not applied; results are always ordered by `timeStamp`
    pub sort_by: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Optional `GET /audit` body restricting the returned fields
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FieldSelection {
    #[serde(default)]
    pub select: Option<Vec<String>>,
}

/// Paginated query response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditPage {
    pub page_size: u32,
    pub page_number: u32,
    #[serde(rename = "_links")]
    pub links: PageLinks,
    pub results: Vec<serde_json::Value>,
}

/// Navigation links of a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLinks {
    pub base: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

/// Format an instant in [`INSTANT_FORMAT`]
pub fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.format(INSTANT_FORMAT).to_string()
}

/// Parse an RFC 3339 instant, or a zone-less one read as UTC
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    None
}

fn serialize_instant<S>(instant: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_instant(instant))
}

/// Instant as sent by clients: an ISO 8601 string or epoch milliseconds
#[derive(Deserialize)]
#[serde(untagged)]
enum RawInstant {
    Millis(i64),
    Text(String),
}

fn deserialize_instant<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    match RawInstant::deserialize(deserializer)? {
        RawInstant::Millis(millis) => DateTime::from_timestamp_millis(millis).ok_or_else(|| {
            serde::de::Error::custom(format!("epoch milliseconds {} out of range", millis))
        }),
        RawInstant::Text(value) => parse_instant(&value).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid timestamp '{}', expected ISO 8601 or epoch milliseconds",
                value
            ))
        }),
    }
}
