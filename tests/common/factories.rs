//! Test factories for generating test data
//!
//! Factories create randomized records within the ingestion bounds, useful
//! when a test needs many distinct events.

use chrono::{DateTime, Duration, Utc};
use fake::faker::lorem::en::{Sentence, Word};
use fake::Fake;
use serde_json::{json, Value};

use audit_service::models::{format_instant, parse_instant, NewAuditRecord};

const METHODS: [&str; 5] = ["GET", "POST", "PUT", "PATCH", "DELETE"];

/// Factory for audit events
pub struct AuditFactory {
    base: DateTime<Utc>,
}

impl Default for AuditFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditFactory {
    /// Events fall on 2023-04-20 unless placed explicitly
    pub fn new() -> Self {
        Self {
            base: parse_instant("2023-04-20T00:00:00Z").expect("valid base instant"),
        }
    }

    /// A random event somewhere in the base day
    pub fn record(&self) -> NewAuditRecord {
        let offset = Duration::seconds((0..86_400).fake::<i64>());
        self.record_at(self.base + offset)
    }

    /// A random event at a fixed instant
    pub fn record_at(&self, time_stamp: DateTime<Utc>) -> NewAuditRecord {
        let user_id: u64 = (1..u64::MAX).fake();
        let word: String = Word().fake();
        let mut source = format!("svc-{}", word);
        source.truncate(30);
        let method = METHODS[(0..METHODS.len()).fake::<usize>()];
        let data: String = Sentence(3..12).fake();

        NewAuditRecord {
            id: None,
            time_stamp,
            user_id: user_id.to_string(),
            source,
            method: method.to_string(),
            data,
        }
    }

    /// `count` events one minute apart starting at the base instant
    pub fn sequence(&self, count: usize) -> Vec<NewAuditRecord> {
        (0..count)
            .map(|i| self.record_at(self.base + Duration::minutes(i as i64)))
            .collect()
    }

    /// JSON ingestion body for a random event
    pub fn body(&self) -> Value {
        to_body(&self.record())
    }
}

/// Render a record as an ingestion request body
pub fn to_body(record: &NewAuditRecord) -> Value {
    json!({
        "timeStamp": format_instant(&record.time_stamp),
        "userId": record.user_id,
        "source": record.source,
        "method": record.method,
        "data": record.data,
    })
}
