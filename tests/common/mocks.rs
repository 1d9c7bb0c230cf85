//! Mock record stores for testing
//!
//! Provide `AuditStore` implementations for exercising the query planner
//! without a database, including one that always fails.

use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use audit_service::{
    db::AuditStore,
    models::{AuditRecord, NewAuditRecord},
    services::{AuditFilter, PageRequest},
};

/// In-memory store ordered by `timeStamp`, then insertion
#[derive(Default)]
pub struct MemoryAuditStore {
    records: RwLock<Vec<AuditRecord>>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn insert(&self, record: &NewAuditRecord) -> Result<AuditRecord> {
        let now = Utc::now();
        let created = AuditRecord {
            id: Uuid::new_v4(),
            time_stamp: record.time_stamp,
            user_id: record.user_id.clone(),
            source: record.source.clone(),
            method: record.method.clone(),
            data: record.data.clone(),
            created_at: now,
            updated_at: now,
        };
        self.records.write().unwrap().push(created.clone());
        Ok(created)
    }

    async fn find(&self, filter: &AuditFilter, page: &PageRequest) -> Result<Vec<AuditRecord>> {
        let mut matching: Vec<AuditRecord> = self
            .records
            .read()
            .unwrap()
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        // Stable sort keeps insertion order among equal timestamps
        matching.sort_by_key(|r| r.time_stamp);

        Ok(matching
            .into_iter()
            .skip(page.skip() as usize)
            .take(page.limit() as usize)
            .collect())
    }
}

/// Store whose every call fails, as a lost database connection would
pub struct FailingAuditStore {
    pub message: String,
}

impl Default for FailingAuditStore {
    fn default() -> Self {
        Self {
            message: "connection refused".to_string(),
        }
    }
}

#[async_trait]
impl AuditStore for FailingAuditStore {
    async fn insert(&self, _record: &NewAuditRecord) -> Result<AuditRecord> {
        anyhow::bail!("{}", self.message)
    }

    async fn find(&self, _filter: &AuditFilter, _page: &PageRequest) -> Result<Vec<AuditRecord>> {
        anyhow::bail!("{}", self.message)
    }
}
