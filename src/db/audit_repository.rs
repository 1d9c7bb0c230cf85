//! Audit record repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::{format_instant, parse_instant, AuditRecord, NewAuditRecord};
use crate::services::query_planner::{AuditFilter, PageRequest};

/// Record store used by the query and ingestion paths
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Store a new record, assigning its id and creation instants
    async fn insert(&self, record: &NewAuditRecord) -> Result<AuditRecord>;

    /// Fetch one page of records matching `filter`, ordered by `timeStamp`
    async fn find(&self, filter: &AuditFilter, page: &PageRequest) -> Result<Vec<AuditRecord>>;
}

#[derive(Debug, sqlx::FromRow)]
struct AuditRow {
    id: String,
    time_stamp: String,
    user_id: String,
    source: String,
    method: String,
    data: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<AuditRow> for AuditRecord {
    type Error = anyhow::Error;

    fn try_from(row: AuditRow) -> Result<Self> {
        let instant = |column: &str, value: &str| {
            parse_instant(value)
                .with_context(|| format!("Invalid {} '{}' in audit_records", column, value))
        };

        Ok(AuditRecord {
            id: Uuid::parse_str(&row.id)
                .with_context(|| format!("Invalid id '{}' in audit_records", row.id))?,
            time_stamp: instant("time_stamp", &row.time_stamp)?,
            created_at: instant("created_at", &row.created_at)?,
            updated_at: instant("updated_at", &row.updated_at)?,
            user_id: row.user_id,
            source: row.source,
            method: row.method,
            data: row.data,
        })
    }
}

pub struct AuditRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AuditRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Count stored records
    pub async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM audit_records")
            .fetch_one(self.pool)
            .await
            .context("Failed to count audit records")
    }
}

#[async_trait]
impl AuditStore for AuditRepository<'_> {
    async fn insert(&self, record: &NewAuditRecord) -> Result<AuditRecord> {
        // Stored precision is milliseconds; truncate so the returned record
        // matches what a later read yields.
        let now = Utc::now().trunc_subsecs(3);
        let created = AuditRecord {
            id: Uuid::new_v4(),
            time_stamp: record.time_stamp.trunc_subsecs(3),
            user_id: record.user_id.clone(),
            source: record.source.clone(),
            method: record.method.clone(),
            data: record.data.clone(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO audit_records (id, time_stamp, user_id, source, method, data, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(created.id.to_string())
        .bind(format_instant(&created.time_stamp))
        .bind(&created.user_id)
        .bind(&created.source)
        .bind(&created.method)
        .bind(&created.data)
        .bind(format_instant(&created.created_at))
        .bind(format_instant(&created.updated_at))
        .execute(self.pool)
        .await
        .context("Failed to insert audit record")?;

        Ok(created)
    }

    async fn find(&self, filter: &AuditFilter, page: &PageRequest) -> Result<Vec<AuditRecord>> {
        let mut sql = String::from(
            "SELECT id, time_stamp, user_id, source, method, data, created_at, updated_at FROM audit_records",
        );

        if filter.range.is_some() {
            sql.push_str(" WHERE time_stamp >= ? AND time_stamp <= ?");
        }

        sql.push_str(" ORDER BY time_stamp ASC, created_at ASC, id ASC LIMIT ? OFFSET ?");

        let mut q = sqlx::query_as::<_, AuditRow>(&sql);
        if let Some(ref range) = filter.range {
            q = q
                .bind(format_instant(&range.start))
                .bind(format_instant(&range.end));
        }
        q = q
            .bind(i64::from(page.limit()))
            .bind(i64::try_from(page.skip()).unwrap_or(i64::MAX));

        let rows = q
            .fetch_all(self.pool)
            .await
            .context("Failed to query audit records")?;

        rows.into_iter().map(AuditRecord::try_from).collect()
    }
}
