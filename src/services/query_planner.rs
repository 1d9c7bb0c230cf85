//! Audit query planning
//!
//! Turns raw `GET /audit` parameters into a range filter, a field
//! projection and a page request, runs them against an [`AuditStore`] and
//! wraps the results in a paginated envelope with navigation links.

use std::collections::BTreeSet;

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tracing::debug;

use crate::db::AuditStore;
use crate::models::{AuditPage, AuditQuery, AuditRecord, FieldSelection, PageLinks};
use crate::utils::error::{AppError, AppResult};
use crate::utils::timestamp::{TimestampError, TimestampParts};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_PAGE_NUMBER: u32 = 1;

/// Field every projection keeps
const ID_FIELD: &str = "_id";

/// Upper bound used when only a start date is given
pub fn open_range_end() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2050, 12, 31, 23, 59, 59)
        .single()
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Inclusive bounds on `timeStamp`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Record filter; the default matches every record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditFilter {
    pub range: Option<TimeRange>,
}

impl AuditFilter {
    pub fn matches(&self, record: &AuditRecord) -> bool {
        match self.range {
            Some(range) => range.start <= record.time_stamp && record.time_stamp <= range.end,
            None => true,
        }
    }
}

/// Build the `timeStamp` range filter from the raw query dates.
///
/// Without a start date the filter is empty and `end` is not consulted.
pub fn build_filter(start: Option<&str>, end: Option<&str>) -> Result<AuditFilter, TimestampError> {
    let Some(start) = start else {
        return Ok(AuditFilter::default());
    };

    let start = TimestampParts::parse(start)?.to_utc();
    let end = match end {
        Some(end) => TimestampParts::parse(end)?.to_utc(),
        None => open_range_end(),
    };

    Ok(AuditFilter {
        range: Some(TimeRange { start, end }),
    })
}

/// Which record fields a query returns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    All,
    Fields(BTreeSet<String>),
}

/// Build a projection from the optional `select` list; `_id` is always kept.
/// An empty list selects every field, like an absent one.
pub fn project_fields(names: Option<&[String]>) -> Projection {
    match names {
        None => Projection::All,
        Some([]) => Projection::All,
        Some(names) => {
            let mut fields: BTreeSet<String> = names.iter().cloned().collect();
            fields.insert(ID_FIELD.to_string());
            Projection::Fields(fields)
        }
    }
}

impl Projection {
    /// Render a record with only the projected fields.
    /// Names that are not record fields select nothing.
    pub fn apply(&self, record: &AuditRecord) -> serde_json::Result<Value> {
        let mut value = serde_json::to_value(record)?;
        if let (Projection::Fields(fields), Value::Object(map)) = (self, &mut value) {
            map.retain(|key, _| fields.contains(key));
        }
        Ok(value)
    }
}

/// One page of a query, 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page_number: u32,
    page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE)
    }
}

impl PageRequest {
    /// Zero values are raised to 1
    pub fn new(page_number: u32, page_size: u32) -> Self {
        Self {
            page_number: page_number.max(1),
            page_size: page_size.max(1),
        }
    }

    /// Parse the raw query values; `pageSize` is clamped to `max_page_size`
    pub fn from_query(
        page_number: Option<&str>,
        page_size: Option<&str>,
        max_page_size: u32,
    ) -> AppResult<Self> {
        let page_number = parse_positive("pageNumber", page_number)?.unwrap_or(DEFAULT_PAGE_NUMBER);
        let page_size = parse_positive("pageSize", page_size)?
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(max_page_size.max(1));

        Ok(Self::new(page_number, page_size))
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Records to skip before this page
    pub fn skip(&self) -> u64 {
        u64::from(self.page_number - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u32 {
        self.page_size
    }
}

fn parse_positive(name: &str, value: Option<&str>) -> AppResult<Option<u32>> {
    let Some(raw) = value else {
        return Ok(None);
    };

    match raw.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(Some(n)),
        _ => Err(AppError::BadRequest(format!(
            "{} must be a positive integer, got '{}'",
            name, raw
        ))),
    }
}

/// Everything needed to run one `GET /audit` query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub filter: AuditFilter,
    pub projection: Projection,
    pub page: PageRequest,
}

impl QueryPlan {
    pub fn from_request(
        query: &AuditQuery,
        selection: &FieldSelection,
        max_page_size: u32,
    ) -> AppResult<Self> {
        if let Some(ref sort_by) = query.sort_by {
            debug!(sort_by = %sort_by, "Ignoring sortBy, results are ordered by timeStamp");
        }

        let filter = build_filter(query.start_date.as_deref(), query.end_date.as_deref())?;
        let projection = project_fields(selection.select.as_deref());
        let page = PageRequest::from_query(
            query.page_number.as_deref(),
            query.page_size.as_deref(),
            max_page_size,
        )?;

        Ok(Self {
            filter,
            projection,
            page,
        })
    }
}

/// Fetch one page from the store and apply the projection
pub async fn paginate(
    store: &dyn AuditStore,
    filter: &AuditFilter,
    projection: &Projection,
    page: &PageRequest,
) -> Result<Vec<Value>> {
    let records = store.find(filter, page).await?;
    records
        .iter()
        .map(|record| projection.apply(record).map_err(anyhow::Error::from))
        .collect()
}

/// Drop the query string from a URL
pub fn strip_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

/// Wrap a page of results in the response envelope.
///
/// `prev` is present past the first page; `next` is present whenever the
/// page came back full, so the last page may link to an empty one.
pub fn build_response(request_url: &str, page: &PageRequest, results: Vec<Value>) -> AuditPage {
    let base = strip_query(request_url).to_string();
    let link = |number: u32| format!("{}?pageSize={}&pageNumber={}", base, page.page_size(), number);

    let prev = (page.page_number() > 1).then(|| link(page.page_number() - 1));
    let next = (results.len() as u64 == u64::from(page.page_size()))
        .then(|| link(page.page_number().saturating_add(1)));

    AuditPage {
        page_size: page.page_size(),
        page_number: page.page_number(),
        links: PageLinks { base, prev, next },
        results,
    }
}
