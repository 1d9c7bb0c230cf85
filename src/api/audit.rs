//! Audit record API endpoints

use axum::{
    body::Bytes,
    extract::{OriginalUri, Query, State},
    http::{header::HOST, HeaderMap},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tracing::{debug, info};
use validator::Validate;

use crate::{
    db::{AuditRepository, AuditStore},
    models::{AuditPage, AuditQuery, CreateAuditParams, FieldSelection, NewAuditRecord},
    services::query_planner::{build_response, paginate, QueryPlan},
    utils::{validation::flag_enabled, AppError, AppResult},
    AppState,
};

const POST_ROUTE: &str = "Audit POST";
const GET_ROUTE: &str = "Audit GET";

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(list_audit_records).post(create_audit_record))
}

async fn create_audit_record(
    State(state): State<AppState>,
    Query(params): Query<CreateAuditParams>,
    body: Bytes,
) -> AppResult<Response> {
    let record: NewAuditRecord = serde_json::from_slice(&body)?;
    record.validate()?;

    info!(
        time_stamp = %record.time_stamp,
        user_id = %record.user_id,
        source = %record.source,
        method = %record.method,
        "Received audit record"
    );
    debug!(data = %record.data, "Audit record payload");

    if !state.config.audit.persist_enabled {
        debug!("Persistence disabled, audit record not stored");
        return Ok("Success".into_response());
    }

    let repo = AuditRepository::new(&state.db);
    let created = repo
        .insert(&record)
        .await
        .map_err(|e| AppError::store(POST_ROUTE, e))?;

    info!(id = %created.id, "Audit record created");

    if flag_enabled(params.return_new.as_deref()) {
        Ok(Json(created).into_response())
    } else {
        Ok("Success".into_response())
    }
}

async fn list_audit_records(
    State(state): State<AppState>,
    Query(query): Query<AuditQuery>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<AuditPage>> {
    let selection: FieldSelection = if body.iter().all(u8::is_ascii_whitespace) {
        FieldSelection::default()
    } else {
        serde_json::from_slice(&body)?
    };

    let plan = QueryPlan::from_request(&query, &selection, state.config.audit.max_page_size)?;

    let repo = AuditRepository::new(&state.db);
    let results = paginate(&repo, &plan.filter, &plan.projection, &plan.page)
        .await
        .map_err(|e| AppError::store(GET_ROUTE, e))?;

    let url = request_url(&state, &headers, &uri);
    let page = build_response(&url, &plan.page, results);

    debug!(
        page_number = page.page_number,
        page_size = page.page_size,
        results = page.results.len(),
        "Returning audit records"
    );

    Ok(Json(page))
}

/// Absolute URL the client used. Forwarding headers are only read when
/// `server.trust_proxy` is set.
fn request_url(state: &AppState, headers: &HeaderMap, uri: &axum::http::Uri) -> String {
    let trust_proxy = state.config.server.trust_proxy;
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let forwarded = |name: &str| if trust_proxy { header(name) } else { None };

    let scheme = forwarded("x-forwarded-proto").unwrap_or_else(|| {
        if state.config.server.tls.is_some() {
            "https".to_string()
        } else {
            "http".to_string()
        }
    });

    let host = forwarded("x-forwarded-host")
        .or_else(|| header(HOST.as_str()))
        .or_else(|| uri.authority().map(|a| a.to_string()))
        .unwrap_or_else(|| format!("{}:{}", state.config.server.host, state.config.server.port));

    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());

    format!("{}://{}{}", scheme, host, path_and_query)
}
