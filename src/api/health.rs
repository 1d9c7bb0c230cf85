//! Health check endpoints
//!
//! Provides health check endpoints for monitoring and load balancers.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Datelike, Local, TimeZone};
use serde::Serialize;
use std::fmt::Display;

use crate::{db, AppState};

/// Basic health response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Detailed health response with component status
#[derive(Serialize)]
pub struct DetailedHealthResponse {
    pub status: String,
    pub version: String,
    pub components: ComponentHealth,
}

/// Health status of individual components
#[derive(Serialize)]
pub struct ComponentHealth {
    pub database: ComponentStatus,
}

/// Status of a single component
#[derive(Serialize)]
pub struct ComponentStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentStatus {
    fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            message: None,
        }
    }

    fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            status: "unhealthy".to_string(),
            message: Some(message.into()),
        }
    }
}

/// Simple health check endpoint (for load balancers)
///
/// Returns 200 OK if the service is running.
/// Does not check component health.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Detailed health check endpoint
///
/// Checks the record store.
/// Returns 200 if all components are healthy, 503 otherwise.
pub async fn health_check_detailed(
    State(state): State<AppState>,
) -> (StatusCode, Json<DetailedHealthResponse>) {
    let database_status = match db::check_health(&state.db).await {
        Ok(_) => ComponentStatus::healthy(),
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            ComponentStatus::unhealthy("database unavailable")
        }
    };

    let overall_healthy = database_status.status == "healthy";

    let status_code = if overall_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = DetailedHealthResponse {
        status: if overall_healthy {
            "healthy".to_string()
        } else {
            "unhealthy".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        components: ComponentHealth {
            database: database_status,
        },
    };

    (status_code, Json(response))
}

/// Server time banner served at `/`
pub async fn server_time() -> String {
    format_server_time(&Local::now())
}

/// Format like `Thursday, April 20th 2023, 08:00:00 +00:00`
pub fn format_server_time<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "{}, {} {}{} {}",
        now.format("%A"),
        now.format("%B"),
        now.day(),
        ordinal_suffix(now.day()),
        now.format("%Y, %H:%M:%S %:z")
    )
}

fn ordinal_suffix(day: u32) -> &'static str {
    match day {
        11..=13 => "th",
        _ => match day % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        },
    }
}

/// Liveness probe
///
/// Returns 200 OK if the process is alive.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe
///
/// Returns 200 OK if the service is ready to accept traffic.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match db::check_health(&state.db).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
