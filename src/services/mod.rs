//! Business logic services

pub mod query_planner;

pub use query_planner::{
    build_filter, build_response, paginate, project_fields, AuditFilter, PageRequest, Projection,
    QueryPlan, TimeRange,
};
