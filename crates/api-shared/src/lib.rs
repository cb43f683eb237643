//! # API Shared
//!
//! Shared definitions for the daily report page API.
//!
//! Contains:
//! - Request/response bodies (`dto` module) with OpenAPI schemas
//! - Shared services like `HealthService`
//!
//! Used by `api-rest`.

pub mod dto;
pub mod health;

pub use dto::*;
pub use health::HealthService;
