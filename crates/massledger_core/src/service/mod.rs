//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate obligation store calls into lifecycle, import and
//!   dashboard level APIs.
//! - Keep the CLI layer decoupled from storage details.

pub mod clock;
pub mod daily_record;
pub mod dashboard_service;
pub mod error;
pub mod import_service;
pub mod lifecycle_service;
