//! Service layer for business logic
//!
//! Shared between the HTTP handlers and the CLI. Each entity's operations
//! live in their own module as `impl AdminService` blocks.

mod admin;
mod analytics_service;
pub mod bulk;
mod dashboard;
mod links;
mod notes;
pub mod revalidation;
mod subjects;
mod users;

pub use admin::{AdminService, AdminSettings, Backends};
pub use analytics_service::*;
pub use bulk::{BulkFailure, BulkOutcome};
pub use links::{LinkFilterOptions, LinkRef, LinkUpdate, merge_by_recency, parse_link_kind};
pub use notes::{NoteDeletion, NoteRef, NoteUpdate, UploaderOptions};
pub use revalidation::{HttpRevalidator, Revalidator};
pub use subjects::{SEMESTERS, SubjectInput};
pub use users::{ImportOutcome, NewUser, UserUpdate};
