// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Security Level: bearer access token, user re-loaded from the store
// Route Prefix: /api/*
// Middleware: jwt_auth_middleware inserts AuthUser into request extensions
//
// Lists are scoped to what the caller participates in; single-object routes
// run an explicit Policy (Ownership or Participation) through
// services::access. Staff (admin, manager) pass every object check.

pub mod attachments;
pub mod auth;
pub mod comments;
pub mod milestones;
pub mod projects;
pub mod tasks;

use crate::error::ApiError;
use crate::services::GuardError;

/// A create request that points at a parent the caller cannot see is a bad
/// reference, not a missing route
pub(crate) fn parent_reference(field: &str, err: GuardError) -> ApiError {
    if err.is_not_visible() {
        ApiError::field(field, "Invalid pk - object does not exist.")
    } else {
        err.into()
    }
}
