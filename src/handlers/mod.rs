// handlers/mod.rs - two-tier handler layout
//
// Public (no auth) → Protected (bearer JWT, user loaded from the store)
//
// Object-level permissions are not a tier of their own: each protected
// handler names the policy it needs through services::access.

pub mod extract;
pub mod protected;
pub mod public;

pub use extract::{ApiJson, ApiPath};
