// policy/mod.rs - authorization and invariant rules
//
// Everything in here is pure: it decides allow/deny from values the caller has
// already loaded. Loading (and transactional safety) belongs to the stores.

pub mod access;
pub mod admission;
pub mod membership;
pub mod roles;

pub use access::{authorize, AccessDenied, Policy, ProjectScope, Resource};
pub use admission::{admit, AdmissionError};
pub use membership::{check_candidate, MembershipError, MembershipSnapshot};
