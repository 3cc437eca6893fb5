// services/mod.rs - store-backed operations shared by handlers and the CLI
//
// accounts:      registration, password hashing, credential checks
// access:        load an object with its project scope and run a policy on it
// time_tracking: hour parsing/accumulation and project metrics

pub mod access;
pub mod accounts;
pub mod time_tracking;

pub use access::GuardError;
pub use accounts::{AccountError, RegistrationRequest};
