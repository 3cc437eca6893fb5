// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition and account bootstrap. Registration is the one public
// endpoint that also looks at an optional bearer token.
//
// Route Prefix: /api (e.g., /api/login, /api/register)
// Middleware: none beyond the global trace/CORS layers

pub mod auth;

pub use auth::*;
