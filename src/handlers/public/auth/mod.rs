// handlers/public/auth/mod.rs - Public authentication handlers

pub mod login;    // POST /api/login - credentials for an access/refresh pair
pub mod refresh;  // POST /api/token/refresh - refresh token for a new access token
pub mod register; // POST /api/register - role-gated account creation

pub use login::login_post;
pub use refresh::refresh_post;
pub use register::register_post;
