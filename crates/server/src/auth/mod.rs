// Authentication module
// Decision: Stateless cookie sessions; the cookie carries the encoded principal
// Decision: Pluggable identity backend (local argon2 or Supabase Auth)
//
// Provides:
// - Session cookie store (issue/read/revoke)
// - Route guard middleware and SessionUser/AdminUser extractors
// - Login, registration and account routes
// - Admin seeding at startup

pub mod bootstrap;
pub mod config;
pub mod cookies;
pub mod gotrue;
pub mod local;
pub mod middleware;
pub mod routes;

pub use config::{AuthConfig, IdentityBackendKind};
pub use cookies::SessionCookies;
pub use gotrue::GoTrueIdentityBackend;
pub use local::LocalIdentityBackend;
pub use middleware::{guard_layer, AdminUser, ApiError, AuthState, SessionUser};
pub use routes::routes;
