// Vitrine auth core
//
// This crate holds the session authentication & authorization layer of the
// Vitrine business directory, independent of any HTTP framework or database.
//
// Key design decisions:
// - Identity verification and role lookup are traits (IdentityBackend,
//   CompanyProfileStore, AdminStore) so the server can plug PostgreSQL,
//   in-memory or Supabase Auth backends
// - Roles are resolved through an ordered list of RoleLookup strategies,
//   first match wins
// - The session codec and the route guard take `now` explicitly so expiry
//   boundaries are testable
// - A decode failure is always "no session", never a panic

pub mod credentials;
pub mod error;
pub mod guard;
pub mod identity;
pub mod login;
pub mod principal;
pub mod roles;
pub mod session;

// Logging setup shared by binaries
pub mod telemetry;

// In-memory implementations for tests and dev mode
pub mod memory;

// Re-exports for convenience
pub use credentials::CredentialVerifier;
pub use error::{AuthError, DecodeError, StoreError};
pub use guard::{landing_path, GuardDecision, RouteClass, RouteGuard};
pub use identity::{normalize_email, IdentityBackend, IdentityError, VerifiedIdentity};
pub use login::LoginService;
pub use principal::{Principal, Role};
pub use roles::{
    AdminLookup, AdminRecord, AdminStore, CompanyProfile, CompanyProfileLookup,
    CompanyProfileStore, RoleGrant, RoleLookup, RoleResolver,
};
pub use session::{SessionCodec, SessionFormat, DEFAULT_SESSION_TTL, SESSION_COOKIE_NAME};
