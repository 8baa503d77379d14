// Vitrine server library
//
// Exposes the router and its building blocks so integration tests and the
// export-openapi binary can use them without starting a listener.

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod openapi;
pub mod storage;

pub use app::build_router;
pub use auth::AuthState;
pub use config::AppConfig;
