// Storage layer for the Vitrine server
// Decision: Support both PostgreSQL (production) and in-memory (dev mode)
//
// StorageBackend implements the core role stores:
// - CompanyProfileStore over perfis_empresas
// - AdminStore over admins
// and backs LocalIdentityBackend through the usuarios table.

pub mod backend;
pub mod memory;
pub mod models;
pub mod password;
pub mod repositories;

pub use backend::StorageBackend;
pub use memory::InMemoryDatabase;
pub use models::*;
pub use repositories::Database;
