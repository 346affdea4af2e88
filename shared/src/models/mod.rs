//! Data models
//!
//! Shared between sacco-server and frontend (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY), timestamps are Unix millis.

pub mod campaign;
pub mod contact_group;
pub mod member;
pub mod message;
pub mod permission;
pub mod role;
pub mod user;

// Re-exports
pub use campaign::*;
pub use contact_group::*;
pub use member::*;
pub use message::*;
pub use permission::*;
pub use role::*;
pub use user::*;
