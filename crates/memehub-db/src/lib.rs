//! Memehub Database Layer
//!
//! This crate provides the credential store for Memehub: the user model,
//! the `UserStore` trait, and its SQLite (sqlx) and in-memory backends.

pub mod error;
pub mod memory;
pub mod models;
pub mod repository;
pub mod store;
pub mod utils;

pub use error::DbError;
pub use memory::MemoryStore;
pub use models::*;
pub use repository::Database;
pub use store::UserStore;

/// Re-export sqlx types for convenience
pub use sqlx::SqlitePool;
