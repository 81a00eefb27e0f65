//! Storage backends for SnipURL.
//!
//! [`InMemoryStore`] keeps everything in a single locked table and can be
//! replayed from a [`FileDumper`]. [`PostgresStore`] pushes the same
//! uniqueness and ownership rules down to PostgreSQL.

pub mod dump;
pub mod memory;
pub mod postgres;

pub use dump::FileDumper;
pub use memory::InMemoryStore;
pub use postgres::{PostgresConfig, PostgresStore};
pub use snipurl_core::{ReadUrlStore, StorageError, UrlStore};
