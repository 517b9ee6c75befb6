//! Schema introspection for replicating PostgreSQL tables into an analytical
//! store.
//!
//! Given a connection (or an already-open transaction), this crate discovers
//! the tables of a schema and extracts a snapshot-consistent description of a
//! table's structure: its physical columns with full catalog metadata, and
//! optionally the primary-key and replica-identity column sets. Column types
//! are resolved to a portable type model, so the downstream replication
//! engine never has to understand PostgreSQL type oids itself.
//!
//! All catalog reads for one fetch happen inside a single transaction. When
//! the caller supplies its own transaction, the same snapshot can also cover
//! the initial data dump, which is what makes CDC bootstrapping correct.

#[cfg(test)]
mod test_helpers;

mod client;
mod error;
mod models;
mod structure_reader;
mod type_resolver;

pub use client::PostgresConnection;
pub use error::*;
pub use models::*;
pub use structure_reader::{
    fetch_table_structure, list_tables, FetchOptions, StructureReader,
};
pub use type_resolver::{PgTypeEntry, PgTypeKind, TypeResolver, UnresolvedType};
