//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_access_repository;
mod in_memory_entity_record_reader;
mod postgres_access_repository;
mod postgres_entity_record_reader;
mod postgres_query_fragments;

pub use in_memory_access_repository::InMemoryAccessRepository;
pub use in_memory_entity_record_reader::InMemoryEntityRecordReader;
pub use postgres_access_repository::PostgresAccessRepository;
pub use postgres_entity_record_reader::PostgresEntityRecordReader;

/// Embedded migrations creating the grant, link and entity type tables.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
