//! Durable `LettingsRepository` implementations.

mod sqlite;

pub use sqlite::SqliteLettingsRepository;
