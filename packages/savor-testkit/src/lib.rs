mod database;
mod error;
mod memory;

pub use database::{TestDatabase, env_dsn, with_test_db};
pub use error::{Error, Result};
pub use memory::{FailingGraphStore, MemoryGraphStore};
