pub mod db;
pub mod graph;
pub mod models;
pub mod onboarding;
pub mod schema;
pub mod store;

mod error;

pub use error::Error;
pub use store::{BoxFuture, GraphStore, PgGraphStore};

pub type Result<T, E = Error> = std::result::Result<T, E>;
