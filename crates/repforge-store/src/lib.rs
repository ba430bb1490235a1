//! RepForge Store — SQLite exercise catalog, int8 vector search, plans and workouts.

pub mod embedding;
mod plans;
pub mod schema;
pub mod sqlite;
pub mod types;
mod users;

pub use sqlite::{SqliteStore, LEXICAL_FALLBACK_SIMILARITY};
pub use types::*;
