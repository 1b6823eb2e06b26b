//! Infrastructure layer - database connection and schema bootstrap.

mod db;
pub mod schema;

pub use db::Database;
pub use schema::Migrator;
