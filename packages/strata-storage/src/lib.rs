pub mod db;
pub mod embedding_jobs;
pub mod entries;
pub mod fts;
pub mod models;
pub mod permissions;
pub mod relations;
pub mod schema;
pub mod scopes;
pub mod tags;
pub mod vector;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
