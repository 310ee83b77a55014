pub mod db;
pub mod executor;
pub mod schema;

mod error;

pub use error::Error;
pub use executor::{BoxFuture, PgExecutor, SqlArg, SqlExecutor, SqlRow, SqlValue};

pub type Result<T, E = Error> = std::result::Result<T, E>;
