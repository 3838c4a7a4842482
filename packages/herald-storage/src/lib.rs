pub mod audience;
pub mod compiler;
pub mod db;
pub mod schema;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
