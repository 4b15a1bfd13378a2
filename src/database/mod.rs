pub mod db;
pub mod db_structs;
pub mod source;

pub use db::{DbClient, TableNames};
pub use source::{EventSource, SourceError};
