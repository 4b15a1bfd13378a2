pub mod args;
pub mod config;
pub mod database;
pub mod model;
pub mod processor;
pub mod scheduler;
pub mod store;
pub mod utils;
