use super::db_structs::{Death, EventFilter, Incap, PlayerRecord, Revive, Server};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to connect to database: {0}")]
    ConnectionError(#[source] tokio_postgres::Error),

    #[error("Query for {entity} failed: {source}")]
    QueryError {
        entity: &'static str,
        #[source]
        source: tokio_postgres::Error
    },

    #[error("Source unavailable: {0}")]
    Unavailable(String)
}

/// Supplies the raw rows a pass folds. Every call reads the current
/// state of the log; nothing is cached between passes.
#[allow(async_fn_in_trait)]
pub trait EventSource {
    async fn list_servers(&self) -> Result<Vec<Server>, SourceError>;

    /// Players with a known display name
    async fn list_players(&self) -> Result<Vec<PlayerRecord>, SourceError>;

    async fn list_deaths(&self, filter: &EventFilter) -> Result<Vec<Death>, SourceError>;

    async fn list_incaps(&self, filter: &EventFilter) -> Result<Vec<Incap>, SourceError>;

    async fn list_revives(&self, filter: &EventFilter) -> Result<Vec<Revive>, SourceError>;
}
