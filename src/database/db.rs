use super::{
    db_structs::{Death, EventFilter, Incap, PlayerRecord, Revive, Server},
    source::{EventSource, SourceError}
};
use chrono::{DateTime, Utc};
use postgres_types::ToSql;
use std::{sync::Arc, time::Instant};
use tokio_postgres::{Client, NoTls, Row};
use tracing::{debug, error, info};

/// Table names of the event log. Defaults follow the DBLog schema.
#[derive(Debug, Clone, PartialEq)]
pub struct TableNames {
    pub servers: String,
    pub players: String,
    pub matches: String,
    pub deaths: String,
    pub incaps: String,
    pub revives: String
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            servers: "DBLog_Servers".to_string(),
            players: "DBLog_SteamUsers".to_string(),
            matches: "DBLog_Matches".to_string(),
            deaths: "DBLog_Deaths".to_string(),
            incaps: "DBLog_Wounds".to_string(),
            revives: "DBLog_Revives".to_string()
        }
    }
}

#[derive(Clone)]
pub struct DbClient {
    client: Arc<Client>,
    tables: TableNames
}

impl DbClient {
    // Connect to the database and return a DbClient instance
    pub async fn connect(connection_str: &str, tables: TableNames) -> Result<Self, SourceError> {
        let (client, connection) = tokio_postgres::connect(connection_str, NoTls)
            .await
            .map_err(SourceError::ConnectionError)?;

        // Spawn the connection object to run in the background
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("connection error: {}", e);
            }
        });

        Ok(DbClient {
            client: Arc::new(client),
            tables
        })
    }

    async fn query(
        &self,
        entity: &'static str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)]
    ) -> Result<Vec<Row>, SourceError> {
        let start = Instant::now();
        let rows = self
            .client
            .query(sql, params)
            .await
            .map_err(|source| SourceError::QueryError { entity, source })?;

        debug!("Fetched {} {} in {:?}", rows.len(), entity, start.elapsed());
        Ok(rows)
    }

    fn event_query(&self, table: &str, columns: &[&str], filter: &EventFilter) -> (String, Vec<Filter>) {
        event_query(&self.tables.matches, table, columns, filter)
    }

    fn death_from_row(row: &Row) -> Death {
        Death {
            attacker: row.get("attacker"),
            victim: row.get("victim"),
            teamkill: row.get::<_, Option<bool>>("teamkill").unwrap_or(false),
            server: row.get("server"),
            match_id: row.get("match_id"),
            layer: row.get("layer")
        }
    }

    fn incap_from_row(row: &Row) -> Incap {
        Incap {
            attacker: row.get("attacker"),
            victim: row.get("victim"),
            teamkill: row.get::<_, Option<bool>>("teamkill").unwrap_or(false),
            server: row.get("server"),
            match_id: row.get("match_id"),
            layer: row.get("layer"),
            damage: row.get("damage")
        }
    }

    fn revive_from_row(row: &Row) -> Revive {
        Revive {
            reviver: row.get("reviver"),
            victim: row.get("victim"),
            server: row.get("server"),
            match_id: row.get("match_id"),
            layer: row.get("layer")
        }
    }
}

/// A bound query parameter. Kept owned so the parameter slice can borrow it.
#[derive(Debug)]
enum Filter {
    Server(i32),
    Since(DateTime<Utc>)
}

impl Filter {
    fn as_param(&self) -> &(dyn ToSql + Sync) {
        match self {
            Filter::Server(id) => id,
            Filter::Since(time) => time
        }
    }
}

fn params(bound: &[Filter]) -> Vec<&(dyn ToSql + Sync)> {
    bound.iter().map(Filter::as_param).collect()
}

/// Builds the shared part of every event query: the join against the
/// matches table (which carries the layer) plus the optional filter.
fn event_query(matches: &str, table: &str, columns: &[&str], filter: &EventFilter) -> (String, Vec<Filter>) {
    let event_table = quote_ident(table);
    let matches_table = quote_ident(matches);

    let selected = columns
        .iter()
        .map(|c| format!("e.{}", quote_ident(c)))
        .collect::<Vec<_>>()
        .join(", ");

    let mut sql = format!(
        "SELECT m.\"layer\" AS layer, e.\"server\" AS server, e.\"match\" AS match_id, {} \
         FROM {} e JOIN {} m ON e.\"match\" = m.\"id\"",
        selected, event_table, matches_table
    );

    let mut conditions = Vec::new();
    let mut bound = Vec::new();

    if let Some(server_id) = filter.server_id {
        bound.push(Filter::Server(server_id));
        conditions.push(format!("e.\"server\" = ${}", bound.len()));
    }

    if let Some(since) = filter.since {
        // Bound as timestamptz so `time` may be either timestamp type
        bound.push(Filter::Since(since));
        conditions.push(format!("e.\"time\" >= ${}::timestamptz", bound.len()));
    }

    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }

    (sql, bound)
}

/// Quotes a configured table or column name so mixed-case DBLog names survive.
fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

impl EventSource for DbClient {
    async fn list_servers(&self) -> Result<Vec<Server>, SourceError> {
        let sql = format!("SELECT \"id\", \"name\" FROM {} ORDER BY \"id\"", quote_ident(&self.tables.servers));
        let rows = self.query("servers", &sql, &[]).await?;

        Ok(rows
            .iter()
            .map(|row| Server {
                id: row.get("id"),
                name: row.get::<_, Option<String>>("name").unwrap_or_default()
            })
            .collect())
    }

    async fn list_players(&self) -> Result<Vec<PlayerRecord>, SourceError> {
        info!("Fetching players...");
        let sql = format!(
            "SELECT \"steamID\" AS steam_id, \"lastName\" AS name FROM {} \
             WHERE \"lastName\" IS NOT NULL ORDER BY \"steamID\"",
            quote_ident(&self.tables.players)
        );
        let rows = self.query("players", &sql, &[]).await?;

        Ok(rows
            .iter()
            .map(|row| PlayerRecord {
                steam_id: row.get("steam_id"),
                name: row.get("name")
            })
            .collect())
    }

    async fn list_deaths(&self, filter: &EventFilter) -> Result<Vec<Death>, SourceError> {
        let (sql, bound) = self.event_query(&self.tables.deaths, &["attacker", "victim", "teamkill"], filter);
        let rows = self.query("deaths", &sql, &params(&bound)).await?;

        Ok(rows.iter().map(Self::death_from_row).collect())
    }

    async fn list_incaps(&self, filter: &EventFilter) -> Result<Vec<Incap>, SourceError> {
        let (sql, bound) = self.event_query(
            &self.tables.incaps,
            &["attacker", "victim", "teamkill", "damage"],
            filter
        );
        let rows = self.query("incaps", &sql, &params(&bound)).await?;

        Ok(rows.iter().map(Self::incap_from_row).collect())
    }

    async fn list_revives(&self, filter: &EventFilter) -> Result<Vec<Revive>, SourceError> {
        let (sql, bound) = self.event_query(&self.tables.revives, &["reviver", "victim"], filter);
        let rows = self.query("revives", &sql, &params(&bound)).await?;

        Ok(rows.iter().map(Self::revive_from_row).collect())
    }
}
