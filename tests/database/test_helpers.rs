use lazy_static::lazy_static;
use std::sync::Arc;
use testcontainers::{clients::Cli, Container};
use testcontainers_modules::postgres::Postgres;
use tokio_postgres::{Client, NoTls};

pub struct TestDatabase {
    pub connection_string: String,
    _container: Container<'static, Postgres>
}

impl TestDatabase {
    pub async fn new() -> Result<Self, Box<dyn std::error::Error>> {
        // Create a static CLI instance
        lazy_static! {
            static ref DOCKER: Arc<Cli> = Arc::new(Cli::default());
        }

        let container = DOCKER.run(Postgres::default());
        let port = container.get_host_port_ipv4(5432);

        let connection_string = format!(
            "host=localhost port={} user=postgres password=postgres dbname=postgres",
            port
        );

        let client = connect(&connection_string).await?;
        client.batch_execute(include_str!("schema.sql")).await?;

        Ok(TestDatabase {
            connection_string,
            _container: container
        })
    }

    pub async fn get_client(&self) -> Result<Client, Box<dyn std::error::Error>> {
        connect(&self.connection_string).await
    }

    /// Two servers, three named players plus one without a name, and one
    /// match per server.
    ///
    /// Events on server 1 happen on 2024-01-10, on server 2 on 2024-02-10.
    /// Match 2 is played on a seeding layer.
    pub async fn seed_test_data(&self) -> Result<(), Box<dyn std::error::Error>> {
        let client = self.get_client().await?;

        client
            .batch_execute(
                r#"
                INSERT INTO "DBLog_Servers" ("id", "name") VALUES
                    (1, 'EU #1'),
                    (2, 'EU #2');

                INSERT INTO "DBLog_SteamUsers" ("steamID", "lastName") VALUES
                    ('76561198000000001', 'Alpha'),
                    ('76561198000000002', 'Bravo'),
                    ('76561198000000003', 'Charlie'),
                    ('76561198000000004', NULL);

                INSERT INTO "DBLog_Matches" ("id", "server", "map", "layer", "startTime") VALUES
                    (1, 1, 'Narva', 'Narva_RAAS_v1', '2024-01-10 20:00:00'),
                    (2, 2, 'Sumari', 'Sumari_Seed_v1', '2024-02-10 20:00:00');

                INSERT INTO "DBLog_Deaths" ("time", "server", "match", "attacker", "victim", "teamkill") VALUES
                    ('2024-01-10 20:05:00', 1, 1, '76561198000000001', '76561198000000002', false),
                    ('2024-01-10 20:06:00', 1, 1, '76561198000000002', '76561198000000003', true),
                    ('2024-01-10 20:07:00', 1, 1, '76561198000000003', '76561198000000001', NULL),
                    ('2024-02-10 20:05:00', 2, 2, '76561198000000001', '76561198000000003', false);

                INSERT INTO "DBLog_Wounds" ("time", "server", "match", "attacker", "victim", "damage", "teamkill") VALUES
                    ('2024-01-10 20:04:00', 1, 1, '76561198000000001', '76561198000000002', 112.5, false),
                    ('2024-02-10 20:04:00', 2, 2, '76561198000000001', '76561198000000003', NULL, false);

                INSERT INTO "DBLog_Revives" ("time", "server", "match", "reviver", "victim") VALUES
                    ('2024-01-10 20:08:00', 1, 1, '76561198000000003', '76561198000000002'),
                    ('2024-01-10 20:09:00', 1, 1, NULL, '76561198000000001');
                "#
            )
            .await?;

        Ok(())
    }
}

async fn connect(connection_string: &str) -> Result<Client, Box<dyn std::error::Error>> {
    let (client, connection) = tokio_postgres::connect(connection_string, NoTls).await?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            eprintln!("Database connection error: {}", e);
        }
    });

    Ok(client)
}
