//! Per-test PostgreSQL databases inside one shared container.

use once_cell::sync::Lazy;
use sqlx::{Connection, PgConnection, PgPool};
use testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres as PostgresImage;
use tokio::sync::{OnceCell, mpsc};
use uuid::Uuid;

const SUPERUSER: &str = "syncbridge_test";
const SUPERUSER_PASSWORD: &str = "syncbridge_test_password";

/// Started on first use and shared by every test in the binary.
static POSTGRES_CONTAINER: Lazy<OnceCell<ContainerAsync<PostgresImage>>> = Lazy::new(OnceCell::new);

/// Names of databases to drop, fed by [`TestDb`]'s `Drop`.
static DROP_QUEUE: Lazy<OnceCell<mpsc::UnboundedSender<String>>> = Lazy::new(OnceCell::new);

async fn start_container() -> ContainerAsync<PostgresImage> {
    PostgresImage::default()
        .with_user(SUPERUSER)
        .with_password(SUPERUSER_PASSWORD)
        .with_db_name("syncbridge_test")
        .with_env_var("POSTGRES_INITDB_ARGS", "--auth-host=trust")
        .start()
        .await
        .expect("Failed to start PostgreSQL container")
}

async fn server_url(database: &str) -> String {
    let container = POSTGRES_CONTAINER.get_or_init(start_container).await;

    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get container port");

    let host =
        std::env::var("TESTCONTAINERS_HOST_OVERRIDE").unwrap_or_else(|_| "localhost".to_string());

    format!("postgresql://{SUPERUSER}:{SUPERUSER_PASSWORD}@{host}:{port}/{database}")
}

async fn start_drop_worker() -> mpsc::UnboundedSender<String> {
    let (sender, mut receiver) = mpsc::unbounded_channel::<String>();

    tokio::spawn(async move {
        while let Some(name) = receiver.recv().await {
            let Ok(mut conn) = PgConnection::connect(&server_url("postgres").await).await else {
                continue;
            };

            // WITH (FORCE) disconnects pools the test left open.
            let drop_database = format!("DROP DATABASE IF EXISTS \"{name}\" WITH (FORCE)");

            if let Err(error) = sqlx::query(&drop_database).execute(&mut conn).await {
                eprintln!("Failed to drop test database '{name}': {error}");
            }

            let _closed = conn.close().await;
        }
    });

    sender
}

/// A freshly migrated database owned by one test.
///
/// Service methods commit normally; isolation comes from every test getting its own
/// database, which is dropped in the background once the `TestDb` goes away.
#[derive(Debug, Clone)]
pub struct TestDb {
    /// Superuser pool; bypasses row-level security.
    pub pool: PgPool,

    pub name: String,

    /// URL `pool` was connected with, for deriving connections as other roles.
    pub(super) superuser_url: String,
}

impl Drop for TestDb {
    fn drop(&mut self) {
        if let Some(queue) = DROP_QUEUE.get() {
            let _queued = queue.send(self.name.clone());
        }
    }
}

impl TestDb {
    pub async fn new() -> Self {
        DROP_QUEUE.get_or_init(start_drop_worker).await;

        // Simple-format uuids keep the name a valid unquoted identifier.
        let name = format!("syncbridge_test_{}", Uuid::now_v7().simple());

        let mut conn = PgConnection::connect(&server_url("postgres").await)
            .await
            .expect("Failed to connect to postgres database");

        sqlx::query(&format!("CREATE DATABASE \"{name}\""))
            .execute(&mut conn)
            .await
            .expect("Failed to create test database");

        conn.close()
            .await
            .expect("Failed to close admin connection");

        let superuser_url = server_url(&name).await;

        let pool = PgPool::connect(&superuser_url)
            .await
            .expect("Failed to create pool for database");

        sqlx::migrate!("../../migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations on database");

        Self {
            pool,
            name,
            superuser_url,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn migrations_create_every_table() {
        let test_db = TestDb::new().await;

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT table_name::text FROM information_schema.tables \
             WHERE table_schema = 'public' AND table_name <> '_sqlx_migrations' \
             ORDER BY table_name",
        )
        .fetch_all(test_db.pool())
        .await
        .expect("Failed to list tables");

        assert_eq!(
            tables,
            [
                "credentials",
                "job_audits",
                "jobs",
                "mappings",
                "sync_cursors",
                "tenants",
                "webhook_events",
            ]
        );
    }

    #[tokio::test]
    async fn each_test_gets_its_own_database() {
        let first = TestDb::new().await;
        let second = TestDb::new().await;

        assert_ne!(first.name, second.name);

        sqlx::query("INSERT INTO tenants (uuid, name) VALUES (gen_random_uuid(), 'only-first')")
            .execute(first.pool())
            .await
            .expect("Failed to insert tenant");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tenants")
            .fetch_one(second.pool())
            .await
            .expect("Failed to count tenants");

        assert_eq!(count, 0);
    }
}
