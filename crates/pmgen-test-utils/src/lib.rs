//! Shared PostgreSQL harness for pmgen integration tests.
//!
//! One PostgreSQL server is shared per test binary; every test gets its
//! own freshly-migrated `pmgen_test_<uuid>` database inside it, so tests
//! never see each other's rows. Set `PMGEN_TEST_PG_URL` to reuse an
//! externally managed server (CI); otherwise a container is started on
//! first use via testcontainers.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Connection, Executor, PgConnection, PgPool};
use testcontainers::ContainerAsync;
use testcontainers::ImageExt;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

use pmgen_db::pool;

struct SharedServer {
    base_url: String,
    /// Dropping the container stops it, so the handle lives as long as the
    /// test binary. `None` when `PMGEN_TEST_PG_URL` points elsewhere.
    _container: Option<ContainerAsync<Postgres>>,
}

static SERVER: OnceCell<SharedServer> = OnceCell::const_new();

/// Server-root URL (no database name) of the shared PostgreSQL.
async fn server_url() -> &'static str {
    let shared = SERVER
        .get_or_init(|| async {
            if let Ok(url) = std::env::var("PMGEN_TEST_PG_URL") {
                return SharedServer {
                    base_url: url,
                    _container: None,
                };
            }

            let container = Postgres::default()
                .with_tag("18")
                .start()
                .await
                .expect("failed to start PostgreSQL container");
            let host = container.get_host().await.expect("failed to get host");
            let port = container
                .get_host_port_ipv4(5432)
                .await
                .expect("failed to get mapped port");

            SharedServer {
                base_url: format!("postgresql://postgres:postgres@{host}:{port}"),
                _container: Some(container),
            }
        })
        .await;
    &shared.base_url
}

/// Direct connection to the server's `postgres` database, for CREATE and
/// DROP DATABASE statements.
async fn admin_conn() -> PgConnection {
    let url = format!("{}/postgres", server_url().await);
    PgConnection::connect(&url)
        .await
        .expect("failed to connect to the shared PostgreSQL server")
}

/// Create a fresh `pmgen_test_<uuid>` database with migrations applied.
///
/// Returns the pool plus the database name to pass to [`drop_test_db`]
/// when the test is done.
pub async fn create_test_db() -> (PgPool, String) {
    let db_name = format!("pmgen_test_{}", Uuid::new_v4().simple());

    let mut admin = admin_conn().await;
    admin
        .execute(format!("CREATE DATABASE {db_name}").as_str())
        .await
        .unwrap_or_else(|e| panic!("failed to create test database {db_name}: {e}"));
    let _ = admin.close().await;

    let url = format!("{}/{db_name}", server_url().await);
    let test_pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&url)
        .await
        .unwrap_or_else(|e| panic!("failed to connect to test database {db_name}: {e}"));

    pool::run_migrations(&test_pool)
        .await
        .expect("migrations should succeed");

    (test_pool, db_name)
}

/// Drop a database created by [`create_test_db`]. Terminates any leftover
/// connections first; safe to call on an already-dropped database.
pub async fn drop_test_db(db_name: &str) {
    let mut admin = admin_conn().await;

    let terminate = format!(
        "SELECT pg_terminate_backend(pid) FROM pg_stat_activity \
         WHERE datname = '{db_name}' AND pid <> pg_backend_pid()"
    );
    let _ = admin.execute(terminate.as_str()).await;
    let _ = admin
        .execute(format!("DROP DATABASE IF EXISTS {db_name}").as_str())
        .await;
    let _ = admin.close().await;
}
