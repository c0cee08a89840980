//! PostgreSQL fixtures for tutorplan integration tests.
//!
//! One server per test binary; every test gets a fresh, migrated database
//! on it. Set `TUTORPLAN_TEST_PG_URL` (server root, no database) to reuse a
//! running server, otherwise a `postgres:16` container is started on first
//! use.

use std::time::Duration;

use sqlx::PgPool;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

use tutorplan_db::config::DbConfig;
use tutorplan_db::pool;

pub const PG_URL_ENV: &str = "TUTORPLAN_TEST_PG_URL";

struct TestServer {
    root: DbConfig,
    _container: Option<ContainerAsync<Postgres>>,
}

static SERVER: OnceCell<TestServer> = OnceCell::const_new();

async fn start_server() -> TestServer {
    let (url, container) = match std::env::var(PG_URL_ENV) {
        Ok(url) => (url.trim_end_matches('/').to_owned(), None),
        Err(_) => {
            let container = Postgres::default()
                .with_tag("16")
                .start()
                .await
                .expect("failed to start PostgreSQL container");
            let host = container.get_host().await.expect("container host");
            let port = container
                .get_host_port_ipv4(5432)
                .await
                .expect("container port");
            (
                format!("postgresql://postgres:postgres@{host}:{port}"),
                Some(container),
            )
        }
    };
    TestServer {
        root: DbConfig::new(url).with_acquire_timeout(Duration::from_secs(30)),
        _container: container,
    }
}

async fn server() -> &'static DbConfig {
    &SERVER.get_or_init(start_server).await.root
}

/// Root URL of the shared server (no database name).
pub async fn pg_url() -> &'static str {
    &server().await.database_url
}

/// Create and migrate a database with a unique `tutorplan_test_*` name.
///
/// Returns `(pool, db_name)`; pass `db_name` to [`drop_test_db`] afterwards.
pub async fn create_test_db() -> (PgPool, String) {
    let root = server().await;
    let db_name = format!("tutorplan_test_{}", Uuid::new_v4().simple());

    let maint = pool::create_pool(&root.maintenance())
        .await
        .expect("maintenance connection");
    pool::create_database(&maint, &db_name)
        .await
        .expect("create test database");
    maint.close().await;

    let db = pool::connect_and_migrate(&root.with_database(&db_name))
        .await
        .unwrap_or_else(|e| panic!("failed to prepare {db_name}: {e:#}"));
    (db, db_name)
}

/// Drop a database made by [`create_test_db`], closing stray connections.
pub async fn drop_test_db(db_name: &str) {
    let maint = pool::create_pool(&server().await.maintenance())
        .await
        .expect("maintenance connection");
    pool::drop_database(&maint, db_name)
        .await
        .unwrap_or_else(|e| panic!("failed to drop {db_name}: {e:#}"));
    maint.close().await;
}
