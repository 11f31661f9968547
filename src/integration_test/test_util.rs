use crate::{SharedData, app_env, db, persistence, routes};
use axum::Router;
use dotenv::dotenv;
use lazy_static::lazy_static;
use rand::{Rng, thread_rng};
use sqlx::{Connection, PgConnection, PgPool, Row};
use std::sync::Arc;
use std::{env, future::Future};
use tokio::runtime::Runtime;

lazy_static! {
    static ref TOKIO_RT: Runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Tokio runtime failed to initialize");
}

struct TestDatabase {
    db_name: String,
}

impl TestDatabase {
    /// Drops databases left behind by earlier test runs. Failures only warn, since
    /// a stale database never affects the fresh one this run provisions.
    async fn clear_old_dbs(admin_cxn: &mut PgConnection) {
        let old_dbs = sqlx::query(
            "SELECT datname FROM pg_catalog.pg_database WHERE datname LIKE 'tasklist_test_%'",
        )
        .fetch_all(&mut *admin_cxn)
        .await;
        let old_dbs = match old_dbs {
            Ok(results) => results
                .into_iter()
                .map(|row| row.get::<String, _>(0))
                .collect::<Vec<_>>(),
            Err(error) => {
                println!(
                    "Warning: failed to look up old test databases. You may need to delete them manually. Error: {error}"
                );
                return;
            }
        };

        for old_db in old_dbs {
            let drop_result = sqlx::query(format!("DROP DATABASE {old_db}").as_str())
                .execute(&mut *admin_cxn)
                .await;
            if drop_result.is_err() {
                println!(
                    "Warning: failed to drop old test database {old_db}, you may need to do it manually."
                );
            }
        }
    }

    async fn create(admin_cxn: &mut PgConnection) -> Result<TestDatabase, sqlx::Error> {
        let db_id: u32 = thread_rng().gen_range(10_000..99_999);
        let db_name = format!("tasklist_test_{db_id}");

        sqlx::query(format!("CREATE DATABASE {db_name}").as_str())
            .execute(&mut *admin_cxn)
            .await?;

        Ok(TestDatabase { db_name })
    }
}

/// Provisions a randomly named database for one test, applies the embedded
/// migrations to it, and invokes the test with a pool pointed at it.
///
/// Expects that the TEST_DB_URL environment variable is populated with a base
/// postgres connection string (no database name in the path)
pub fn prepare_db_and_test<F, R>(test_fn: F)
where
    R: Future<Output = ()>,
    F: FnOnce(PgPool) -> R,
{
    if dotenv().is_err() {
        println!("Test is running without .env file.");
    }

    TOKIO_RT.block_on(async move {
        let pg_connection_base_url = env::var(app_env::test::TEST_DB_URL).expect(
            "You must provide the TEST_DB_URL environment variable as the base postgres connection string",
        );
        let mut admin_cxn = PgConnection::connect(&pg_connection_base_url)
            .await
            .expect("Test failure - could not create initial connection to provision database.");

        TestDatabase::clear_old_dbs(&mut admin_cxn).await;
        let test_db = match TestDatabase::create(&mut admin_cxn).await {
            Ok(test_db) => test_db,
            Err(db_err) => panic!("Failed to provision test database: {db_err}"),
        };
        let _ = admin_cxn.close().await;

        let sqlx_pool =
            db::connect_sqlx(format!("{pg_connection_base_url}/{}", test_db.db_name).as_str())
                .await;
        db::run_migrations(&sqlx_pool).await;

        test_fn(sqlx_pool).await;
    });
}

/// Builds the application's real router backed by the given database pool
pub fn test_router(test_db: PgPool) -> Router {
    routes::application_routes().with_state(Arc::new(SharedData {
        ext_cxn: persistence::ExternalConnectivity::new(test_db),
    }))
}
