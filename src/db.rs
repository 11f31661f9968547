use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

/// Builds the application's PostgreSQL connection pool. Panics on failure because
/// the service cannot run without its database.
pub async fn connect_sqlx(db_url: &str) -> PgPool {
    PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(2))
        .connect(db_url)
        .await
        .expect("Failed to build database connection pool")
}

/// Applies any pending migrations from the embedded ./migrations directory
pub async fn run_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .expect("Failed to apply database migrations");
}
