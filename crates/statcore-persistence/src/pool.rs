use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;

/// Connects to `dsn` via `sqlx`'s `Any` driver and applies the schema.
/// Production DSNs point at Postgres; tests use an in-memory SQLite database
/// per the pack's own portable-SQL test pattern (`sqlite:file:{name}?mode=memory&cache=shared`).
pub async fn connect(dsn: &str, max_connections: u32) -> Result<AnyPool, sqlx::Error> {
    sqlx::any::install_default_drivers();
    let pool = AnyPoolOptions::new()
        .max_connections(max_connections)
        .connect(dsn)
        .await?;
    crate::schema::create_all(&pool).await?;
    Ok(pool)
}

/// A fresh, isolated in-memory SQLite pool for tests. The random name plus
/// `cache=shared` lets every connection the pool opens see the same
/// in-memory database without colliding with other tests running in
/// parallel.
pub async fn connect_test() -> AnyPool {
    sqlx::any::install_default_drivers();
    let name = uuid::Uuid::new_v4();
    let dsn = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let pool = AnyPoolOptions::new()
        .max_connections(5)
        .connect(&dsn)
        .await
        .expect("connect in-memory sqlite");
    crate::schema::create_all(&pool)
        .await
        .expect("create schema");
    pool
}
