use diesel_async::pooled_connection::deadpool::Pool;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;

pub type DbPool = Pool<AsyncPgConnection>;

/// History writes are small and fire-and-forget; a modest pool is plenty.
const MAX_CONNECTIONS: usize = 8;

/// Create a Diesel async connection pool for the history store.
///
/// Connections are opened lazily, so an unreachable database surfaces as
/// logged history errors rather than a startup failure.
pub fn connect(database_url: &str) -> DbPool {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
    let pool = Pool::builder(manager)
        .max_size(MAX_CONNECTIONS)
        .build()
        .expect("failed to build connection pool");

    tracing::info!(max_connections = MAX_CONNECTIONS, "history database pool created");

    pool
}
