use crate::config::Config;
use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

pub type ConnectionPool = Pool<ConnectionManager<SqliteConnection>>;
pub type Connection = PooledConnection<ConnectionManager<SqliteConnection>>;
pub type MigrationError = Box<dyn std::error::Error + Send + Sync>;

/// Builds a connection pool for the database at `config.database_url`.
///
/// An in-memory database only lives as long as its connection, so the pool is
/// restricted to a single, never-recycled connection in that case.
pub fn create_connection_pool(config: &Config) -> Result<ConnectionPool, diesel::r2d2::PoolError> {
    let in_memory = config.database_url == ":memory:";
    let num_threads = tokio::runtime::Handle::try_current()
        .map(|handle| handle.metrics().num_workers())
        .unwrap_or(1);
    let max_size = if in_memory { 1 } else { num_threads.max(2) as u32 };

    let manager = ConnectionManager::new(&config.database_url);
    Pool::builder()
        .max_size(max_size)
        .max_lifetime(None)
        .idle_timeout(None)
        .test_on_check_out(!in_memory)
        .connection_customizer(Box::new(ConnectionOptions))
        .build(manager)
}

/// Runs embedded migrations on the database.
pub fn run_migrations(conn: &mut SqliteConnection) -> Result<(), MigrationError> {
    conn.run_pending_migrations(MIGRATIONS).map(|_| ())
}

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Pragmas that SQLite only applies per connection.
#[derive(Debug)]
struct ConnectionOptions;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
            .map_err(diesel::r2d2::Error::QueryError)
    }
}
