use crate::db::{DatabaseConnection, DatabaseKind, Db};
use crate::utils::workspace::WORKSPACE_DIR;
use std::env;
use std::path::Path;

/// Connects to a database and applies migrations.
/// We use `SQLite` by default, but we can override this by setting the `DATABASE_URL` environment variable.
///
/// # Errors
/// Errors if connection to database fails.
/// Connections can fail if the database is not running, or if the database URL is invalid.
pub async fn connect(workspace_path: &Path) -> anyhow::Result<DatabaseConnection> {
    let db_url = env::var("DATABASE_URL").unwrap_or_else(|_| default_sqlite_url(workspace_path));
    connect_to(&db_url).await
}

/// Connects to the database at `db_url` and applies migrations.
///
/// # Errors
/// Errors if the URL is unsupported, the database is unreachable or a migration fails.
pub async fn connect_to(db_url: &str) -> anyhow::Result<DatabaseConnection> {
    let connection = DatabaseConnection::connect(db_url).await?;
    tracing::info!("Connected to database");
    match connection.kind {
        DatabaseKind::Sqlite => {
            sqlx::migrate!("./migrations/sqlite")
                .run(&connection.pool)
                .await?;
        }
        DatabaseKind::Postgres => {
            sqlx::migrate!("./migrations/postgres")
                .run(&connection.pool)
                .await?;
        }
    }
    Ok(connection)
}

/// `SQLite` database file kept inside the workspace directory.
fn default_sqlite_url(workspace_path: &Path) -> String {
    let sqlite_db_path = workspace_path.join(WORKSPACE_DIR).join("db.sqlite3");
    format!("sqlite://{}?mode=rwc", sqlite_db_path.to_string_lossy())
}
