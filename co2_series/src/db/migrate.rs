//! Embedded schema migrations.

use anyhow::anyhow;
use diesel::{Connection, SqliteConnection, connection::SimpleConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

/// Embedded Diesel migrations bundled with this crate.
///
/// These are applied by `run_sqlite` to bring the database schema up to date.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Runs pending Diesel migrations on a SQLite database at the given URL.
///
/// This sets the SQLite journal mode to WAL and applies all embedded migrations, returning an error on failure.
pub fn run_sqlite(url: &str) -> anyhow::Result<()> {
    let mut conn = SqliteConnection::establish(sqlite_path(url))?;
    conn.batch_execute("PRAGMA journal_mode=WAL;")?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow!(e))?;

    Ok(())
}

/// Runs pending migrations for the given database URL.
///
/// Accepts `sqlite:` URLs and bare file paths; anything that looks like a
/// server URL (`scheme://`) is rejected.
pub fn run_all(database_url: &str) -> anyhow::Result<()> {
    if database_url.contains("://") {
        anyhow::bail!("Unsupported DATABASE_URL: {database_url}");
    }
    run_sqlite(database_url)
}

/// Strips an optional `sqlite:` prefix so both URL and path forms open the same file.
pub(crate) fn sqlite_path(url: &str) -> &str {
    url.strip_prefix("sqlite:").unwrap_or(url)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn migrations_apply_on_temp_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        let path = temp.path().to_string_lossy().to_string();

        run_sqlite(&path).expect("migration run");

        let mut conn = SqliteConnection::establish(&path).unwrap();
        conn.batch_execute(
            "INSERT INTO sensor_data (recorded_at, co2_ppm) VALUES ('2025-01-05T08:00:00.000Z', 612.0)",
        )
        .unwrap();
        conn.batch_execute("INSERT INTO history_cache (date_key, data_json) VALUES ('2025-01-04', '[]')")
            .unwrap();
    }

    #[test]
    fn sqlite_prefix_is_stripped() {
        assert_eq!(sqlite_path("sqlite:co2.db"), "co2.db");
        assert_eq!(sqlite_path("/var/lib/co2.db"), "/var/lib/co2.db");
    }

    #[test]
    fn server_urls_are_rejected() {
        let err = run_all("postgres://localhost/co2").unwrap_err();
        assert!(err.to_string().contains("Unsupported DATABASE_URL"));
    }
}
