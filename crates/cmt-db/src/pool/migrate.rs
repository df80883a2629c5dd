//! Schema migrations
//!
//! Migrations are plain SQL files read at runtime from a directory, applied
//! in version order and tracked by sqlx in `_sqlx_migrations`.

use std::path::{Path, PathBuf};

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::PgPool;
use tracing::info;

/// The `migrations/` directory shipped with this crate
pub fn default_migrations_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")
}

/// Apply every pending migration in `dir`. Returns how many were known.
pub async fn run_migrations(pool: &PgPool, dir: &Path) -> Result<usize, MigrateError> {
    let migrator = Migrator::new(dir).await?;
    let count = migrator.iter().count();
    migrator.run(pool).await?;
    info!(dir = %dir.display(), migrations = count, "Schema is up to date");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dir_has_initial_migration() {
        let dir = default_migrations_dir();
        assert!(dir.join("0001_init.sql").is_file());
    }
}
