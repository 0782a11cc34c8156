//! Shared test utilities for studio integration tests.
//!
//! Every test gets its own SQLite file inside a fresh temporary directory,
//! with the embedded migrations applied. The directory doubles as the data
//! root for anything a test writes to disk (uploads, exports).

use sqlx::SqlitePool;
use tempfile::TempDir;

use studio_db::config::DbConfig;
use studio_db::pool;

/// Create a temporary database with migrations applied.
///
/// Returns `(pool, dir)`. The database lives at `dir/studio.db`; keep `dir`
/// alive for the duration of the test and pass both to [`drop_test_db`]
/// when done.
pub async fn create_test_db() -> (SqlitePool, TempDir) {
    let dir = tempfile::Builder::new()
        .prefix("studio_test_")
        .tempdir()
        .expect("failed to create temp directory");

    let config = DbConfig::for_file(&dir.path().join("studio.db"));
    let temp_pool = pool::create_pool(&config)
        .await
        .unwrap_or_else(|e| panic!("failed to open temp database: {e:#}"));

    pool::run_migrations(&temp_pool)
        .await
        .expect("migrations should succeed");

    (temp_pool, dir)
}

/// Close the pool and remove the temporary directory.
pub async fn drop_test_db(pool: SqlitePool, dir: TempDir) {
    pool.close().await;
    let _ = dir.close();
}

/// Write a small placeholder image into `dir` and return its path.
pub fn write_fixture_image(dir: &std::path::Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    // PNG signature followed by filler; nothing decodes these bytes.
    std::fs::write(&path, b"\x89PNG\r\n\x1a\nfixture").expect("failed to write fixture image");
    path
}
