// Spreadsheet-style table storage on SQLite
// One database file per spreadsheet; each city table is a titled sheet whose
// rows are stored as JSON string arrays, header first.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::{debug, info};

use crate::domain::errors::StorageError;
use crate::domain::repositories::{Row, TableBackend};
use crate::domain::spreadsheet::SpreadsheetId;

pub struct SqliteSheetBackend {
    pool: SqlitePool,
}

impl SqliteSheetBackend {
    /// Database file that backs a spreadsheet
    pub fn database_path(data_dir: &Path, spreadsheet: &SpreadsheetId) -> PathBuf {
        data_dir.join(format!("{}.db", spreadsheet.as_str()))
    }

    /// Open (creating if needed) the store for a spreadsheet
    pub async fn open(data_dir: &Path, spreadsheet: &SpreadsheetId) -> Result<Self, StorageError> {
        tokio::fs::create_dir_all(data_dir)
            .await
            .map_err(|e| StorageError::Backend(format!("cannot create {}: {e}", data_dir.display())))?;

        let path = Self::database_path(data_dir, spreadsheet);
        info!("📂 Opening spreadsheet store: {}", path.display());

        let options = SqliteConnectOptions::new().filename(&path).create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        let backend = Self { pool };
        backend.migrate().await?;
        Ok(backend)
    }

    /// Private in-memory store
    pub async fn in_memory() -> Result<Self, StorageError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let backend = Self { pool };
        backend.migrate().await?;
        Ok(backend)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), StorageError> {
        let create_sheets_sql = r#"
            CREATE TABLE IF NOT EXISTS sheets (
                title TEXT PRIMARY KEY,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
        "#;

        let create_rows_sql = r#"
            CREATE TABLE IF NOT EXISTS sheet_rows (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                sheet_title TEXT NOT NULL,
                cells TEXT NOT NULL,
                FOREIGN KEY (sheet_title) REFERENCES sheets (title) ON DELETE CASCADE
            )
        "#;

        let create_index_sql = r#"
            CREATE INDEX IF NOT EXISTS idx_sheet_rows_title ON sheet_rows (sheet_title, id)
        "#;

        sqlx::query(create_sheets_sql).execute(&self.pool).await?;
        sqlx::query(create_rows_sql).execute(&self.pool).await?;
        sqlx::query(create_index_sql).execute(&self.pool).await?;

        Ok(())
    }

    async fn table_exists(&self, name: &str) -> Result<bool, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sheets WHERE title = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }
}

#[async_trait]
impl TableBackend for SqliteSheetBackend {
    async fn list_tables(&self) -> Result<Vec<String>, StorageError> {
        let titles: Vec<String> = sqlx::query_scalar("SELECT title FROM sheets ORDER BY rowid")
            .fetch_all(&self.pool)
            .await?;
        Ok(titles)
    }

    async fn create_table(&self, name: &str, header: &[String]) -> Result<(), StorageError> {
        if self.table_exists(name).await? {
            return Err(StorageError::Backend(format!("table '{name}' already exists")));
        }

        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO sheets (title) VALUES (?)")
            .bind(name)
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO sheet_rows (sheet_title, cells) VALUES (?, ?)")
            .bind(name)
            .bind(serde_json::to_string(header)?)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!("Created table '{}'", name);
        Ok(())
    }

    async fn read_all_rows(&self, name: &str) -> Result<Vec<Row>, StorageError> {
        if !self.table_exists(name).await? {
            return Err(StorageError::TableNotFound(name.to_string()));
        }

        let encoded: Vec<String> =
            sqlx::query_scalar("SELECT cells FROM sheet_rows WHERE sheet_title = ? ORDER BY id")
                .bind(name)
                .fetch_all(&self.pool)
                .await?;

        encoded
            .iter()
            .map(|cells| serde_json::from_str::<Row>(cells).map_err(StorageError::from))
            .collect()
    }

    async fn append_rows(&self, name: &str, rows: &[Row]) -> Result<(), StorageError> {
        if !self.table_exists(name).await? {
            return Err(StorageError::TableNotFound(name.to_string()));
        }
        if rows.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for row in rows {
            sqlx::query("INSERT INTO sheet_rows (sheet_title, cells) VALUES (?, ?)")
                .bind(name)
                .bind(serde_json::to_string(row)?)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        debug!("Appended {} row(s) to '{}'", rows.len(), name);
        Ok(())
    }
}
