use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rusqlite::{params, Connection, OpenFlags};
use tokio::task;

use crate::core::detection::{Detection, DetectionStore};
use crate::core::error::TwitcherResult;

/// Read-only view over the analyzer's SQLite database. Every query opens a
/// fresh read-only connection: the analyzer owns the file, and short-lived
/// readers keep locks out of its way.
pub struct SqliteDetectionStore {
    db_path: PathBuf,
}

impl SqliteDetectionStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    fn open(path: &Path) -> TwitcherResult<Connection> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        Ok(conn)
    }
}

#[async_trait]
impl DetectionStore for SqliteDetectionStore {
    async fn max_id(&self) -> anyhow::Result<i64> {
        let path = self.db_path.clone();
        let max = task::spawn_blocking(move || -> TwitcherResult<i64> {
            let conn = SqliteDetectionStore::open(&path)?;
            let max: Option<i64> = conn.query_row("SELECT MAX(id) FROM notes", [], |row| row.get(0))?;
            Ok(max.unwrap_or(0))
        })
        .await??;
        Ok(max)
    }

    async fn detections_after(&self, id: i64) -> anyhow::Result<Vec<Detection>> {
        let path = self.db_path.clone();
        let detections = task::spawn_blocking(move || -> TwitcherResult<Vec<Detection>> {
            let conn = SqliteDetectionStore::open(&path)?;
            let mut stmt = conn.prepare(
                "SELECT id, scientific_name, common_name, confidence, date, time
                 FROM notes
                 WHERE id > ?1
                 ORDER BY id ASC",
            )?;
            let rows = stmt
                .query_map(params![id], |row| {
                    Ok(Detection {
                        id: row.get(0)?,
                        scientific_name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                        common_name: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                        confidence: row.get::<_, Option<f64>>(3)?.unwrap_or_default(),
                        date: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                        time: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await??;
        Ok(detections)
    }
}
