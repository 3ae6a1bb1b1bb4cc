//! Track repository (the artifact store).

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::database::begin_immediate;
use crate::database::models::{TrackDbModel, TrackSummary};
use crate::database::retry::retry_on_sqlite_busy;
use crate::{Error, Result};

const TRACK: &str = "Track";

const SUMMARY_COLUMNS: &str =
    "id, title, artist, duration_secs, source_url, thumbnail_url, created_at";

/// Track repository trait.
#[async_trait]
pub trait TrackRepository: Send + Sync {
    /// Persist a complete track. All-or-nothing; an empty payload is rejected.
    async fn put(&self, track: &TrackDbModel) -> Result<()>;
    async fn get(&self, id: &str) -> Result<TrackSummary>;
    /// Load only the payload. `Ok(None)` means the row exists without audio.
    async fn get_payload(&self, id: &str) -> Result<Option<Vec<u8>>>;
    /// All tracks, newest first.
    async fn list(&self) -> Result<Vec<TrackSummary>>;
    async fn delete(&self, id: &str) -> Result<()>;
    async fn count(&self) -> Result<i64>;
}

/// SQLx implementation of TrackRepository.
pub struct SqlxTrackRepository {
    pool: SqlitePool,
}

impl SqlxTrackRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn put_once(&self, track: &TrackDbModel) -> Result<()> {
        let mut tx = begin_immediate(&self.pool).await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO tracks (id, title, artist, duration_secs, source_url, thumbnail_url, payload, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&track.id)
        .bind(&track.title)
        .bind(&track.artist)
        .bind(track.duration_secs)
        .bind(&track.source_url)
        .bind(&track.thumbnail_url)
        .bind(&track.payload)
        .bind(track.created_at)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {
                tx.commit().await?;
                Ok(())
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(id = %track.id, error = %rollback_err, "Failed to roll back track insert");
                }
                Err(e.into())
            }
        }
    }
}

#[async_trait]
impl TrackRepository for SqlxTrackRepository {
    async fn put(&self, track: &TrackDbModel) -> Result<()> {
        if !track.has_payload() {
            return Err(Error::validation(format!(
                "Track {} has no audio payload",
                track.id
            )));
        }

        retry_on_sqlite_busy("put_track", || self.put_once(track)).await?;
        debug!(id = %track.id, bytes = track.payload.as_ref().map_or(0, Vec::len), "Track stored");
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<TrackSummary> {
        sqlx::query_as::<_, TrackSummary>(&format!(
            "SELECT {SUMMARY_COLUMNS} FROM tracks WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::not_found(TRACK, id))
    }

    async fn get_payload(&self, id: &str) -> Result<Option<Vec<u8>>> {
        let row: Option<(Option<Vec<u8>>,)> =
            sqlx::query_as("SELECT payload FROM tracks WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(|(payload,)| payload)
            .ok_or_else(|| Error::not_found(TRACK, id))
    }

    async fn list(&self) -> Result<Vec<TrackSummary>> {
        let tracks = sqlx::query_as::<_, TrackSummary>(&format!(
            "SELECT {SUMMARY_COLUMNS} FROM tracks ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(tracks)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM tracks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::not_found(TRACK, id));
        }
        Ok(())
    }

    async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tracks")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::migrated_pool;
    use crate::domain::{SourceUrl, TrackMetadata};

    fn track(id: &str, created_at: i64) -> TrackDbModel {
        let metadata = TrackMetadata {
            title: format!("title-{id}"),
            ..TrackMetadata::default()
        };
        TrackDbModel::new(
            id,
            &metadata,
            &SourceUrl::from_trusted("https://youtu.be/dQw4w9WgXcQ"),
            vec![0xFF, 0xFB, 0x90, 0x00],
        )
        .with_created_at(created_at)
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let (pool, _dir) = migrated_pool().await;
        let repo = SqlxTrackRepository::new(pool);

        repo.put(&track("a", 1_000)).await.unwrap();

        let summary = repo.get("a").await.unwrap();
        assert_eq!(summary.title, "title-a");
        assert_eq!(summary.created_at, 1_000);

        let payload = repo.get_payload("a").await.unwrap();
        assert_eq!(payload, Some(vec![0xFF, 0xFB, 0x90, 0x00]));
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let (pool, _dir) = migrated_pool().await;
        let repo = SqlxTrackRepository::new(pool);

        for (id, ts) in [("mid", 2_000), ("old", 1_000), ("new", 3_000)] {
            repo.put(&track(id, ts)).await.unwrap();
        }

        let ids: Vec<String> = repo.list().await.unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn test_duplicate_id_fails_without_corrupting_store() {
        let (pool, _dir) = migrated_pool().await;
        let repo = SqlxTrackRepository::new(pool);

        repo.put(&track("dup", 1_000)).await.unwrap();
        let err = repo.put(&track("dup", 2_000)).await.unwrap_err();
        assert!(matches!(err, Error::DatabaseSqlx(_)));

        assert_eq!(repo.count().await.unwrap(), 1);
        assert_eq!(repo.get("dup").await.unwrap().created_at, 1_000);
    }

    #[tokio::test]
    async fn test_empty_payload_rejected() {
        let (pool, _dir) = migrated_pool().await;
        let repo = SqlxTrackRepository::new(pool);

        let mut empty = track("empty", 1_000);
        empty.payload = Some(Vec::new());
        let err = repo.put(&empty).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let (pool, _dir) = migrated_pool().await;
        let repo = SqlxTrackRepository::new(pool);

        repo.put(&track("gone", 1_000)).await.unwrap();
        repo.delete("gone").await.unwrap();
        assert!(repo.delete("gone").await.unwrap_err().is_not_found());
        assert!(repo.get("gone").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let (pool, _dir) = migrated_pool().await;
        let repo = SqlxTrackRepository::new(pool);

        let id = uuid::Uuid::new_v4().to_string();
        assert!(repo.get(&id).await.unwrap_err().is_not_found());
        assert!(repo.get_payload(&id).await.unwrap_err().is_not_found());
    }
}
