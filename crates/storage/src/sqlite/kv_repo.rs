use async_trait::async_trait;
use sqlx::Row;

use crate::repository::{
    LeaderboardStore, PreferenceStore, SessionRecord, SessionStore, StorageError, ThemePreference,
};
use quiz_core::model::Leaderboard;

use super::SqliteStore;

pub(crate) const SESSION_KEY: &str = "quiz_session_v2";
pub(crate) const LEADERBOARD_KEY: &str = "quiz_leaderboard_v1";
pub(crate) const THEME_KEY: &str = "quiz_theme";

impl SqliteStore {
    async fn get_value(&self, key: &str) -> Result<Option<String>, StorageError> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?1")
            .bind(key)
            .fetch_optional(self.pool())
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        let Some(row) = row else {
            return Ok(None);
        };
        row.try_get("value")
            .map(Some)
            .map_err(|err| StorageError::Serialization(err.to_string()))
    }

    async fn put_value(&self, key: &str, value: &str) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO kv_store (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            ",
        )
        .bind(key)
        .bind(value)
        .execute(self.pool())
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(())
    }

    async fn delete_value(&self, key: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?1")
            .bind(key)
            .execute(self.pool())
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn save_session(&self, record: &SessionRecord) -> Result<(), StorageError> {
        let json = serde_json::to_string(record)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        self.put_value(SESSION_KEY, &json).await
    }

    async fn load_session(&self) -> Result<Option<SessionRecord>, StorageError> {
        match self.get_value(SESSION_KEY).await? {
            None => Ok(None),
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|err| StorageError::Serialization(err.to_string())),
        }
    }

    async fn clear_session(&self) -> Result<(), StorageError> {
        self.delete_value(SESSION_KEY).await
    }
}

#[async_trait]
impl LeaderboardStore for SqliteStore {
    async fn load_leaderboard(&self) -> Result<Leaderboard, StorageError> {
        match self.get_value(LEADERBOARD_KEY).await? {
            None => Ok(Leaderboard::new()),
            Some(json) => serde_json::from_str(&json)
                .map_err(|err| StorageError::Serialization(err.to_string())),
        }
    }

    async fn save_leaderboard(&self, board: &Leaderboard) -> Result<(), StorageError> {
        let json = serde_json::to_string(board)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        self.put_value(LEADERBOARD_KEY, &json).await
    }
}

#[async_trait]
impl PreferenceStore for SqliteStore {
    async fn theme(&self) -> Result<Option<ThemePreference>, StorageError> {
        match self.get_value(THEME_KEY).await? {
            None => Ok(None),
            Some(value) => value
                .parse()
                .map(Some)
                .map_err(|err: crate::repository::ThemeParseError| {
                    StorageError::Serialization(err.to_string())
                }),
        }
    }

    async fn set_theme(&self, theme: ThemePreference) -> Result<(), StorageError> {
        self.put_value(THEME_KEY, theme.as_str()).await
    }
}
