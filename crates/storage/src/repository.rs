use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use quiz_core::model::{
    AnsweredRecord, CategoryBreakdown, Leaderboard, Provenance, QuizItem, SessionMeta,
    SessionState, SessionStateError,
};

/// Errors surfaced by persistence adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted mirror of `SessionState`.
///
/// This mirrors the domain state so stores can serialize/deserialize
/// without leaking storage concerns into the domain layer. Restoring goes
/// back through `SessionState::from_persisted`, which re-checks the
/// session invariants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub items: Vec<QuizItem>,
    pub current_index: usize,
    pub selected_option: Option<String>,
    pub answers: Vec<Option<AnsweredRecord>>,
    pub score: u32,
    pub seconds_per_question: u32,
    pub timer_remaining: u32,
    pub paused: bool,
    pub provenance: Provenance,
    pub accuracy: CategoryBreakdown,
    pub meta: SessionMeta,
}

impl SessionRecord {
    #[must_use]
    pub fn from_state(state: &SessionState) -> Self {
        Self {
            items: state.items().to_vec(),
            current_index: state.current_index(),
            selected_option: state.selected_option().map(str::to_owned),
            answers: state.answers().to_vec(),
            score: state.score(),
            seconds_per_question: state.seconds_per_question(),
            timer_remaining: state.timer_remaining(),
            paused: state.is_paused(),
            provenance: state.provenance(),
            accuracy: state.accuracy().clone(),
            meta: state.meta().clone(),
        }
    }

    /// Convert the record back into a domain `SessionState`.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::InvalidPersistedState` if the snapshot
    /// violates session invariants.
    pub fn into_state(self) -> Result<SessionState, SessionStateError> {
        SessionState::from_persisted(
            self.items,
            self.current_index,
            self.selected_option,
            self.answers,
            self.score,
            self.seconds_per_question,
            self.timer_remaining,
            self.paused,
            self.provenance,
            self.accuracy,
            self.meta,
        )
    }
}

/// UI theme choice; external to the quiz core, consulted only at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemePreference {
    Dark,
    Light,
}

impl ThemePreference {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ThemePreference::Dark => "dark",
            ThemePreference::Light => "light",
        }
    }
}

impl fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown theme: {0}")]
pub struct ThemeParseError(String);

impl FromStr for ThemePreference {
    type Err = ThemeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dark" => Ok(ThemePreference::Dark),
            "light" => Ok(ThemePreference::Light),
            other => Err(ThemeParseError(other.to_owned())),
        }
    }
}

/// Store contract for the single persisted session snapshot.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist the snapshot, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be stored.
    async fn save_session(&self, record: &SessionRecord) -> Result<(), StorageError>;

    /// Fetch the snapshot, if one was persisted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for an unreadable value, or
    /// other storage errors.
    async fn load_session(&self) -> Result<Option<SessionRecord>, StorageError>;

    /// Drop the snapshot; absent snapshots are not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be written.
    async fn clear_session(&self) -> Result<(), StorageError>;
}

/// Store contract for the bounded leaderboard.
#[async_trait]
pub trait LeaderboardStore: Send + Sync {
    /// Fetch the leaderboard; an absent value is an empty board.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for an unreadable value, or
    /// other storage errors.
    async fn load_leaderboard(&self) -> Result<Leaderboard, StorageError>;

    /// Persist the leaderboard wholesale.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the board cannot be stored.
    async fn save_leaderboard(&self, board: &Leaderboard) -> Result<(), StorageError>;
}

/// Store contract for startup preferences.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Fetch the stored theme, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for a value outside the
    /// fixed set, or other storage errors.
    async fn theme(&self) -> Result<Option<ThemePreference>, StorageError>;

    /// Persist the theme choice.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the preference cannot be stored.
    async fn set_theme(&self, theme: ThemePreference) -> Result<(), StorageError>;
}

/// Simple in-memory store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    session: Arc<Mutex<Option<SessionRecord>>>,
    leaderboard: Arc<Mutex<Leaderboard>>,
    theme: Arc<Mutex<Option<ThemePreference>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn save_session(&self, record: &SessionRecord) -> Result<(), StorageError> {
        let mut guard = self
            .session
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(record.clone());
        Ok(())
    }

    async fn load_session(&self) -> Result<Option<SessionRecord>, StorageError> {
        let guard = self
            .session
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn clear_session(&self) -> Result<(), StorageError> {
        let mut guard = self
            .session
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = None;
        Ok(())
    }
}

#[async_trait]
impl LeaderboardStore for InMemoryStore {
    async fn load_leaderboard(&self) -> Result<Leaderboard, StorageError> {
        let guard = self
            .leaderboard
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn save_leaderboard(&self, board: &Leaderboard) -> Result<(), StorageError> {
        let mut guard = self
            .leaderboard
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = board.clone();
        Ok(())
    }
}

#[async_trait]
impl PreferenceStore for InMemoryStore {
    async fn theme(&self) -> Result<Option<ThemePreference>, StorageError> {
        let guard = self
            .theme
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(*guard)
    }

    async fn set_theme(&self, theme: ThemePreference) -> Result<(), StorageError> {
        let mut guard = self
            .theme
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(theme);
        Ok(())
    }
}

/// Aggregates the three stores behind trait objects for easy backend
/// swapping.
#[derive(Clone)]
pub struct Storage {
    pub sessions: Arc<dyn SessionStore>,
    pub leaderboard: Arc<dyn LeaderboardStore>,
    pub preferences: Arc<dyn PreferenceStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let store = InMemoryStore::new();
        Self {
            sessions: Arc::new(store.clone()),
            leaderboard: Arc::new(store.clone()),
            preferences: Arc::new(store),
        }
    }
}
