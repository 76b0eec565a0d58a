use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, warn};

use quiz_core::Clock;
use quiz_core::model::{
    CategorySelection, DEFAULT_QUESTIONS, DEFAULT_SECONDS_PER_QUESTION, Difficulty, Leaderboard,
    LeaderboardEntry, QuizConfig, SessionMeta,
};
use storage::repository::{
    LeaderboardStore, SessionRecord, SessionStore, Storage, StorageError,
};

use crate::assist::{NoopScoreSink, ScoreSink};
use crate::error::{SessionError, StartError};
use crate::resolver::{QuestionRequest, QuestionResolver};

use super::machine::{AdvanceOutcome, QuestionToken, QuizSession, SubmitFeedback, TickOutcome};
use super::summary::QuizSummary;

/// Raw quiz start form input. Out-of-range numbers are clamped into the
/// supported ranges, never rejected.
#[derive(Debug, Clone)]
pub struct StartInput {
    pub amount: usize,
    pub seconds_per_question: u32,
    pub selection: CategorySelection,
    pub difficulty: Difficulty,
    pub player_name: String,
}

impl Default for StartInput {
    fn default() -> Self {
        Self {
            amount: DEFAULT_QUESTIONS,
            seconds_per_question: DEFAULT_SECONDS_PER_QUESTION,
            selection: CategorySelection::Any,
            difficulty: Difficulty::Any,
            player_name: String::new(),
        }
    }
}

/// What `resume` found in the store.
#[derive(Debug)]
pub enum ResumeOutcome {
    /// No usable snapshot; start from the form.
    Fresh,
    /// A mid-quiz snapshot; the countdown continues from its persisted
    /// remaining time.
    InProgress(QuizSession),
    /// A finished quiz; results reconstructed from the snapshot.
    Completed(QuizSummary),
}

/// Orchestrates quiz start, command dispatch, persistence, and the
/// leaderboard.
///
/// Every state-changing command persists a snapshot before returning, in
/// the same control flow, so no partial state is ever observable in the
/// store.
pub struct QuizWorkflow {
    resolver: QuestionResolver,
    storage: Storage,
    clock: Clock,
    score_sink: Arc<dyn ScoreSink>,
    epoch: AtomicU64,
}

impl QuizWorkflow {
    #[must_use]
    pub fn new(resolver: QuestionResolver, storage: Storage) -> Self {
        Self {
            resolver,
            storage,
            clock: Clock::default(),
            score_sink: Arc::new(NoopScoreSink),
            epoch: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_score_sink(mut self, sink: Arc<dyn ScoreSink>) -> Self {
        self.score_sink = sink;
        self
    }

    /// Start a new quiz from form input.
    ///
    /// The question fetch is awaited before any session exists, so the
    /// machine never leaves `Idle` with a fetch pending. A `reset` racing
    /// the fetch wins: the resolved items are discarded.
    ///
    /// # Errors
    ///
    /// Returns `StartError` on bank exhaustion, storage failure, or a
    /// superseding reset.
    pub async fn start(&self, input: StartInput) -> Result<QuizSession, StartError> {
        let epoch = self.epoch.load(Ordering::SeqCst);
        let config = QuizConfig::clamped(input.amount, input.seconds_per_question);
        let resolved = self
            .resolver
            .resolve(QuestionRequest {
                amount: config.amount(),
                selection: input.selection,
                difficulty: input.difficulty,
            })
            .await?;
        if self.epoch.load(Ordering::SeqCst) != epoch {
            debug!("discarding resolved questions from a superseded start");
            return Err(StartError::Cancelled);
        }

        debug!(
            "starting quiz: {} questions, provenance {}",
            resolved.items.len(),
            resolved.provenance
        );
        let session = QuizSession::new(
            resolved.items,
            config,
            resolved.provenance,
            SessionMeta {
                difficulty: input.difficulty,
                category: input.selection,
                player_name: input.player_name,
            },
        );
        self.persist(&session).await?;
        Ok(session)
    }

    async fn persist(&self, session: &QuizSession) -> Result<(), StorageError> {
        self.storage
            .sessions
            .save_session(&SessionRecord::from_state(session.state()))
            .await
    }

    /// Record a tentative selection and persist.
    ///
    /// # Errors
    ///
    /// Propagates machine rejections and storage failures.
    pub async fn select(
        &self,
        session: &mut QuizSession,
        option: impl Into<String>,
    ) -> Result<(), SessionError> {
        session.select(option)?;
        self.persist(session).await?;
        Ok(())
    }

    /// Submit the current selection and persist.
    ///
    /// # Errors
    ///
    /// Propagates machine rejections and storage failures.
    pub async fn submit(&self, session: &mut QuizSession) -> Result<SubmitFeedback, SessionError> {
        let feedback = session.submit()?;
        self.persist(session).await?;
        Ok(feedback)
    }

    /// Skip the current question and persist.
    ///
    /// # Errors
    ///
    /// Propagates machine rejections and storage failures.
    pub async fn skip(&self, session: &mut QuizSession) -> Result<SubmitFeedback, SessionError> {
        let feedback = session.skip()?;
        self.persist(session).await?;
        Ok(feedback)
    }

    /// Toggle pause and persist. Returns the new paused flag.
    ///
    /// # Errors
    ///
    /// Propagates machine rejections and storage failures.
    pub async fn toggle_pause(&self, session: &mut QuizSession) -> Result<bool, SessionError> {
        let paused = session.toggle_pause()?;
        self.persist(session).await?;
        Ok(paused)
    }

    /// Drive the countdown by one second, persisting any state change.
    ///
    /// # Errors
    ///
    /// Propagates storage failures; tick itself never fails.
    pub async fn tick(
        &self,
        session: &mut QuizSession,
        token: QuestionToken,
    ) -> Result<TickOutcome, SessionError> {
        let outcome = session.tick(token);
        match &outcome {
            TickOutcome::Running { .. } | TickOutcome::Expired(_) => {
                self.persist(session).await?;
            }
            TickOutcome::Ignored | TickOutcome::Paused => {}
        }
        Ok(outcome)
    }

    /// Advance past a submitted question, persisting; on finish, the
    /// leaderboard entry is recorded and pushed to the score sink.
    ///
    /// # Errors
    ///
    /// Propagates machine rejections and storage failures.
    pub async fn advance(&self, session: &mut QuizSession) -> Result<AdvanceOutcome, SessionError> {
        let outcome = session.advance()?;
        self.persist(session).await?;
        if let AdvanceOutcome::Finished(summary) = &outcome {
            self.record_result(summary).await?;
        }
        Ok(outcome)
    }

    async fn record_result(&self, summary: &QuizSummary) -> Result<(), SessionError> {
        let name = if summary.player_name.trim().is_empty() {
            "Anonymous".to_owned()
        } else {
            summary.player_name.clone()
        };
        let entry = LeaderboardEntry {
            name,
            score: summary.score,
            total: summary.total,
            percentage: summary.percentage,
            recorded_at: self.clock.now(),
        };

        let mut board = self.leaderboard().await?;
        board.record(entry.clone());
        self.storage.leaderboard.save_leaderboard(&board).await?;

        // Remote publication is best-effort; local results already stand.
        if let Err(err) = self.score_sink.push(&entry).await {
            warn!("remote score sink failed: {err}");
        }
        Ok(())
    }

    /// The current leaderboard; an unreadable one resets to empty.
    ///
    /// # Errors
    ///
    /// Propagates storage failures other than corruption.
    pub async fn leaderboard(&self) -> Result<Leaderboard, SessionError> {
        match self.storage.leaderboard.load_leaderboard().await {
            Ok(board) => Ok(board),
            Err(StorageError::Serialization(err)) => {
                warn!("discarding corrupt leaderboard: {err}");
                Ok(Leaderboard::new())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Restore whatever the store holds from a previous run.
    ///
    /// A corrupt or invariant-violating snapshot is discarded and
    /// reported as `Fresh`, never as an error.
    ///
    /// # Errors
    ///
    /// Propagates storage failures other than corruption.
    pub async fn resume(&self) -> Result<ResumeOutcome, StorageError> {
        let record = match self.storage.sessions.load_session().await {
            Ok(Some(record)) => record,
            Ok(None) => return Ok(ResumeOutcome::Fresh),
            Err(StorageError::Serialization(err)) => {
                warn!("discarding corrupt session snapshot: {err}");
                self.storage.sessions.clear_session().await?;
                return Ok(ResumeOutcome::Fresh);
            }
            Err(err) => return Err(err),
        };

        let state = match record.into_state() {
            Ok(state) => state,
            Err(err) => {
                warn!("discarding invalid session snapshot: {err}");
                self.storage.sessions.clear_session().await?;
                return Ok(ResumeOutcome::Fresh);
            }
        };

        if state.items().is_empty() {
            return Ok(ResumeOutcome::Fresh);
        }
        if state.current_index() < state.items().len() {
            Ok(ResumeOutcome::InProgress(QuizSession::from_state(state)))
        } else {
            Ok(ResumeOutcome::Completed(QuizSummary::from_state(&state)))
        }
    }

    /// Abandon the current quiz: any in-flight start is invalidated and
    /// the persisted snapshot dropped.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be cleared.
    pub async fn reset(&self) -> Result<(), StorageError> {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.storage.sessions.clear_session().await
    }
}
