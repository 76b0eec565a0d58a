use quiz_core::model::{
    Provenance, QuizConfig, QuizItem, SessionMeta, SessionState, SessionStateError,
};

use crate::error::SessionError;
use super::summary::QuizSummary;

/// Token binding scheduled ticks to one rendered question.
///
/// Re-rendering invalidates the previous token, so a stale countdown can
/// never decrement the timer of a newer question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionToken(u64);

/// Feedback returned by a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitFeedback {
    pub index: usize,
    pub selected: Option<String>,
    pub correct: bool,
    pub correct_answer: String,
}

/// Outcome of one timer tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Stale token, submitted question, or finished quiz; nothing changed.
    Ignored,
    /// Countdown is frozen while paused.
    Paused,
    Running { remaining: u32 },
    /// The countdown hit zero and the question auto-submitted.
    Expired(SubmitFeedback),
}

/// Outcome of advancing past a submitted question.
#[derive(Debug, Clone, PartialEq)]
pub enum AdvanceOutcome {
    Next { index: usize, token: QuestionToken },
    Finished(QuizSummary),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Timed single-player quiz session.
///
/// Steps through `InProgress(i) → Submitted(i) → InProgress(i+1) |
/// Finished` under an explicit command interface (`select`, `submit`,
/// `skip`, `tick`, `toggle_pause`, `hint`, `advance`) callable from any
/// front end. All mutation happens on these commands; the countdown is
/// driven by an external once-per-second `tick`.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSession {
    state: SessionState,
    finished: bool,
    token: QuestionToken,
}

impl QuizSession {
    pub(crate) fn new(
        items: Vec<QuizItem>,
        config: QuizConfig,
        provenance: Provenance,
        meta: SessionMeta,
    ) -> Self {
        Self {
            state: SessionState::new(items, config, provenance, meta),
            finished: false,
            token: QuestionToken(0),
        }
    }

    /// Rebuild an in-progress session from restored state. The countdown
    /// continues from the persisted remaining time.
    pub(crate) fn from_state(state: SessionState) -> Self {
        Self {
            state,
            finished: false,
            token: QuestionToken(0),
        }
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The token ticks must carry to affect the current question.
    #[must_use]
    pub fn token(&self) -> QuestionToken {
        self.token
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Whether the current question has been submitted (feedback shown,
    /// waiting on advance).
    #[must_use]
    pub fn current_submitted(&self) -> bool {
        self.state.current_answer().is_some()
    }

    fn guard_active(&self) -> Result<&QuizItem, SessionError> {
        if self.finished {
            return Err(SessionError::Finished);
        }
        self.state
            .current_item()
            .ok_or(SessionError::NoActiveQuestion)
    }

    fn guard_unsubmitted(&self) -> Result<&QuizItem, SessionError> {
        let item = self.guard_active()?;
        if self.current_submitted() {
            return Err(SessionError::AlreadySubmitted);
        }
        Ok(item)
    }

    /// Record a tentative selection. Does not score and does not touch
    /// the timer.
    ///
    /// # Errors
    ///
    /// Rejected after submission or past the end of the quiz.
    pub fn select(&mut self, option: impl Into<String>) -> Result<(), SessionError> {
        self.guard_unsubmitted()?;
        self.state.set_selection(Some(option.into()));
        Ok(())
    }

    /// Submit the current selection for scoring.
    ///
    /// Idempotent per question: a second submission is rejected without
    /// any state change.
    ///
    /// # Errors
    ///
    /// Returns `AlreadySubmitted` on a duplicate submission.
    pub fn submit(&mut self) -> Result<SubmitFeedback, SessionError> {
        self.guard_unsubmitted()?;
        self.score_current()
    }

    /// Give up on the current question; counts as incorrect.
    ///
    /// # Errors
    ///
    /// Rejected after submission or past the end of the quiz.
    pub fn skip(&mut self) -> Result<SubmitFeedback, SessionError> {
        self.guard_unsubmitted()?;
        self.state.set_selection(None);
        self.score_current()
    }

    fn score_current(&mut self) -> Result<SubmitFeedback, SessionError> {
        let submission = self.state.submit_current().map_err(map_state_error)?;
        Ok(SubmitFeedback {
            index: submission.index,
            selected: submission.selected,
            correct: submission.correct,
            correct_answer: submission.correct_answer,
        })
    }

    /// Drive the countdown by one second.
    ///
    /// Ticks carrying a stale token are ignored, as are ticks after
    /// submission; a paused session freezes the countdown without
    /// suspending the caller's schedule. Reaching zero auto-submits
    /// exactly once.
    pub fn tick(&mut self, token: QuestionToken) -> TickOutcome {
        if token != self.token || self.finished || self.current_submitted() {
            return TickOutcome::Ignored;
        }
        if self.state.current_item().is_none() {
            return TickOutcome::Ignored;
        }
        if self.state.is_paused() {
            return TickOutcome::Paused;
        }
        let remaining = self.state.tick_down();
        if remaining > 0 {
            return TickOutcome::Running { remaining };
        }
        match self.score_current() {
            Ok(feedback) => TickOutcome::Expired(feedback),
            // Unreachable: the guards above ensure an unanswered question.
            Err(_) => TickOutcome::Ignored,
        }
    }

    /// Toggle the advisory pause flag consulted by `tick`.
    ///
    /// # Errors
    ///
    /// Rejected once the current question is submitted.
    pub fn toggle_pause(&mut self) -> Result<bool, SessionError> {
        self.guard_unsubmitted()?;
        let paused = !self.state.is_paused();
        self.state.set_paused(paused);
        Ok(paused)
    }

    /// A non-scoring hint: the worked solution when the item has one,
    /// else a nudge from the correct answer's first character.
    ///
    /// # Errors
    ///
    /// Rejected after submission; hints only exist before answering.
    pub fn hint(&self) -> Result<String, SessionError> {
        let item = self.guard_unsubmitted()?;
        if !item.solution().is_empty() {
            return Ok(item.solution().to_owned());
        }
        match item.correct_answer().chars().next() {
            Some(first) => Ok(format!("Think: the answer starts with \"{first}\"")),
            None => Ok("Trust your first instinct.".to_owned()),
        }
    }

    /// Move past a submitted question: either the next question with a
    /// fresh countdown and token, or the finished summary.
    ///
    /// # Errors
    ///
    /// Returns `NotSubmitted` before submission and `Finished` after the
    /// quiz is over.
    pub fn advance(&mut self) -> Result<AdvanceOutcome, SessionError> {
        if self.finished {
            return Err(SessionError::Finished);
        }
        if self.state.current_item().is_none() {
            return Err(SessionError::NoActiveQuestion);
        }
        if !self.current_submitted() {
            return Err(SessionError::NotSubmitted);
        }

        if self.state.advance() {
            self.token = QuestionToken(self.token.0 + 1);
            Ok(AdvanceOutcome::Next {
                index: self.state.current_index(),
                token: self.token,
            })
        } else {
            self.finished = true;
            Ok(AdvanceOutcome::Finished(QuizSummary::from_state(
                &self.state,
            )))
        }
    }
}

fn map_state_error(err: SessionStateError) -> SessionError {
    match err {
        SessionStateError::AlreadyAnswered(_) => SessionError::AlreadySubmitted,
        _ => SessionError::NoActiveQuestion,
    }
}
