use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::model::{CategorySelection, Difficulty, QuizItem};

//
// ─── LIMITS ────────────────────────────────────────────────────────────────────
//

/// Bounds silently applied to quiz start form input.
pub const MIN_QUESTIONS: usize = 5;
pub const MAX_QUESTIONS: usize = 20;
pub const DEFAULT_QUESTIONS: usize = 10;
pub const MIN_SECONDS_PER_QUESTION: u32 = 5;
pub const MAX_SECONDS_PER_QUESTION: u32 = 90;
pub const DEFAULT_SECONDS_PER_QUESTION: u32 = 20;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionStateError {
    #[error("no active question")]
    NoActiveQuestion,

    #[error("question {0} was already answered")]
    AlreadyAnswered(usize),

    #[error("invalid persisted state: {0}")]
    InvalidPersistedState(String),
}

//
// ─── RECORDS ───────────────────────────────────────────────────────────────────
//

/// Answer recorded for one question index.
///
/// `selected` is `None` for a skip or timeout; an empty string is never
/// used to mean "no answer".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnsweredRecord {
    pub selected: Option<String>,
}

/// Correct/total tallies for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryTally {
    pub correct: u32,
    pub total: u32,
}

/// Per-category accuracy, keyed by category display name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryBreakdown(BTreeMap<String, CategoryTally>);

impl CategoryBreakdown {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one answered question: `total` always increments, `correct`
    /// only on a match.
    pub fn record(&mut self, category: &str, correct: bool) {
        let tally = self.0.entry(category.to_owned()).or_default();
        tally.total += 1;
        if correct {
            tally.correct += 1;
        }
    }

    #[must_use]
    pub fn tally(&self, category: &str) -> Option<CategoryTally> {
        self.0.get(category).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, CategoryTally)> {
        self.0.iter().map(|(name, tally)| (name.as_str(), *tally))
    }

    /// Sum of correct answers across categories; always equals the score.
    #[must_use]
    pub fn correct_sum(&self) -> u32 {
        self.0.values().map(|tally| tally.correct).sum()
    }

    /// Sum of totals across categories; always equals the answered count.
    #[must_use]
    pub fn answered_total(&self) -> u32 {
        self.0.values().map(|tally| tally.total).sum()
    }

    #[must_use]
    pub fn distinct_categories(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// How the session's items were acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    /// Every item came from the static source.
    ApiBank,
    /// Static source items topped up with generated ones.
    Mixed,
    /// Pure local generation.
    Generated,
}

impl Provenance {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Provenance::ApiBank => "api-bank",
            Provenance::Mixed => "mixed",
            Provenance::Generated => "generated",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata captured from the start form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMeta {
    pub difficulty: Difficulty,
    pub category: CategorySelection,
    pub player_name: String,
}

/// Validated quiz start parameters; out-of-range input is clamped,
/// never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizConfig {
    amount: usize,
    seconds_per_question: u32,
}

impl QuizConfig {
    #[must_use]
    pub fn clamped(amount: usize, seconds_per_question: u32) -> Self {
        Self {
            amount: amount.clamp(MIN_QUESTIONS, MAX_QUESTIONS),
            seconds_per_question: seconds_per_question
                .clamp(MIN_SECONDS_PER_QUESTION, MAX_SECONDS_PER_QUESTION),
        }
    }

    #[must_use]
    pub fn amount(&self) -> usize {
        self.amount
    }

    #[must_use]
    pub fn seconds_per_question(&self) -> u32 {
        self.seconds_per_question
    }
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            amount: DEFAULT_QUESTIONS,
            seconds_per_question: DEFAULT_SECONDS_PER_QUESTION,
        }
    }
}

/// Outcome of recording a submission for the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub index: usize,
    pub selected: Option<String>,
    pub correct: bool,
    pub correct_answer: String,
}

//
// ─── SESSION STATE ─────────────────────────────────────────────────────────────
//

/// All state owned by one running quiz session.
///
/// Mutation happens through a small set of guarded methods so the
/// bookkeeping invariants hold at every step: the score never exceeds the
/// answered count, every score increment has a matching `AnsweredRecord`,
/// and the remaining time never leaves `0..=seconds_per_question`.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    items: Vec<QuizItem>,
    current_index: usize,
    selected_option: Option<String>,
    answers: Vec<Option<AnsweredRecord>>,
    score: u32,
    seconds_per_question: u32,
    timer_remaining: u32,
    paused: bool,
    provenance: Provenance,
    accuracy: CategoryBreakdown,
    meta: SessionMeta,
}

impl SessionState {
    #[must_use]
    pub fn new(
        items: Vec<QuizItem>,
        config: QuizConfig,
        provenance: Provenance,
        meta: SessionMeta,
    ) -> Self {
        let answers = vec![None; items.len()];
        Self {
            items,
            current_index: 0,
            selected_option: None,
            answers,
            score: 0,
            seconds_per_question: config.seconds_per_question(),
            timer_remaining: config.seconds_per_question(),
            paused: false,
            provenance,
            accuracy: CategoryBreakdown::new(),
            meta,
        }
    }

    /// Rehydrate a session from persisted storage, re-checking the
    /// bookkeeping invariants.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::InvalidPersistedState` if any invariant
    /// does not hold in the snapshot.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        items: Vec<QuizItem>,
        current_index: usize,
        selected_option: Option<String>,
        answers: Vec<Option<AnsweredRecord>>,
        score: u32,
        seconds_per_question: u32,
        timer_remaining: u32,
        paused: bool,
        provenance: Provenance,
        accuracy: CategoryBreakdown,
        meta: SessionMeta,
    ) -> Result<Self, SessionStateError> {
        let invalid = |reason: &str| SessionStateError::InvalidPersistedState(reason.to_owned());

        if answers.len() != items.len() {
            return Err(invalid("answers are not aligned with the item list"));
        }
        if current_index > items.len() {
            return Err(invalid("current index is out of bounds"));
        }
        if timer_remaining > seconds_per_question {
            return Err(invalid("remaining time exceeds the time per question"));
        }
        let answered = u32::try_from(answers.iter().filter(|record| record.is_some()).count())
            .map_err(|_| invalid("answer list is too large"))?;
        if score > answered {
            return Err(invalid("score exceeds the answered count"));
        }
        if accuracy.correct_sum() != score {
            return Err(invalid("category tallies disagree with the score"));
        }
        if accuracy.answered_total() != answered {
            return Err(invalid("category tallies disagree with the answered count"));
        }

        Ok(Self {
            items,
            current_index,
            selected_option,
            answers,
            score,
            seconds_per_question,
            timer_remaining,
            paused,
            provenance,
            accuracy,
            meta,
        })
    }

    #[must_use]
    pub fn items(&self) -> &[QuizItem] {
        &self.items
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn current_item(&self) -> Option<&QuizItem> {
        self.items.get(self.current_index)
    }

    #[must_use]
    pub fn selected_option(&self) -> Option<&str> {
        self.selected_option.as_deref()
    }

    #[must_use]
    pub fn answers(&self) -> &[Option<AnsweredRecord>] {
        &self.answers
    }

    /// The answer recorded for the current question, if any.
    #[must_use]
    pub fn current_answer(&self) -> Option<&AnsweredRecord> {
        self.answers.get(self.current_index).and_then(Option::as_ref)
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|record| record.is_some()).count()
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn seconds_per_question(&self) -> u32 {
        self.seconds_per_question
    }

    #[must_use]
    pub fn timer_remaining(&self) -> u32 {
        self.timer_remaining
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[must_use]
    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    #[must_use]
    pub fn accuracy(&self) -> &CategoryBreakdown {
        &self.accuracy
    }

    #[must_use]
    pub fn meta(&self) -> &SessionMeta {
        &self.meta
    }

    /// Record a tentative selection; scoring happens at submission.
    pub fn set_selection(&mut self, selected: Option<String>) {
        self.selected_option = selected;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Decrement the countdown by one second, never below zero.
    pub fn tick_down(&mut self) -> u32 {
        self.timer_remaining = self.timer_remaining.saturating_sub(1);
        self.timer_remaining
    }

    /// Score the current selection against the current question.
    ///
    /// Records the `AnsweredRecord`, bumps the score on a match, and
    /// updates the category tallies in the same step.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveQuestion` past the end of the quiz, or
    /// `AlreadyAnswered` if this question was submitted before; state is
    /// untouched in both cases.
    pub fn submit_current(&mut self) -> Result<Submission, SessionStateError> {
        let index = self.current_index;
        let Some(item) = self.items.get(index) else {
            return Err(SessionStateError::NoActiveQuestion);
        };
        if self.answers[index].is_some() {
            return Err(SessionStateError::AlreadyAnswered(index));
        }

        let selected = self.selected_option.clone();
        let correct = item.is_correct(selected.as_deref());
        self.answers[index] = Some(AnsweredRecord {
            selected: selected.clone(),
        });
        if correct {
            self.score += 1;
        }
        let category = item.category().to_owned();
        self.accuracy.record(&category, correct);

        Ok(Submission {
            index,
            selected,
            correct,
            correct_answer: item.correct_answer().to_owned(),
        })
    }

    /// Move to the next question with a cleared selection and a full
    /// countdown. Returns `true` while questions remain.
    pub fn advance(&mut self) -> bool {
        self.current_index += 1;
        self.selected_option = None;
        self.timer_remaining = self.seconds_per_question;
        self.current_index < self.items.len()
    }
}
