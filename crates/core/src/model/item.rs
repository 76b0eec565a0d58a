use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every item carries exactly this many answer options.
pub const OPTION_COUNT: usize = 4;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ItemError {
    #[error("expected {OPTION_COUNT} options, got {0}")]
    WrongOptionCount(usize),

    #[error("duplicate option: {0}")]
    DuplicateOption(String),

    #[error("options do not contain the correct answer")]
    MissingCorrectAnswer,
}

/// One quiz question with its answer options and solution trace.
///
/// Invariant: `options` holds exactly four mutually distinct entries and
/// contains `correct_answer` exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedItem")]
pub struct QuizItem {
    category: String,
    question: String,
    correct_answer: String,
    options: Vec<String>,
    solution: String,
}

impl QuizItem {
    /// Build an item, validating the option invariant.
    ///
    /// # Errors
    ///
    /// Returns `ItemError` unless `options` holds exactly four mutually
    /// distinct entries including `correct_answer`.
    pub fn new(
        category: String,
        question: String,
        correct_answer: String,
        options: Vec<String>,
        solution: String,
    ) -> Result<Self, ItemError> {
        validate_options(&options, &correct_answer)?;
        Ok(Self {
            category,
            question,
            correct_answer,
            options,
            solution,
        })
    }

    /// Generator-side constructor; callers guarantee the option invariant.
    pub(crate) fn from_generated(
        category: &str,
        question: String,
        correct_answer: String,
        options: Vec<String>,
        solution: String,
    ) -> Self {
        debug_assert!(validate_options(&options, &correct_answer).is_ok());
        Self {
            category: category.to_owned(),
            question,
            correct_answer,
            options,
            solution,
        }
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Step-by-step solution trace; empty when the source provided none.
    #[must_use]
    pub fn solution(&self) -> &str {
        &self.solution
    }

    #[must_use]
    pub fn is_correct(&self, selected: Option<&str>) -> bool {
        selected == Some(self.correct_answer.as_str())
    }
}

fn validate_options(options: &[String], correct_answer: &str) -> Result<(), ItemError> {
    if options.len() != OPTION_COUNT {
        return Err(ItemError::WrongOptionCount(options.len()));
    }
    for (i, option) in options.iter().enumerate() {
        if options[..i].contains(option) {
            return Err(ItemError::DuplicateOption(option.clone()));
        }
    }
    if !options.iter().any(|option| option == correct_answer) {
        return Err(ItemError::MissingCorrectAnswer);
    }
    Ok(())
}

/// Deserialization shape for `QuizItem`; re-validates the invariant so a
/// tampered snapshot cannot smuggle in a malformed item.
#[derive(Deserialize)]
struct UncheckedItem {
    category: String,
    question: String,
    correct_answer: String,
    options: Vec<String>,
    solution: String,
}

impl TryFrom<UncheckedItem> for QuizItem {
    type Error = ItemError;

    fn try_from(raw: UncheckedItem) -> Result<Self, Self::Error> {
        QuizItem::new(
            raw.category,
            raw.question,
            raw.correct_answer,
            raw.options,
            raw.solution,
        )
    }
}

/// External item contract shared by the static question source and the
/// assembler output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawQuestion {
    pub category: String,
    #[serde(default)]
    pub difficulty: Option<String>,
    pub question: String,
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
    #[serde(default)]
    pub solution: Option<String>,
}

impl RawQuestion {
    /// Reshape a domain item into the external contract.
    #[must_use]
    pub fn from_item(item: &QuizItem) -> Self {
        Self {
            category: item.category().to_owned(),
            difficulty: Some("any".to_owned()),
            question: item.question().to_owned(),
            correct_answer: item.correct_answer().to_owned(),
            incorrect_answers: item
                .options()
                .iter()
                .filter(|option| option.as_str() != item.correct_answer())
                .cloned()
                .collect(),
            solution: Some(item.solution().to_owned()),
        }
    }

    /// Normalize into a `QuizItem`: HTML entities are decoded and the
    /// options shuffled exactly once, at preparation time.
    ///
    /// # Errors
    ///
    /// Returns `ItemError` if the answers do not form four distinct options.
    pub fn prepare<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<QuizItem, ItemError> {
        let correct_answer = decode(&self.correct_answer);
        let mut options: Vec<String> = Vec::with_capacity(OPTION_COUNT);
        options.push(correct_answer.clone());
        options.extend(self.incorrect_answers.iter().map(|answer| decode(answer)));
        options.shuffle(rng);
        QuizItem::new(
            decode(&self.category),
            decode(&self.question),
            correct_answer,
            options,
            self.solution.clone().unwrap_or_default(),
        )
    }
}

fn decode(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn options(values: [&str; 4]) -> Vec<String> {
        values.into_iter().map(str::to_owned).collect()
    }

    #[test]
    fn valid_item_passes() {
        let item = QuizItem::new(
            "Calendar".into(),
            "If today is Monday, what day is tomorrow?".into(),
            "Tuesday".into(),
            options(["Monday", "Tuesday", "Friday", "Sunday"]),
            String::new(),
        )
        .unwrap();
        assert!(item.is_correct(Some("Tuesday")));
        assert!(!item.is_correct(Some("Monday")));
        assert!(!item.is_correct(None));
    }

    #[test]
    fn duplicate_option_is_rejected() {
        let err = QuizItem::new(
            "Calendar".into(),
            "Q".into(),
            "Tuesday".into(),
            options(["Tuesday", "Monday", "Monday", "Sunday"]),
            String::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ItemError::DuplicateOption(_)));
    }

    #[test]
    fn missing_correct_answer_is_rejected() {
        let err = QuizItem::new(
            "Calendar".into(),
            "Q".into(),
            "Saturday".into(),
            options(["Tuesday", "Monday", "Friday", "Sunday"]),
            String::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ItemError::MissingCorrectAnswer));
    }

    #[test]
    fn wrong_option_count_is_rejected() {
        let err = QuizItem::new(
            "Calendar".into(),
            "Q".into(),
            "Monday".into(),
            vec!["Monday".into(), "Tuesday".into()],
            String::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ItemError::WrongOptionCount(2)));
    }

    #[test]
    fn prepare_decodes_entities_and_keeps_invariant() {
        let raw = RawQuestion {
            category: "Profit &amp; Loss".into(),
            difficulty: None,
            question: "What is 2 &lt; 3?".into(),
            correct_answer: "true".into(),
            incorrect_answers: vec!["false".into(), "maybe".into(), "no".into()],
            solution: None,
        };
        let mut rng = StdRng::seed_from_u64(7);
        let item = raw.prepare(&mut rng).unwrap();
        assert_eq!(item.category(), "Profit & Loss");
        assert_eq!(item.question(), "What is 2 < 3?");
        assert_eq!(item.options().len(), OPTION_COUNT);
        assert!(item.options().contains(&"true".to_owned()));
        assert_eq!(item.solution(), "");
    }

    #[test]
    fn prepare_rejects_duplicate_answers() {
        let raw = RawQuestion {
            category: "Calendar".into(),
            difficulty: None,
            question: "Q".into(),
            correct_answer: "Monday".into(),
            incorrect_answers: vec!["Monday".into(), "Tuesday".into(), "Friday".into()],
            solution: None,
        };
        let mut rng = StdRng::seed_from_u64(7);
        assert!(raw.prepare(&mut rng).is_err());
    }

    #[test]
    fn deserialization_revalidates_the_invariant() {
        let json = r#"{
            "category": "Calendar",
            "question": "Q",
            "correct_answer": "Monday",
            "options": ["Monday", "Monday", "Tuesday", "Friday"],
            "solution": ""
        }"#;
        assert!(serde_json::from_str::<QuizItem>(json).is_err());
    }

    #[test]
    fn round_trip_through_external_contract() {
        let item = QuizItem::new(
            "Simple Interest".into(),
            "Q".into(),
            "₹150".into(),
            options(["₹150", "₹180", "₹120", "₹187.5"]),
            "SI = (P×R×T)/100".into(),
        )
        .unwrap();
        let raw = RawQuestion::from_item(&item);
        assert_eq!(raw.incorrect_answers.len(), 3);
        assert!(!raw.incorrect_answers.contains(&"₹150".to_owned()));

        let mut rng = StdRng::seed_from_u64(3);
        let prepared = raw.prepare(&mut rng).unwrap();
        assert_eq!(prepared.correct_answer(), "₹150");
        assert_eq!(prepared.solution(), "SI = (P×R×T)/100");
    }
}
