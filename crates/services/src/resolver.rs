use std::sync::Arc;

use log::{debug, warn};
use rand::Rng;
use rand::rng;
use rand::seq::SliceRandom;

use quiz_core::generate::{BankError, assemble};
use quiz_core::model::{CategorySelection, Difficulty, Provenance, QuizItem, RawQuestion};

use crate::source::QuestionSource;

/// What a quiz start asks the resolver for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionRequest {
    pub amount: usize,
    pub selection: CategorySelection,
    /// Carried into session metadata; the static source is never filtered
    /// on difficulty.
    pub difficulty: Difficulty,
}

/// Items ready for a session, tagged with how they were acquired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQuestions {
    pub items: Vec<QuizItem>,
    pub provenance: Provenance,
}

/// Acquires questions: static source first, generated backfill for any
/// shortfall, full generation when the source is unavailable.
#[derive(Clone, Default)]
pub struct QuestionResolver {
    source: Option<Arc<dyn QuestionSource>>,
}

impl QuestionResolver {
    /// A resolver with no static source; every quiz is fully generated.
    #[must_use]
    pub fn generated_only() -> Self {
        Self { source: None }
    }

    #[must_use]
    pub fn with_source(source: Arc<dyn QuestionSource>) -> Self {
        Self {
            source: Some(source),
        }
    }

    /// Resolve a request into normalized items.
    ///
    /// A source failure is recovered locally and never surfaced; only
    /// bank exhaustion is fatal.
    ///
    /// # Errors
    ///
    /// Returns `BankError::InsufficientItems` if generation cannot reach
    /// the requested amount.
    pub async fn resolve(&self, request: QuestionRequest) -> Result<ResolvedQuestions, BankError> {
        if let Some(source) = &self.source {
            match source.fetch().await {
                Ok(file) => {
                    let mut rng = rng();
                    return Self::from_collection(file.questions, request, &mut rng);
                }
                Err(err) => warn!("question source unavailable, generating locally: {err}"),
            }
        }
        let mut rng = rng();
        let items = Self::generate(request.amount, request.selection, &mut rng)?;
        Ok(ResolvedQuestions {
            items,
            provenance: Provenance::Generated,
        })
    }

    fn from_collection<R: Rng + ?Sized>(
        questions: Vec<RawQuestion>,
        request: QuestionRequest,
        rng: &mut R,
    ) -> Result<ResolvedQuestions, BankError> {
        let mut filtered: Vec<RawQuestion> = questions
            .into_iter()
            .filter(|question| request.selection.admits(&question.category))
            .collect();
        filtered.shuffle(rng);

        let mut items: Vec<QuizItem> = Vec::with_capacity(request.amount);
        for raw in &filtered {
            if items.len() == request.amount {
                break;
            }
            match raw.prepare(rng) {
                Ok(item) => items.push(item),
                Err(err) => warn!("dropping malformed source question: {err}"),
            }
        }
        let external = items.len();
        let shortfall = request.amount - external;
        if shortfall > 0 {
            debug!("backfilling {shortfall} questions from generators");
            items.extend(Self::generate(shortfall, request.selection, rng)?);
        }

        if items.is_empty() {
            let items = Self::generate(request.amount, request.selection, rng)?;
            return Ok(ResolvedQuestions {
                items,
                provenance: Provenance::Generated,
            });
        }

        let provenance = if external == 0 {
            Provenance::Generated
        } else if shortfall > 0 {
            Provenance::Mixed
        } else {
            Provenance::ApiBank
        };
        Ok(ResolvedQuestions { items, provenance })
    }

    fn generate<R: Rng + ?Sized>(
        amount: usize,
        selection: CategorySelection,
        rng: &mut R,
    ) -> Result<Vec<QuizItem>, BankError> {
        let raw = assemble(amount, selection, rng)?;
        Ok(raw
            .iter()
            .filter_map(|question| match question.prepare(rng) {
                Ok(item) => Some(item),
                Err(err) => {
                    warn!("dropping malformed generated question: {err}");
                    None
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::source::{QuestionFile, QuestionSource};
    use async_trait::async_trait;
    use quiz_core::model::Category;

    struct StaticSource(Vec<RawQuestion>);

    #[async_trait]
    impl QuestionSource for StaticSource {
        async fn fetch(&self) -> Result<QuestionFile, SourceError> {
            Ok(QuestionFile {
                questions: self.0.clone(),
            })
        }
    }

    struct FailingSource;

    #[async_trait]
    impl QuestionSource for FailingSource {
        async fn fetch(&self) -> Result<QuestionFile, SourceError> {
            Err(SourceError::HttpStatus(
                reqwest::StatusCode::SERVICE_UNAVAILABLE,
            ))
        }
    }

    fn raw(category: &str, question: &str) -> RawQuestion {
        RawQuestion {
            category: category.to_owned(),
            difficulty: None,
            question: question.to_owned(),
            correct_answer: "A".into(),
            incorrect_answers: vec!["B".into(), "C".into(), "D".into()],
            solution: None,
        }
    }

    fn request(amount: usize, selection: CategorySelection) -> QuestionRequest {
        QuestionRequest {
            amount,
            selection,
            difficulty: Difficulty::Any,
        }
    }

    #[tokio::test]
    async fn unavailable_source_falls_back_to_full_generation() {
        let resolver = QuestionResolver::with_source(Arc::new(FailingSource));
        let resolved = resolver
            .resolve(request(5, CategorySelection::Any))
            .await
            .unwrap();
        assert_eq!(resolved.items.len(), 5);
        assert_eq!(resolved.provenance, Provenance::Generated);
    }

    #[tokio::test]
    async fn sufficient_source_is_tagged_api_bank() {
        let questions: Vec<RawQuestion> = (0..8).map(|i| raw("Calendar", &format!("Q{i}"))).collect();
        let resolver = QuestionResolver::with_source(Arc::new(StaticSource(questions)));
        let resolved = resolver
            .resolve(request(5, CategorySelection::Any))
            .await
            .unwrap();
        assert_eq!(resolved.items.len(), 5);
        assert_eq!(resolved.provenance, Provenance::ApiBank);
    }

    #[tokio::test]
    async fn short_source_is_backfilled_and_tagged_mixed() {
        let questions = vec![raw("Calendar", "Q0"), raw("Calendar", "Q1")];
        let resolver = QuestionResolver::with_source(Arc::new(StaticSource(questions)));
        let resolved = resolver
            .resolve(request(6, CategorySelection::Any))
            .await
            .unwrap();
        assert_eq!(resolved.items.len(), 6);
        assert_eq!(resolved.provenance, Provenance::Mixed);
    }

    #[tokio::test]
    async fn category_filter_uses_display_names() {
        let questions = vec![
            raw("Calendar", "C0"),
            raw("Calendar", "C1"),
            raw("Profit & Loss", "P0"),
        ];
        let resolver = QuestionResolver::with_source(Arc::new(StaticSource(questions)));
        let resolved = resolver
            .resolve(request(5, CategorySelection::One(Category::ProfitLoss)))
            .await
            .unwrap();
        assert_eq!(resolved.items.len(), 5);
        assert_eq!(resolved.provenance, Provenance::Mixed);
        assert!(resolved.items.iter().all(|i| i.category() == "Profit & Loss"));
    }

    #[tokio::test]
    async fn empty_source_is_tagged_generated() {
        let resolver = QuestionResolver::with_source(Arc::new(StaticSource(Vec::new())));
        let resolved = resolver
            .resolve(request(5, CategorySelection::Any))
            .await
            .unwrap();
        assert_eq!(resolved.items.len(), 5);
        assert_eq!(resolved.provenance, Provenance::Generated);
    }

    #[tokio::test]
    async fn malformed_source_questions_are_dropped() {
        let mut bad = raw("Calendar", "dup options");
        bad.incorrect_answers = vec!["A".into(), "B".into(), "C".into()];
        let questions = vec![bad, raw("Calendar", "Q0")];
        let resolver = QuestionResolver::with_source(Arc::new(StaticSource(questions)));
        let resolved = resolver
            .resolve(request(5, CategorySelection::Any))
            .await
            .unwrap();
        assert_eq!(resolved.items.len(), 5);
        assert_eq!(resolved.provenance, Provenance::Mixed);
        assert!(resolved.items.iter().all(|i| i.question() != "dup options"));
    }

    #[tokio::test]
    async fn no_source_generates_everything() {
        let resolver = QuestionResolver::generated_only();
        let resolved = resolver
            .resolve(request(7, CategorySelection::One(Category::SimpleInterest)))
            .await
            .unwrap();
        assert_eq!(resolved.items.len(), 7);
        assert_eq!(resolved.provenance, Provenance::Generated);
        assert!(resolved.items.iter().all(|i| i.category() == "Simple Interest"));
    }
}
