use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use thiserror::Error;

use crate::generate::numeric;
use crate::model::{Category, CategorySelection, RawQuestion};

/// Smallest bank the assembler over-generates before sampling. Small
/// requests still draw from a reasonably varied pool.
pub const BANK_FLOOR: usize = 40;

const OVERDRAW_FACTOR: usize = 4;
const ATTEMPTS_PER_SLOT: usize = 25;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BankError {
    #[error(
        "could not assemble {requested} unique questions (bank reached {assembled} of {target})"
    )]
    InsufficientItems {
        requested: usize,
        target: usize,
        assembled: usize,
    },
}

/// Assemble `amount` questions for the selection, shaped for the external
/// item contract.
///
/// Over-generates into a bank of `max(amount * 4, 40)` items deduplicated
/// by (category, question text), shuffles, and keeps the first `amount`.
///
/// # Errors
///
/// Returns `BankError::InsufficientItems` if the attempt cap is reached
/// before the bank fills; generation never loops unbounded.
pub fn assemble<R: Rng + ?Sized>(
    amount: usize,
    selection: CategorySelection,
    rng: &mut R,
) -> Result<Vec<RawQuestion>, BankError> {
    let target = (amount * OVERDRAW_FACTOR).max(BANK_FLOOR);
    assemble_with_limits(amount, selection, target, target * ATTEMPTS_PER_SLOT, rng)
}

pub(crate) fn assemble_with_limits<R: Rng + ?Sized>(
    amount: usize,
    selection: CategorySelection,
    target: usize,
    max_attempts: usize,
    rng: &mut R,
) -> Result<Vec<RawQuestion>, BankError> {
    let mut seen: HashSet<(String, String)> = HashSet::with_capacity(target);
    let mut bank = Vec::with_capacity(target);
    let mut attempts = 0;

    while bank.len() < target {
        if attempts == max_attempts {
            return Err(BankError::InsufficientItems {
                requested: amount,
                target,
                assembled: bank.len(),
            });
        }
        attempts += 1;

        let category = match selection {
            CategorySelection::Any => Category::ALL[rng.random_range(0..Category::ALL.len())],
            CategorySelection::One(category) => category,
        };
        let item = numeric::generate(category, rng);
        let signature = (item.category().to_owned(), item.question().to_owned());
        if !seen.insert(signature) {
            continue;
        }
        bank.push(item);
    }

    bank.shuffle(rng);
    Ok(bank
        .iter()
        .take(amount)
        .map(RawQuestion::from_item)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn assembles_the_requested_amount() {
        let mut rng = StdRng::seed_from_u64(11);
        let questions = assemble(5, CategorySelection::Any, &mut rng).unwrap();
        assert_eq!(questions.len(), 5);
        for question in &questions {
            assert_eq!(question.incorrect_answers.len(), 3);
            assert_eq!(question.difficulty.as_deref(), Some("any"));
            assert!(question.solution.is_some());
        }
    }

    #[test]
    fn sampled_questions_are_unique() {
        let mut rng = StdRng::seed_from_u64(12);
        let questions = assemble(20, CategorySelection::Any, &mut rng).unwrap();
        let signatures: HashSet<(String, String)> = questions
            .iter()
            .map(|q| (q.category.clone(), q.question.clone()))
            .collect();
        assert_eq!(signatures.len(), questions.len());
    }

    #[test]
    fn specific_selection_stays_in_category() {
        let mut rng = StdRng::seed_from_u64(13);
        let questions = assemble(8, CategorySelection::One(Category::Calendar), &mut rng).unwrap();
        assert!(questions.iter().all(|q| q.category == "Calendar"));
    }

    #[test]
    fn attempt_cap_fails_instead_of_hanging() {
        let mut rng = StdRng::seed_from_u64(14);
        let err = assemble_with_limits(
            5,
            CategorySelection::One(Category::Calendar),
            40,
            10,
            &mut rng,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            BankError::InsufficientItems { assembled, .. } if assembled <= 10
        ));
    }
}
