use serde::{Deserialize, Serialize};

use crate::model::Provenance;

const ACE_PERCENTAGE: u32 = 90;
const STREAK_SCORE: u32 = 5;
const EXPLORER_CATEGORIES: usize = 3;

/// Achievements awarded when a quiz finishes.
///
/// Badges are independent of each other; any subset can be earned at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Badge {
    /// Scored 90% or better.
    Ace,
    /// Five or more correct answers.
    Streak,
    /// Finished a quiz built entirely from locally generated questions.
    Resilient,
    /// Answered across three or more categories.
    Explorer,
}

impl Badge {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Badge::Ace => "Ace",
            Badge::Streak => "Streak",
            Badge::Resilient => "Resilient",
            Badge::Explorer => "Explorer",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Badge::Ace => "Scored 90%+ in a quiz",
            Badge::Streak => "5+ correct answers",
            Badge::Resilient => "Played a fully generated quiz",
            Badge::Explorer => "Answered across 3+ categories",
        }
    }

    /// Evaluate every badge condition against the final results.
    #[must_use]
    pub fn earned(
        percentage: u32,
        score: u32,
        provenance: Provenance,
        categories_answered: usize,
    ) -> Vec<Badge> {
        let mut badges = Vec::new();
        if percentage >= ACE_PERCENTAGE {
            badges.push(Badge::Ace);
        }
        if score >= STREAK_SCORE {
            badges.push(Badge::Streak);
        }
        if provenance == Provenance::Generated {
            badges.push(Badge::Resilient);
        }
        if categories_answered >= EXPLORER_CATEGORIES {
            badges.push(Badge::Explorer);
        }
        badges
    }
}
