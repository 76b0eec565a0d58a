use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The six aptitude categories questions are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    TimeWork,
    SpeedDistance,
    ProfitLoss,
    Calendar,
    SimpleInterest,
    CompoundInterest,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::TimeWork,
        Category::SpeedDistance,
        Category::ProfitLoss,
        Category::Calendar,
        Category::SimpleInterest,
        Category::CompoundInterest,
    ];

    /// Stable key used in form input and persisted metadata.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Category::TimeWork => "time_work",
            Category::SpeedDistance => "speed_distance",
            Category::ProfitLoss => "profit_loss",
            Category::Calendar => "calendar",
            Category::SimpleInterest => "simple_interest",
            Category::CompoundInterest => "compound_interest",
        }
    }

    /// Human-readable name, matching the static source's `category` field.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Category::TimeWork => "Time & Work",
            Category::SpeedDistance => "Speed & Distance",
            Category::ProfitLoss => "Profit & Loss",
            Category::Calendar => "Calendar",
            Category::SimpleInterest => "Simple Interest",
            Category::CompoundInterest => "Compound Interest",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown category key: {0}")]
pub struct CategoryParseError(String);

impl FromStr for Category {
    type Err = CategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.key() == s)
            .ok_or_else(|| CategoryParseError(s.to_owned()))
    }
}

/// A quiz-wide category choice: everything, or one specific category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CategorySelection {
    #[default]
    Any,
    One(Category),
}

impl CategorySelection {
    /// The form key for this selection (`"any"` or a category key).
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            CategorySelection::Any => "any",
            CategorySelection::One(category) => category.key(),
        }
    }

    /// Whether an item with the given display name passes this selection.
    #[must_use]
    pub fn admits(self, category_name: &str) -> bool {
        match self {
            CategorySelection::Any => true,
            CategorySelection::One(category) => category.display_name() == category_name,
        }
    }
}

impl FromStr for CategorySelection {
    type Err = CategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "any" {
            Ok(CategorySelection::Any)
        } else {
            s.parse::<Category>().map(CategorySelection::One)
        }
    }
}

/// Requested difficulty, carried as metadata only.
///
/// The static source has no reliable difficulty data, so no filtering
/// ever happens on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Any,
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Difficulty::Any => "any",
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Lenient parse matching the form's behavior: unknown input means `Any`.
    #[must_use]
    pub fn from_key(s: &str) -> Self {
        match s {
            "easy" => Difficulty::Easy,
            "medium" => Difficulty::Medium,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Any,
        }
    }
}
