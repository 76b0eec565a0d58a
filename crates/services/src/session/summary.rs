use quiz_core::model::{Badge, CategoryBreakdown, Provenance, SessionState};

/// `round(score / total * 100)`, 0 when nothing was asked.
#[must_use]
pub fn percentage(score: u32, total: u32) -> u32 {
    if total == 0 {
        0
    } else {
        let ratio = f64::from(score) / f64::from(total);
        (ratio * 100.0).round() as u32
    }
}

/// Final results of a quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSummary {
    pub player_name: String,
    pub score: u32,
    pub total: u32,
    pub percentage: u32,
    pub breakdown: CategoryBreakdown,
    pub badges: Vec<Badge>,
    pub provenance: Provenance,
}

impl QuizSummary {
    #[must_use]
    pub fn from_state(state: &SessionState) -> Self {
        let total = u32::try_from(state.total()).unwrap_or(u32::MAX);
        let percentage = percentage(state.score(), total);
        let badges = Badge::earned(
            percentage,
            state.score(),
            state.provenance(),
            state.accuracy().distinct_categories(),
        );
        Self {
            player_name: state.meta().player_name.clone(),
            score: state.score(),
            total,
            percentage,
            breakdown: state.accuracy().clone(),
            badges,
            provenance: state.provenance(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(5, 5), 100);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 8), 13);
    }
}
