mod machine;
mod summary;
mod workflow;

pub use machine::{AdvanceOutcome, QuestionToken, QuizSession, SubmitFeedback, TickOutcome};
pub use summary::{QuizSummary, percentage};
pub use workflow::{QuizWorkflow, ResumeOutcome, StartInput};
