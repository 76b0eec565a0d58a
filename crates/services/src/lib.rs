#![forbid(unsafe_code)]

pub mod assist;
pub mod error;
pub mod resolver;
pub mod session;
pub mod source;

pub use quiz_core::Clock;

pub use assist::{HintProvider, NoopScoreSink, RemoteAssist, ScoreSink};
pub use error::{AssistError, SessionError, SourceError, StartError};
pub use resolver::{QuestionRequest, QuestionResolver, ResolvedQuestions};
pub use session::{
    AdvanceOutcome, QuestionToken, QuizSession, QuizSummary, QuizWorkflow, ResumeOutcome,
    StartInput, SubmitFeedback, TickOutcome,
};
pub use source::{HttpQuestionSource, QuestionFile, QuestionSource};
