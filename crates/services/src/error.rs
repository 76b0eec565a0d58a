//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::generate::BankError;
use storage::repository::StorageError;

/// Errors fetching the static question collection.
///
/// Never fatal: the resolver recovers by generating locally.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SourceError {
    #[error("question source returned status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors fatal to quiz start.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StartError {
    #[error(transparent)]
    Bank(#[from] BankError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("quiz start superseded by a reset")]
    Cancelled,
}

/// Errors emitted by the session state machine and workflow.
///
/// The command rejections (`AlreadySubmitted`, `NotSubmitted`, …) leave
/// session state untouched; front ends may ignore them.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("question already submitted")]
    AlreadySubmitted,
    #[error("current question has not been submitted")]
    NotSubmitted,
    #[error("no active question")]
    NoActiveQuestion,
    #[error("quiz already finished")]
    Finished,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the remote-assist extension point.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AssistError {
    #[error("remote assist is not configured")]
    Disabled,
    #[error("remote assist request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
