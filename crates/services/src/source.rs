use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use quiz_core::model::RawQuestion;

use crate::error::SourceError;

/// Payload shape of the static question collection.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionFile {
    pub questions: Vec<RawQuestion>,
}

/// Read-only provider of the static question collection, fetched once
/// per quiz start.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Fetch the full collection.
    ///
    /// # Errors
    ///
    /// Returns `SourceError` if the collection cannot be fetched or parsed.
    async fn fetch(&self) -> Result<QuestionFile, SourceError>;
}

/// Fetches the collection from an HTTP endpoint serving JSON.
#[derive(Clone)]
pub struct HttpQuestionSource {
    client: Client,
    url: String,
}

impl HttpQuestionSource {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl QuestionSource for HttpQuestionSource {
    async fn fetch(&self) -> Result<QuestionFile, SourceError> {
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(SourceError::HttpStatus(response.status()));
        }
        Ok(response.json().await?)
    }
}
