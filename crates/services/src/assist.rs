//! Remote-assist extension point.
//!
//! The session never talks to the network itself; these capability traits
//! are the seam where a real hint or score-sync integration plugs in
//! without touching session logic.

use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use quiz_core::model::LeaderboardEntry;

use crate::error::AssistError;

/// Capability for fetching a hint from a remote helper.
#[async_trait]
pub trait HintProvider: Send + Sync {
    /// Ask for a hint for the given question text.
    ///
    /// # Errors
    ///
    /// Returns `AssistError` when the provider is disabled or the request
    /// fails.
    async fn hint_for(&self, question: &str) -> Result<String, AssistError>;
}

/// Capability for pushing final scores to a remote service.
#[async_trait]
pub trait ScoreSink: Send + Sync {
    /// Publish one finished-quiz entry.
    ///
    /// # Errors
    ///
    /// Returns `AssistError` when the sink is disabled or the request
    /// fails.
    async fn push(&self, entry: &LeaderboardEntry) -> Result<(), AssistError>;
}

/// Default sink: keeps all scores local.
#[derive(Clone, Copy, Default)]
pub struct NoopScoreSink;

#[async_trait]
impl ScoreSink for NoopScoreSink {
    async fn push(&self, _entry: &LeaderboardEntry) -> Result<(), AssistError> {
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct RemoteAssistConfig {
    pub base_url: String,
    pub api_key: String,
}

impl RemoteAssistConfig {
    /// Read `QUIZ_ASSIST_BASE_URL` and `QUIZ_ASSIST_API_KEY`; `None`
    /// unless both are present and non-empty.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("QUIZ_ASSIST_BASE_URL").ok()?;
        let api_key = env::var("QUIZ_ASSIST_API_KEY").ok()?;
        if base_url.trim().is_empty() || api_key.trim().is_empty() {
            return None;
        }
        Some(Self { base_url, api_key })
    }
}

/// Remote hint/score integration; disabled unless configured.
#[derive(Clone)]
pub struct RemoteAssist {
    client: Client,
    config: Option<RemoteAssistConfig>,
}

impl RemoteAssist {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(RemoteAssistConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<RemoteAssistConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    fn endpoint(&self, path: &str) -> Result<(String, &RemoteAssistConfig), AssistError> {
        let config = self.config.as_ref().ok_or(AssistError::Disabled)?;
        let url = format!("{}/{path}", config.base_url.trim_end_matches('/'));
        Ok((url, config))
    }
}

#[async_trait]
impl HintProvider for RemoteAssist {
    async fn hint_for(&self, question: &str) -> Result<String, AssistError> {
        let (url, config) = self.endpoint("hint")?;
        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&HintRequest { question })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AssistError::HttpStatus(response.status()));
        }
        let body: HintResponse = response.json().await?;
        Ok(body.hint)
    }
}

#[async_trait]
impl ScoreSink for RemoteAssist {
    async fn push(&self, entry: &LeaderboardEntry) -> Result<(), AssistError> {
        let (url, config) = self.endpoint("scores")?;
        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&ScoreUpload {
                name: &entry.name,
                score: entry.score,
                total: entry.total,
                percentage: entry.percentage,
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AssistError::HttpStatus(response.status()));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct HintRequest<'a> {
    question: &'a str,
}

#[derive(Debug, Deserialize)]
struct HintResponse {
    hint: String,
}

#[derive(Debug, Serialize)]
struct ScoreUpload<'a> {
    name: &'a str,
    score: u32,
    total: u32,
    percentage: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_now;

    #[tokio::test]
    async fn unconfigured_assist_is_disabled() {
        let assist = RemoteAssist::new(None);
        assert!(!assist.enabled());

        let err = assist.hint_for("What is 2 + 2?").await.unwrap_err();
        assert!(matches!(err, AssistError::Disabled));

        let entry = LeaderboardEntry {
            name: "Asha".into(),
            score: 5,
            total: 5,
            percentage: 100,
            recorded_at: fixed_now(),
        };
        let err = assist.push(&entry).await.unwrap_err();
        assert!(matches!(err, AssistError::Disabled));
    }
}
