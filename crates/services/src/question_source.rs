use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use trivia_core::model::QuestionDraft;

use crate::error::FetchError;

/// Default question bank endpoint (Open Trivia DB).
pub const DEFAULT_API_URL: &str = "https://opentdb.com/api.php";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(format!("unknown difficulty {other:?}")),
        }
    }
}

/// Fixed parameters of the batch request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionQuery {
    pub amount: u32,
    pub category: Option<u32>,
    pub difficulty: Option<Difficulty>,
}

impl Default for QuestionQuery {
    fn default() -> Self {
        Self {
            amount: 10,
            category: Some(27),
            difficulty: Some(Difficulty::Easy),
        }
    }
}

impl QuestionQuery {
    /// Query pairs as the question bank expects them. Always multiple choice.
    #[must_use]
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("amount", self.amount.to_string())];
        if let Some(category) = self.category {
            params.push(("category", category.to_string()));
        }
        if let Some(difficulty) = self.difficulty {
            params.push(("difficulty", difficulty.to_string()));
        }
        params.push(("type", "multiple".to_string()));
        params
    }
}

/// Remote source of raw questions. One call is one attempt; retries belong to
/// `FetchPolicy`.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Request one batch of raw questions.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` when the request fails or the service reports an
    /// error. An empty list is returned as-is; the policy decides what it means.
    async fn fetch(&self, query: &QuestionQuery) -> Result<Vec<QuestionDraft>, FetchError>;
}

/// `QuestionSource` backed by the Open Trivia DB HTTP API.
#[derive(Clone)]
pub struct OpenTdbSource {
    client: Client,
    base_url: Url,
    request_timeout: Duration,
}

impl OpenTdbSource {
    #[must_use]
    pub fn new(base_url: Url, request_timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url,
            request_timeout,
        }
    }

    /// Full request URL for `query`.
    #[must_use]
    pub fn request_url(&self, query: &QuestionQuery) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query.params() {
                pairs.append_pair(key, &value);
            }
        }
        url
    }
}

#[async_trait]
impl QuestionSource for OpenTdbSource {
    async fn fetch(&self, query: &QuestionQuery) -> Result<Vec<QuestionDraft>, FetchError> {
        let url = self.request_url(query);
        debug!(%url, "requesting question batch");

        let response = self
            .client
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status()));
        }

        let body: OpenTdbResponse = response.json().await?;
        body.into_drafts()
    }
}

#[derive(Debug, Deserialize)]
struct OpenTdbResponse {
    response_code: u8,
    #[serde(default)]
    results: Vec<OpenTdbQuestion>,
}

#[derive(Debug, Deserialize)]
struct OpenTdbQuestion {
    question: String,
    correct_answer: String,
    #[serde(default)]
    incorrect_answers: Vec<String>,
}

impl OpenTdbResponse {
    fn into_drafts(self) -> Result<Vec<QuestionDraft>, FetchError> {
        if self.response_code != 0 {
            return Err(FetchError::Api {
                code: self.response_code,
            });
        }

        Ok(self
            .results
            .into_iter()
            .map(|q| QuestionDraft {
                prompt: q.question,
                correct_answer: q.correct_answer,
                incorrect_answers: q.incorrect_answers,
            })
            .collect())
    }
}
