// src/annotator.rs

//! Client for the external content annotator that tags posts with topics,
//! sentiment and tone.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Annotation attached to a post at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub topics: Vec<String>,
    pub sentiment: String,
    pub tone: String,
}

impl Analysis {
    /// Trims labels and drops blank topics.
    fn normalized(self) -> Self {
        Self {
            topics: self
                .topics
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            sentiment: self.sentiment.trim().to_string(),
            tone: self.tone.trim().to_string(),
        }
    }
}

#[derive(Debug)]
pub enum AnnotatorError {
    /// The request never produced a response (connect error, timeout).
    Transport(String),
    /// The service answered with an error status or an unreadable body.
    InvalidResponse(String),
}

impl fmt::Display for AnnotatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotatorError::Transport(msg) => write!(f, "annotator unreachable: {}", msg),
            AnnotatorError::InvalidResponse(msg) => write!(f, "annotator response: {}", msg),
        }
    }
}

impl std::error::Error for AnnotatorError {}

#[async_trait]
pub trait Annotator: Send + Sync {
    async fn analyze(&self, content: &str) -> Result<Analysis, AnnotatorError>;
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    content: &'a str,
}

/// Calls a JSON endpoint: `POST {endpoint}` with `{"content": ...}`, expecting
/// `{"topics": [...], "sentiment": "...", "tone": "..."}` back.
#[derive(Clone)]
pub struct HttpAnnotator {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAnnotator {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, AnnotatorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnnotatorError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl Annotator for HttpAnnotator {
    async fn analyze(&self, content: &str) -> Result<Analysis, AnnotatorError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&AnalyzeRequest { content })
            .send()
            .await
            .map_err(|e| AnnotatorError::Transport(e.to_string()))?;

        let response = response
            .error_for_status()
            .map_err(|e| AnnotatorError::InvalidResponse(e.to_string()))?;

        let analysis = response
            .json::<Analysis>()
            .await
            .map_err(|e| AnnotatorError::InvalidResponse(e.to_string()))?;

        Ok(analysis.normalized())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Uses the `#hashtags` of a post as its topics.
    pub(crate) struct HashtagAnnotator;

    #[async_trait]
    impl Annotator for HashtagAnnotator {
        async fn analyze(&self, content: &str) -> Result<Analysis, AnnotatorError> {
            let topics = content
                .split_whitespace()
                .filter_map(|w| w.strip_prefix('#'))
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect();
            Ok(Analysis {
                topics,
                sentiment: "neutral".to_string(),
                tone: "informal".to_string(),
            })
        }
    }

    pub(crate) struct DownAnnotator;

    #[async_trait]
    impl Annotator for DownAnnotator {
        async fn analyze(&self, _content: &str) -> Result<Analysis, AnnotatorError> {
            Err(AnnotatorError::Transport("connection refused".to_string()))
        }
    }
}
