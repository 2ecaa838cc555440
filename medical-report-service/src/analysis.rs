use async_trait::async_trait;
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{error, info, warn};

/// Retry budget for transient failures: the first call plus one retry
const MAX_ATTEMPTS: u32 = 2;

/// Content submitted to the remote model
#[derive(Debug, Clone)]
pub enum AnalysisRequest {
    /// A complete text prompt
    Text(String),
    /// An instruction paired with a PNG-encoded image
    Image { instruction: String, png: Vec<u8> },
}

impl AnalysisRequest {
    fn kind(&self) -> &'static str {
        match self {
            AnalysisRequest::Text(_) => "text",
            AnalysisRequest::Image { .. } => "image",
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum ModelError {
    /// Worth retrying: connection problems, rate limiting, server errors
    #[error("{0}")]
    Transient(String),

    #[error("{0}")]
    Permanent(String),
}

#[derive(Error, Debug, Clone)]
pub enum AnalysisError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl AnalysisError {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            AnalysisError::Timeout(_) | AnalysisError::Model(ModelError::Transient(_))
        )
    }
}

/// Remote generative model that turns a request into free text
#[async_trait]
pub trait AnalysisModel: Send + Sync {
    async fn generate(&self, request: &AnalysisRequest) -> Result<String, ModelError>;
}

/// Calls the model with a per-attempt timeout and one retry on transient failure.
#[derive(Clone)]
pub struct AnalysisInvoker {
    model: Arc<dyn AnalysisModel>,
    timeout: Duration,
}

impl AnalysisInvoker {
    pub fn new(model: Arc<dyn AnalysisModel>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    pub async fn invoke(&self, request: &AnalysisRequest) -> Result<String, AnalysisError> {
        let mut attempt = 1;
        loop {
            info!(
                "Sending {} analysis request (attempt {}/{})",
                request.kind(),
                attempt,
                MAX_ATTEMPTS
            );

            match self.attempt(request).await {
                Ok(response) => {
                    info!("Model responded with {} characters", response.len());
                    return Ok(response);
                }
                Err(e) if e.is_transient() && attempt < MAX_ATTEMPTS => {
                    warn!("Transient model failure, retrying: {}", e);
                    attempt += 1;
                }
                Err(e) => {
                    error!("Model call failed: {}", e);
                    return Err(e);
                }
            }
        }
    }

    async fn attempt(&self, request: &AnalysisRequest) -> Result<String, AnalysisError> {
        match tokio::time::timeout(self.timeout, self.model.generate(request)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(AnalysisError::Timeout(self.timeout)),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted outcomes and records every request it receives.
    /// Once the script runs out the last outcome repeats.
    pub struct ScriptedModel {
        outcomes: Mutex<VecDeque<Result<String, ModelError>>>,
        last: Mutex<Result<String, ModelError>>,
        requests: Mutex<Vec<AnalysisRequest>>,
        delay: Option<Duration>,
    }

    impl ScriptedModel {
        pub fn new(outcomes: Vec<Result<String, ModelError>>) -> Self {
            let last = outcomes
                .last()
                .cloned()
                .unwrap_or_else(|| Ok(String::new()));
            Self {
                outcomes: Mutex::new(outcomes.into()),
                last: Mutex::new(last),
                requests: Mutex::new(Vec::new()),
                delay: None,
            }
        }

        pub fn replying(text: &str) -> Self {
            Self::new(vec![Ok(text.to_string())])
        }

        pub fn failing(error: ModelError) -> Self {
            Self::new(vec![Err(error)])
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn requests(&self) -> Vec<AnalysisRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl AnalysisModel for ScriptedModel {
        async fn generate(&self, request: &AnalysisRequest) -> Result<String, ModelError> {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let next = self.outcomes.lock().unwrap().pop_front();
            next.unwrap_or_else(|| self.last.lock().unwrap().clone())
        }
    }
}
