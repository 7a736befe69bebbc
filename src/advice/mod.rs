//! Fabric and sewing advice from an external text-generation service.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backon::{ConstantBuilder, Retryable};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{MeasurementField, Measurements};

pub mod gemini;
pub mod tracker;

pub use gemini::GeminiClient;
pub use tracker::{AdviceTicket, AdviceTracker};

/// Shown whenever no advice could be obtained.
pub const FALLBACK_ADVICE: &str =
    "متأسفانه در حال حاضر امکان دریافت مشاوره وجود ندارد. لطفاً اتصال اینترنت را بررسی کرده و دوباره تلاش کنید.";

/// Pause before the single retry of a failed attempt.
const RETRY_DELAY: Duration = Duration::from_millis(500);

pub const DEFAULT_GARMENT: &str = "men's shirt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gender {
    #[default]
    Male,
    Female,
    Child,
}

impl Gender {
    pub fn next(self) -> Self {
        match self {
            Gender::Male => Gender::Female,
            Gender::Female => Gender::Child,
            Gender::Child => Gender::Male,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Child => "child",
        };
        f.write_str(label)
    }
}

/// Everything the advisor needs to know about one garment.
#[derive(Debug, Clone, PartialEq)]
pub struct AdviceRequest {
    pub garment: String,
    pub gender: Gender,
    pub measurements: Measurements,
}

#[derive(Debug, Error)]
pub enum AdviceError {
    #[error("no API key configured for the advice service")]
    MissingApiKey,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("service returned no text")]
    EmptyResponse,

    #[error("no answer within {0:?}")]
    Timeout(Duration),
}

impl AdviceError {
    /// Whether a second attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            AdviceError::MissingApiKey => false,
            AdviceError::Status { status, .. } => *status == 429 || *status >= 500,
            AdviceError::Http(_) | AdviceError::EmptyResponse | AdviceError::Timeout(_) => true,
        }
    }
}

/// A service that turns a prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AdviceError>;
}

/// Build the prompt sent to the advisor.
pub fn build_prompt(request: &AdviceRequest) -> String {
    let m = &request.measurements;
    let mut prompt = format!(
        "You are an experienced master tailor. A client needs a {} ({}).\n\
         Their measurements in centimetres are:\n",
        request.garment.trim(),
        request.gender,
    );

    for field in MeasurementField::ALL {
        let value = m.get(field).unwrap_or("not measured");
        prompt.push_str(&format!("- {}: {}\n", field.label(), value));
    }
    if let Some(notes) = &m.notes {
        prompt.push_str(&format!("- Notes: {}\n", notes));
    }

    prompt.push_str(
        "\nEstimate how much fabric to buy (standard 1.5 m width), suggest suitable \
         fabrics, and give short practical sewing tips for these measurements. \
         Answer in Persian, using brief Markdown headings and bullet points.",
    );
    prompt
}

/// Sends advice requests with a per-attempt timeout and one retry.
pub struct AdviceRequester {
    generator: Arc<dyn TextGenerator>,
    timeout: Duration,
}

impl AdviceRequester {
    pub fn new(generator: Arc<dyn TextGenerator>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    /// Ask for advice. Never fails: any error becomes [`FALLBACK_ADVICE`].
    pub async fn request(&self, request: &AdviceRequest) -> String {
        match self.try_request(request).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "advice request failed");
                FALLBACK_ADVICE.to_string()
            }
        }
    }

    pub async fn try_request(&self, request: &AdviceRequest) -> Result<String, AdviceError> {
        let prompt = build_prompt(request);
        debug!(garment = %request.garment, gender = %request.gender, "requesting advice");

        (|| self.attempt(&prompt))
            .retry(
                ConstantBuilder::default()
                    .with_delay(RETRY_DELAY)
                    .with_max_times(1),
            )
            .when(AdviceError::is_retryable)
            .notify(|e, delay| warn!(error = %e, ?delay, "advice attempt failed, retrying once"))
            .await
    }

    async fn attempt(&self, prompt: &str) -> Result<String, AdviceError> {
        let text = tokio::time::timeout(self.timeout, self.generator.generate(prompt))
            .await
            .map_err(|_| AdviceError::Timeout(self.timeout))??;

        if text.trim().is_empty() {
            return Err(AdviceError::EmptyResponse);
        }
        Ok(text)
    }
}
