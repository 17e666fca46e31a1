//! Generation orchestration: prompt → model call → validation → retry.
//!
//! ## Retry Strategy
//!
//! The retry budget is exactly one, and it is reserved for *output-shape*
//! problems: malformed JSON, a missing top-level field, or unrecognized
//! slide types. Those are failures a stricter instruction can plausibly fix.
//! A transport failure of the model call is terminal immediately (retrying
//! an auth error or a dead endpoint with a reworded prompt fixes nothing),
//! and so is every business-rule violation, where the model produced
//! well-formed but non-compliant output. After the single retry, any
//! failure is terminal regardless of class.

use crate::config::GenerationRequest;
use crate::error::GenerationError;
use crate::post::StructuredPostOutput;
use crate::prompts::{build_carousel_prompt, STRICT_RETRY_SUFFIX};
use crate::validate::validate_model_response;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Failure of the external model-call collaborator.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ModelCallError {
    pub message: String,
}

impl ModelCallError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// External model-call collaborator: one prompt in, raw text out.
///
/// Implementations wrap whatever backend the host application uses; this
/// core never inspects anything but the returned text. Must be `Send + Sync`
/// so it can be shared behind an `Arc` across concurrent requests.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ModelCallError>;
}

/// Generate a validated carousel post for `request`.
///
/// Invokes the model once; on a *recoverable* validation failure, retries
/// exactly once with [`STRICT_RETRY_SUFFIX`] appended to the prompt. Returns
/// the first successful [`StructuredPostOutput`], or the classified error of
/// the attempt that ended the run.
pub async fn generate_post(
    client: &dyn ModelClient,
    request: &GenerationRequest,
) -> Result<StructuredPostOutput, GenerationError> {
    let prompt = build_carousel_prompt(request);
    info!(
        max_slides = request.max_slides(),
        prompt_len = prompt.len(),
        "starting carousel generation"
    );

    let raw = client
        .complete(&prompt)
        .await
        .map_err(|e| GenerationError::ModelCall { detail: e.message })?;
    debug!(response_len = raw.len(), "model responded");

    let first_failure = match validate_model_response(&raw, request.max_slides()) {
        Ok(post) => return Ok(post),
        Err(err) if err.is_recoverable() => err,
        Err(err) => {
            warn!(code = err.code(), "terminal validation failure, not retrying");
            return Err(err);
        }
    };

    warn!(
        code = first_failure.code(),
        "recoverable validation failure, retrying once with strict instruction"
    );

    let strict_prompt = format!("{prompt}{STRICT_RETRY_SUFFIX}");
    let raw = client
        .complete(&strict_prompt)
        .await
        .map_err(|e| GenerationError::ModelCall { detail: e.message })?;
    debug!(response_len = raw.len(), "model responded to retry");

    match validate_model_response(&raw, request.max_slides()) {
        Ok(post) => {
            info!(slides = post.slides.len(), "retry produced a valid post");
            Ok(post)
        }
        Err(err) => {
            warn!(code = err.code(), "retry failed, giving up");
            Err(err)
        }
    }
}
