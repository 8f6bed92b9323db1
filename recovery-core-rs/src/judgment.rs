//! Structured-judgment capability used by the delegated pipeline stages.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Failure of the external judgment service. Never retried by the core.
#[derive(Debug, Error)]
pub enum JudgmentServiceError {
    #[error("judgment service is not configured: {0}")]
    Misconfigured(String),

    #[error("judgment service unavailable: {0}")]
    Unavailable(String),

    #[error("judgment response does not match the expected schema: {0}")]
    InvalidResponse(String),
}

impl JudgmentServiceError {
    pub fn invalid_response<S: Into<String>>(message: S) -> Self {
        Self::InvalidResponse(message.into())
    }

    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn misconfigured<S: Into<String>>(message: S) -> Self {
        Self::Misconfigured(message.into())
    }
}

/// Given a system instruction, a user prompt and a JSON schema hint, return
/// one JSON object that should conform to the hint.
#[async_trait]
pub trait JudgmentService: Send + Sync {
    async fn judge(
        &self,
        system: &str,
        user: &str,
        schema_hint: &str,
    ) -> Result<Value, JudgmentServiceError>;
}

#[async_trait]
impl<J: JudgmentService + ?Sized> JudgmentService for Arc<J> {
    async fn judge(
        &self,
        system: &str,
        user: &str,
        schema_hint: &str,
    ) -> Result<Value, JudgmentServiceError> {
        (**self).judge(system, user, schema_hint).await
    }
}
