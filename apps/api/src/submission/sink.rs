//! Submission sink — where a committed payload goes.
//!
//! Default: `LogSink` renders the payload to the log for inspection.
//! A network-backed sink can replace it without touching the handlers.
//!
//! `AppState` holds an `Arc<dyn SubmissionSink>`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::transformer::SubmissionPayload;
use crate::errors::AppError;

/// Acknowledgement returned once a payload has been handed off.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub submission_id: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub sink: String, // "log" | future backends
}

#[async_trait]
pub trait SubmissionSink: Send + Sync {
    async fn deliver(&self, payload: &SubmissionPayload) -> Result<SubmissionReceipt, AppError>;
}

pub struct LogSink;

#[async_trait]
impl SubmissionSink for LogSink {
    async fn deliver(&self, payload: &SubmissionPayload) -> Result<SubmissionReceipt, AppError> {
        let rendered = serde_json::to_string_pretty(payload)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to render payload: {e}")))?;
        let receipt = SubmissionReceipt {
            submission_id: Uuid::new_v4(),
            submitted_at: Utc::now(),
            sink: "log".to_string(),
        };
        info!(
            submission_id = %receipt.submission_id,
            entries = payload.experience.len(),
            "Applicant submission received:\n{rendered}"
        );
        Ok(receipt)
    }
}
