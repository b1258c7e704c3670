//! The predict-verify ledger.
//!
//! Every generated response may carry a hypothesis about the user's next
//! utterance. The record is saved unverified and closed exactly once, by the
//! very next message in that session. The store enforces the verify-once
//! contract; the pipeline treats a second verification as a logged no-op.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: String,
    pub user_id: i64,
    pub session_id: String,
    /// The response we sent.
    pub bot_message: String,
    /// The reaction we expected it to provoke.
    pub predicted_reaction: String,
    pub predicted_embedding: Option<Vec<f32>>,
    pub actual_message: Option<String>,
    pub actual_embedding: Option<Vec<f32>>,
    pub prediction_error: Option<f32>,
    pub created_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
}

impl PredictionRecord {
    pub fn new(
        user_id: i64,
        session_id: impl Into<String>,
        bot_message: impl Into<String>,
        predicted_reaction: impl Into<String>,
        predicted_embedding: Option<Vec<f32>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            session_id: session_id.into(),
            bot_message: bot_message.into(),
            predicted_reaction: predicted_reaction.into(),
            predicted_embedding,
            actual_message: None,
            actual_embedding: None,
            prediction_error: None,
            created_at: Utc::now(),
            verified_at: None,
        }
    }

    pub fn is_verified(&self) -> bool {
        self.verified_at.is_some()
    }

    /// An open loop that resolved badly (or never resolved) is a "zeigarnik"
    /// re-engagement candidate.
    pub fn is_open_loop(&self) -> bool {
        match self.prediction_error {
            Some(e) => e >= 0.8,
            None => true,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("prediction {0} not found")]
    NotFound(String),
    #[error("prediction {0} is already verified")]
    AlreadyVerified(String),
}

#[async_trait]
pub trait PredictionStore: Send + Sync {
    async fn save_prediction(&self, record: PredictionRecord) -> Result<()>;

    /// The most recent unverified prediction for a session, if any.
    async fn last_unverified(&self, session_id: &str) -> Result<Option<PredictionRecord>>;

    /// Close a prediction with the observed outcome. Rejects double
    /// verification.
    async fn verify(
        &self,
        id: &str,
        actual_message: &str,
        actual_embedding: Option<Vec<f32>>,
        prediction_error: f32,
    ) -> Result<(), VerifyError>;

    /// Open loops for a user, newest first (zeigarnik candidates).
    async fn open_loops(&self, user_id: i64, limit: usize) -> Result<Vec<PredictionRecord>>;
}

/// RAM-backed prediction ledger.
#[derive(Default)]
pub struct InMemoryPredictionStore {
    records: RwLock<HashMap<String, Vec<PredictionRecord>>>,
}

impl InMemoryPredictionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PredictionStore for InMemoryPredictionStore {
    async fn save_prediction(&self, record: PredictionRecord) -> Result<()> {
        let mut records = self.records.write().await;
        records
            .entry(record.session_id.clone())
            .or_default()
            .push(record);
        Ok(())
    }

    async fn last_unverified(&self, session_id: &str) -> Result<Option<PredictionRecord>> {
        let records = self.records.read().await;
        Ok(records
            .get(session_id)
            .and_then(|v| v.iter().rev().find(|r| !r.is_verified()))
            .cloned())
    }

    async fn verify(
        &self,
        id: &str,
        actual_message: &str,
        actual_embedding: Option<Vec<f32>>,
        prediction_error: f32,
    ) -> Result<(), VerifyError> {
        let mut records = self.records.write().await;
        let record = records
            .values_mut()
            .flat_map(|v| v.iter_mut())
            .find(|r| r.id == id)
            .ok_or_else(|| VerifyError::NotFound(id.to_string()))?;

        if record.is_verified() {
            return Err(VerifyError::AlreadyVerified(id.to_string()));
        }

        record.actual_message = Some(actual_message.to_string());
        record.actual_embedding = actual_embedding;
        record.prediction_error = Some(prediction_error);
        record.verified_at = Some(Utc::now());
        Ok(())
    }

    async fn open_loops(&self, user_id: i64, limit: usize) -> Result<Vec<PredictionRecord>> {
        let records = self.records.read().await;
        let mut loops: Vec<PredictionRecord> = records
            .values()
            .flat_map(|v| v.iter())
            .filter(|r| r.user_id == user_id && r.is_verified() && r.is_open_loop())
            .cloned()
            .collect();
        loops.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        loops.truncate(limit);
        Ok(loops)
    }
}
