//! Message envelopes exchanged with transport collaborators, and the stable
//! diagnostic record every processed turn emits.

use crate::hormones::HormonalState;
use crate::mood::MoodVector;
use crate::signal::AgentKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// One user message as delivered by a transport collaborator.
/// Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub message_id: String,
    pub user_id: i64,
    pub session_id: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Opaque transport metadata (chat id, platform flags, ...).
    #[serde(default)]
    pub channel_meta: serde_json::Value,
}

impl IncomingMessage {
    pub fn new(user_id: i64, session_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            user_id,
            session_id: session_id.into(),
            text: text.into(),
            timestamp: Utc::now(),
            channel_meta: serde_json::Value::Null,
        }
    }
}

/// Which path the caller requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelMode {
    /// Full architecture: council, hormones, prediction loop.
    Cortical,
    /// Degraded reflex path: one direct oracle call, no state updates.
    Reflex,
}

/// Which path the kernel actually took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingMode {
    FastPath,
    SlowPath,
}

/// An outward action the transport should perform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum CoreAction {
    SendText { text: String },
}

/// Full result of one processed turn.
#[derive(Debug, Clone, Serialize)]
pub struct CoreResponse {
    pub actions: Vec<CoreAction>,
    pub winning_agent: AgentKind,
    pub current_mood: MoodVector,
    pub current_hormones: HormonalState,
    pub processing_mode: ProcessingMode,
    pub internal_stats: InternalStats,
}

/// Stable per-turn diagnostic record for logging/telemetry collaborators.
///
/// The key set of the serialized form is part of the external contract:
/// dashboards key on these names, so fields are only ever added, never
/// renamed or removed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InternalStats {
    pub latency_ms: u64,
    pub winner: Option<AgentKind>,
    pub winner_score: f32,
    pub winner_rationale: String,
    /// Post-modulation score per agent, keyed by wire name (sorted map for
    /// deterministic serialization).
    pub all_scores: BTreeMap<String, f32>,
    pub mood: Option<MoodVector>,
    pub hormones: Option<HormonalState>,
    pub archetype: String,
    pub prediction_error: f32,
    pub surprise_impact: f32,
    pub tec: f32,
    pub lc_mode: String,
    pub intent: String,
    pub strategy: String,
    pub volition_selected: Option<String>,
    pub bifurcation: Option<String>,
    pub sentiment_context_used: bool,
    pub chaos_level: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incoming_message_ids_are_unique() {
        let a = IncomingMessage::new(1, "s", "hello");
        let b = IncomingMessage::new(1, "s", "hello");
        assert_ne!(a.message_id, b.message_id);
    }

    #[test]
    fn test_core_action_wire_format() {
        let action = CoreAction::SendText {
            text: "hi".to_string(),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "send_text");
        assert_eq!(json["payload"]["text"], "hi");
    }

    #[test]
    fn test_internal_stats_key_set_is_stable() {
        // Contract check: these keys feed external dashboards.
        let stats = InternalStats::default();
        let json = serde_json::to_value(&stats).unwrap();
        for key in [
            "latency_ms",
            "winner",
            "winner_score",
            "all_scores",
            "mood",
            "hormones",
            "archetype",
            "prediction_error",
            "surprise_impact",
            "tec",
            "lc_mode",
            "intent",
            "strategy",
            "volition_selected",
            "bifurcation",
            "sentiment_context_used",
            "chaos_level",
        ] {
            assert!(json.get(key).is_some(), "missing stats key: {}", key);
        }
    }
}
