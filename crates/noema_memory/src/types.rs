//! Long-term memory records.

use chrono::{DateTime, Utc};
use noema_core::MoodVector;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A fact as a (subject, predicate, object) triple.
/// Example: (User, LIKES, Python).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticTriple {
    pub subject: String,
    pub predicate: String,
    pub object: String,
    /// 0.0 to 1.0.
    pub confidence: f32,
    pub source_message_id: Option<String>,
    /// Emotional charge of the fact, when it carries one ("User HATES Java").
    pub sentiment: Option<MoodVector>,
    pub embedding: Option<Vec<f32>>,
}

impl SemanticTriple {
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            confidence: 1.0,
            source_message_id: None,
            sentiment: None,
            embedding: None,
        }
    }

    /// Identity for upsert purposes.
    pub fn key(&self) -> (String, String, String) {
        (
            self.subject.to_lowercase(),
            self.predicate.to_lowercase(),
            self.object.to_lowercase(),
        )
    }

    /// Merge a newer observation of the same triple: confidence rises to the
    /// max of the two, sentiment and embedding are filled only if missing.
    pub fn absorb(&mut self, other: &SemanticTriple) {
        self.confidence = self.confidence.max(other.confidence);
        if self.sentiment.is_none() {
            self.sentiment = other.sentiment;
        }
        if self.embedding.is_none() {
            self.embedding = other.embedding.clone();
        }
    }
}

/// A key memory moment, stored with its emotional charge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodicAnchor {
    pub id: String,
    pub raw_text: String,
    pub embedding: Vec<f32>,
    /// Valence of the moment, -1.0 to 1.0.
    pub valence: f32,
    /// Activation of the moment, 0.0 to 1.0.
    pub arousal: f32,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl EpisodicAnchor {
    pub fn new(raw_text: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            raw_text: raw_text.into(),
            embedding,
            valence: 0.0,
            arousal: 0.0,
            tags: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// High-intensity anchors are bifurcation candidates.
    pub fn is_emotionally_charged(&self) -> bool {
        self.valence.abs() > 0.7 || self.arousal > 0.7
    }
}

/// A learned behavioral pattern: trigger → impulse → target.
///
/// Patterns are reinforced on repeat detection and decay with disuse; they
/// are never hard-deleted, only deactivated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolitionalPattern {
    pub id: String,
    pub trigger: String,
    pub impulse: String,
    pub target: String,
    pub goal: String,
    /// Learned strength of the pattern, 0.0 to 1.0.
    pub intensity: f32,
    /// Motivational reserve, 0.0 to 1.0 — distinct from intensity.
    pub fuel: f32,
    /// Reinforcement-learning correction on top of intensity, -1.0 to 1.0.
    pub learned_delta: f32,
    pub turns_active: u32,
    pub last_novelty_turn: u32,
    pub is_active: bool,
    /// Effective-score penalty per day of disuse.
    pub decay_rate: f32,
    pub reinforcement_rate: f32,
    /// Fuel spent each turn the pattern drives the conversation.
    pub energy_cost: f32,
    pub resolution_strategy: String,
    pub conflict_detected: bool,
    pub action_taken: String,
    pub last_activated_at: DateTime<Utc>,
}

impl VolitionalPattern {
    pub fn new(
        trigger: impl Into<String>,
        impulse: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            trigger: trigger.into(),
            impulse: impulse.into(),
            target: target.into(),
            goal: String::new(),
            intensity: 0.5,
            fuel: 1.0,
            learned_delta: 0.0,
            turns_active: 0,
            last_novelty_turn: 0,
            is_active: true,
            decay_rate: 0.1,
            reinforcement_rate: 0.1,
            energy_cost: 0.1,
            resolution_strategy: String::new(),
            conflict_detected: false,
            action_taken: String::new(),
            last_activated_at: Utc::now(),
        }
    }

    /// Identity for upsert purposes.
    pub fn key(&self) -> (String, String, String) {
        (
            self.trigger.to_lowercase(),
            self.impulse.to_lowercase(),
            self.target.to_lowercase(),
        )
    }

    /// Reinforce on repeat detection: intensity grows logistically
    /// (diminishing returns near both ends), the learned correction climbs,
    /// and fuel is restored.
    pub fn reinforce(&mut self, now: DateTime<Utc>) {
        self.intensity = (self.intensity
            + self.reinforcement_rate * self.intensity * (1.0 - self.intensity))
            .clamp(0.0, 1.0);
        self.learned_delta = (self.learned_delta + self.reinforcement_rate).clamp(-1.0, 1.0);
        self.fuel = (self.fuel + 0.3).min(1.0);
        self.last_activated_at = now;
    }

    /// Effective-score penalty accrued since the last activation.
    pub fn decay_penalty(&self, now: DateTime<Utc>) -> f32 {
        let days = (now - self.last_activated_at).num_seconds().max(0) as f32 / 86_400.0;
        days * self.decay_rate
    }

    /// Spend fuel for one turn of driving the conversation.
    pub fn spend_fuel(&mut self) {
        self.fuel = (self.fuel - self.energy_cost).max(0.0);
    }
}

/// One line of chat history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Per-user long-term profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: i64,
    pub name: Option<String>,
    /// "formal" or "informal" address.
    pub preferred_mode: String,
    /// Self-disclosed identity facts ("vegetarian", "backend developer").
    pub traits: Vec<String>,
    /// Episodes since the last consolidation pass.
    pub short_term_memory_load: u32,
}

impl UserProfile {
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            name: None,
            preferred_mode: "formal".to_string(),
            traits: Vec::new(),
            short_term_memory_load: 0,
        }
    }
}

/// An emotional attitude toward a named entity, surfaced at recall time so
/// response generation can steer around (or into) it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffectiveRelation {
    pub subject: String,
    pub predicate: String,
    pub entity: String,
    /// Signed strength: negative for aversion, positive for affinity.
    pub valence: f32,
}
