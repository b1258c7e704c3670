//! VAD mood model (Valence-Arousal-Dominance).
//!
//! Mehrabian's three-dimensional extension of the circumplex model: instead of
//! discrete emotion labels, the kernel's mood is a point in a continuous cube.
//! Dominance is what separates rage (dominant) from fear (submissive) at the
//! same valence/arousal.

use crate::sanitize_f32;
use crate::signal::AgentKind;
use serde::{Deserialize, Serialize};

/// Mood inertia: how much of the previous mood survives each turn.
const MOOD_INERTIA: f32 = 0.7;

/// Force of a decisive winner (score > 4.0) vs a weak one.
const FORCE_STRONG: f32 = 0.3;
const FORCE_WEAK: f32 = 0.05;

/// A point in VAD space; every axis is bounded to [-1.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoodVector {
    pub valence: f32,
    pub arousal: f32,
    pub dominance: f32,
}

impl Default for MoodVector {
    fn default() -> Self {
        // Slightly positive, slightly activated, neutral dominance.
        Self {
            valence: 0.1,
            arousal: 0.1,
            dominance: 0.0,
        }
    }
}

impl MoodVector {
    pub fn new(valence: f32, arousal: f32, dominance: f32) -> Self {
        Self {
            valence: valence.clamp(-1.0, 1.0),
            arousal: arousal.clamp(-1.0, 1.0),
            dominance: dominance.clamp(-1.0, 1.0),
        }
    }

    /// Clamp all axes and scrub non-finite values.
    pub fn normalize(&mut self) {
        self.valence = sanitize_f32(self.valence, 0.0).clamp(-1.0, 1.0);
        self.arousal = sanitize_f32(self.arousal, 0.0).clamp(-1.0, 1.0);
        self.dominance = sanitize_f32(self.dominance, 0.0).clamp(-1.0, 1.0);
    }

    /// Blend the winning agent's fixed impact into the mood with inertia:
    /// `mood = mood * 0.7 + impact * force`.
    ///
    /// A weak winner (score <= 4.0) barely moves the mood; a decisive one
    /// pulls it with force 0.3.
    pub fn apply_winner(&mut self, winner: AgentKind, winner_score: f32) {
        let impact = Self::agent_impact(winner);
        let force = if winner_score > 4.0 {
            FORCE_STRONG
        } else {
            FORCE_WEAK
        };
        self.valence = self.valence * MOOD_INERTIA + impact.valence * force;
        self.arousal = self.arousal * MOOD_INERTIA + impact.arousal * force;
        self.dominance = self.dominance * MOOD_INERTIA + impact.dominance * force;
        self.normalize();
    }

    /// Fixed VAD impact vector per agent kind.
    ///
    /// These are tuning constants, not learned values: an Amygdala win feels
    /// bad, activated and confrontational; a Social win feels warm and calm;
    /// an Uncertainty win is the mildly unpleasant submissive confusion of
    /// losing the thread.
    pub fn agent_impact(agent: AgentKind) -> MoodVector {
        match agent {
            AgentKind::Amygdala => MoodVector::new(-0.6, 0.8, 0.5),
            AgentKind::Striatum => MoodVector::new(0.7, 0.6, 0.2),
            AgentKind::Social => MoodVector::new(0.6, -0.2, 0.1),
            AgentKind::Prefrontal => MoodVector::new(0.1, -0.3, 0.2),
            AgentKind::Intuition => MoodVector::new(0.2, 0.1, 0.0),
            AgentKind::Uncertainty => MoodVector::new(-0.2, 0.4, -0.4),
        }
    }

    /// Is the current mood fear-like: activated but submissive?
    pub fn is_fearful(&self) -> bool {
        self.arousal > 0.6 && self.dominance < -0.3
    }

    /// Is the current mood triumphant: activated and dominant?
    pub fn is_triumphant(&self) -> bool {
        self.arousal > 0.6 && self.dominance > 0.3
    }
}
