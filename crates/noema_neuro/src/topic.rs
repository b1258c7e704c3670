//! Topic engagement tracking.
//!
//! Tracks whether the conversation is still "about the same thing" (a rolling
//! centroid of message embeddings) and how much patience remains for it (TEC,
//! the Topic Engagement Capacity). When similarity to the centroid collapses,
//! the topic has changed and patience resets to full; otherwise TEC decays at
//! a rate set by the topic's intent category and the quality of the exchange.

use noema_core::math::{cosine_similarity, normalize};
use noema_core::phatic::{default_phatic_predicate, PhaticPredicate};
use serde::{Deserialize, Serialize};

/// Similarity to the centroid below which the topic is considered changed.
const TOPIC_CHANGE_SIMILARITY: f32 = 0.40;
/// Word count at which a message counts as fully dense.
const DENSITY_SPAN: f32 = 50.0;

/// Conversational register of the current topic, as reported by the
/// volitional detector when the topic was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentCategory {
    Phatic,
    #[default]
    Casual,
    Narrative,
    Deep,
    Task,
}

impl IntentCategory {
    /// Per-turn base TEC decay. Small talk burns patience fast; a concrete
    /// task holds it indefinitely.
    pub fn base_decay(&self) -> f32 {
        match self {
            IntentCategory::Phatic => 1.0,
            IntentCategory::Casual => 0.4,
            IntentCategory::Narrative => 0.15,
            IntentCategory::Deep => 0.05,
            IntentCategory::Task => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IntentCategory::Phatic => "phatic",
            IntentCategory::Casual => "casual",
            IntentCategory::Narrative => "narrative",
            IntentCategory::Deep => "deep",
            IntentCategory::Task => "task",
        }
    }

    /// Parse a detector label; unknown labels default to Casual.
    pub fn parse(label: &str) -> Self {
        match label.to_lowercase().as_str() {
            "phatic" => IntentCategory::Phatic,
            "narrative" => IntentCategory::Narrative,
            "deep" => IntentCategory::Deep,
            "task" => IntentCategory::Task,
            _ => IntentCategory::Casual,
        }
    }
}

/// Current topic snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicState {
    /// Running unit-length centroid of the topic's message embeddings.
    pub centroid: Vec<f32>,
    /// The message that opened the topic, for diagnostics.
    pub topic_text: String,
    /// Topic Engagement Capacity: remaining patience, 0.0 to 1.0.
    pub tec: f32,
    pub turns_on_topic: u32,
    /// Number of centroid-contributing messages since the last reset.
    pub messages_in_topic: u32,
    pub intent: IntentCategory,
    pub last_prediction_error: f32,
}

/// Outcome of one observation, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicUpdate {
    /// Phatic or embedding-less message: topic-neutral, nothing changed.
    Skipped,
    /// Topic changed; TEC and centroid were reset.
    Reset,
    /// Same topic; centroid updated and TEC decayed.
    Continued,
}

/// Rolling topic tracker. One per kernel instance.
pub struct TopicTracker {
    state: Option<TopicState>,
    is_phatic: PhaticPredicate,
}

impl Default for TopicTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl TopicTracker {
    pub fn new() -> Self {
        Self {
            state: None,
            is_phatic: default_phatic_predicate,
        }
    }

    /// Replace the phatic heuristic (the boundary is tunable without touching
    /// the pipeline).
    pub fn with_phatic_predicate(predicate: PhaticPredicate) -> Self {
        Self {
            state: None,
            is_phatic: predicate,
        }
    }

    /// Observe one message and update the topic state.
    ///
    /// Phatic messages bypass similarity entirely: a one-word "ок" must not
    /// read as a topic change, and it does not contribute to the centroid or
    /// its counter.
    pub fn observe(
        &mut self,
        text: &str,
        embedding: Option<&[f32]>,
        detected_intent: IntentCategory,
        prediction_error: f32,
    ) -> TopicUpdate {
        if (self.is_phatic)(text) {
            return TopicUpdate::Skipped;
        }
        let Some(embedding) = embedding else {
            // Missing embedding is a data inconsistency: treat as no signal.
            tracing::warn!("topic observation without embedding, skipping");
            return TopicUpdate::Skipped;
        };

        let changed = match &self.state {
            None => true,
            Some(state) => {
                cosine_similarity(embedding, &state.centroid) < TOPIC_CHANGE_SIMILARITY
            }
        };

        if changed {
            let mut centroid = embedding.to_vec();
            normalize(&mut centroid);
            self.state = Some(TopicState {
                centroid,
                topic_text: text.chars().take(120).collect(),
                tec: 1.0,
                turns_on_topic: 1,
                messages_in_topic: 1,
                intent: detected_intent,
                last_prediction_error: prediction_error,
            });
            return TopicUpdate::Reset;
        }

        let state = self.state.as_mut().expect("checked above");

        // Incremental centroid mean, renormalized.
        let n = state.messages_in_topic as f32;
        for (c, x) in state.centroid.iter_mut().zip(embedding) {
            *c = (*c * n + x) / (n + 1.0);
        }
        normalize(&mut state.centroid);
        state.messages_in_topic += 1;
        state.turns_on_topic += 1;
        state.last_prediction_error = prediction_error;

        // Patience decay: good predictions and dense replies slow it down.
        let words = text.split_whitespace().count() as f32;
        let density = (words / DENSITY_SPAN).min(1.0);
        let situational = (0.5 + (1.0 - prediction_error.clamp(0.0, 1.0)) * 0.5) * (2.0 - density);
        state.tec = (state.tec - state.intent.base_decay() * situational).max(0.0);

        TopicUpdate::Continued
    }

    /// Remaining patience for the current topic; a fresh kernel starts fully
    /// engaged.
    pub fn tec(&self) -> f32 {
        self.state.as_ref().map(|s| s.tec).unwrap_or(1.0)
    }

    pub fn state(&self) -> Option<&TopicState> {
        self.state.as_ref()
    }

    pub fn intent(&self) -> IntentCategory {
        self.state.as_ref().map(|s| s.intent).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Orthogonal unit vectors: guaranteed topic change.
    fn e1() -> Vec<f32> {
        vec![1.0, 0.0, 0.0]
    }
    fn e2() -> Vec<f32> {
        vec![0.0, 1.0, 0.0]
    }

    const LONG_A: &str = "let me tell you about the parser generator I have been building";
    const LONG_B: &str = "completely unrelated: what do you think about winter hiking gear";

    #[test]
    fn test_first_message_resets() {
        let mut t = TopicTracker::new();
        let update = t.observe(LONG_A, Some(&e1()), IntentCategory::Deep, 0.0);
        assert_eq!(update, TopicUpdate::Reset);
        assert_eq!(t.tec(), 1.0);
        assert_eq!(t.state().unwrap().messages_in_topic, 1);
    }

    #[test]
    fn test_dissimilar_message_resets_again() {
        let mut t = TopicTracker::new();
        t.observe(LONG_A, Some(&e1()), IntentCategory::Deep, 0.0);
        let update = t.observe(LONG_B, Some(&e2()), IntentCategory::Casual, 0.0);
        assert_eq!(update, TopicUpdate::Reset);
        assert_eq!(t.tec(), 1.0);
        assert_eq!(t.intent(), IntentCategory::Casual);
    }

    #[test]
    fn test_same_topic_decays_tec() {
        let mut t = TopicTracker::new();
        t.observe(LONG_A, Some(&e1()), IntentCategory::Casual, 0.0);
        let update = t.observe(LONG_A, Some(&e1()), IntentCategory::Casual, 0.0);
        assert_eq!(update, TopicUpdate::Continued);
        assert!(t.tec() < 1.0);
        assert_eq!(t.state().unwrap().messages_in_topic, 2);
    }

    #[test]
    fn test_tec_monotone_and_floored() {
        let mut t = TopicTracker::new();
        t.observe(LONG_A, Some(&e1()), IntentCategory::Casual, 0.0);
        let mut prev = t.tec();
        for _ in 0..10 {
            t.observe(LONG_A, Some(&e1()), IntentCategory::Casual, 0.5);
            let tec = t.tec();
            assert!(tec <= prev, "TEC must not increase within a topic");
            assert!(tec >= 0.0, "TEC must be floored at zero");
            prev = tec;
        }
        assert_eq!(prev, 0.0);
    }

    #[test]
    fn test_task_topic_never_decays() {
        let mut t = TopicTracker::new();
        t.observe(LONG_A, Some(&e1()), IntentCategory::Task, 0.0);
        for _ in 0..5 {
            t.observe(LONG_A, Some(&e1()), IntentCategory::Task, 0.9);
        }
        assert_eq!(t.tec(), 1.0);
    }

    #[test]
    fn test_phatic_never_resets_or_counts() {
        let mut t = TopicTracker::new();
        t.observe(LONG_A, Some(&e1()), IntentCategory::Deep, 0.0);
        let tec_before = t.tec();

        for filler in ["ок", "да", "ok", "👍"] {
            // Even with a wildly different embedding, a filler is neutral.
            let update = t.observe(filler, Some(&e2()), IntentCategory::Phatic, 0.9);
            assert_eq!(update, TopicUpdate::Skipped, "'{}' must be skipped", filler);
        }
        assert_eq!(t.tec(), tec_before);
        assert_eq!(t.state().unwrap().messages_in_topic, 1);
        assert_eq!(t.intent(), IntentCategory::Deep);
    }

    #[test]
    fn test_missing_embedding_is_skipped() {
        let mut t = TopicTracker::new();
        let update = t.observe(LONG_A, None, IntentCategory::Deep, 0.0);
        assert_eq!(update, TopicUpdate::Skipped);
        assert!(t.state().is_none());
    }

    #[test]
    fn test_centroid_moves_toward_new_messages() {
        let mut t = TopicTracker::new();
        t.observe(LONG_A, Some(&e1()), IntentCategory::Deep, 0.0);
        // Similar but not identical direction (cos = 0.707 > 0.40).
        let drift = vec![0.7, 0.7, 0.0];
        t.observe(LONG_A, Some(&drift), IntentCategory::Deep, 0.0);
        let centroid = &t.state().unwrap().centroid;
        assert!(centroid[1] > 0.0, "centroid should drift toward new mass");
        let norm: f32 = centroid.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5, "centroid stays unit length");
    }

    #[test]
    fn test_surprise_slows_decay() {
        // A surprising exchange (high prediction error) halves the
        // situational multiplier: novelty sustains patience.
        let mut predictable = TopicTracker::new();
        predictable.observe(LONG_A, Some(&e1()), IntentCategory::Casual, 0.0);
        predictable.observe(LONG_A, Some(&e1()), IntentCategory::Casual, 0.0);

        let mut surprising = TopicTracker::new();
        surprising.observe(LONG_A, Some(&e1()), IntentCategory::Casual, 0.0);
        surprising.observe(LONG_A, Some(&e1()), IntentCategory::Casual, 1.0);

        assert!(predictable.tec() < surprising.tec());
    }
}
