//! The memory store contract and its in-memory reference implementation.
//!
//! The kernel only ever talks to `dyn MemoryStore`; the in-memory variant is
//! both the prototype backend and the fixture all kernel tests run against.

use crate::types::{
    AffectiveRelation, ChatMessage, EpisodicAnchor, SemanticTriple, UserProfile, VolitionalPattern,
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use noema_core::math::cosine_similarity;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Predicates that mark a fact as an emotional relation worth surfacing at
/// recall time even without stored sentiment.
const AFFECTIVE_PREDICATES: &[&str] = &[
    "hates", "loves", "fears", "despises", "adores", "enjoys", "dislikes",
];

/// Everything the kernel needs to know about a user before a turn.
#[derive(Debug, Clone, Default)]
pub struct RecallContext {
    pub episodic: Vec<EpisodicAnchor>,
    pub semantic_facts: Vec<SemanticTriple>,
    pub volitional_patterns: Vec<VolitionalPattern>,
    pub chat_history: Vec<ChatMessage>,
    pub user_profile: Option<UserProfile>,
    /// Emotional relations relevant to response steering.
    pub affective_context: Vec<AffectiveRelation>,
    pub relevant_traits: Vec<String>,
}

/// Partial profile update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub preferred_mode: Option<String>,
    pub add_traits: Vec<String>,
}

#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Gather the full pre-turn context for a user.
    async fn recall_context(
        &self,
        user_id: i64,
        text: &str,
        session_id: &str,
        embedding: Option<&[f32]>,
    ) -> Result<RecallContext>;

    /// Upsert a triple: an existing (subject, predicate, object) absorbs the
    /// new observation instead of duplicating it.
    async fn save_semantic(&self, user_id: i64, triple: SemanticTriple) -> Result<()>;

    async fn save_episodic(&self, user_id: i64, anchor: EpisodicAnchor) -> Result<()>;

    /// Upsert a pattern: an existing (trigger, impulse, target) is reinforced
    /// instead of duplicated.
    async fn save_pattern(&self, user_id: i64, pattern: VolitionalPattern) -> Result<()>;

    /// Replace a pattern in place (fuel spend, deactivation).
    async fn update_pattern(&self, user_id: i64, pattern: VolitionalPattern) -> Result<()>;

    async fn save_chat_message(
        &self,
        user_id: i64,
        session_id: &str,
        role: &str,
        content: &str,
    ) -> Result<()>;

    async fn update_user_profile(&self, user_id: i64, update: ProfileUpdate) -> Result<()>;

    /// All semantic facts for a user (consolidation, bifurcation).
    async fn semantic_facts(&self, user_id: i64) -> Result<Vec<SemanticTriple>>;

    /// Replace the full semantic set (consolidation result).
    async fn replace_semantic_facts(&self, user_id: i64, facts: Vec<SemanticTriple>) -> Result<()>;

    /// All volitional patterns for a user, active or not.
    async fn volitional_patterns(&self, user_id: i64) -> Result<Vec<VolitionalPattern>>;

    /// High-intensity anchors, newest first.
    async fn emotional_anchors(&self, user_id: i64, limit: usize) -> Result<Vec<EpisodicAnchor>>;

    /// Bump the short-term consolidation counter; returns the new value.
    async fn increment_memory_load(&self, user_id: i64) -> Result<u32>;

    async fn reset_memory_load(&self, user_id: i64) -> Result<()>;
}

// ============================================================================
// In-memory reference implementation
// ============================================================================

#[derive(Default)]
struct UserSpace {
    semantic: Vec<SemanticTriple>,
    episodic: Vec<EpisodicAnchor>,
    patterns: Vec<VolitionalPattern>,
    profile: Option<UserProfile>,
    chats: HashMap<String, Vec<ChatMessage>>,
}

/// RAM-backed store. Mirrors the query contracts a database-backed
/// implementation must honor; used directly in tests and prototyping.
#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<i64, UserSpace>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn recall_context(
        &self,
        user_id: i64,
        text: &str,
        session_id: &str,
        embedding: Option<&[f32]>,
    ) -> Result<RecallContext> {
        let users = self.users.read().await;
        let Some(space) = users.get(&user_id) else {
            return Ok(RecallContext::default());
        };

        // Episodic recall: nearest by embedding when available, else recency.
        let episodic = match embedding {
            Some(query) => {
                let mut scored: Vec<(f32, &EpisodicAnchor)> = space
                    .episodic
                    .iter()
                    .map(|a| (cosine_similarity(query, &a.embedding), a))
                    .collect();
                scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
                scored.into_iter().take(3).map(|(_, a)| a.clone()).collect()
            }
            None => space.episodic.iter().rev().take(3).cloned().collect(),
        };

        // Semantic recall: substring relevance against the message text.
        let lowered = text.to_lowercase();
        let semantic_facts: Vec<SemanticTriple> = space
            .semantic
            .iter()
            .filter(|t| {
                lowered.contains(&t.object.to_lowercase())
                    || lowered.contains(&t.predicate.to_lowercase())
            })
            .cloned()
            .collect();

        // Affective relations are surfaced regardless of textual overlap:
        // the point is to warn generation about standing attitudes.
        let affective_context: Vec<AffectiveRelation> = space
            .semantic
            .iter()
            .filter(|t| {
                t.sentiment.map(|s| s.valence.abs() > 0.5).unwrap_or(false)
                    || AFFECTIVE_PREDICATES.contains(&t.predicate.to_lowercase().as_str())
            })
            .map(|t| AffectiveRelation {
                subject: t.subject.clone(),
                predicate: t.predicate.clone(),
                entity: t.object.clone(),
                valence: t.sentiment.map(|s| s.valence).unwrap_or_else(|| {
                    if matches!(
                        t.predicate.to_lowercase().as_str(),
                        "hates" | "fears" | "despises" | "dislikes"
                    ) {
                        -0.8
                    } else {
                        0.8
                    }
                }),
            })
            .collect();

        let volitional_patterns = space.patterns.iter().filter(|p| p.is_active).cloned().collect();

        let chat_history = space
            .chats
            .get(session_id)
            .map(|msgs| msgs.iter().rev().take(10).rev().cloned().collect())
            .unwrap_or_default();

        let relevant_traits = space
            .profile
            .as_ref()
            .map(|p| p.traits.clone())
            .unwrap_or_default();

        Ok(RecallContext {
            episodic,
            semantic_facts,
            volitional_patterns,
            chat_history,
            user_profile: space.profile.clone(),
            affective_context,
            relevant_traits,
        })
    }

    async fn save_semantic(&self, user_id: i64, triple: SemanticTriple) -> Result<()> {
        let mut users = self.users.write().await;
        let space = users.entry(user_id).or_default();
        if let Some(existing) = space.semantic.iter_mut().find(|t| t.key() == triple.key()) {
            existing.absorb(&triple);
        } else {
            tracing::debug!(
                "semantic fact saved: {} {} {}",
                triple.subject,
                triple.predicate,
                triple.object
            );
            space.semantic.push(triple);
        }
        Ok(())
    }

    async fn save_episodic(&self, user_id: i64, anchor: EpisodicAnchor) -> Result<()> {
        let mut users = self.users.write().await;
        users.entry(user_id).or_default().episodic.push(anchor);
        Ok(())
    }

    async fn save_pattern(&self, user_id: i64, pattern: VolitionalPattern) -> Result<()> {
        let mut users = self.users.write().await;
        let space = users.entry(user_id).or_default();
        if let Some(existing) = space.patterns.iter_mut().find(|p| p.key() == pattern.key()) {
            existing.reinforce(Utc::now());
        } else {
            tracing::debug!(
                "pattern learned: {} -> {} -> {}",
                pattern.trigger,
                pattern.impulse,
                pattern.target
            );
            space.patterns.push(pattern);
        }
        Ok(())
    }

    async fn update_pattern(&self, user_id: i64, pattern: VolitionalPattern) -> Result<()> {
        let mut users = self.users.write().await;
        let space = users.entry(user_id).or_default();
        if let Some(existing) = space.patterns.iter_mut().find(|p| p.id == pattern.id) {
            *existing = pattern;
        }
        Ok(())
    }

    async fn save_chat_message(
        &self,
        user_id: i64,
        session_id: &str,
        role: &str,
        content: &str,
    ) -> Result<()> {
        let mut users = self.users.write().await;
        users
            .entry(user_id)
            .or_default()
            .chats
            .entry(session_id.to_string())
            .or_default()
            .push(ChatMessage {
                role: role.to_string(),
                content: content.to_string(),
                created_at: Utc::now(),
            });
        Ok(())
    }

    async fn update_user_profile(&self, user_id: i64, update: ProfileUpdate) -> Result<()> {
        let mut users = self.users.write().await;
        let space = users.entry(user_id).or_default();
        let profile = space.profile.get_or_insert_with(|| UserProfile::new(user_id));
        if let Some(name) = update.name {
            profile.name = Some(name);
        }
        if let Some(mode) = update.preferred_mode {
            profile.preferred_mode = mode;
        }
        for t in update.add_traits {
            if !profile.traits.contains(&t) {
                profile.traits.push(t);
            }
        }
        Ok(())
    }

    async fn semantic_facts(&self, user_id: i64) -> Result<Vec<SemanticTriple>> {
        let users = self.users.read().await;
        Ok(users.get(&user_id).map(|s| s.semantic.clone()).unwrap_or_default())
    }

    async fn replace_semantic_facts(&self, user_id: i64, facts: Vec<SemanticTriple>) -> Result<()> {
        let mut users = self.users.write().await;
        users.entry(user_id).or_default().semantic = facts;
        Ok(())
    }

    async fn volitional_patterns(&self, user_id: i64) -> Result<Vec<VolitionalPattern>> {
        let users = self.users.read().await;
        Ok(users.get(&user_id).map(|s| s.patterns.clone()).unwrap_or_default())
    }

    async fn emotional_anchors(&self, user_id: i64, limit: usize) -> Result<Vec<EpisodicAnchor>> {
        let users = self.users.read().await;
        Ok(users
            .get(&user_id)
            .map(|s| {
                s.episodic
                    .iter()
                    .rev()
                    .filter(|a| a.is_emotionally_charged())
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn increment_memory_load(&self, user_id: i64) -> Result<u32> {
        let mut users = self.users.write().await;
        let space = users.entry(user_id).or_default();
        let profile = space.profile.get_or_insert_with(|| UserProfile::new(user_id));
        profile.short_term_memory_load += 1;
        Ok(profile.short_term_memory_load)
    }

    async fn reset_memory_load(&self, user_id: i64) -> Result<()> {
        let mut users = self.users.write().await;
        if let Some(profile) = users.entry(user_id).or_default().profile.as_mut() {
            profile.short_term_memory_load = 0;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noema_core::MoodVector;

    #[tokio::test]
    async fn test_semantic_upsert_no_duplicates() {
        let store = InMemoryStore::new();
        let mut first = SemanticTriple::new("User", "LIKES", "Rust");
        first.confidence = 0.6;
        let mut second = SemanticTriple::new("user", "likes", "rust");
        second.confidence = 0.9;

        store.save_semantic(1, first).await.unwrap();
        store.save_semantic(1, second).await.unwrap();

        let facts = store.semantic_facts(1).await.unwrap();
        assert_eq!(facts.len(), 1);
        assert!((facts[0].confidence - 0.9).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_sentiment_roundtrip_is_exact() {
        let store = InMemoryStore::new();
        let mut triple = SemanticTriple::new("User", "HATES", "Java");
        let sentiment = MoodVector::new(-0.85, 0.62, -0.1);
        triple.sentiment = Some(sentiment);
        store.save_semantic(7, triple).await.unwrap();

        let ctx = store
            .recall_context(7, "what about java then", "s1", None)
            .await
            .unwrap();
        let recalled = ctx.semantic_facts.iter().find(|t| t.object == "Java").unwrap();
        let got = recalled.sentiment.unwrap();
        assert_eq!(got.valence, sentiment.valence);
        assert_eq!(got.arousal, sentiment.arousal);
        assert_eq!(got.dominance, sentiment.dominance);
    }

    #[tokio::test]
    async fn test_affective_context_surfaces_attitudes() {
        let store = InMemoryStore::new();
        let mut triple = SemanticTriple::new("User", "HATES", "Java");
        triple.sentiment = Some(MoodVector::new(-0.9, 0.6, 0.0));
        store.save_semantic(7, triple).await.unwrap();

        // Recall with an unrelated message still surfaces the attitude.
        let ctx = store
            .recall_context(7, "what language should I use for backend?", "s1", None)
            .await
            .unwrap();
        assert_eq!(ctx.affective_context.len(), 1);
        assert_eq!(ctx.affective_context[0].entity, "Java");
        assert!(ctx.affective_context[0].valence < 0.0);
    }

    #[tokio::test]
    async fn test_pattern_upsert_reinforces() {
        let store = InMemoryStore::new();
        let pattern = VolitionalPattern::new("coding", "laziness", "project");
        let original_intensity = pattern.intensity;
        store.save_pattern(1, pattern.clone()).await.unwrap();
        store.save_pattern(1, pattern).await.unwrap();

        let patterns = store.volitional_patterns(1).await.unwrap();
        assert_eq!(patterns.len(), 1);
        assert!(patterns[0].intensity > original_intensity);
    }

    #[tokio::test]
    async fn test_episodic_recall_prefers_similar() {
        let store = InMemoryStore::new();
        for (text, emb) in [
            ("about rust", vec![1.0, 0.0]),
            ("about cooking", vec![0.0, 1.0]),
        ] {
            store
                .save_episodic(1, EpisodicAnchor::new(text, emb))
                .await
                .unwrap();
        }

        let ctx = store
            .recall_context(1, "anything", "s", Some(&[1.0, 0.05]))
            .await
            .unwrap();
        assert_eq!(ctx.episodic[0].raw_text, "about rust");
    }

    #[tokio::test]
    async fn test_memory_load_counter() {
        let store = InMemoryStore::new();
        assert_eq!(store.increment_memory_load(1).await.unwrap(), 1);
        assert_eq!(store.increment_memory_load(1).await.unwrap(), 2);
        store.reset_memory_load(1).await.unwrap();
        assert_eq!(store.increment_memory_load(1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_user_recalls_empty() {
        let store = InMemoryStore::new();
        let ctx = store.recall_context(404, "hello", "s", None).await.unwrap();
        assert!(ctx.semantic_facts.is_empty());
        assert!(ctx.user_profile.is_none());
    }
}
