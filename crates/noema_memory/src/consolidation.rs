//! Background memory consolidation ("hippocampus").
//!
//! Runs off the response path: the kernel fires it per turn and never waits
//! for it. When a user's short-term load counter reaches the threshold, the
//! pass compacts semantic memory and maintains volitional patterns, then
//! resets the counter.

use crate::store::MemoryStore;
use crate::types::SemanticTriple;
use anyhow::Result;
use chrono::Utc;
use std::collections::HashMap;

/// Episodes between consolidation passes.
pub const CONSOLIDATION_THRESHOLD: u32 = 10;

/// A pattern whose effective strength falls below this is deactivated.
const PATTERN_FLOOR: f32 = 0.05;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ConsolidationReport {
    pub ran: bool,
    pub facts_merged: usize,
    pub patterns_deactivated: usize,
}

/// Bump the user's load counter and consolidate if it crossed the threshold.
pub async fn maybe_consolidate(
    store: &dyn MemoryStore,
    user_id: i64,
) -> Result<ConsolidationReport> {
    let load = store.increment_memory_load(user_id).await?;
    if load < CONSOLIDATION_THRESHOLD {
        return Ok(ConsolidationReport::default());
    }
    let report = consolidate(store, user_id).await?;
    store.reset_memory_load(user_id).await?;
    Ok(report)
}

/// One full consolidation pass: deduplicate triples, decay stale patterns.
pub async fn consolidate(store: &dyn MemoryStore, user_id: i64) -> Result<ConsolidationReport> {
    let mut report = ConsolidationReport {
        ran: true,
        ..Default::default()
    };

    // Task 1: merge exact-duplicate triples, keeping max confidence and any
    // sentiment/embedding either copy carries.
    let facts = store.semantic_facts(user_id).await?;
    let before = facts.len();
    let mut merged: HashMap<(String, String, String), SemanticTriple> = HashMap::new();
    for fact in facts {
        match merged.get_mut(&fact.key()) {
            Some(existing) => existing.absorb(&fact),
            None => {
                merged.insert(fact.key(), fact);
            }
        }
    }
    report.facts_merged = before - merged.len();
    if report.facts_merged > 0 {
        store
            .replace_semantic_facts(user_id, merged.into_values().collect())
            .await?;
    }

    // Task 2: deactivate patterns that decayed to nothing. Soft delete only;
    // history stays queryable.
    let now = Utc::now();
    for mut pattern in store.volitional_patterns(user_id).await? {
        if !pattern.is_active {
            continue;
        }
        let effective = pattern.intensity + pattern.learned_delta - pattern.decay_penalty(now);
        if effective < PATTERN_FLOOR {
            pattern.is_active = false;
            report.patterns_deactivated += 1;
            store.update_pattern(user_id, pattern).await?;
        }
    }

    tracing::info!(
        user_id,
        facts_merged = report.facts_merged,
        patterns_deactivated = report.patterns_deactivated,
        "consolidation pass complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use crate::types::VolitionalPattern;
    use chrono::Duration;
    use noema_core::MoodVector;

    #[tokio::test]
    async fn test_consolidation_waits_for_threshold() {
        let store = InMemoryStore::new();
        for _ in 0..CONSOLIDATION_THRESHOLD - 1 {
            let report = maybe_consolidate(&store, 1).await.unwrap();
            assert!(!report.ran);
        }
        let report = maybe_consolidate(&store, 1).await.unwrap();
        assert!(report.ran);

        // Counter was reset: the next pass waits again.
        let report = maybe_consolidate(&store, 1).await.unwrap();
        assert!(!report.ran);
    }

    #[tokio::test]
    async fn test_deduplication_merges_sentiment() {
        let store = InMemoryStore::new();
        // Bypass save_semantic's own upsert to simulate drift in a real
        // backend: two copies of the same fact, one carrying sentiment.
        let mut a = SemanticTriple::new("User", "HATES", "Java");
        a.confidence = 0.5;
        let mut b = SemanticTriple::new("user", "hates", "java");
        b.confidence = 0.9;
        b.sentiment = Some(MoodVector::new(-0.9, 0.7, 0.0));
        store.replace_semantic_facts(1, vec![a, b]).await.unwrap();

        let report = consolidate(&store, 1).await.unwrap();
        assert_eq!(report.facts_merged, 1);

        let facts = store.semantic_facts(1).await.unwrap();
        assert_eq!(facts.len(), 1);
        assert!((facts[0].confidence - 0.9).abs() < 1e-6);
        assert!(facts[0].sentiment.is_some());
    }

    #[tokio::test]
    async fn test_stale_patterns_are_deactivated() {
        let store = InMemoryStore::new();
        let mut stale = VolitionalPattern::new("coding", "laziness", "project");
        stale.intensity = 0.3;
        stale.learned_delta = 0.0;
        stale.last_activated_at = Utc::now() - Duration::days(30); // penalty 3.0
        store.save_pattern(1, stale).await.unwrap();

        let mut fresh = VolitionalPattern::new("evening", "boredom", "chat");
        fresh.intensity = 0.8;
        store.save_pattern(1, fresh).await.unwrap();

        let report = consolidate(&store, 1).await.unwrap();
        assert_eq!(report.patterns_deactivated, 1);

        let patterns = store.volitional_patterns(1).await.unwrap();
        let stale = patterns.iter().find(|p| p.impulse == "laziness").unwrap();
        assert!(!stale.is_active);
        let fresh = patterns.iter().find(|p| p.impulse == "boredom").unwrap();
        assert!(fresh.is_active);
    }
}
