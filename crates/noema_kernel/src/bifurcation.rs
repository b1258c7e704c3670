//! Bifurcation: proactive topic-switch proposal under low engagement.
//!
//! Runs only in tonic (exploration) mode. Three memory vectors are queried
//! concurrently — semantic neighbors, emotional anchors, and unresolved
//! "zeigarnik" threads — and the best-scoring candidate becomes a directive
//! to gently bridge the conversation toward it. A failure in any one source
//! degrades to an empty candidate list and never aborts the others.

use noema_core::math::cosine_distance;
use noema_memory::{MemoryStore, PredictionStore};

const SEMANTIC_WEIGHT: f32 = 0.5;
const EMOTIONAL_WEIGHT: f32 = 0.3;
const ZEIGARNIK_WEIGHT: f32 = 0.2;
/// Sweet spot for semantic pivots: related enough to bridge, far enough to
/// feel fresh.
const IDEAL_SEMANTIC_DISTANCE: f32 = 0.5;
const SOURCE_LIMIT: usize = 5;

/// One scored pivot-topic candidate.
#[derive(Debug, Clone)]
pub struct PivotCandidate {
    pub topic: String,
    pub score: f32,
    pub source: &'static str,
}

/// Gather and rank pivot candidates; returns the best one, if any.
pub async fn propose(
    store: &dyn MemoryStore,
    predictions: &dyn PredictionStore,
    user_id: i64,
    current_embedding: Option<&[f32]>,
) -> Option<PivotCandidate> {
    let (semantic, emotional, zeigarnik) = tokio::join!(
        semantic_candidates(store, user_id, current_embedding),
        emotional_candidates(store, user_id),
        zeigarnik_candidates(predictions, user_id),
    );

    let mut candidates: Vec<PivotCandidate> = Vec::new();
    candidates.extend(degrade("semantic", semantic));
    candidates.extend(degrade("emotional", emotional));
    candidates.extend(degrade("zeigarnik", zeigarnik));

    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates.into_iter().next()
}

fn degrade(source: &str, result: anyhow::Result<Vec<PivotCandidate>>) -> Vec<PivotCandidate> {
    match result {
        Ok(candidates) => candidates,
        Err(e) => {
            tracing::warn!("bifurcation source '{}' failed: {}", source, e);
            Vec::new()
        }
    }
}

/// Facts at the ideal semantic distance from the current message.
async fn semantic_candidates(
    store: &dyn MemoryStore,
    user_id: i64,
    current_embedding: Option<&[f32]>,
) -> anyhow::Result<Vec<PivotCandidate>> {
    let Some(query) = current_embedding else {
        return Ok(Vec::new());
    };

    let facts = store.semantic_facts(user_id).await?;
    let mut candidates: Vec<PivotCandidate> = facts
        .iter()
        .filter_map(|fact| {
            let embedding = fact.embedding.as_ref()?;
            let dist = cosine_distance(query, embedding);
            // Peaked at the ideal distance, zero at 0.0 and 1.0.
            let affinity = (1.0 - (dist - IDEAL_SEMANTIC_DISTANCE).abs() * 2.0).clamp(0.0, 1.0);
            Some(PivotCandidate {
                topic: format!("{} {} {}", fact.subject, fact.predicate, fact.object),
                score: SEMANTIC_WEIGHT * affinity,
                source: "semantic",
            })
        })
        .collect();
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    candidates.truncate(SOURCE_LIMIT);
    Ok(candidates)
}

/// High-intensity emotional memories.
async fn emotional_candidates(
    store: &dyn MemoryStore,
    user_id: i64,
) -> anyhow::Result<Vec<PivotCandidate>> {
    let anchors = store.emotional_anchors(user_id, SOURCE_LIMIT).await?;
    Ok(anchors
        .into_iter()
        .map(|anchor| {
            let intensity = anchor.valence.abs().max(anchor.arousal);
            PivotCandidate {
                topic: anchor.raw_text,
                score: EMOTIONAL_WEIGHT * intensity,
                source: "emotional",
            }
        })
        .collect())
}

/// Open loops: predictions that resolved badly, newest first. An unfinished
/// thread pulls attention back (the Zeigarnik effect).
async fn zeigarnik_candidates(
    predictions: &dyn PredictionStore,
    user_id: i64,
) -> anyhow::Result<Vec<PivotCandidate>> {
    let loops = predictions.open_loops(user_id, SOURCE_LIMIT).await?;
    Ok(loops
        .into_iter()
        .enumerate()
        .map(|(rank, record)| {
            let recency = 1.0 / (rank as f32 + 1.0);
            let error = record.prediction_error.unwrap_or(1.0);
            let topic = if record.actual_message.as_deref().unwrap_or("").is_empty() {
                record.bot_message
            } else {
                record.actual_message.unwrap_or_default()
            };
            PivotCandidate {
                topic,
                score: ZEIGARNIK_WEIGHT * recency * error,
                source: "zeigarnik",
            }
        })
        .collect())
}

/// Render the winning candidate as a prompt directive.
pub fn pivot_directive(candidate: &PivotCandidate) -> String {
    format!(
        "PROACTIVE PIVOT: engagement is low. Gently bridge the conversation toward: \"{}\" (do not force it).",
        candidate.topic
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use noema_memory::{
        EpisodicAnchor, InMemoryPredictionStore, InMemoryStore, MemoryStore, PredictionRecord,
        PredictionStore, SemanticTriple,
    };

    fn fact_with_embedding(object: &str, embedding: Vec<f32>) -> SemanticTriple {
        let mut t = SemanticTriple::new("User", "LIKES", object);
        t.embedding = Some(embedding);
        t
    }

    #[tokio::test]
    async fn test_no_memory_no_pivot() {
        let store = InMemoryStore::new();
        let predictions = InMemoryPredictionStore::new();
        let pivot = propose(&store, &predictions, 1, Some(&[1.0, 0.0])).await;
        assert!(pivot.is_none());
    }

    #[tokio::test]
    async fn test_semantic_band_peak_wins() {
        let store = InMemoryStore::new();
        let predictions = InMemoryPredictionStore::new();

        // Query along x: identical fact (dist 0.0), ideal-band fact
        // (dist 0.5 at 60°), unrelated fact (dist 1.0).
        store
            .save_semantic(1, fact_with_embedding("identical", vec![1.0, 0.0]))
            .await
            .unwrap();
        store
            .save_semantic(
                1,
                fact_with_embedding("adjacent", vec![0.5, 3f32.sqrt() / 2.0]),
            )
            .await
            .unwrap();
        store
            .save_semantic(1, fact_with_embedding("unrelated", vec![0.0, 1.0]))
            .await
            .unwrap();

        let pivot = propose(&store, &predictions, 1, Some(&[1.0, 0.0]))
            .await
            .unwrap();
        assert!(pivot.topic.contains("adjacent"), "got {:?}", pivot);
        assert_eq!(pivot.source, "semantic");
        assert!((pivot.score - SEMANTIC_WEIGHT).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_emotional_anchor_scores() {
        let store = InMemoryStore::new();
        let predictions = InMemoryPredictionStore::new();

        let mut anchor = EpisodicAnchor::new("the day the demo crashed", vec![1.0]);
        anchor.valence = -0.9;
        store.save_episodic(1, anchor).await.unwrap();

        let pivot = propose(&store, &predictions, 1, None).await.unwrap();
        assert_eq!(pivot.source, "emotional");
        assert!((pivot.score - 0.27).abs() < 1e-4); // 0.3 * 0.9
    }

    #[tokio::test]
    async fn test_zeigarnik_recency_ranking() {
        let store = InMemoryStore::new();
        let predictions = InMemoryPredictionStore::new();

        for (session, text) in [("s1", "older thread"), ("s2", "newer thread")] {
            let r = PredictionRecord::new(1, session, "bot", "hypothesis", None);
            let id = r.id.clone();
            predictions.save_prediction(r).await.unwrap();
            predictions.verify(&id, text, None, 0.95).await.unwrap();
        }

        let pivot = propose(&store, &predictions, 1, None).await.unwrap();
        assert_eq!(pivot.source, "zeigarnik");
        assert_eq!(pivot.topic, "newer thread");
    }

    #[tokio::test]
    async fn test_directive_mentions_topic() {
        let candidate = PivotCandidate {
            topic: "winter hiking".to_string(),
            score: 0.4,
            source: "semantic",
        };
        let directive = pivot_directive(&candidate);
        assert!(directive.contains("winter hiking"));
        assert!(directive.contains("Gently"));
    }
}
