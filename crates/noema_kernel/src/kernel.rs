//! The per-session kernel: one `process_message` call is one full cognitive
//! turn.
//!
//! Turn order: verify last prediction → recall memory → council report →
//! topic update → signals → volitional selection → modulation passes →
//! arbitration → mood/hormone update → response generation → new prediction
//! → persistence. Every sub-stage degrades to a documented fallback; no
//! failure path terminates the turn.
//!
//! The kernel holds mutable per-session state (hormones, mood, topic, focus)
//! with no internal locking: `process_message` takes `&mut self`, so callers
//! serialize turns per session by construction.

use crate::arbitration;
use crate::bifurcation::{self, PivotCandidate};
use crate::council;
use crate::oracle::{fallback_report, GeneratedResponse, Oracle, ResponseRequest};
use crate::retry::{retry_with_backoff, RetryConfig};
use crate::volition::{self, ActiveFocus, STANDARD};
use chrono::Utc;
use noema_core::math::cosine_distance;
use noema_core::phatic::{default_phatic_predicate, PhaticPredicate};
use noema_core::{
    AgentKind, CoreAction, CoreResponse, IncomingMessage, InternalStats, KernelMode, MoodVector,
    NoemaConfig, ProcessingMode,
};
use noema_memory::{
    consolidation, EpisodicAnchor, MemoryStore, PredictionRecord, PredictionStore, RecallContext,
    SemanticTriple, VerifyError,
};
use noema_neuro::{LcMode, NeuroModulation, TopicTracker};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

/// Messages containing any of these run the FULL council report (with
/// affective extraction) instead of the light one.
const AFFECTIVE_KEYWORDS: &[&str] = &[
    "ненавижу",
    "боюсь",
    "люблю",
    "обожаю",
    "презираю",
    "терпеть не могу",
    "не выношу",
    "hate",
    "fear",
    "love",
    "enjoy",
    "despise",
    "adore",
    "can't stand",
];

/// Last-resort reply when even generation fails: neutral, polite, Social.
const FALLBACK_REPLY: &str = "Sorry — I lost my train of thought for a moment. Tell me more?";

pub struct Kernel {
    config: NoemaConfig,
    oracle: Arc<dyn Oracle>,
    store: Arc<dyn MemoryStore>,
    predictions: Arc<dyn PredictionStore>,

    neuro: NeuroModulation,
    mood: MoodVector,
    topic: TopicTracker,
    focus: ActiveFocus,

    retry: RetryConfig,
    is_phatic: PhaticPredicate,
}

impl Kernel {
    pub fn new(
        config: NoemaConfig,
        oracle: Arc<dyn Oracle>,
        store: Arc<dyn MemoryStore>,
        predictions: Arc<dyn PredictionStore>,
    ) -> Self {
        Self {
            config,
            oracle,
            store,
            predictions,
            neuro: NeuroModulation::new(Utc::now()),
            mood: MoodVector::default(),
            topic: TopicTracker::new(),
            focus: ActiveFocus::default(),
            retry: RetryConfig::default(),
            is_phatic: default_phatic_predicate,
        }
    }

    /// Override the retry policy (tests use millisecond delays).
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Swap the phatic heuristic without touching the pipeline.
    pub fn with_phatic_predicate(mut self, predicate: PhaticPredicate) -> Self {
        self.is_phatic = predicate;
        self.topic = TopicTracker::with_phatic_predicate(predicate);
        self
    }

    pub fn mood(&self) -> &MoodVector {
        &self.mood
    }

    /// Process one turn. Never fails: every stage degrades internally.
    pub async fn process_message(
        &mut self,
        message: IncomingMessage,
        mode: KernelMode,
    ) -> CoreResponse {
        let start = Instant::now();

        if mode == KernelMode::Reflex {
            return self.reflex_turn(&message, start).await;
        }

        // 0. Temporal metabolism, against last turn's engagement level.
        let elapsed = self.neuro.decay(message.timestamp, self.topic.tec());
        tracing::debug!(elapsed_minutes = elapsed, "hormonal decay applied");

        // 1. Embed the message once; everything downstream shares it.
        let embedding = match retry_with_backoff(&self.retry, "embed", || {
            let oracle = Arc::clone(&self.oracle);
            let text = message.text.clone();
            async move { oracle.embed(&text).await }
        })
        .await
        {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("embedding unavailable this turn: {}", e);
                None
            }
        };

        // 2. Close the predictive loop: verify the last open prediction.
        let prediction_error = self.verify_last_prediction(&message, embedding.as_deref()).await;
        tracing::debug!(
            prediction_error,
            band = ?self.config.pe.band(prediction_error),
            "empathy alignment"
        );

        // 3. Memory recall.
        let context = match self
            .store
            .recall_context(
                message.user_id,
                &message.text,
                &message.session_id,
                embedding.as_deref(),
            )
            .await
        {
            Ok(ctx) => ctx,
            Err(e) => {
                tracing::warn!("memory recall failed, proceeding empty: {}", e);
                RecallContext::default()
            }
        };

        let user_mode = preferred_mode(&context);

        // 4. One shared council report (full when attitude keywords appear).
        let lower = message.text.to_lowercase();
        let full = AFFECTIVE_KEYWORDS.iter().any(|k| lower.contains(k));
        let report = match retry_with_backoff(&self.retry, "council_report", || {
            let oracle = Arc::clone(&self.oracle);
            let text = message.text.clone();
            let ctx = format_council_context(&context);
            async move { oracle.council_report(&text, &ctx, full).await }
        })
        .await
        {
            Ok(r) if r.is_complete() => r,
            Ok(_) => {
                tracing::warn!("council report incomplete, substituting fallback");
                fallback_report()
            }
            Err(e) => {
                tracing::warn!("council report failed ({}), substituting fallback", e);
                fallback_report()
            }
        };

        // 5. Side channels: attitudes and self-disclosed profile facts.
        for extract in &report.affective_extraction {
            let mut triple =
                SemanticTriple::new(&extract.subject, &extract.predicate, &extract.object);
            triple.confidence = extract.intensity;
            triple.source_message_id = Some(message.message_id.clone());
            triple.sentiment = Some(MoodVector::new(extract.valence, extract.intensity, 0.0));
            triple.embedding = embedding.clone();
            if let Err(e) = self.store.save_semantic(message.user_id, triple).await {
                tracing::warn!("failed to save affective triple: {}", e);
            }
        }
        if let Some(hint) = &report.profile_update {
            let update = noema_memory::ProfileUpdate {
                name: hint.name.clone(),
                preferred_mode: hint.preferred_mode.clone(),
                add_traits: hint.traits.clone(),
            };
            if let Err(e) = self.store.update_user_profile(message.user_id, update).await {
                tracing::warn!("profile update failed: {}", e);
            }
        }

        // 6. Topic engagement update.
        let intent = report
            .intent
            .as_deref()
            .map(noema_neuro::IntentCategory::parse)
            .unwrap_or_default();
        self.topic
            .observe(&message.text, embedding.as_deref(), intent, prediction_error);
        let tec = self.topic.tec();

        // 7. Memorize the event.
        if let Some(emb) = &embedding {
            let mut anchor = EpisodicAnchor::new(&message.text, emb.clone());
            if let Some(strongest) = report
                .affective_extraction
                .iter()
                .max_by(|a, b| a.intensity.total_cmp(&b.intensity))
            {
                anchor.valence = strongest.valence;
                anchor.arousal = strongest.intensity;
            }
            if let Err(e) = self.store.save_episodic(message.user_id, anchor).await {
                tracing::warn!("episodic save failed: {}", e);
            }
        }
        if let Err(e) = self
            .store
            .save_chat_message(message.user_id, &message.session_id, "user", &message.text)
            .await
        {
            tracing::warn!("chat log save failed: {}", e);
        }

        // 8. Fire-and-forget consolidation; must never block the turn.
        let store = Arc::clone(&self.store);
        let user_id = message.user_id;
        tokio::spawn(async move {
            if let Err(e) = consolidation::maybe_consolidate(store.as_ref(), user_id).await {
                tracing::warn!("background consolidation failed: {}", e);
            }
        });

        // 9. Council signals plus the Uncertainty meta-agent.
        let episodic_hit = !context.episodic.is_empty();
        let mut signals = council::signals_from_report(&report, &self.config.bot, episodic_hit);
        signals.push(council::uncertainty_signal(
            prediction_error,
            &self.config.uncertainty,
        ));

        // 10. Volitional gating.
        let dominant = volition::select_dominant(
            &context.volitional_patterns,
            &mut self.focus,
            message.user_id,
            &self.mood,
            message.timestamp,
        );

        // 11. Modulation passes, in contract order: hormonal, volitional,
        // chaos, tonic.
        let archetype = self.neuro.archetype();
        arbitration::apply_hormonal(&mut signals, archetype);
        let strategy = match &dominant {
            Some(pattern) => volition::apply_modulation(&mut signals, pattern),
            None => STANDARD,
        };
        arbitration::apply_chaos(&mut signals, self.config.bot.chaos_level);
        let lc_mode = self.neuro.lc_mode(tec);
        arbitration::apply_tonic_boost(&mut signals, lc_mode);

        // 12. Bifurcation: propose a pivot only when exploring.
        let pivot = if lc_mode == LcMode::Tonic {
            bifurcation::propose(
                self.store.as_ref(),
                self.predictions.as_ref(),
                message.user_id,
                embedding.as_deref(),
            )
            .await
        } else {
            None
        };

        // 13. Arbitration.
        let all_scores: BTreeMap<String, f32> = signals
            .iter()
            .map(|s| (s.agent.as_str().to_string(), s.score))
            .collect();
        let (winner, strong_losers) = arbitration::arbitrate(signals);

        // 14. Mood inertia and hormonal reaction.
        self.mood.apply_winner(winner.agent, winner.score);
        let mut impact = self.neuro.compute_surprise_impact(prediction_error);
        if impact < 0.1 {
            // Winner-implied floor: some victories are intrinsically arousing
            // even when the prediction held.
            impact = match winner.agent {
                AgentKind::Amygdala => 0.9,
                AgentKind::Intuition => 0.2,
                AgentKind::Striatum => 0.1,
                _ => impact,
            };
        }
        self.neuro.update_from_stimuli(
            impact,
            winner.agent,
            self.config.bot.reward.as_ref(),
            tec,
        );

        // 15. A pattern that actually drove the turn spends fuel.
        if let Some(pattern) = &dominant {
            if strategy.name != STANDARD.name {
                let mut spent = pattern.clone();
                spent.spend_fuel();
                spent.turns_active += 1;
                if let Err(e) = self.store.update_pattern(message.user_id, spent).await {
                    tracing::warn!("fuel spend persist failed: {}", e);
                }
            }
        }

        // 16. Style assembly: hormones, archetype, strong losers, volition.
        let mut style = self.neuro.style_instruction();
        style.push('\n');
        style.push_str(archetype.style_directive());
        for loser in &strong_losers {
            if let Some(instruction) = &loser.style_instruction {
                style.push_str(&format!("\nSECONDARY ({}): {}", loser.agent, instruction));
            }
        }
        if let Some(pattern) = &dominant {
            style.push_str(&format!(
                "\nVOLITIONAL DIRECTIVE: trigger '{}', impulse '{}', strategy '{}'",
                pattern.trigger, pattern.impulse, strategy.name
            ));
        }

        let affective_context = format_affective_context(&context);
        let sentiment_context_used = !context.affective_context.is_empty();

        // 17. Response generation in the winner's voice.
        let request = ResponseRequest {
            agent: winner.agent,
            user_text: message.text.clone(),
            context: format_response_context(&context),
            rationale: winner.rationale.clone(),
            bot_name: self.config.bot.name.clone(),
            user_mode,
            style,
            affective_context,
            pivot_directive: pivot.as_ref().map(bifurcation::pivot_directive),
        };
        let generated = match retry_with_backoff(&self.retry, "generate_response", || {
            let oracle = Arc::clone(&self.oracle);
            let request = request.clone();
            async move { oracle.generate_response(&request).await }
        })
        .await
        {
            Ok(g) => g,
            Err(e) => {
                tracing::warn!("generation failed ({}), using canned fallback", e);
                GeneratedResponse {
                    text: FALLBACK_REPLY.to_string(),
                    predicted_reaction: None,
                }
            }
        };

        // 18. Open the next predictive loop.
        if let Some(reaction) = &generated.predicted_reaction {
            self.save_new_prediction(&message, &generated.text, reaction).await;
        }

        if let Err(e) = self
            .store
            .save_chat_message(
                message.user_id,
                &message.session_id,
                "assistant",
                &generated.text,
            )
            .await
        {
            tracing::warn!("chat log save failed: {}", e);
        }

        let internal_stats = InternalStats {
            latency_ms: start.elapsed().as_millis() as u64,
            winner: Some(winner.agent),
            winner_score: winner.score,
            winner_rationale: winner.rationale.clone(),
            all_scores,
            mood: Some(self.mood),
            hormones: Some(self.neuro.state),
            archetype: archetype.as_str().to_string(),
            prediction_error,
            surprise_impact: impact,
            tec,
            lc_mode: lc_mode.as_str().to_string(),
            intent: self.topic.intent().as_str().to_string(),
            strategy: strategy.name.to_string(),
            volition_selected: dominant.as_ref().map(|p| p.impulse.clone()),
            bifurcation: pivot.as_ref().map(|p: &PivotCandidate| p.topic.clone()),
            sentiment_context_used,
            chaos_level: self.config.bot.chaos_level,
        };

        CoreResponse {
            actions: vec![CoreAction::SendText {
                text: generated.text,
            }],
            winning_agent: winner.agent,
            current_mood: self.mood,
            current_hormones: self.neuro.state,
            processing_mode: ProcessingMode::SlowPath,
            internal_stats,
        }
    }

    /// Verify (close) the most recent open prediction for this session.
    /// Phatic replies and missing embeddings yield error 0.0; the record is
    /// closed unconditionally either way.
    async fn verify_last_prediction(
        &self,
        message: &IncomingMessage,
        embedding: Option<&[f32]>,
    ) -> f32 {
        let last = match self.predictions.last_unverified(&message.session_id).await {
            Ok(Some(record)) => record,
            Ok(None) => return 0.0,
            Err(e) => {
                tracing::warn!("prediction lookup failed: {}", e);
                return 0.0;
            }
        };

        let mut prediction_error = 0.0;
        if (self.is_phatic)(&message.text) {
            tracing::debug!("phatic message, prediction error stays 0.0");
        } else if let (Some(predicted), Some(actual)) = (&last.predicted_embedding, embedding) {
            prediction_error = cosine_distance(predicted, actual);
            tracing::debug!(prediction_error, "prediction verified");
        } else {
            tracing::debug!("embeddings missing, prediction error stays 0.0");
        }

        match self
            .predictions
            .verify(
                &last.id,
                &message.text,
                embedding.map(|e| e.to_vec()),
                prediction_error,
            )
            .await
        {
            Ok(()) => {}
            Err(VerifyError::AlreadyVerified(id)) => {
                tracing::warn!("prediction {} already verified, ignoring", id);
            }
            Err(e) => tracing::warn!("prediction verify failed: {}", e),
        }
        prediction_error
    }

    async fn save_new_prediction(&self, message: &IncomingMessage, bot_text: &str, reaction: &str) {
        let predicted_embedding = match retry_with_backoff(&self.retry, "embed_prediction", || {
            let oracle = Arc::clone(&self.oracle);
            let reaction = reaction.to_string();
            async move { oracle.embed(&reaction).await }
        })
        .await
        {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("prediction embedding failed: {}", e);
                None
            }
        };

        let record = PredictionRecord::new(
            message.user_id,
            &message.session_id,
            bot_text,
            reaction,
            predicted_embedding,
        );
        if let Err(e) = self.predictions.save_prediction(record).await {
            tracing::warn!("prediction save failed: {}", e);
        }
    }

    /// Degraded reflex path: one direct oracle call in the Prefrontal voice,
    /// no state updates, no memory writes.
    async fn reflex_turn(&self, message: &IncomingMessage, start: Instant) -> CoreResponse {
        let request = ResponseRequest {
            agent: AgentKind::Prefrontal,
            user_text: message.text.clone(),
            bot_name: self.config.bot.name.clone(),
            ..ResponseRequest::default()
        };
        let generated = match retry_with_backoff(&self.retry, "reflex_response", || {
            let oracle = Arc::clone(&self.oracle);
            let request = request.clone();
            async move { oracle.generate_response(&request).await }
        })
        .await
        {
            Ok(g) => g,
            Err(_) => GeneratedResponse {
                text: FALLBACK_REPLY.to_string(),
                predicted_reaction: None,
            },
        };

        CoreResponse {
            actions: vec![CoreAction::SendText {
                text: generated.text,
            }],
            winning_agent: AgentKind::Prefrontal,
            current_mood: self.mood,
            current_hormones: self.neuro.state,
            processing_mode: ProcessingMode::FastPath,
            internal_stats: InternalStats {
                latency_ms: start.elapsed().as_millis() as u64,
                winner: Some(AgentKind::Prefrontal),
                ..InternalStats::default()
            },
        }
    }
}

fn preferred_mode(context: &RecallContext) -> String {
    let raw = context
        .user_profile
        .as_ref()
        .map(|p| p.preferred_mode.to_lowercase())
        .unwrap_or_default();
    if matches!(raw.as_str(), "ты" | "informal" | "casual" | "friendly") {
        "informal".to_string()
    } else {
        "formal".to_string()
    }
}

/// Shallow context for the council: recent history only. The lenses judge the
/// message, not the archive.
fn format_council_context(context: &RecallContext) -> String {
    context
        .chat_history
        .iter()
        .rev()
        .take(1)
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Full context for response generation.
fn format_response_context(context: &RecallContext) -> String {
    let mut lines = Vec::new();
    for m in &context.chat_history {
        lines.push(format!("{}: {}", m.role, m.content));
    }
    for fact in &context.semantic_facts {
        lines.push(format!(
            "fact: {} {} {}",
            fact.subject, fact.predicate, fact.object
        ));
    }
    if !context.relevant_traits.is_empty() {
        lines.push(format!("user traits: {}", context.relevant_traits.join(", ")));
    }
    lines.join("\n")
}

fn format_affective_context(context: &RecallContext) -> String {
    context
        .affective_context
        .iter()
        .map(|r| format!("- {} {} {}", r.subject, r.predicate, r.entity))
        .collect::<Vec<_>>()
        .join("\n")
}
