//! # Noema Core
//!
//! Shared data model and utility layer for the Noema cognitive kernel:
//!
//! - Message and response envelopes exchanged with transport collaborators
//! - The `AgentSignal` contract every council agent produces
//! - Continuous affective state (VAD mood vector, hormonal state)
//! - Personality sliders and behavioral configuration
//! - Small math utilities (cosine, logistic) and the phatic-message predicate
//!
//! Everything here is plain data plus invariant-preserving methods; the
//! machinery that evolves this state lives in `noema_neuro` and
//! `noema_kernel`.

pub mod config;
pub mod hormones;
pub mod math;
pub mod message;
pub mod mood;
pub mod phatic;
pub mod signal;

pub use config::{BotConfig, NoemaConfig, PeThresholds, PersonalitySliders, UncertaintyConfig};
pub use hormones::HormonalState;
pub use message::{
    CoreAction, CoreResponse, IncomingMessage, InternalStats, KernelMode, ProcessingMode,
};
pub use mood::MoodVector;
pub use phatic::{default_phatic_predicate, PhaticPredicate};
pub use signal::{AgentKind, AgentSignal};

/// Guard against NaN and Infinity leaking into bounded state.
/// Non-finite values are replaced with the provided homeostatic fallback.
#[inline]
pub fn sanitize_f32(v: f32, fallback: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        tracing::warn!("NaN/Inf detected in bounded state, resetting to {}", fallback);
        fallback
    }
}
