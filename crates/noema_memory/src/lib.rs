//! # Noema Memory
//!
//! Memory contracts for the kernel and their in-memory reference
//! implementation. The kernel treats persistence as an opaque collaborator
//! with defined query contracts; anything that speaks these traits (Postgres,
//! sqlite, a remote service) can be swapped in without touching the pipeline.
//!
//! Three surfaces:
//! - [`MemoryStore`]: semantic triples, episodic anchors, volitional
//!   patterns, chat history, user profiles
//! - [`PredictionStore`]: the predict-verify ledger of the predictive loop
//! - [`consolidation`]: the background "hippocampus" pass that compacts and
//!   maintains a user's long-term memory

pub mod consolidation;
pub mod prediction;
pub mod store;
pub mod types;

pub use consolidation::{maybe_consolidate, ConsolidationReport, CONSOLIDATION_THRESHOLD};
pub use prediction::{InMemoryPredictionStore, PredictionRecord, PredictionStore, VerifyError};
pub use store::{InMemoryStore, MemoryStore, ProfileUpdate, RecallContext};
pub use types::{
    AffectiveRelation, ChatMessage, EpisodicAnchor, SemanticTriple, UserProfile, VolitionalPattern,
};
