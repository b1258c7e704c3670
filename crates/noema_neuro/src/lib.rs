//! # Noema Neuro
//!
//! The biochemical regulation layer of the kernel:
//!
//! - **Hormonal physics**: four hormone channels with time-based decay and
//!   event-based reactive updates (Doya-style neuromodulation analogy)
//! - **Archetypes**: threshold classification of the hormonal state into nine
//!   named emotional categories, each carrying a style directive and a table
//!   of per-agent score multipliers
//! - **Topic engagement**: a rolling conversation centroid with a decaying
//!   patience score (TEC) that drives the exploration/exploitation switch
//!
//! All of this is deterministic math over bounded state; the LLM never sees
//! raw hormone levels, only the directives derived from them.

pub mod archetype;
pub mod hormones;
pub mod topic;

pub use archetype::Archetype;
pub use hormones::{LcMode, NeuroModulation};
pub use topic::{IntentCategory, TopicTracker, TopicUpdate};
