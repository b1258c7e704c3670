//! # Noema Kernel
//!
//! The decision core of the Noema conversational agent. Each incoming
//! message is scored in parallel by a council of specialized agents, the
//! biochemical layer (hormones, mood, topic engagement) reweights their
//! votes, a volitional pattern may gate the whole turn, and arbitration
//! picks the persona voice that answers. A predict-verify loop measures how
//! well the previous turn anticipated this one and feeds the error back into
//! the hormones and the topic tracker.
//!
//! The kernel consumes three external collaborators behind traits:
//! [`oracle::Oracle`] (embeddings, council report, generation),
//! `noema_memory::MemoryStore` and `noema_memory::PredictionStore`. All of
//! them degrade rather than fail: no oracle or store error ever terminates a
//! turn.

pub mod arbitration;
pub mod bifurcation;
pub mod council;
pub mod kernel;
pub mod oracle;
pub mod providers;
pub mod retry;
pub mod volition;

pub use kernel::Kernel;
pub use oracle::{CouncilReport, GeneratedResponse, Oracle, ResponseRequest};
pub use providers::{MockOracle, OpenAiOracle};
pub use retry::{retry_with_backoff, OracleError, RetryConfig};
