//! Pronounce - pronunciation scoring engine for language learners
//!
//! Scores a spoken attempt at a target word from its transcript, with accent
//! tolerance, an encouragement curve and actionable feedback. Transcription
//! goes through a pluggable provider and falls back to a seedable simulator.

pub mod audio;
pub mod config;
pub mod error;
pub mod feedback;
pub mod ffi;
pub mod phonetic;
pub mod providers;
pub mod scoring;
pub mod session;
pub mod similarity;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

// Export FFI functions at crate root for the C header
pub use ffi::*;

/// Re-export the main engine components for convenience
pub use config::{ProviderConfig, ProviderKind};
pub use feedback::{analyze, feedback_message, quality_tier};
pub use providers::{TranscriptionAdapter, TranscriptionProvider};
pub use scoring::{boost_score, raw_accuracy, score_attempt};
pub use session::{AttemptSummary, PracticeSession, evaluate};
