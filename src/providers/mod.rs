//! Provider abstraction layer for speech-to-text
//!
//! Supports pluggable cloud backends (OpenAI Whisper, Deepgram) and a seedable
//! simulator used whenever a real backend cannot answer.
mod adapter;
mod deepgram;
mod openai;
mod simulated;
mod transcription;

pub use adapter::{AdapterOutcome, AttemptState, DEFAULT_PROVIDER_TIMEOUT, TranscriptionAdapter};
pub use deepgram::DeepgramProvider;
pub use openai::OpenAIWhisperProvider;
pub use simulated::{SimulatedOutcome, SimulatedTranscriptionProvider};
pub use transcription::{TranscriptionProvider, TranscriptionRequest};
