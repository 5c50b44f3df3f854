//! Adapters that capture provider interactions into a cassette.

pub mod llm;

pub use llm::RecordingLlmClient;
