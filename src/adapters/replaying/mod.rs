//! Adapters that serve recorded provider interactions.

pub mod llm;

pub use llm::ReplayingLlmClient;
