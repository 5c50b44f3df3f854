//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the generation core and an
//! external system (time, language models, filesystem). Implementations
//! live in `src/adapters/`.

pub mod clock;
pub mod filesystem;
pub mod llm;

pub use clock::Clock;
pub use filesystem::FileSystem;
pub use llm::{
    accumulate, ChunkStream, CompletionFuture, CompletionRequest, CompletionResponse, LlmClient,
};
