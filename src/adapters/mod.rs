//! Port adapters: live providers, cassette replay and cassette recording.

pub mod live;
pub mod recording;
pub mod replaying;
