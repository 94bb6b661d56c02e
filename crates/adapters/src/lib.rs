//! mcbe-news adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `help_center`: Help-center listing HTTP client
//! - `state`: JSON flat-file state repositories
//! - `llm`: LLM provider adapters (OpenAI, Anthropic, etc.) and the provider router
//! - `sinks`: Message delivery (HTTP relay, JSONL outbox)
//! - `context`: Chat context adapters

pub mod context;
pub mod help_center;
pub mod llm;
pub mod outbox;
pub mod relay;
mod state_json;

/// Re-exports for state adapters
pub mod state {
    pub use crate::state_json::{
        DESTINATIONS_FILE, JsonDestinationsRepo, JsonSeenIdsRepo, SEEN_FILE,
    };
}

/// Re-exports for message sinks
pub mod sinks {
    pub use crate::outbox::OutboxSink;
    pub use crate::relay::RelaySink;
}
