//! mcbe-news domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Domain entities and value objects
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `state`: Seen-article store, destination registry and session state
//! - `schedule`: Check schedule parsing
//! - `usecases`: Application use cases / business logic

pub mod model;
pub mod ports;
pub mod schedule;
pub mod state;
pub mod usecases;

pub use model::*;
pub use ports::*;
