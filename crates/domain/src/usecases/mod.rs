//! Application use cases / business logic

pub mod check;
pub mod commands;
pub mod extract;
pub mod render;
pub mod summarize;

pub use check::{CheckConfig, CheckError, UpdateChecker};
pub use commands::{ChatCommand, CommandHandler, StatusInfo};
pub use render::{RenderConfig, Renderer};
pub use summarize::{SummarizeConfig, SummarizeUseCase};
