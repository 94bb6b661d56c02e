//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// mcbe-news: watch the Minecraft Bedrock update blog and push AI-summarized articles to chats
#[derive(Parser, Debug)]
#[command(name = "mcbe-news")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run scheduled update checks
    Run(RunArgs),

    /// Dispatch one chat command and print the replies
    Chat(ChatArgs),

    /// Configuration management
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Run one check cycle and exit
    #[arg(long)]
    pub once: bool,

    /// Read chat commands from stdin in this origin's context while running
    #[arg(long, value_name = "ORIGIN")]
    pub console_origin: Option<String>,
}

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Calling context as a `platform:MessageType:session` origin
    #[arg(long, default_value = "console:FriendMessage:local")]
    pub origin: String,

    /// Calling context as a bare group id (legacy address format)
    #[arg(long, conflicts_with = "origin")]
    pub group: Option<String>,

    /// Command text, e.g. `/mcbe_status`
    #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
    pub text: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./config.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}
