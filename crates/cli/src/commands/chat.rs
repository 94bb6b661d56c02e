//! Chat command - one-shot chat command dispatch

use anyhow::{Result, bail};
use mcbe_news_adapters::context::{GroupIdContext, UnifiedOriginContext};
use mcbe_news_domain::{ChatContext, usecases::ChatCommand};
use std::path::PathBuf;

use crate::app::{App, AppHandler, format_for_console};
use crate::args::ChatArgs;
use crate::config::AppConfig;

pub async fn execute(args: ChatArgs, config_path: Option<PathBuf>) -> Result<()> {
    let text = args.text.join(" ");
    let Some(command) = ChatCommand::parse(&text) else {
        bail!("Unrecognized command '{}'. Try /mcbe_help", text.trim());
    };

    let config = AppConfig::load(config_path.as_deref())?;
    let app = App::build(&config).await?;

    let context: Box<dyn ChatContext> = match args.group {
        Some(group_id) => Box::new(GroupIdContext::new(group_id)),
        None => Box::new(UnifiedOriginContext::new(args.origin)),
    };

    print_replies(&app.handler, command, context.as_ref()).await;
    Ok(())
}

/// Dispatch one console line; unknown input gets a hint instead of an error
pub(crate) async fn dispatch_line(handler: &AppHandler, context: &dyn ChatContext, line: &str) {
    if line.trim().is_empty() {
        return;
    }

    match ChatCommand::parse(line) {
        Some(command) => print_replies(handler, command, context).await,
        None => println!("Unrecognized command. Try /mcbe_help"),
    }
}

async fn print_replies(handler: &AppHandler, command: ChatCommand, context: &dyn ChatContext) {
    for reply in handler.handle(command, context).await {
        println!("{}", format_for_console(&reply));
    }
}
