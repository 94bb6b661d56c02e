//! Run command - scheduled update checks

use anyhow::{Context, Result};
use mcbe_news_adapters::context::UnifiedOriginContext;
use mcbe_news_domain::usecases::CheckError;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::app::{App, AppChecker};
use crate::args::RunArgs;
use crate::commands::chat::dispatch_line;
use crate::config::AppConfig;

pub async fn execute(args: RunArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let app = App::build(&config).await?;

    tracing::info!(
        once = args.once,
        console = ?args.console_origin,
        beta = config.feeds.enable_beta,
        release = config.feeds.enable_release,
        "Starting mcbe-news run"
    );

    if args.once {
        run_cycle(&app.checker).await;
        tracing::info!("mcbe-news run completed");
        return Ok(());
    }

    let mut scheduler = start_scheduler(&app).await?;
    app.session.set_scheduler_running(true);

    let context = args.console_origin.map(UnifiedOriginContext::new);
    let mut console_open = context.is_some();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutdown signal received");
    };
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line(), if console_open => match (line, &context) {
                (Ok(Some(line)), Some(context)) => {
                    dispatch_line(&app.handler, context, &line).await;
                }
                (Ok(_), _) => {
                    tracing::info!("Console input closed");
                    console_open = false;
                }
                (Err(e), _) => {
                    tracing::warn!(error = %e, "Failed to read console input");
                    console_open = false;
                }
            },
            _ = &mut shutdown => {
                tracing::info!("Shutting down gracefully");
                break;
            }
        }
    }

    scheduler
        .shutdown()
        .await
        .context("Failed to stop scheduler")?;
    app.session.set_scheduler_running(false);

    tracing::info!("mcbe-news run completed");
    Ok(())
}

async fn start_scheduler(app: &App) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new()
        .await
        .context("Failed to create scheduler")?;

    let checker = app.checker.clone();
    let job = Job::new_async(app.schedule.with_seconds().as_str(), move |_uuid, _lock| {
        let checker = checker.clone();
        Box::pin(async move {
            run_cycle(&checker).await;
        })
    })
    .with_context(|| format!("Invalid cron expression '{}'", app.schedule))?;

    scheduler.add(job).await.context("Failed to add check job")?;
    scheduler.start().await.context("Failed to start scheduler")?;

    tracing::info!(cron = %app.schedule, "Scheduled update checks started");
    Ok(scheduler)
}

async fn run_cycle(checker: &AppChecker) {
    match checker.run_cycle().await {
        Ok(report) => {
            for (feed, error) in &report.failed_feeds {
                tracing::warn!(feed = %feed, error = %error, "Feed check failed");
            }
            tracing::info!(
                new_articles = report.new_articles.len(),
                delivered = report.delivered,
                delivery_failures = report.delivery_failures,
                "Check cycle complete"
            );
        }
        Err(CheckError::InProgress) => {
            tracing::info!("Previous check still running, trigger dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcbe_news_domain::schedule::CronSchedule;

    async fn next_weekday(expression: &str) -> String {
        let schedule = CronSchedule::parse(expression).unwrap();
        let mut scheduler = JobScheduler::new().await.unwrap();
        let job = Job::new_async(schedule.with_seconds().as_str(), |_uuid, _lock| {
            Box::pin(async {})
        })
        .unwrap();
        let id = scheduler.add(job).await.unwrap();

        let next = scheduler.next_tick_for_job(id).await.unwrap().unwrap();
        next.format("%a").to_string()
    }

    #[tokio::test]
    async fn test_numeric_weekday_fires_on_that_day() {
        assert_eq!(next_weekday("0 9 * * 1").await, "Mon");
        assert_eq!(next_weekday("0 9 * * 5").await, "Fri");
    }

    #[tokio::test]
    async fn test_sunday_as_zero_or_seven_is_accepted() {
        assert_eq!(next_weekday("0 9 * * 0").await, "Sun");
        assert_eq!(next_weekday("0 9 * * 7").await, "Sun");
        assert_eq!(next_weekday("0 9 * * MON").await, "Mon");
    }
}
