//! Update checker - fetch, dedup, first-run seeding and fan-out delivery

use std::sync::Arc;

use crate::{
    model::{ArticleListing, CycleReport, Destination, Feed, FeedArticle},
    ports::{ArticleSource, Clock, MessageSink, Summarizer},
    state::{ReconcileState, Session},
    usecases::render::{RenderConfig, Renderer},
};

/// Configuration for the update checker
#[derive(Debug, Clone)]
pub struct CheckConfig {
    pub enable_beta: bool,
    pub enable_release: bool,
    /// Comma-separated raw group ids used when nothing is registered
    pub legacy_group_ids: String,
    pub render: RenderConfig,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            enable_beta: true,
            enable_release: true,
            legacy_group_ids: String::new(),
            render: RenderConfig::default(),
        }
    }
}

impl CheckConfig {
    pub fn is_enabled(&self, feed: Feed) -> bool {
        match feed {
            Feed::Beta => self.enable_beta,
            Feed::Release => self.enable_release,
        }
    }

    /// Parsed legacy group ids, blanks removed
    pub fn legacy_ids(&self) -> Vec<String> {
        self.legacy_group_ids
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(String::from)
            .collect()
    }
}

/// Address format used for bare legacy group ids
pub fn legacy_group_address(group_id: &str) -> String {
    format!("group_{}", group_id)
}

/// Errors from a reconciliation cycle
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("A check is already in progress")]
    InProgress,
}

/// Mark new articles of one listing as seen and return them in page order.
///
/// On first run every listed id is seeded but only the newest is reported.
/// The store is persisted once if anything was added.
pub async fn reconcile_listing(
    state: &mut ReconcileState,
    feed: Feed,
    listing: ArticleListing,
) -> Vec<FeedArticle> {
    if state.first_run {
        tracing::info!(
            feed = %feed,
            count = listing.articles.len(),
            "First run: marking all listed articles as seen, surfacing only the newest"
        );

        for article in &listing.articles {
            state.seen.add(article.id);
        }
        state.seen.persist().await;

        return listing
            .articles
            .into_iter()
            .next()
            .map(|article| FeedArticle { feed, article })
            .into_iter()
            .collect();
    }

    let new_articles: Vec<FeedArticle> = listing
        .articles
        .into_iter()
        .filter(|article| state.seen.add(article.id))
        .map(|article| FeedArticle { feed, article })
        .collect();

    if !new_articles.is_empty() {
        state.seen.persist().await;
    }

    new_articles
}

/// Update checker orchestrator
pub struct UpdateChecker<A, S, M, Cl>
where
    A: ArticleSource + ?Sized,
    S: Summarizer + ?Sized,
    M: MessageSink + ?Sized,
    Cl: Clock + ?Sized,
{
    source: Arc<A>,
    renderer: Renderer<S>,
    sink: Arc<M>,
    clock: Arc<Cl>,
    session: Arc<Session>,
    config: CheckConfig,
}

impl<A, S, M, Cl> UpdateChecker<A, S, M, Cl>
where
    A: ArticleSource + ?Sized,
    S: Summarizer + ?Sized,
    M: MessageSink + ?Sized,
    Cl: Clock + ?Sized,
{
    pub fn new(
        source: Arc<A>,
        summarizer: Arc<S>,
        sink: Arc<M>,
        clock: Arc<Cl>,
        session: Arc<Session>,
        config: CheckConfig,
    ) -> Self {
        let renderer = Renderer::new(summarizer, config.render.clone());
        Self {
            source,
            renderer,
            sink,
            clock,
            session,
            config,
        }
    }

    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn renderer(&self) -> &Renderer<S> {
        &self.renderer
    }

    pub fn source(&self) -> &Arc<A> {
        &self.source
    }

    /// Run one reconciliation cycle across all enabled feeds.
    ///
    /// Only one cycle runs at a time; a concurrent trigger is refused. The
    /// seen set is locked per feed while it is reconciled, never across
    /// fetches or delivery.
    pub async fn run_cycle(&self) -> Result<CycleReport, CheckError> {
        let Some(_cycle) = self.session.try_begin_check() else {
            tracing::warn!("Update check already in progress, skipping this trigger");
            return Err(CheckError::InProgress);
        };

        let first_run = self.session.reconcile_state().await.first_run;
        tracing::info!(first_run, "Checking for updates");

        let mut report = CycleReport::default();

        for feed in Feed::ALL {
            if !self.config.is_enabled(feed) {
                tracing::debug!(feed = %feed, "Feed disabled, skipping");
                continue;
            }

            match self.source.fetch_listing(feed).await {
                Ok(listing) => {
                    let mut state = self.session.reconcile_state().await;
                    let found = reconcile_listing(&mut state, feed, listing).await;
                    tracing::info!(feed = %feed, new = found.len(), "Feed checked");
                    report.new_articles.extend(found);
                }
                Err(e) => {
                    tracing::error!(feed = %feed, error = %e, "Failed to fetch feed");
                    report.failed_feeds.push((feed, e.to_string()));
                }
            }
        }

        {
            let mut state = self.session.reconcile_state().await;
            if state.first_run {
                state.first_run = false;
                tracing::info!("First-run initialization complete");
            }
            state.last_check = Some(self.clock.now());
        }

        if report.new_articles.is_empty() {
            tracing::info!("No new articles");
        } else {
            tracing::info!(count = report.new_articles.len(), "Found new articles");
            self.deliver(&mut report).await;
        }

        Ok(report)
    }

    /// Resolve fan-out targets: registry first, then legacy group ids
    pub async fn destinations(&self) -> Vec<Destination> {
        let registered = self.session.registry().read().await.destinations();
        if !registered.is_empty() {
            return registered;
        }

        self.config
            .legacy_ids()
            .into_iter()
            .map(|id| Destination {
                address: legacy_group_address(&id),
                key: id,
            })
            .collect()
    }

    async fn deliver(&self, report: &mut CycleReport) {
        let destinations = self.destinations().await;
        if destinations.is_empty() {
            tracing::warn!(
                "No registered destinations and no legacy group ids configured, nothing sent"
            );
            return;
        }

        tracing::info!(
            destinations = ?destinations.iter().map(|d| &d.key).collect::<Vec<_>>(),
            sink = self.sink.name(),
            "Delivering new articles"
        );

        let (mut delivered, mut failures) = (0, 0);
        for item in &report.new_articles {
            let message = self.renderer.render(item.feed, &item.article).await;

            for destination in &destinations {
                match self.sink.deliver(&destination.address, &message).await {
                    Ok(()) => {
                        delivered += 1;
                        tracing::info!(
                            article_id = item.article.id,
                            destination = %destination.key,
                            "Message delivered"
                        );
                    }
                    Err(e) => {
                        failures += 1;
                        tracing::error!(
                            article_id = item.article.id,
                            destination = %destination.key,
                            error = %e,
                            "Failed to deliver message"
                        );
                    }
                }
            }
        }

        report.delivered = delivered;
        report.delivery_failures = failures;
    }
}
