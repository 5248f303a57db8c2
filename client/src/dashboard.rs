//! Scan log dashboard: aggregate counters and the paged, filterable log table.

use std::future::Future;

use common::{
    data::{FilterCriteria, PageResult, Statistics},
    payloads::LogQuery,
};
use futures_util::future::{FutureExt, LocalBoxFuture, OptionFuture};
use tracing::{debug, error, warn};

use crate::{
    api::Gateway,
    error::Result,
    render::{pagination_controls, LogTable, PageControl},
};

/// Keeps the last successfully fetched counters on display.
#[derive(Debug, Default)]
pub struct DashboardStatsLoader {
    displayed: Option<Statistics>,
}

impl DashboardStatsLoader {
    /// Refreshes the counters. A failed fetch is logged and leaves the
    /// previous values untouched.
    pub async fn load<G>(&mut self, gateway: &G) -> Option<&Statistics>
    where
        G: Gateway + ?Sized,
    {
        match gateway.statistics().await {
            Ok(stats) => {
                debug!(?stats, "statistics loaded");
                self.displayed = Some(stats);
            }
            Err(e) => error!("Error loading statistics: {e}"),
        }
        self.displayed.as_ref()
    }

    pub fn displayed(&self) -> Option<&Statistics> {
        self.displayed.as_ref()
    }
}

#[derive(Debug)]
pub struct LogQueryManager {
    page: u32,
    size: u32,
    filter: FilterCriteria,
    table: LogTable,
    last_result: Option<PageResult>,
    controls: Vec<PageControl>,
}

impl LogQueryManager {
    pub fn new(size: u32) -> Self {
        Self {
            page: 0,
            size: size.max(1),
            filter: FilterCriteria::default(),
            table: LogTable::default(),
            last_result: None,
            controls: Vec::new(),
        }
    }

    /// Sets the filter without fetching anything.
    pub fn with_filter(mut self, criteria: FilterCriteria) -> Self {
        self.filter = criteria;
        self
    }

    /// Zero-based index of the page on display.
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn filter(&self) -> &FilterCriteria {
        &self.filter
    }

    pub fn table(&self) -> &LogTable {
        &self.table
    }

    pub fn controls(&self) -> &[PageControl] {
        &self.controls
    }

    pub fn last_result(&self) -> Option<&PageResult> {
        self.last_result.as_ref()
    }

    /// Query that [`LogQueryManager::load_page`] would send for `page`.
    pub fn query_for(&self, page: u32) -> LogQuery {
        LogQuery::select(&self.filter, page, self.size)
    }

    /// Fetches `page` with the active filter.
    ///
    /// On success the page becomes current and both the table and the
    /// pagination controls are rebuilt. On failure the table shows an error
    /// row and everything else stays as it was.
    pub async fn load_page<G>(&mut self, gateway: &G, page: u32) -> Result<()>
    where
        G: Gateway + ?Sized,
    {
        for field in self.filter.shadowed() {
            warn!(field, "filter is set but not sent; only one filter dimension is queried at a time");
        }
        let query = self.query_for(page);
        debug!(?query, "loading logs");
        match gateway.logs(&query).await {
            Ok(result) => {
                // Unpaged endpoints always come back as a single page.
                self.page = if query.is_paged() { page } else { 0 };
                self.table = LogTable::from_entries(&result.content);
                self.controls = pagination_controls(&result, self.page);
                self.last_result = Some(result);
                Ok(())
            }
            Err(e) => {
                error!("Error loading logs: {e}");
                self.table = LogTable::Failed;
                Err(e)
            }
        }
    }

    /// Replaces the filter and goes back to the first page.
    pub async fn apply_filters<G>(&mut self, gateway: &G, criteria: FilterCriteria) -> Result<()>
    where
        G: Gateway + ?Sized,
    {
        self.filter = criteria;
        self.page = 0;
        self.load_page(gateway, 0).await
    }

    /// Returns `false` without fetching when already on the last page.
    pub async fn next_page<G>(&mut self, gateway: &G) -> Result<bool>
    where
        G: Gateway + ?Sized,
    {
        let has_next = self.last_result.as_ref().is_some_and(|r| !r.last);
        if !has_next {
            return Ok(false);
        }
        self.load_page(gateway, self.page + 1).await?;
        Ok(true)
    }

    /// Returns `false` without fetching when already on the first page.
    pub async fn previous_page<G>(&mut self, gateway: &G) -> Result<bool>
    where
        G: Gateway + ?Sized,
    {
        let has_previous = self.page > 0 && self.last_result.as_ref().is_some_and(|r| !r.first);
        if !has_previous {
            return Ok(false);
        }
        self.load_page(gateway, self.page - 1).await?;
        Ok(true)
    }
}

/// Everything the dashboard shows.
#[derive(Debug)]
pub struct Dashboard {
    pub stats: DashboardStatsLoader,
    pub logs: LogQueryManager,
}

impl Dashboard {
    pub fn new(page_size: u32) -> Self {
        Self {
            stats: DashboardStatsLoader::default(),
            logs: LogQueryManager::new(page_size),
        }
    }

    /// Initial load: counters first, then the first page of logs.
    pub async fn load<G>(&mut self, gateway: &G) -> Result<()>
    where
        G: Gateway + ?Sized,
    {
        self.stats.load(gateway).await;
        let page = self.logs.page();
        self.logs.load_page(gateway, page).await
    }
}

/// The dashboard, either idle or lent to a command that is still running.
///
/// A running command is polled as its own flow, so it never holds up an
/// upload driven next to it.
pub enum DashboardSlot<'a> {
    Parked(Dashboard),
    Running(LocalBoxFuture<'a, Dashboard>),
}

impl<'a> DashboardSlot<'a> {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running(_))
    }

    /// Lends the dashboard to `command`. A slot that is already running is
    /// returned unchanged.
    pub fn start<F, Fut>(self, command: F) -> Self
    where
        F: FnOnce(Dashboard) -> Fut,
        Fut: Future<Output = Dashboard> + 'a,
    {
        match self {
            Self::Parked(board) => Self::Running(command(board).boxed_local()),
            running => running,
        }
    }

    /// Resolves with the dashboard once the running command is done;
    /// resolves to `None` straight away when parked.
    pub fn running(&mut self) -> OptionFuture<&mut LocalBoxFuture<'a, Dashboard>> {
        match self {
            Self::Running(command) => Some(command).into(),
            Self::Parked(_) => None.into(),
        }
    }

    /// Waits for any running command and hands the dashboard back.
    pub async fn settle(self) -> Dashboard {
        match self {
            Self::Parked(board) => board,
            Self::Running(command) => command.await,
        }
    }
}
