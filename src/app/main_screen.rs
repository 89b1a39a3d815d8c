// Listing screen: one loader over a TMDB listing, a console viewport over its rows,
// and the proximity check that asks for the next page while scrolling.

use std::fmt::Write as _;
use std::sync::Arc;

use super::pagination::{LoadPhase, LoaderEvent, PageFetcher, PaginatedListLoader, RetryPolicy};
use super::scroll::{ScrollProximity, Viewport};
use crate::api::ShowSummary;
use crate::types::{ShowId, ShowList};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainAction {
    OpenDetails(ShowId),
}

pub struct MainScreen {
    list: ShowList,
    loader: PaginatedListLoader<ShowSummary>,
    proximity: ScrollProximity,
    viewport: Viewport,
    last_error: Option<String>,
}

impl MainScreen {
    pub fn new(
        list: ShowList,
        fetcher: Arc<dyn PageFetcher<ShowSummary>>,
        handle: tokio::runtime::Handle,
        retry: RetryPolicy,
        proximity: ScrollProximity,
        rows: usize,
    ) -> Self {
        let loader = PaginatedListLoader::new(fetcher, handle)
            .with_retry(retry)
            .with_label(format!("main:{}", list));
        Self {
            list,
            loader,
            proximity,
            viewport: Viewport::new(rows),
            last_error: None,
        }
    }

    /// First display kicks off page 1.
    pub fn on_appear(&mut self) {
        if self.loader.phase() == LoadPhase::Idle {
            self.loader.start();
        }
    }

    /// Drains loader completions. Returns true if anything changed on screen.
    pub fn poll(&mut self) -> bool {
        let events = self.loader.poll();
        for ev in &events {
            match ev {
                LoaderEvent::Loaded { .. } | LoaderEvent::Exhausted { .. } => self.last_error = None,
                LoaderEvent::Failed { error, .. } => self.last_error = Some(error.to_string()),
            }
        }
        !events.is_empty()
    }

    pub fn scroll_down(&mut self) {
        let content = self.loader.items().len();
        self.viewport.scroll_down(content);
        if self
            .proximity
            .is_near_bottom(self.viewport.offset, self.viewport.height, content)
        {
            self.loader.on_scroll_near_bottom();
        }
    }

    pub fn retry(&mut self) -> bool {
        if self.loader.phase() != LoadPhase::Failed {
            return false;
        }
        self.loader.load_next()
    }

    pub fn select(&self, index: usize) -> Option<MainAction> {
        self.loader
            .items()
            .get(index)
            .map(|show| MainAction::OpenDetails(show.id))
    }

    #[cfg(test)]
    pub fn loader(&self) -> &PaginatedListLoader<ShowSummary> {
        &self.loader
    }

    pub fn render(&self) -> String {
        let items = self.loader.items();
        let mut out = String::new();
        let _ = writeln!(out, "== {} TV shows ==", self.list.title());
        for idx in self.viewport.visible(items.len()) {
            let show = &items[idx];
            let _ = writeln!(out, "{}", show_row(idx, show));
        }
        let _ = writeln!(out, "{}", self.status_line());
        out
    }

    fn status_line(&self) -> String {
        let shown = self.viewport.visible(self.loader.items().len());
        let total = self.loader.items().len();
        match self.loader.phase() {
            LoadPhase::Idle => "-- not loaded --".to_string(),
            LoadPhase::Loading => format!("-- loading page {}... --", self.loader.current_page()),
            LoadPhase::Failed => format!(
                "-- error: {} (r to retry) --",
                self.last_error.as_deref().unwrap_or("unknown")
            ),
            LoadPhase::Exhausted if total == 0 => "-- no shows --".to_string(),
            LoadPhase::Exhausted => format!("-- {}-{} of {}, end of list --", shown.start + 1, shown.end, total),
            LoadPhase::Ready => format!("-- {}-{} of {}+ --", shown.start + 1, shown.end, total),
        }
    }
}

pub(super) fn show_row(idx: usize, show: &ShowSummary) -> String {
    match show.year() {
        Some(year) => format!("{:>4}. {} ({}) * {:.1}", idx, show.name, year, show.vote_average),
        None => format!("{:>4}. {} * {:.1}", idx, show.name, show.vote_average),
    }
}
