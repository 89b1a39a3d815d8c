// Detail screen: the full record for one show id plus a paged "similar shows" list.

use std::fmt::Write as _;
use std::sync::{Arc, mpsc};

use super::main_screen::show_row;
use super::pagination::{FetchError, LoadPhase, PageFetcher, PaginatedListLoader, RetryPolicy};
use super::sources::DetailsProvider;
use crate::api::{ShowDetails, ShowSummary, image_url};
use crate::types::ShowId;

pub struct DetailsScreen {
    show_id: ShowId,
    provider: Arc<dyn DetailsProvider>,
    handle: tokio::runtime::Handle,
    details: Option<ShowDetails>,
    error: Option<String>,
    loading: bool,
    tx: mpsc::Sender<Result<ShowDetails, FetchError>>,
    rx: mpsc::Receiver<Result<ShowDetails, FetchError>>,
    similar: PaginatedListLoader<ShowSummary>,
}

impl DetailsScreen {
    pub fn new(
        show_id: ShowId,
        provider: Arc<dyn DetailsProvider>,
        similar: Arc<dyn PageFetcher<ShowSummary>>,
        handle: tokio::runtime::Handle,
        retry: RetryPolicy,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        let similar = PaginatedListLoader::new(similar, handle.clone())
            .with_retry(retry)
            .with_label(format!("similar:{}", show_id));
        Self {
            show_id,
            provider,
            handle,
            details: None,
            error: None,
            loading: false,
            tx,
            rx,
            similar,
        }
    }

    pub fn on_appear(&mut self) {
        if self.details.is_none() && !self.loading {
            self.spawn_details();
        }
        if self.similar.phase() == LoadPhase::Idle {
            self.similar.start();
        }
    }

    fn spawn_details(&mut self) {
        self.loading = true;
        self.error = None;
        let provider = self.provider.clone();
        let tx = self.tx.clone();
        let id = self.show_id;
        self.handle.spawn(async move {
            let res = provider.fetch_details(id).await;
            if let Err(e) = &res {
                log::warn!("details fetch failed: id={} err={}", id, e);
            }
            if tx.send(res).is_err() {
                log::debug!("details for id={} arrived after the screen was closed", id);
            }
        });
    }

    /// Returns true if anything changed on screen.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(res) = self.rx.try_recv() {
            self.loading = false;
            match res {
                Ok(d) => {
                    if d.id != self.show_id {
                        log::warn!("details for id={} returned record id={}", self.show_id, d.id);
                    }
                    self.details = Some(d);
                    self.error = None;
                }
                Err(e) => self.error = Some(e.to_string()),
            }
            changed = true;
        }
        !self.similar.poll().is_empty() || changed
    }

    /// Retries whatever failed: the record itself and/or the similar list.
    pub fn retry(&mut self) -> bool {
        let mut issued = false;
        if self.error.is_some() && !self.loading {
            self.spawn_details();
            issued = true;
        }
        if self.similar.phase() == LoadPhase::Failed {
            issued |= self.similar.load_next();
        }
        issued
    }

    /// The similar list has no viewport of its own; every "scroll" asks for more.
    pub fn scroll_down(&mut self) -> bool {
        self.similar.on_scroll_near_bottom()
    }

    pub fn select_similar(&self, index: usize) -> Option<ShowId> {
        self.similar.items().get(index).map(|s| s.id)
    }

    pub fn details(&self) -> Option<&ShowDetails> {
        self.details.as_ref()
    }

    pub fn similar(&self) -> &PaginatedListLoader<ShowSummary> {
        &self.similar
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        match (&self.details, &self.error) {
            (Some(d), _) => {
                let _ = writeln!(out, "== {} ==", d.name);
                if let Some(date) = d.first_air_date.as_deref().filter(|s| !s.is_empty()) {
                    let _ = writeln!(out, "First aired: {}   Status: {}", date, d.status);
                }
                let _ = writeln!(
                    out,
                    "Rating: {:.1} ({} votes)   Seasons: {}   Episodes: {}",
                    d.vote_average, d.vote_count, d.number_of_seasons, d.number_of_episodes
                );
                if !d.genres.is_empty() {
                    let _ = writeln!(out, "Genres: {}", d.genre_names());
                }
                if let Some(url) = d.poster_path.as_deref().and_then(|p| image_url(p, "w342")) {
                    let _ = writeln!(out, "Poster: {}", url);
                }
                if let Some(url) = d.backdrop_path.as_deref().and_then(|p| image_url(p, "w780")) {
                    let _ = writeln!(out, "Backdrop: {}", url);
                }
                if let Some(home) = d.homepage.as_deref().filter(|h| !h.is_empty()) {
                    let _ = writeln!(out, "Homepage: {}", home);
                }
                if !d.overview.is_empty() {
                    let _ = writeln!(out, "\n{}", d.overview);
                }
            }
            (None, Some(err)) => {
                let _ = writeln!(out, "== show {} ==\nerror: {} (r to retry)", self.show_id, err);
            }
            (None, None) => {
                let _ = writeln!(out, "== show {} ==\nloading...", self.show_id);
            }
        }

        let _ = writeln!(out, "\n-- similar shows --");
        for (idx, show) in self.similar.items().iter().enumerate() {
            let _ = writeln!(out, "{}", show_row(idx, show));
        }
        let footer = match self.similar.phase() {
            LoadPhase::Idle => "",
            LoadPhase::Loading => "loading...",
            LoadPhase::Ready => "m for more",
            LoadPhase::Failed => "failed to load (r to retry)",
            LoadPhase::Exhausted if self.similar.items().is_empty() => "none",
            LoadPhase::Exhausted => "end of list",
        };
        let _ = writeln!(out, "-- {} --", footer);
        out
    }
}
