// Canned data sources shared by the screen tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use super::pagination::{FetchError, PageFetcher};
use super::sources::DetailsProvider;
use crate::api::{ShowDetails, ShowSummary};
use crate::types::ShowId;

pub fn show(id: u64) -> ShowSummary {
    ShowSummary {
        id: ShowId(id),
        name: format!("Show {id}"),
        vote_average: 7.5,
        first_air_date: Some("2020-01-01".to_string()),
    }
}

pub fn details(id: u64) -> ShowDetails {
    ShowDetails {
        id: ShowId(id),
        name: format!("Show {id}"),
        overview: "A show.".to_string(),
        poster_path: Some("/poster.jpg".to_string()),
        backdrop_path: Some("/backdrop.jpg".to_string()),
        vote_average: 8.0,
        vote_count: 120,
        first_air_date: Some("2019-05-02".to_string()),
        number_of_seasons: 2,
        number_of_episodes: 16,
        genres: Vec::new(),
        status: "Returning Series".to_string(),
        homepage: Some(format!("https://example.org/shows/{id}")),
    }
}

/// Serves `pages[n - 1]` for page n and an empty page past the end.
pub struct StaticFetcher {
    pages: Vec<Vec<ShowSummary>>,
    failures: Mutex<HashMap<u32, u32>>,
    calls: Mutex<Vec<u32>>,
}

impl StaticFetcher {
    pub fn pages(pages: Vec<Vec<ShowSummary>>) -> Self {
        Self {
            pages,
            failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// The first request for `page` fails with a network error.
    pub fn fail_first(self, page: u32) -> Self {
        *self.failures.lock().unwrap().entry(page).or_default() += 1;
        self
    }

    pub fn calls(&self) -> Vec<u32> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher<ShowSummary> for StaticFetcher {
    async fn fetch_page(&self, page: u32) -> Result<Vec<ShowSummary>, FetchError> {
        self.calls.lock().unwrap().push(page);
        {
            let mut failures = self.failures.lock().unwrap();
            if let Some(left) = failures.get_mut(&page).filter(|n| **n > 0) {
                *left -= 1;
                return Err(FetchError::Network("connection refused".into()));
            }
        }
        let idx = page.saturating_sub(1) as usize;
        Ok(self.pages.get(idx).cloned().unwrap_or_default())
    }
}

pub struct StaticDetails(pub Result<ShowDetails, FetchError>);

#[async_trait]
impl DetailsProvider for StaticDetails {
    async fn fetch_details(&self, _show_id: ShowId) -> Result<ShowDetails, FetchError> {
        self.0.clone()
    }
}

/// Polls `f` until it reports a change, failing the test after two seconds.
pub async fn wait_until<F: FnMut() -> bool>(mut f: F) {
    for _ in 0..400 {
        if f() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not met within 2s");
}
