// PageFetcher implementations backed by the TMDB client.

use async_trait::async_trait;

use super::pagination::{FetchError, PageFetcher};
use crate::api::{self, ShowDetails, ShowSummary, TmdbError};
use crate::types::{ShowId, ShowList};

impl From<TmdbError> for FetchError {
    fn from(e: TmdbError) -> Self {
        match e {
            TmdbError::MissingApiKey => FetchError::Config(e.to_string()),
            TmdbError::Url(e) => FetchError::Config(e.to_string()),
            TmdbError::Reqwest(e) if e.is_decode() => FetchError::Decode(e.to_string()),
            TmdbError::Reqwest(e) => FetchError::Network(e.to_string()),
            TmdbError::Api { status, message } => FetchError::Api { status, message },
            TmdbError::Decode(e) => FetchError::Decode(e.to_string()),
        }
    }
}

/// One of the `/tv/<list>` listings.
pub struct ListPageFetcher {
    list: ShowList,
}

impl ListPageFetcher {
    pub fn new(list: ShowList) -> Self {
        Self { list }
    }
}

#[async_trait]
impl PageFetcher<ShowSummary> for ListPageFetcher {
    async fn fetch_page(&self, page: u32) -> Result<Vec<ShowSummary>, FetchError> {
        let resp = api::fetch_list_page(self.list, page).await?;
        Ok(resp.into_items())
    }
}

/// Shows TMDB considers similar to one show.
pub struct SimilarPageFetcher {
    show_id: ShowId,
}

impl SimilarPageFetcher {
    pub fn new(show_id: ShowId) -> Self {
        Self { show_id }
    }
}

#[async_trait]
impl PageFetcher<ShowSummary> for SimilarPageFetcher {
    async fn fetch_page(&self, page: u32) -> Result<Vec<ShowSummary>, FetchError> {
        let resp = api::fetch_similar_page(self.show_id, page).await?;
        Ok(resp.into_items())
    }
}

/// Source of the full record behind the detail screen.
#[async_trait]
pub trait DetailsProvider: Send + Sync {
    async fn fetch_details(&self, show_id: ShowId) -> Result<ShowDetails, FetchError>;
}

pub struct TmdbDetailsProvider;

#[async_trait]
impl DetailsProvider for TmdbDetailsProvider {
    async fn fetch_details(&self, show_id: ShowId) -> Result<ShowDetails, FetchError> {
        Ok(api::fetch_show_details(show_id).await?)
    }
}
