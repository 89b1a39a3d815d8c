use async_trait::async_trait;

use super::FetchError;

/// Data source for one listing. Pages are numbered from 1; an empty page means
/// there is nothing after it.
#[async_trait]
pub trait PageFetcher<T>: Send + Sync {
    async fn fetch_page(&self, page: u32) -> Result<Vec<T>, FetchError>;
}
