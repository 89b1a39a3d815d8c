// Incremental page loading: fetch page N, append, detect the end, ask for N+1 near the bottom.
//
// `LoaderState` is the bare state machine, `PaginatedListLoader` drives it against a
// `PageFetcher` on the tokio runtime and hands completions back through `poll()`.

mod error;
mod fetcher;
mod loader;
mod retry;
mod state;

pub use error::FetchError;
pub use fetcher::PageFetcher;
pub use loader::PaginatedListLoader;
pub use retry::RetryPolicy;
pub use state::{LoadPhase, LoaderEvent, LoaderState};
