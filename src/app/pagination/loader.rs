use std::sync::Arc;
use std::sync::mpsc;

use super::{FetchError, LoadPhase, LoaderEvent, LoaderState, PageFetcher, RetryPolicy};

type PageResult<T> = (u32, Result<Vec<T>, FetchError>);

/// Drives a `LoaderState` against a `PageFetcher`.
///
/// Fetches run on the given tokio runtime; their results wait in a channel until the
/// owner calls `poll()`, so state only ever changes on the owner's thread.
pub struct PaginatedListLoader<T> {
    label: String,
    state: LoaderState<T>,
    fetcher: Arc<dyn PageFetcher<T>>,
    retry: RetryPolicy,
    handle: tokio::runtime::Handle,
    tx: mpsc::Sender<PageResult<T>>,
    rx: mpsc::Receiver<PageResult<T>>,
}

impl<T: Clone + Send + 'static> PaginatedListLoader<T> {
    pub fn new(fetcher: Arc<dyn PageFetcher<T>>, handle: tokio::runtime::Handle) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            label: "list".to_string(),
            state: LoaderState::new(),
            fetcher,
            retry: RetryPolicy::default(),
            handle,
            tx,
            rx,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Name used in log lines.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn start(&mut self) {
        match self.state.begin_start() {
            Some(page) => self.spawn_fetch(page),
            None => log::warn!("{}: start() called on a loader that already started", self.label),
        }
    }

    /// Returns true if a request was issued.
    pub fn load_next(&mut self) -> bool {
        match self.state.begin_next() {
            Some(page) => {
                self.spawn_fetch(page);
                true
            }
            None => {
                log::trace!(
                    "{}: load_next ignored in phase {:?}",
                    self.label,
                    self.state.phase()
                );
                false
            }
        }
    }

    pub fn on_scroll_near_bottom(&mut self) -> bool {
        self.load_next()
    }

    /// Applies every completion that arrived since the last call, oldest first.
    pub fn poll(&mut self) -> Vec<LoaderEvent<T>> {
        let mut events = Vec::new();
        while let Ok((page, result)) = self.rx.try_recv() {
            if let Some(ev) = self.state.complete(page, result) {
                match &ev {
                    LoaderEvent::Loaded { page, items } => log::info!(
                        "{}: page {} loaded ({} items, {} total)",
                        self.label,
                        page,
                        items.len(),
                        self.state.items().len()
                    ),
                    LoaderEvent::Exhausted { page } => {
                        log::info!("{}: page {} is empty, end of list", self.label, page)
                    }
                    LoaderEvent::Failed { page, error } => {
                        log::warn!("{}: page {} failed: {}", self.label, page, error)
                    }
                }
                events.push(ev);
            }
        }
        events
    }

    fn spawn_fetch(&self, page: u32) {
        log::debug!("{}: requesting page {}", self.label, page);
        let fetcher = self.fetcher.clone();
        let retry = self.retry;
        let tx = self.tx.clone();
        let label = self.label.clone();
        self.handle.spawn(async move {
            let result = retry.run(|| fetcher.fetch_page(page)).await;
            if tx.send((page, result)).is_err() {
                log::debug!("{}: page {} finished after the loader was dropped", label, page);
            }
        });
    }

    pub fn items(&self) -> &[T] {
        self.state.items()
    }

    pub fn phase(&self) -> LoadPhase {
        self.state.phase()
    }

    pub fn current_page(&self) -> u32 {
        self.state.current_page()
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Semaphore;

    /// Fetcher that answers from a script and records every page it was asked for.
    /// With a gate, each request waits for one permit before answering.
    struct ScriptedFetcher {
        script: Mutex<HashMap<u32, VecDeque<Result<Vec<&'static str>, FetchError>>>>,
        calls: Mutex<Vec<u32>>,
        gate: Option<Arc<Semaphore>>,
    }

    impl ScriptedFetcher {
        fn new() -> Self {
            Self {
                script: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
                gate: None,
            }
        }

        fn gated(gate: Arc<Semaphore>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::new()
            }
        }

        fn respond(self, page: u32, result: Result<Vec<&'static str>, FetchError>) -> Self {
            self.script
                .lock()
                .unwrap()
                .entry(page)
                .or_default()
                .push_back(result);
            self
        }

        fn calls(&self) -> Vec<u32> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageFetcher<&'static str> for ScriptedFetcher {
        async fn fetch_page(&self, page: u32) -> Result<Vec<&'static str>, FetchError> {
            self.calls.lock().unwrap().push(page);
            if let Some(gate) = &self.gate {
                gate.acquire().await.expect("gate closed").forget();
            }
            self.script
                .lock()
                .unwrap()
                .get_mut(&page)
                .and_then(|q| q.pop_front())
                .unwrap_or(Ok(Vec::new()))
        }
    }

    fn loader(fetcher: &Arc<ScriptedFetcher>) -> PaginatedListLoader<&'static str> {
        let dyn_fetcher: Arc<dyn PageFetcher<&'static str>> = fetcher.clone();
        PaginatedListLoader::new(dyn_fetcher, tokio::runtime::Handle::current()).with_label("test")
    }

    async fn next_events(loader: &mut PaginatedListLoader<&'static str>) -> Vec<LoaderEvent<&'static str>> {
        for _ in 0..400 {
            let events = loader.poll();
            if !events.is_empty() {
                return events;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("no loader events within 2s");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn scroll_through_to_exhaustion() {
        let fetcher = Arc::new(
            ScriptedFetcher::new()
                .respond(1, Ok(vec!["a", "b", "c"]))
                .respond(2, Ok(vec![])),
        );
        let mut l = loader(&fetcher);

        l.start();
        assert!(l.is_loading());
        let ev = next_events(&mut l).await;
        assert_eq!(ev, vec![LoaderEvent::Loaded { page: 1, items: vec!["a", "b", "c"] }]);
        assert_eq!(l.phase(), LoadPhase::Ready);
        assert_eq!(l.current_page(), 1);

        assert!(l.on_scroll_near_bottom());
        let ev = next_events(&mut l).await;
        assert_eq!(ev, vec![LoaderEvent::Exhausted { page: 2 }]);
        assert_eq!(l.phase(), LoadPhase::Exhausted);
        assert_eq!(l.items(), &["a", "b", "c"]);
        assert_eq!(l.current_page(), 2);

        assert!(!l.on_scroll_near_bottom());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(l.poll().is_empty());
        assert_eq!(fetcher.calls(), vec![1, 2]);
        assert_eq!(l.phase(), LoadPhase::Exhausted);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn failed_start_retries_page_one() {
        let fetcher = Arc::new(
            ScriptedFetcher::new()
                .respond(1, Err(FetchError::Network("offline".into())))
                .respond(1, Ok(vec!["a"])),
        );
        let mut l = loader(&fetcher);

        l.start();
        let ev = next_events(&mut l).await;
        assert!(matches!(ev.as_slice(), [LoaderEvent::Failed { page: 1, .. }]));
        assert!(!l.is_loading());
        assert_eq!(l.current_page(), 1);
        assert!(l.items().is_empty());

        assert!(l.load_next());
        let ev = next_events(&mut l).await;
        assert_eq!(ev, vec![LoaderEvent::Loaded { page: 1, items: vec!["a"] }]);
        assert_eq!(fetcher.calls(), vec![1, 1]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn repeated_proximity_signals_issue_one_request() {
        let gate = Arc::new(Semaphore::new(1));
        let fetcher = Arc::new(
            ScriptedFetcher::gated(gate.clone())
                .respond(1, Ok(vec!["a"]))
                .respond(2, Ok(vec!["b"])),
        );
        let mut l = loader(&fetcher);

        l.start();
        next_events(&mut l).await;

        assert!(l.on_scroll_near_bottom());
        assert!(!l.on_scroll_near_bottom());
        assert!(!l.load_next());
        // Page 2 is still held by the gate.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(l.poll().is_empty());
        assert!(l.is_loading());

        gate.add_permits(1);
        let ev = next_events(&mut l).await;
        assert_eq!(ev, vec![LoaderEvent::Loaded { page: 2, items: vec!["b"] }]);
        assert_eq!(fetcher.calls(), vec![1, 2]);
        assert_eq!(l.items(), &["a", "b"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn retry_policy_absorbs_transient_failures() {
        let fetcher = Arc::new(
            ScriptedFetcher::new()
                .respond(1, Err(FetchError::Network("reset".into())))
                .respond(1, Ok(vec!["a"])),
        );
        let mut l = loader(&fetcher).with_retry(RetryPolicy {
            max_attempts: 2,
            backoff_ms: 1,
        });

        l.start();
        let ev = next_events(&mut l).await;
        assert_eq!(ev, vec![LoaderEvent::Loaded { page: 1, items: vec!["a"] }]);
        assert_eq!(fetcher.calls(), vec![1, 1]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn second_start_does_not_fetch() {
        let fetcher = Arc::new(ScriptedFetcher::new().respond(1, Ok(vec!["a"])));
        let mut l = loader(&fetcher);
        l.start();
        l.start();
        next_events(&mut l).await;
        l.start();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(l.poll().is_empty());
        assert_eq!(fetcher.calls(), vec![1]);
    }
}
