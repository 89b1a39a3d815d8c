use super::FetchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    /// Nothing requested yet.
    Idle,
    /// One page request is in flight.
    Loading,
    /// At least one page arrived and more may follow.
    Ready,
    /// The last request failed; the same page is requested again on the next load.
    Failed,
    /// The last page came back empty. Terminal.
    Exhausted,
}

/// Completion notification, one per finished page request.
#[derive(Debug, Clone, PartialEq)]
pub enum LoaderEvent<T> {
    Loaded { page: u32, items: Vec<T> },
    Exhausted { page: u32 },
    Failed { page: u32, error: FetchError },
}

#[derive(Debug, Clone)]
pub struct LoaderState<T> {
    current_page: u32,
    is_loading: bool,
    has_next_page: bool,
    items: Vec<T>,
    phase: LoadPhase,
    // has_next_page as it was before the in-flight request; restored if it fails
    has_next_before: bool,
    in_flight: Option<u32>,
}

impl<T> Default for LoaderState<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LoaderState<T> {
    pub fn new() -> Self {
        Self {
            current_page: 1,
            is_loading: false,
            has_next_page: false,
            items: Vec::new(),
            phase: LoadPhase::Idle,
            has_next_before: false,
            in_flight: None,
        }
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    #[cfg(test)]
    pub fn has_next_page(&self) -> bool {
        self.has_next_page
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    #[cfg(test)]
    pub fn in_flight(&self) -> Option<u32> {
        self.in_flight
    }

    /// Page 1, once. Returns the page to request, or `None` if the loader was already started.
    pub fn begin_start(&mut self) -> Option<u32> {
        if self.phase != LoadPhase::Idle {
            return None;
        }
        Some(self.launch(1))
    }

    /// Next page to request, or `None` when a request is in flight or the listing is exhausted.
    pub fn begin_next(&mut self) -> Option<u32> {
        match self.phase {
            LoadPhase::Idle => self.begin_start(),
            LoadPhase::Loading | LoadPhase::Exhausted => None,
            LoadPhase::Failed => Some(self.launch(self.current_page)),
            LoadPhase::Ready if !self.has_next_page => None,
            LoadPhase::Ready => Some(self.launch(self.current_page + 1)),
        }
    }

    fn launch(&mut self, page: u32) -> u32 {
        self.has_next_before = self.has_next_page;
        self.is_loading = true;
        self.has_next_page = false;
        self.current_page = page;
        self.in_flight = Some(page);
        self.phase = LoadPhase::Loading;
        page
    }

    /// Applies the result of the in-flight request. Results for any other page are dropped.
    pub fn complete(
        &mut self,
        page: u32,
        result: Result<Vec<T>, FetchError>,
    ) -> Option<LoaderEvent<T>>
    where
        T: Clone,
    {
        if self.in_flight != Some(page) {
            log::warn!(
                "dropping result for page {} (in flight: {:?})",
                page,
                self.in_flight
            );
            return None;
        }
        self.in_flight = None;
        self.is_loading = false;

        match result {
            Ok(items) if items.is_empty() => {
                self.has_next_page = false;
                self.phase = LoadPhase::Exhausted;
                Some(LoaderEvent::Exhausted { page })
            }
            Ok(items) => {
                self.has_next_page = true;
                self.phase = LoadPhase::Ready;
                self.items.extend(items.iter().cloned());
                Some(LoaderEvent::Loaded { page, items })
            }
            Err(error) => {
                self.has_next_page = self.has_next_before;
                self.phase = LoadPhase::Failed;
                Some(LoaderEvent::Failed { page, error })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net_err() -> FetchError {
        FetchError::Network("connection reset".into())
    }

    #[test]
    fn first_page_makes_loader_ready() {
        let mut st = LoaderState::new();
        assert_eq!(st.begin_start(), Some(1));
        assert!(st.is_loading());

        let ev = st.complete(1, Ok(vec!['a', 'b', 'c']));
        assert_eq!(
            ev,
            Some(LoaderEvent::Loaded {
                page: 1,
                items: vec!['a', 'b', 'c']
            })
        );
        assert_eq!(st.phase(), LoadPhase::Ready);
        assert_eq!(st.items(), &['a', 'b', 'c']);
        assert_eq!(st.current_page(), 1);
        assert!(st.has_next_page());
        assert!(!st.is_loading());
    }

    #[test]
    fn empty_page_exhausts_and_further_loads_are_ignored() {
        let mut st = LoaderState::new();
        st.begin_start();
        st.complete(1, Ok(vec!['a', 'b', 'c']));

        assert_eq!(st.begin_next(), Some(2));
        assert_eq!(st.complete(2, Ok(vec![])), Some(LoaderEvent::Exhausted { page: 2 }));
        assert_eq!(st.phase(), LoadPhase::Exhausted);
        assert_eq!(st.items(), &['a', 'b', 'c']);
        assert_eq!(st.current_page(), 2);
        assert!(!st.has_next_page());

        for _ in 0..3 {
            assert_eq!(st.begin_next(), None);
        }
        assert_eq!(st.phase(), LoadPhase::Exhausted);
        assert_eq!(st.current_page(), 2);
        assert!(!st.is_loading());
    }

    #[test]
    fn failed_first_page_is_retried_as_page_one() {
        let mut st: LoaderState<char> = LoaderState::new();
        st.begin_start();
        let ev = st.complete(1, Err(net_err()));
        assert!(matches!(ev, Some(LoaderEvent::Failed { page: 1, .. })));
        assert_eq!(st.phase(), LoadPhase::Failed);
        assert!(!st.is_loading());
        assert_eq!(st.current_page(), 1);
        assert!(st.items().is_empty());

        assert_eq!(st.begin_next(), Some(1));
    }

    #[test]
    fn failure_restores_has_next_page_and_keeps_items() {
        let mut st = LoaderState::new();
        st.begin_start();
        st.complete(1, Ok(vec![1, 2]));
        assert_eq!(st.begin_next(), Some(2));
        assert!(!st.has_next_page());

        st.complete(2, Err(net_err()));
        assert!(st.has_next_page());
        assert_eq!(st.items(), &[1, 2]);
        assert_eq!(st.current_page(), 2);

        // Retry asks for page 2 again, then moves on normally.
        assert_eq!(st.begin_next(), Some(2));
        st.complete(2, Ok(vec![3]));
        assert_eq!(st.begin_next(), Some(3));
    }

    #[test]
    fn only_one_request_in_flight() {
        let mut st: LoaderState<u8> = LoaderState::new();
        assert_eq!(st.begin_start(), Some(1));
        assert_eq!(st.begin_next(), None);
        assert_eq!(st.begin_next(), None);
        assert_eq!(st.begin_start(), None);
        assert_eq!(st.in_flight(), Some(1));
    }

    #[test]
    fn start_twice_is_ignored() {
        let mut st = LoaderState::new();
        st.begin_start();
        st.complete(1, Ok(vec![1]));
        assert_eq!(st.begin_start(), None);
        assert_eq!(st.current_page(), 1);
    }

    #[test]
    fn load_next_before_start_requests_page_one() {
        let mut st: LoaderState<u8> = LoaderState::new();
        assert_eq!(st.begin_next(), Some(1));
        assert_eq!(st.current_page(), 1);
    }

    #[test]
    fn stray_completion_is_dropped() {
        let mut st = LoaderState::new();
        st.begin_start();
        assert_eq!(st.complete(7, Ok(vec![1])), None);
        assert!(st.is_loading());
        assert!(st.items().is_empty());
    }

    #[test]
    fn items_are_concatenated_in_request_order_without_dedup() {
        let pages = [vec![1, 2, 3], vec![3, 4], vec![1], vec![5, 6, 7, 8]];
        let mut st = LoaderState::new();
        let mut expected = Vec::new();
        for (i, page) in pages.iter().enumerate() {
            let requested = st.begin_next().unwrap();
            assert_eq!(requested, i as u32 + 1);
            st.complete(requested, Ok(page.clone()));
            expected.extend(page.iter().copied());
        }
        assert_eq!(st.items(), expected.as_slice());
    }

    #[test]
    fn page_counter_moves_by_one_per_success_and_holds_on_failure() {
        // Deterministic mix of outcomes: every third response fails.
        let mut st = LoaderState::new();
        let mut successes = 0u32;
        for step in 0..30u32 {
            let before = st.current_page();
            let Some(page) = st.begin_next() else {
                panic!("loader stalled at step {step}");
            };
            if st.phase() == LoadPhase::Loading && step > 0 {
                assert!(page == before || page == before + 1);
            }
            if step % 3 == 2 {
                st.complete(page, Err(net_err()));
                assert_eq!(st.current_page(), page);
            } else {
                st.complete(page, Ok(vec![step]));
                successes += 1;
                assert_eq!(st.current_page(), successes);
            }
        }
        assert_eq!(st.items().len() as u32, successes);
    }
}
