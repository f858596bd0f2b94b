//! Search-as-you-type location lookup.
//!
//! [`LocationSearch`] is a plain state machine driven by explicit timestamps;
//! [`SearchDriver`] runs it against a live input channel and geocoding
//! provider. Every issued query gets a monotonically increasing id and only
//! the response to the latest id is applied.

use std::{sync::Arc, time::Duration};

use tokio::{sync::mpsc, time::Instant};

use crate::{
    config::SearchConfig,
    error::WeatherError,
    model::{LocationCandidate, SelectedLocation},
    provider::GeocodingProvider,
};

/// Holds the most recent value until `delay` has passed without a new one.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at)
    }

    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        match self.pending.take() {
            Some((value, at)) if at <= now => Some(value),
            other => {
                self.pending = other;
                None
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchState {
    Idle,
    Querying { id: u64, query: String },
    /// An empty list means the query matched nothing.
    Showing(Vec<LocationCandidate>),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub id: u64,
    pub query: String,
}

#[derive(Debug)]
pub struct LocationSearch {
    state: SearchState,
    debouncer: Debouncer<String>,
    min_query_len: usize,
    last_issued: u64,
}

impl LocationSearch {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            state: SearchState::Idle,
            debouncer: Debouncer::new(config.debounce()),
            min_query_len: config.min_query_len,
            last_issued: 0,
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn candidates(&self) -> &[LocationCandidate] {
        match &self.state {
            SearchState::Showing(candidates) => candidates,
            _ => &[],
        }
    }

    /// When the pending query becomes due, if one is scheduled.
    pub fn deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// A keystroke: drops any pending query and schedules a new one if the
    /// trimmed text is long enough.
    ///
    /// Shortening the text below the minimum also drops the pending query, so
    /// a search never runs for text that is no longer in the box.
    pub fn input(&mut self, text: &str, now: Instant) {
        self.debouncer.cancel();

        let query = text.trim();
        if query.chars().count() < self.min_query_len {
            return;
        }
        self.debouncer.push(query.to_string(), now);
    }

    pub fn poll_due(&mut self, now: Instant) -> Option<SearchRequest> {
        let query = self.debouncer.take_due(now)?;

        self.last_issued += 1;
        let id = self.last_issued;
        self.state = SearchState::Querying { id, query: query.clone() };

        tracing::debug!(id, query = %query, "issuing location search");
        Some(SearchRequest { id, query })
    }

    /// Apply a finished request. Returns `false` if a newer request has been
    /// issued since, in which case the result is discarded.
    pub fn complete(
        &mut self,
        id: u64,
        result: Result<Vec<LocationCandidate>, WeatherError>,
    ) -> bool {
        if id != self.last_issued {
            tracing::warn!(id, latest = self.last_issued, "discarding stale search response");
            return false;
        }

        self.state = match result {
            Ok(candidates) => SearchState::Showing(candidates),
            Err(WeatherError::EmptyResult) => SearchState::Showing(Vec::new()),
            Err(err) => {
                tracing::warn!(error = %err, "location search failed");
                SearchState::Error(err.to_string())
            }
        };
        true
    }

    /// Pick a suggestion. Clears the list and returns to idle.
    pub fn select(&mut self, index: usize) -> Option<SelectedLocation> {
        let selected = self.candidates().get(index)?.to_selected();
        self.state = SearchState::Idle;
        tracing::info!(name = %selected.name, "location selected");
        Some(selected)
    }
}

type Completion = (u64, Result<Vec<LocationCandidate>, WeatherError>);

/// Runs a [`LocationSearch`] against an input channel.
#[derive(Debug)]
pub struct SearchDriver {
    provider: Arc<dyn GeocodingProvider>,
    search: LocationSearch,
}

impl SearchDriver {
    pub fn new(provider: Arc<dyn GeocodingProvider>, search: LocationSearch) -> Self {
        Self { provider, search }
    }

    /// Consume input text until the channel closes, publishing every state
    /// change on `updates`. Returns once input is closed and no query is
    /// pending or in flight.
    pub async fn run(
        mut self,
        mut inputs: mpsc::Receiver<String>,
        updates: mpsc::UnboundedSender<SearchState>,
    ) -> LocationSearch {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();
        let mut inputs_open = true;
        let mut in_flight = 0usize;

        loop {
            let deadline = self.search.deadline();
            if !inputs_open && deadline.is_none() && in_flight == 0 {
                break;
            }
            let wake_at = deadline.unwrap_or_else(Instant::now);

            tokio::select! {
                received = inputs.recv(), if inputs_open => match received {
                    Some(text) => self.search.input(&text, Instant::now()),
                    None => inputs_open = false,
                },
                _ = tokio::time::sleep_until(wake_at), if deadline.is_some() => {
                    if let Some(request) = self.search.poll_due(Instant::now()) {
                        let _ = updates.send(self.search.state().clone());
                        in_flight += 1;

                        let provider = Arc::clone(&self.provider);
                        let done = done_tx.clone();
                        tokio::spawn(async move {
                            let result = provider.search(&request.query).await;
                            let _ = done.send((request.id, result));
                        });
                    }
                }
                Some((id, result)) = done_rx.recv(), if in_flight > 0 => {
                    in_flight -= 1;
                    if self.search.complete(id, result) {
                        let _ = updates.send(self.search.state().clone());
                    }
                }
                else => break,
            }
        }

        self.search
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use reqwest::StatusCode;
    use tokio::time::sleep;

    fn london() -> LocationCandidate {
        LocationCandidate::new("London", Some("UK"), 51.5, -0.12)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Records each query with the time it was issued; queries listed in
    /// `slow` take a second to answer.
    #[derive(Debug, Default)]
    struct RecordingGeocoder {
        calls: Mutex<Vec<(String, Instant)>>,
        slow: Vec<&'static str>,
    }

    impl RecordingGeocoder {
        fn calls(&self) -> Vec<(String, Instant)> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl GeocodingProvider for RecordingGeocoder {
        async fn search(&self, query: &str) -> Result<Vec<LocationCandidate>, WeatherError> {
            self.calls.lock().push((query.to_string(), Instant::now()));
            if self.slow.iter().any(|slow| *slow == query) {
                sleep(Duration::from_secs(1)).await;
            }
            Ok(vec![LocationCandidate::new(query, Some("Test"), 1.0, 2.0)])
        }
    }

    #[test]
    fn debouncer_keeps_latest_value() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(ms(300));

        d.push("a", t0);
        d.push("b", t0 + ms(50));
        assert_eq!(d.deadline(), Some(t0 + ms(350)));
        assert_eq!(d.take_due(t0 + ms(349)), None);
        assert_eq!(d.take_due(t0 + ms(350)), Some("b"));
        assert_eq!(d.take_due(t0 + ms(1000)), None);
    }

    #[test]
    fn short_queries_are_not_scheduled() {
        let t0 = Instant::now();
        let mut search = LocationSearch::new(&SearchConfig::default());

        search.input("  L ", t0);
        assert_eq!(search.deadline(), None);
        assert_eq!(search.poll_due(t0 + ms(1000)), None);
        assert_eq!(search.state(), &SearchState::Idle);
    }

    #[test]
    fn short_keystroke_cancels_pending_query() {
        let t0 = Instant::now();
        let mut search = LocationSearch::new(&SearchConfig::default());

        search.input("Lo", t0);
        search.input("L", t0 + ms(100));
        assert_eq!(search.poll_due(t0 + ms(1000)), None);
    }

    #[test]
    fn three_quick_inputs_issue_one_request() {
        let t0 = Instant::now();
        let mut search = LocationSearch::new(&SearchConfig::default());

        search.input("Lo", t0);
        search.input("Lon", t0 + ms(50));
        search.input("Lond", t0 + ms(100));

        assert_eq!(search.poll_due(t0 + ms(399)), None);
        let request = search.poll_due(t0 + ms(400)).unwrap();
        assert_eq!(request, SearchRequest { id: 1, query: "Lond".into() });
        assert_eq!(search.poll_due(t0 + ms(2000)), None);
        assert!(matches!(search.state(), SearchState::Querying { id: 1, .. }));
    }

    #[test]
    fn stale_response_is_discarded() {
        let t0 = Instant::now();
        let mut search = LocationSearch::new(&SearchConfig::default());

        search.input("Lon", t0);
        let first = search.poll_due(t0 + ms(300)).unwrap();
        search.input("Paris", t0 + ms(400));
        let second = search.poll_due(t0 + ms(700)).unwrap();

        let paris = LocationCandidate::new("Paris", Some("France"), 48.85, 2.35);
        assert!(search.complete(second.id, Ok(vec![paris.clone()])));
        assert!(!search.complete(first.id, Ok(vec![london()])));
        assert_eq!(search.candidates(), &[paris]);
    }

    #[test]
    fn empty_result_shows_empty_list() {
        let t0 = Instant::now();
        let mut search = LocationSearch::new(&SearchConfig::default());
        search.input("Zzzz", t0);
        let req = search.poll_due(t0 + ms(300)).unwrap();

        assert!(search.complete(req.id, Ok(vec![])));
        assert_eq!(search.state(), &SearchState::Showing(vec![]));
    }

    #[test]
    fn failure_moves_to_error_state() {
        let t0 = Instant::now();
        let mut search = LocationSearch::new(&SearchConfig::default());
        search.input("Lon", t0);
        let req = search.poll_due(t0 + ms(300)).unwrap();

        let err = WeatherError::Status {
            service: "geocoding",
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: String::new(),
        };
        assert!(search.complete(req.id, Err(err)));
        assert!(matches!(search.state(), SearchState::Error(msg) if msg.contains("500")));
        assert_eq!(search.select(0), None);
    }

    #[test]
    fn selecting_candidate_returns_to_idle() {
        let t0 = Instant::now();
        let mut search = LocationSearch::new(&SearchConfig::default());
        search.input("Lon", t0);
        let req = search.poll_due(t0 + ms(300)).unwrap();
        search.complete(req.id, Ok(vec![london()]));

        assert_eq!(search.select(3), None);
        let selected = search.select(0).unwrap();

        assert_eq!(selected.name, "London, UK");
        assert_eq!(selected.latitude, 51.5);
        assert_eq!(search.state(), &SearchState::Idle);
        assert!(search.candidates().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn driver_debounces_burst_into_single_fetch() {
        let provider = Arc::new(RecordingGeocoder::default());
        let (tx, rx) = mpsc::channel(8);
        let (updates_tx, mut updates_rx) = mpsc::unbounded_channel();

        let driver = SearchDriver::new(
            provider.clone(),
            LocationSearch::new(&SearchConfig::default()),
        );
        let handle = tokio::spawn(driver.run(rx, updates_tx));

        tx.send("Lo".to_string()).await.unwrap();
        sleep(ms(40)).await;
        tx.send("Lon".to_string()).await.unwrap();
        sleep(ms(40)).await;
        tx.send("Lond".to_string()).await.unwrap();
        let last_input = Instant::now();
        drop(tx);

        let search = handle.await.unwrap();

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "Lond");
        let waited = calls[0].1 - last_input;
        assert!(waited >= ms(300) && waited < ms(305), "waited {waited:?}");

        assert_eq!(search.candidates().len(), 1);
        assert!(matches!(updates_rx.recv().await, Some(SearchState::Querying { id: 1, .. })));
        assert!(matches!(updates_rx.recv().await, Some(SearchState::Showing(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn driver_drops_out_of_order_response() {
        let provider = Arc::new(RecordingGeocoder { slow: vec!["Lon"], ..Default::default() });
        let (tx, rx) = mpsc::channel(8);
        let (updates_tx, _updates_rx) = mpsc::unbounded_channel();

        let driver = SearchDriver::new(
            provider.clone(),
            LocationSearch::new(&SearchConfig::default()),
        );
        let handle = tokio::spawn(driver.run(rx, updates_tx));

        tx.send("Lon".to_string()).await.unwrap();
        // The first query is in flight by now.
        sleep(ms(350)).await;
        tx.send("Paris".to_string()).await.unwrap();
        drop(tx);

        let search = handle.await.unwrap();

        assert_eq!(provider.calls().len(), 2);
        assert_eq!(search.candidates().len(), 1);
        assert_eq!(search.candidates()[0].display_name, "Paris, Test");
    }
}
