//! Aggregation engine tests against a scriptable mock transport.
//!
//! The mock serves the leaderboard envelope, tracks session/fetch counts,
//! and can be told to fail specific pages once or permanently.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;
use yield_points_tracker::error::AppResult;
use yield_points_tracker::infrastructure::transport::{
    FetchResponse, Transport, TransportError, TransportSession,
};
use yield_points_tracker::jobs::cap;
use yield_points_tracker::orchestrator::run_aggregation;
use yield_points_tracker::services::sheets::{MetricsSink, RowSlot};
use yield_points_tracker::{AppError, Config};

// ========== Mock transport ==========

struct MockState {
    total_pages: usize,
    include_pagination: bool,
    page_sums: HashMap<usize, u64>,
    transient_failures: Mutex<HashMap<usize, usize>>,
    permanent_failures: HashSet<usize>,
    stagger: bool,
    sessions_opened: AtomicUsize,
    fetches: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

#[derive(Clone)]
struct MockTransport {
    state: Arc<MockState>,
}

impl MockTransport {
    /// Pages default to a sum of `page * 10`
    fn new(total_pages: usize) -> Self {
        let page_sums = (1..=total_pages).map(|p| (p, p as u64 * 10)).collect();
        Self {
            state: Arc::new(MockState {
                total_pages,
                include_pagination: true,
                page_sums,
                transient_failures: Mutex::new(HashMap::new()),
                permanent_failures: HashSet::new(),
                stagger: false,
                sessions_opened: AtomicUsize::new(0),
                fetches: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }),
        }
    }

    fn state_mut(&mut self) -> &mut MockState {
        Arc::get_mut(&mut self.state).expect("mock not yet shared")
    }

    fn with_sum(mut self, page: usize, sum: u64) -> Self {
        self.state_mut().page_sums.insert(page, sum);
        self
    }

    fn fail_once(self, page: usize) -> Self {
        self.state
            .transient_failures
            .lock()
            .unwrap()
            .insert(page, 1);
        self
    }

    fn fail_always(mut self, pages: &[usize]) -> Self {
        for &page in pages {
            self.state_mut().permanent_failures.insert(page);
        }
        self
    }

    fn staggered(mut self) -> Self {
        self.state_mut().stagger = true;
        self
    }

    fn without_pagination(mut self) -> Self {
        self.state_mut().include_pagination = false;
        self
    }

    /// Sum over every page that can succeed
    fn expected_total(&self) -> u64 {
        self.state
            .page_sums
            .iter()
            .filter(|(page, _)| !self.state.permanent_failures.contains(page))
            .map(|(_, sum)| sum)
            .sum()
    }

    fn sessions_opened(&self) -> usize {
        self.state.sessions_opened.load(Ordering::SeqCst)
    }

    fn fetches(&self) -> usize {
        self.state.fetches.load(Ordering::SeqCst)
    }

    fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn open_session(&self) -> Result<Box<dyn TransportSession>, TransportError> {
        self.state.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            state: self.state.clone(),
        }))
    }
}

struct MockSession {
    state: Arc<MockState>,
}

#[async_trait]
impl TransportSession for MockSession {
    async fn fetch(&self, url: &str, _timeout: Duration) -> Result<FetchResponse, TransportError> {
        let state = &self.state;
        state.fetches.fetch_add(1, Ordering::SeqCst);

        let Some(page) = url
            .split("page=")
            .nth(1)
            .and_then(|n| n.parse::<usize>().ok())
        else {
            // the proxy connectivity probe
            return Ok(FetchResponse {
                status: 200,
                body: json!({"origin": "203.0.113.7"}).to_string(),
            });
        };

        let now = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        state.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if state.stagger {
            // later slots in a chunk finish first
            sleep(Duration::from_millis(10 - (page % 6) as u64)).await;
        }
        let result = self.respond(page);
        state.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn close(&self) {}
}

impl MockSession {
    fn respond(&self, page: usize) -> Result<FetchResponse, TransportError> {
        let state = &self.state;

        if state.permanent_failures.contains(&page) {
            return Ok(FetchResponse {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }

        {
            let mut transient = state.transient_failures.lock().unwrap();
            if let Some(remaining) = transient.get_mut(&page) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(TransportError::Network("connection reset".to_string()));
                }
            }
        }

        let sum = state.page_sums.get(&page).copied().unwrap_or(0);
        let mut body = json!({ "entries": [ { "caps": sum } ] });
        if page == 1 && state.include_pagination {
            body["pagination"] = json!({ "total": state.total_pages });
        }
        Ok(FetchResponse {
            status: 200,
            body: body.to_string(),
        })
    }
}

// ========== Mock sink ==========

#[derive(Default)]
struct MockSink {
    filled: bool,
    writes: Mutex<Vec<(String, usize, Vec<(u8, Value)>)>>,
}

#[async_trait]
impl MetricsSink for MockSink {
    async fn find_or_create_row(&self, _worksheet: &str, _date_key: &str) -> AppResult<RowSlot> {
        Ok(RowSlot {
            row: 5,
            already_filled: self.filled,
        })
    }

    async fn write_cells(
        &self,
        worksheet: &str,
        row: usize,
        cells: &[(u8, Value)],
    ) -> AppResult<()> {
        self.writes
            .lock()
            .unwrap()
            .push((worksheet.to_string(), row, cells.to_vec()));
        Ok(())
    }
}

fn test_config() -> Config {
    Config {
        page_timeout_ms: 1_000,
        discovery_timeout_ms: 1_000,
        page_retry_delay_ms: 1,
        retry_delay_ms: 1,
        leaderboard_url: "https://leaderboard.invalid/v1/entries".to_string(),
        ..Config::default()
    }
}

// ========== Scheduler behavior ==========

#[tokio::test]
async fn aggregates_forty_pages_in_three_batches() {
    let transport = MockTransport::new(40).staggered();
    let config = test_config();

    let report = run_aggregation(&transport, &config).await.unwrap();

    assert_eq!(report.total_pages, 40);
    assert_eq!(report.processed_pages, 40);
    assert!(report.failed_pages.is_empty());
    // order of completion within a chunk does not affect the sum
    assert_eq!(report.grand_total, (1..=40).map(|p| p * 10).sum::<u64>());

    // one discovery session, then 6 + 6 + 4 workers for batches
    // [1..18], [19..36], [37..40]
    assert_eq!(transport.sessions_opened(), 17);
    // discovery probe plus one fetch per page
    assert_eq!(transport.fetches(), 41);
    // concurrency cap honored, and actually reached
    assert_eq!(transport.max_in_flight(), 6);
}

#[tokio::test]
async fn total_page_count_defaults_to_one() {
    let transport = MockTransport::new(1).without_pagination();
    let config = test_config();

    let report = run_aggregation(&transport, &config).await.unwrap();

    assert_eq!(report.total_pages, 1);
    assert_eq!(report.processed_pages, 1);
    assert_eq!(report.grand_total, 10);
}

#[tokio::test]
async fn zero_pages_is_a_clean_empty_run() {
    let transport = MockTransport::new(0);
    let config = test_config();

    let report = run_aggregation(&transport, &config).await.unwrap();

    assert_eq!(report.total_pages, 0);
    assert_eq!(report.processed_pages, 0);
    assert!(report.failed_pages.is_empty());
    assert_eq!(report.grand_total, 0);
    // only the discovery probe ran
    assert_eq!(transport.fetches(), 1);
}

#[tokio::test]
async fn transient_page_failure_is_masked_by_retry() {
    let transport = MockTransport::new(10).with_sum(7, 120).fail_once(7);
    let config = test_config();

    let report = run_aggregation(&transport, &config).await.unwrap();

    assert_eq!(report.processed_pages, 10);
    assert!(report.failed_pages.is_empty());
    assert_eq!(report.grand_total, transport.expected_total());
    // discovery + 10 pages + 1 retry for page 7
    assert_eq!(transport.fetches(), 12);
}

#[tokio::test]
async fn discovery_retries_transient_failure() {
    let transport = MockTransport::new(3).fail_once(1);
    let config = test_config();

    let report = run_aggregation(&transport, &config).await.unwrap();

    assert_eq!(report.total_pages, 3);
    assert_eq!(report.processed_pages, 3);
}

#[tokio::test]
async fn gate_trips_above_ten_percent_failures() {
    let failing: Vec<usize> = (1..=11).map(|i| i * 9).collect();
    let transport = MockTransport::new(100).fail_always(&failing);
    let config = test_config();

    let err = run_aggregation(&transport, &config).await.unwrap_err();

    match err {
        AppError::HighFailureRate { failed, total } => {
            assert_eq!(failed, 11);
            assert_eq!(total, 100);
        }
        other => panic!("expected HighFailureRate, got {}", other),
    }
}

#[tokio::test]
async fn gate_tolerates_ten_percent_failures() {
    let failing: Vec<usize> = (1..=10).map(|i| i * 9).collect();
    let transport = MockTransport::new(100).fail_always(&failing);
    let config = test_config();

    let report = run_aggregation(&transport, &config).await.unwrap();

    assert_eq!(report.processed_pages, 90);
    assert_eq!(report.grand_total, transport.expected_total());

    let mut failed = report.failed_pages.clone();
    failed.sort_unstable();
    assert_eq!(failed, failing);
    // every page is accounted for exactly once
    assert_eq!(report.processed_pages + report.failed_pages.len(), 100);
}

// ========== Job behavior ==========

#[tokio::test]
async fn job_is_idempotent_for_a_filled_row() {
    let transport = MockTransport::new(40);
    let sink = MockSink {
        filled: true,
        ..MockSink::default()
    };
    let config = test_config();

    cap::run(&transport, &sink, &config).await.unwrap();

    assert_eq!(transport.fetches(), 0);
    assert!(sink.writes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn job_writes_grand_total_into_column_b() {
    let transport = MockTransport::new(3);
    let sink = MockSink::default();
    let config = test_config();

    cap::run(&transport, &sink, &config).await.unwrap();

    let writes = sink.writes.lock().unwrap();
    assert_eq!(writes.len(), 1);
    let (worksheet, row, cells) = &writes[0];
    assert_eq!(worksheet, "Cap");
    assert_eq!(*row, 5);
    assert_eq!(cells.as_slice(), &[(2, json!(60))]);
}
