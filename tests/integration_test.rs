//! Live integration tests. All ignored by default; run manually with
//! `cargo test -- --ignored` on a machine with Chromium and the required
//! environment variables.

use std::time::Duration;
use yield_points_tracker::config::Config;
use yield_points_tracker::infrastructure::{BrowserTransport, Transport, TransportSession};
use yield_points_tracker::jobs::cap;
use yield_points_tracker::services::SheetsClient;
use yield_points_tracker::utils::logging;

#[tokio::test]
#[ignore]
async fn test_browser_fetch() {
    logging::init();

    let config = Config::from_env();
    let transport = BrowserTransport::launch(&config)
        .await
        .expect("failed to launch browser");

    let session = transport
        .open_session()
        .await
        .expect("failed to open session");
    let response = session
        .fetch("https://httpbin.org/ip", Duration::from_millis(20_000))
        .await
        .expect("fetch failed");
    session.close().await;
    transport.shutdown().await;

    assert_eq!(response.status, 200);
    assert!(response.body.contains("origin"), "unexpected body: {}", response.body);
}

#[tokio::test]
#[ignore]
async fn test_cap_job_end_to_end() {
    logging::init();

    let config = Config::from_env();
    let sink = SheetsClient::new(&config).expect("sheet credentials missing");
    let transport = BrowserTransport::launch(&config)
        .await
        .expect("failed to launch browser");

    let result = cap::run(&transport, &sink, &config).await;
    transport.shutdown().await;

    result.expect("cap job failed");
}
