use anyhow::Result;
use yield_points_tracker::config::Config;
use yield_points_tracker::jobs;
use yield_points_tracker::utils::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Logging first, everything else reports through it
    logging::init();

    // Configuration comes from the environment
    let config = Config::from_env();

    // Job name from the command line, the aggregation job by default
    let job = std::env::args().nth(1).unwrap_or_else(|| "cap".to_string());

    jobs::run_job(&job, &config).await
}
