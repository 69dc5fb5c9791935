/// Logging helpers
///
/// Subscriber setup plus the formatting helpers shared by the jobs
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber
///
/// Honors `RUST_LOG`; defaults to `info` when unset.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Log job startup banner
pub fn log_startup(job: &str, max_concurrent: usize, batch_size: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 starting job: {}", job);
    info!("📊 concurrency cap: {} | batch size: {}", max_concurrent, batch_size);
    info!(
        "🕐 {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
}

/// Truncate long text for log display
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_leaves_short_text_alone() {
        assert_eq!(truncate_text("hello", 10), "hello");
    }

    #[test]
    fn truncate_appends_ellipsis() {
        assert_eq!(truncate_text("hello world", 5), "hello...");
    }
}
