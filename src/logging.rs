// src/logging.rs
// =============================================================================
// Sets up progress output.
//
// Every crawler message goes through `tracing` and is printed as a plain
// line on stdout (no timestamps, no module targets), e.g.
//   INFO Crawling https://example.org/files/
//   INFO Skipping files/readme.txt, already exists
//
// RUST_LOG wins when set; otherwise --verbose picks debug over info.
// =============================================================================

use tracing_subscriber::EnvFilter;

pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{default_level},hyper=warn,reqwest=warn")));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stdout)
        .with_target(false)
        .without_time()
        .init();
}
