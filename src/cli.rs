// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use clap's "derive" API: the struct below IS the CLI, and the doc
// comments on each field become the --help text.
//
// Every crawl setting is an Option here so that "not given on the command
// line" can fall through to the config file and then to the defaults.
// =============================================================================

use clap::Parser;
use std::path::PathBuf;

use crate::config::Settings;

#[derive(Parser, Debug)]
#[command(
    name = "site-mirror",
    version,
    about = "Mirror a website directory tree onto local disk",
    long_about = "site-mirror walks every link under a base URL, downloads each file it finds \
                  into a matching local directory tree, and skips files that are already there. \
                  Links outside the base URL are never followed."
)]
pub struct Cli {
    /// Base URL to mirror (e.g., https://example.org/files/)
    ///
    /// Only URLs starting with this prefix are fetched
    pub base_url: Option<String>,

    /// Output directory (default: last path segment of the base URL)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// TOML file with default settings; flags override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Connect timeout, and longest silence allowed mid-transfer, in seconds (default: 30)
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Pause after each downloaded file, in milliseconds (default: 100)
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// User-Agent header sent with every request
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Deepest directory level to expand; the base URL is level 0
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Print the run summary as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Show debug output, including every ignored link
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// The settings given as flags, ready to layer over a config file
    pub fn settings(&self) -> Settings {
        Settings {
            base_url: self.base_url.clone(),
            output_dir: self.output.clone(),
            timeout_secs: self.timeout_secs,
            delay_ms: self.delay_ms,
            user_agent: self.user_agent.clone(),
            max_depth: self.max_depth,
        }
    }
}
