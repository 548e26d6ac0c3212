// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging
// 3. Merge flags, the optional config file, and defaults into a MirrorConfig
// 4. Run the mirror and print a summary
// 5. Exit with proper code (0 = run completed, 2 = could not start)
//
// A run that hit broken links or failed downloads still exits 0: those are
// logged per URL and listed in the summary, but the traversal itself
// finished.
// =============================================================================

mod cli;
mod config;
mod logging;
mod mirror;

use anyhow::Result;
use clap::Parser;

use cli::Cli;
use config::{MirrorConfig, Settings};
use mirror::MirrorReport;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let file_settings = match &cli.config {
        Some(path) => Settings::read(path)?,
        None => Settings::default(),
    };
    let config = MirrorConfig::from_settings(cli.settings().or(file_settings))?;

    println!("🔍 Mirroring {}", config.base_url);
    println!("📁 Output directory: {}", config.output_dir.display());

    let report = mirror::mirror(config).await?;

    print_report(&report, cli.json)
}

// Prints the summary either as a table or JSON
fn print_report(report: &MirrorReport, json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(report)?;
        println!("{}", json_output);
    } else {
        print_table(report);
    }
    Ok(())
}

fn print_table(report: &MirrorReport) {
    println!();
    println!("📊 Summary:");
    println!("   📂 Directories crawled: {}", report.directories_crawled);
    println!("   ⬇️  Downloaded: {} ({} bytes)", report.files_downloaded, report.bytes_downloaded);
    println!("   ⏭️  Skipped (already present): {}", report.files_skipped);
    println!("   🚫 Links ignored: {}", report.links_discarded);
    println!("   ❌ Failed: {}", report.failures.len());

    if report.is_clean() {
        return;
    }

    println!();
    println!("{:<60} {:<12} {:<30}", "URL", "KIND", "MESSAGE");
    println!("{}", "=".repeat(102));

    for failure in &report.failures {
        // Truncate URL if too long for display
        let url_display = if failure.url.chars().count() > 57 {
            let head: String = failure.url.chars().take(57).collect();
            format!("{}...", head)
        } else {
            failure.url.clone()
        };

        let kind = match failure.kind {
            mirror::FailureKind::Transport => "transport",
            mirror::FailureKind::Decode => "decode",
            mirror::FailureKind::Filesystem => "filesystem",
        };

        println!("{:<60} {:<12} {:<30}", url_display, kind, failure.message);
    }
}
