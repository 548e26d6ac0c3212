// src/mirror/crawler.rs
// =============================================================================
// This module walks a website subtree and mirrors it to disk.
//
// How it works:
// 1. Start with the base URL on a stack, as a directory entry
// 2. Pop an entry
//    - directory: fetch the listing, run every href through the scope
//      pipeline, push the survivors (in reverse, so they pop in page order)
//    - file: download it unless it already exists locally
// 3. Repeat until the stack is empty
//
// Using a stack gives the same depth-first order as recursing into each
// subdirectory the moment it is seen, without tying traversal depth to the
// call stack. Everything runs one request at a time.
//
// Failures are per URL: a broken listing or download is logged and
// recorded, and the crawl carries on with the remaining entries.
//
// Politeness:
// - A configurable delay follows every downloaded file
// - Only URLs under the base scope are ever requested, redirects included
//
// Rust concepts:
// - Vec as a stack: push()/pop() from the end
// - HashSet: remembers which directory URLs were already expanded
// - anyhow::Context: attach a human message to setup errors
// =============================================================================

use anyhow::{Context, Result};
use reqwest::Client;
use std::collections::HashSet;
use tracing::{debug, info, warn};
use url::Url;

use super::download::{download, DownloadOutcome};
use super::error::MirrorError;
use super::fetch::{build_client, fetch_listing};
use super::links::extract_hrefs;
use super::report::MirrorReport;
use super::scope::{FrontierEntry, Scope};
use crate::config::MirrorConfig;

// Mirrors `config.base_url` into `config.output_dir`
//
// This is the main entry point. It only returns Err when the run cannot
// start at all (HTTP client or output directory cannot be created); every
// per-URL problem ends up in the report instead.
pub async fn mirror(config: MirrorConfig) -> Result<MirrorReport> {
    Crawler::new(config)?.run().await
}

pub struct Crawler {
    config: MirrorConfig,
    client: Client,
    scope: Scope,
}

impl Crawler {
    pub fn new(config: MirrorConfig) -> Result<Self> {
        let client = build_client(config.timeout, &config.user_agent, &config.base_url)
            .context("failed to create HTTP client")?;
        let scope = Scope::new(config.base_url.clone(), config.output_dir.clone());

        Ok(Crawler {
            config,
            client,
            scope,
        })
    }

    pub async fn run(&self) -> Result<MirrorReport> {
        let output_dir = self.scope.output_dir();
        tokio::fs::create_dir_all(output_dir)
            .await
            .with_context(|| format!("failed to create output directory {}", output_dir.display()))?;

        let mut report = MirrorReport::new(self.scope.base().as_str(), output_dir);

        // Pending frontier entries; the top of the stack is processed next
        let mut stack = vec![self.scope.root()];

        // Directory URLs already expanded during this run. Listings that link
        // to each other ("a/" -> "../b/" -> "../a/") would otherwise loop.
        let mut expanded: HashSet<Url> = HashSet::new();

        while let Some(entry) = stack.pop() {
            if entry.is_directory() {
                if let Some(max_depth) = self.config.max_depth {
                    if entry.depth > max_depth {
                        info!("Not descending into {} (depth limit {})", entry.url, max_depth);
                        continue;
                    }
                }

                if !expanded.insert(entry.url.clone()) {
                    debug!("Already crawled {}", entry.url);
                    continue;
                }

                match self.fetch_and_expand(&entry).await {
                    Ok(hrefs) => {
                        report.directories_crawled += 1;

                        let children: Vec<FrontierEntry> = hrefs
                            .iter()
                            .filter_map(|href| self.resolve_and_dispatch(href, &entry, &mut report))
                            .collect();

                        // Reverse so the first link on the page is popped first
                        stack.extend(children.into_iter().rev());
                    }
                    Err(e) => {
                        warn!("Error crawling {}: {}", entry.url, e);
                        report.record_failure(entry.url.as_str(), &e);
                    }
                }
            } else {
                let outcome = download(
                    &self.client,
                    entry.url.as_str(),
                    &entry.local_path,
                    self.config.timeout,
                    self.config.delay,
                )
                .await;
                match outcome {
                    Ok(DownloadOutcome::Downloaded(bytes)) => {
                        report.files_downloaded += 1;
                        report.bytes_downloaded += bytes;
                    }
                    Ok(DownloadOutcome::Skipped) => {
                        report.files_skipped += 1;
                    }
                    Err(e) => {
                        warn!("Failed to download {}: {}", entry.url, e);
                        report.record_failure(entry.url.as_str(), &e);
                    }
                }
            }
        }

        info!(
            "Finished {}: {} downloaded, {} skipped, {} failed",
            report.base_url,
            report.files_downloaded,
            report.files_skipped,
            report.failures.len()
        );

        Ok(report)
    }

    // Fetches a directory listing and returns the raw hrefs on it
    async fn fetch_and_expand(&self, entry: &FrontierEntry) -> Result<Vec<String>, MirrorError> {
        info!("Crawling {}", entry.url);
        let html = fetch_listing(&self.client, entry.url.as_str(), self.config.timeout).await?;
        let hrefs = extract_hrefs(&html);
        debug!("{} links on {} -> {}", hrefs.len(), entry.url, entry.local_path.display());
        Ok(hrefs)
    }

    // Turns one href from `parent`'s listing into a frontier entry, or drops it
    fn resolve_and_dispatch(
        &self,
        href: &str,
        parent: &FrontierEntry,
        report: &mut MirrorReport,
    ) -> Option<FrontierEntry> {
        match self.scope.resolve(href, &parent.url, parent.depth + 1) {
            Ok(child) => Some(child),
            Err(reason) => {
                debug!("Ignoring '{}' on {}: {}", href, parent.url, reason);
                report.links_discarded += 1;
                None
            }
        }
    }
}
