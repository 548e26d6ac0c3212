// src/mirror/download.rs
// =============================================================================
// This module saves a single file into the mirror tree.
//
// How it works:
// 1. Make sure the parent directory exists (created lazily, right before use)
// 2. If the destination already exists, skip it: an existing file IS the
//    record that this URL was mirrored on an earlier run
// 3. Stream the body into a fresh, uniquely named temporary file next to
//    the destination (".<random>.part")
// 4. Rename the temporary file onto the destination once every byte is
//    on disk
// 5. Sleep for the politeness delay
//
// Because of step 4 an interrupted transfer never leaves a file at the real
// destination, so the next run does not mistake it for a finished download.
// The temporary name is created exclusively, so it can never be a file the
// site itself serves (say "notes.txt.part"); a failed transfer deletes only
// what it created.
//
// The configured timeout is an idle timeout here: it bounds the wait for
// the response headers and for each chunk of the body, never the transfer
// as a whole.
//
// Rust concepts:
// - tokio::fs: async file IO that doesn't block the runtime
// - AsyncWriteExt: gives us .write_all() and .flush() on async files
// - tempfile::TempPath: deletes the file on drop unless persisted
// - tokio::time::timeout: wraps any future with a deadline
// =============================================================================

use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;
use tracing::info;

use super::error::MirrorError;

/// Suffix of in-progress downloads, which are also hidden (leading '.')
pub const PART_SUFFIX: &str = ".part";

// What happened to a file URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Fetched and written; holds the number of bytes saved
    Downloaded(u64),
    /// Destination was already present, nothing fetched
    Skipped,
}

// Downloads `url` to `dest` unless `dest` already exists
//
// Parameters:
//   client: shared HTTP client
//   url: absolute file URL (already scope-checked)
//   dest: final path inside the mirror tree
//   idle: longest wait for the next piece of the response
//   delay: pause after a successful download, to go easy on the server
pub async fn download(
    client: &Client,
    url: &str,
    dest: &Path,
    idle: Duration,
    delay: Duration,
) -> Result<DownloadOutcome, MirrorError> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)
        .await
        .map_err(|e| MirrorError::filesystem(dir, "create directory", e))?;

    let exists = fs::try_exists(dest)
        .await
        .map_err(|e| MirrorError::filesystem(dest, "check", e))?;
    if exists {
        info!("Skipping {}, already exists", dest.display());
        return Ok(DownloadOutcome::Skipped);
    }

    info!("Downloading {} -> {}", url, dest.display());

    let bytes = fetch_to(client, url, dir, dest, idle).await?;

    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    Ok(DownloadOutcome::Downloaded(bytes))
}

// Streams the response body for `url` into `dest` by way of a temporary
// file in `dir`, returning the byte count
//
// Any early return drops the TempPath, which deletes the partial file.
async fn fetch_to(
    client: &Client,
    url: &str,
    dir: &Path,
    dest: &Path,
    idle: Duration,
) -> Result<u64, MirrorError> {
    let stalled = || MirrorError::Stalled {
        url: url.to_string(),
        idle,
    };

    let mut response = timeout(idle, client.get(url).send())
        .await
        .map_err(|_| stalled())?
        .map_err(MirrorError::transport)?;

    let status = response.status();
    if !status.is_success() {
        return Err(MirrorError::Status {
            url: url.to_string(),
            status,
        });
    }

    let temp = tempfile::Builder::new()
        .prefix(".")
        .suffix(PART_SUFFIX)
        .tempfile_in(dir)
        .map_err(|e| MirrorError::filesystem(dir, "create temporary file in", e))?;
    let (file, temp_path) = temp.into_parts();
    let mut file = fs::File::from_std(file);

    let mut written: u64 = 0;
    while let Some(chunk) = timeout(idle, response.chunk())
        .await
        .map_err(|_| stalled())?
        .map_err(MirrorError::transport)?
    {
        file.write_all(&chunk)
            .await
            .map_err(|e| MirrorError::filesystem(&*temp_path, "write", e))?;
        written += chunk.len() as u64;
    }

    // sync_all so the rename never publishes a file whose data is still
    // sitting in the page cache
    file.flush()
        .await
        .map_err(|e| MirrorError::filesystem(&*temp_path, "write", e))?;
    file.sync_all()
        .await
        .map_err(|e| MirrorError::filesystem(&*temp_path, "sync", e))?;
    drop(file);

    temp_path
        .persist(dest)
        .map_err(|e| MirrorError::filesystem(dest, "rename into", e.error))?;

    Ok(written)
}
