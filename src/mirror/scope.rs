// src/mirror/scope.rs
// =============================================================================
// This module decides what a discovered link turns into.
//
// Every href found on a directory listing goes through the same pipeline,
// in this exact order:
// 1. Drop non-navigational hrefs ("?...", "#...", "../", "./")
// 2. Strip the query string; drop the link if nothing is left
// 3. Resolve the href against the page it was found on
// 4. Drop anything that does not start with the base scope prefix
// 5. Strip the prefix; drop the link if it points at the scope root itself
// 6. Percent-decode the remainder and join it onto the output directory
// 7. Directory if the URL ends with '/', file otherwise
//
// The scope check (4) runs on the RESOLVED url, never on the raw href text,
// so "../escape.txt" and "https://other.example/x" are both rejected there.
//
// Rust concepts:
// - Result<T, E> with a custom error enum to say WHY a link was dropped
// - Url::join: browser-style resolution of relative links
// - PathBuf: building platform-correct file paths segment by segment
// =============================================================================

use percent_encoding::percent_decode_str;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

// One unit of work for the crawler
//
// A directory entry (URL ends with '/') is fetched and its links expanded.
// Anything else is a single file downloaded to `local_path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    /// Absolute URL, inside the scope, without query or fragment
    pub url: Url,
    /// Where this URL lives in the local mirror tree
    pub local_path: PathBuf,
    /// Number of directory hops from the base URL (base = 0)
    pub depth: usize,
}

impl FrontierEntry {
    /// Directory-like URLs are listings to expand, not files to save
    pub fn is_directory(&self) -> bool {
        self.url.as_str().ends_with('/')
    }
}

// Why a link was dropped by the pipeline
//
// Only used for debug logging and tests; a discarded link is never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discard {
    /// "?sort", "#anchor", "../" or "./"
    NonNavigational,
    /// Nothing left after removing the query string
    EmptyAfterQuery,
    /// Url::join could not make sense of the href
    Unresolvable,
    /// Resolved outside the base scope prefix
    OutOfScope,
    /// Resolved to the scope root itself
    SameDirectory,
    /// Decoded path would climb out of the output directory
    UnsafePath,
}

impl fmt::Display for Discard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Discard::NonNavigational => "non-navigational link",
            Discard::EmptyAfterQuery => "empty after removing query",
            Discard::Unresolvable => "cannot be resolved",
            Discard::OutOfScope => "outside the base scope",
            Discard::SameDirectory => "points at the scope root",
            Discard::UnsafePath => "unsafe local path",
        };
        f.write_str(reason)
    }
}

// The boundary of a crawl plus where it lands on disk
#[derive(Debug, Clone)]
pub struct Scope {
    base: Url,
    output_dir: PathBuf,
}

impl Scope {
    // Creates a scope rooted at `base`
    //
    // `base` is expected to already end with '/' (MirrorConfig guarantees
    // this), so the prefix check never matches sibling paths like
    // "/base-old/" for a base of "/base/".
    pub fn new(base: Url, output_dir: impl Into<PathBuf>) -> Self {
        Scope {
            base,
            output_dir: output_dir.into(),
        }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// The entry the traversal starts from: the base URL as a directory
    pub fn root(&self) -> FrontierEntry {
        FrontierEntry {
            url: self.base.clone(),
            local_path: self.output_dir.clone(),
            depth: 0,
        }
    }

    // Runs one href through the filter/transform pipeline
    //
    // Parameters:
    //   href: raw attribute value, exactly as it appeared in the HTML
    //   current: URL of the listing the href was found on
    //   depth: depth of the child entry if it survives
    //
    // Returns: the Frontier Entry to process, or the reason it was dropped
    pub fn resolve(&self, href: &str, current: &Url, depth: usize) -> Result<FrontierEntry, Discard> {
        // Step 1: raw-text filters. Only the exact strings "../" and "./"
        // are dropped here; "../other.txt" is resolved and caught by step 4.
        if href.starts_with('?') || href.starts_with('#') || href == "../" || href == "./" {
            return Err(Discard::NonNavigational);
        }

        // Step 2: everything after the first '?' goes
        let clean = match href.split_once('?') {
            Some((before, _query)) => before,
            None => href,
        };
        if clean.is_empty() {
            return Err(Discard::EmptyAfterQuery);
        }

        // Step 3: resolve against the page we are on
        let mut url = current.join(clean).map_err(|_| Discard::Unresolvable)?;
        url.set_fragment(None);

        // Step 4: containment, on the resolved string
        let relative = url
            .as_str()
            .strip_prefix(self.base.as_str())
            .ok_or(Discard::OutOfScope)?;

        // Step 5: remote-relative path
        let relative = relative.strip_prefix('/').unwrap_or(relative);
        if relative.is_empty() {
            return Err(Discard::SameDirectory);
        }

        // Step 6: decode and map onto the output directory
        let local_path = self.local_path_for(relative)?;

        Ok(FrontierEntry { url, local_path, depth })
    }

    // Percent-decodes a scope-relative path and joins it onto the output dir
    //
    // Decoding happens before splitting, so "a%2Fb" becomes two directories.
    // Any "." or ".." segment that appears after decoding is rejected: the
    // url crate already collapsed real dot-segments, so these can only come
    // from encoded dots and would otherwise escape the mirror root.
    fn local_path_for(&self, relative: &str) -> Result<PathBuf, Discard> {
        let decoded = percent_decode_str(relative).decode_utf8_lossy();

        let mut path = self.output_dir.clone();
        let mut pushed = 0;
        for segment in decoded.split('/') {
            match segment {
                "" => continue,
                "." | ".." => return Err(Discard::UnsafePath),
                s if s.contains('\\') => return Err(Discard::UnsafePath),
                s => {
                    path.push(s);
                    pushed += 1;
                }
            }
        }

        if pushed == 0 {
            return Err(Discard::SameDirectory);
        }
        Ok(path)
    }
}
