// src/mirror/error.rs
// =============================================================================
// Errors that can happen while mirroring a single URL.
//
// None of these stop a run. The crawler catches them per URL, records them
// in the report, and moves on to the next sibling link. Variants raised
// after the server answered carry the URL they are about, so the message
// still makes sense when it is printed on its own.
//
// Rust concepts:
// - thiserror: derives Display and Error for an enum from attributes
// - #[source]: keeps the underlying error so callers can walk the chain
// =============================================================================

use reqwest::StatusCode;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MirrorError {
    /// Connection failure, timeout, TLS problem, redirect loop, ...
    #[error("{reason} ({source})")]
    Transport {
        reason: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// No bytes arrived for `idle` while waiting on a download
    #[error("no data from {url} for {}s", .idle.as_secs_f64())]
    Stalled { url: String, idle: Duration },

    /// The server answered, but not with a 2xx (an off-scope redirect
    /// also ends up here, since it is never followed)
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: StatusCode },

    /// A directory listing that is not valid UTF-8
    #[error("{url} is not valid UTF-8 ({source})")]
    Decode {
        url: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// Creating a directory, writing, or renaming a file failed
    #[error("{action} {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        action: &'static str,
        #[source]
        source: std::io::Error,
    },
}

// Coarse category for the run report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Transport,
    Decode,
    Filesystem,
}

impl MirrorError {
    // Wraps a reqwest error, naming the failure the way a person would
    //
    // reqwest errors can happen for many reasons:
    // - Network timeout
    // - DNS resolution failure
    // - SSL certificate issues
    // - Too many redirects
    // - Body cut off mid-transfer
    pub fn transport(error: reqwest::Error) -> Self {
        let text = error.to_string().to_lowercase();

        let reason = if error.is_timeout() {
            "request timed out"
        } else if error.is_redirect() {
            "too many redirects"
        } else if error.is_connect() {
            if text.contains("dns") {
                "could not resolve hostname"
            } else {
                "connection failed"
            }
        } else if text.contains("certificate") || text.contains("ssl") || text.contains("tls") {
            "TLS error"
        } else if error.is_body() || error.is_decode() {
            "transfer interrupted"
        } else {
            "request failed"
        };

        MirrorError::Transport {
            reason,
            source: error,
        }
    }

    pub fn filesystem(path: impl Into<PathBuf>, action: &'static str, source: std::io::Error) -> Self {
        MirrorError::Filesystem {
            path: path.into(),
            action,
            source,
        }
    }

    /// Stalls and non-2xx statuses count as transport failures in the report
    pub fn kind(&self) -> FailureKind {
        match self {
            MirrorError::Transport { .. } | MirrorError::Stalled { .. } | MirrorError::Status { .. } => {
                FailureKind::Transport
            }
            MirrorError::Decode { .. } => FailureKind::Decode,
            MirrorError::Filesystem { .. } => FailureKind::Filesystem,
        }
    }
}
