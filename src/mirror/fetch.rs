// src/mirror/fetch.rs
// =============================================================================
// HTTP side of the crawler: building the client and fetching listings.
//
// One reqwest Client is built per run and reused for every request, so
// connections to the origin are pooled. Timeout and user agent come from
// MirrorConfig.
//
// Timeouts:
// - Connecting is bounded by the configured timeout on every request
// - A listing fetch as a whole is bounded by the same timeout
// - File downloads have no overall limit; download.rs applies the timeout
//   to each wait for the next chunk instead, so a big file on a slow link
//   can finish as long as bytes keep arriving
//
// Redirects:
// - Followed only while the target stays under the base scope
// - A redirect that leaves the scope is not followed; the 3xx itself comes
//   back and is reported as an HTTP status failure
// =============================================================================

use reqwest::redirect::Policy;
use reqwest::Client;
use std::time::Duration;
use url::Url;

use super::error::MirrorError;

const MAX_REDIRECTS: usize = 10;

// Creates the HTTP client used for a whole run
//
// Parameters:
//   timeout: connect timeout
//   user_agent: sent with every request
//   scope: base URL; redirects outside it are refused
pub fn build_client(timeout: Duration, user_agent: &str, scope: &Url) -> reqwest::Result<Client> {
    Client::builder()
        .connect_timeout(timeout)
        .user_agent(user_agent)
        .redirect(scoped_redirects(scope))
        .build()
}

// Follows up to MAX_REDIRECTS hops, all of which must stay in scope
fn scoped_redirects(scope: &Url) -> Policy {
    let prefix = scope.as_str().to_string();

    Policy::custom(move |attempt| {
        if attempt.previous().len() > MAX_REDIRECTS {
            attempt.error("too many redirects")
        } else if !attempt.url().as_str().starts_with(&prefix) {
            attempt.stop()
        } else {
            attempt.follow()
        }
    })
}

// Fetches a directory listing and returns its HTML
//
// Fails if:
// - the request itself fails (connection, timeout, TLS, ...)
// - the status is not 2xx
// - the body is not valid UTF-8
pub async fn fetch_listing(client: &Client, url: &str, timeout: Duration) -> Result<String, MirrorError> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(MirrorError::transport)?;

    let status = response.status();
    if !status.is_success() {
        return Err(MirrorError::Status {
            url: url.to_string(),
            status,
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(MirrorError::transport)?;

    // Strict decoding: reqwest's text() would silently replace bad bytes
    String::from_utf8(body.to_vec()).map_err(|source| MirrorError::Decode {
        url: url.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mirror::error::FailureKind;
    use crate::mirror::test_server::{Route, TestServer};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn client(server: &TestServer) -> Client {
        let scope = Url::parse(&server.url("/")).unwrap();
        build_client(TIMEOUT, "site-mirror-test", &scope).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_listing_ok() {
        let server = TestServer::start(vec![Route::html("/d/", r#"<a href="x">x</a>"#)]);
        let html = fetch_listing(&client(&server), &server.url("/d/"), TIMEOUT).await.unwrap();
        assert!(html.contains("href=\"x\""));
    }

    #[tokio::test]
    async fn test_fetch_listing_not_found() {
        let server = TestServer::start(vec![]);
        let url = server.url("/missing/");
        let err = fetch_listing(&client(&server), &url, TIMEOUT).await.unwrap_err();
        assert!(matches!(err, MirrorError::Status { status, .. } if status.as_u16() == 404));
        assert!(err.to_string().ends_with(&url));
    }

    #[tokio::test]
    async fn test_fetch_listing_rejects_invalid_utf8() {
        let server = TestServer::start(vec![Route::bytes("/bin/", vec![0x3c, 0xff, 0xfe, 0x3e])]);
        let url = server.url("/bin/");
        let err = fetch_listing(&client(&server), &url, TIMEOUT).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Decode);
        assert!(err.to_string().starts_with(&url));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport() {
        // Bind then drop to get a port nobody is listening on
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let url = format!("http://127.0.0.1:{}/", port);
        let client = build_client(TIMEOUT, "site-mirror-test", &Url::parse(&url).unwrap()).unwrap();
        let err = fetch_listing(&client, &url, TIMEOUT).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Transport);
    }

    #[tokio::test]
    async fn test_user_agent_is_sent() {
        let server = TestServer::start(vec![Route::html("/d/", "")]);
        let scope = Url::parse(&server.url("/")).unwrap();
        let client = build_client(TIMEOUT, "mirror-bot/9", &scope).unwrap();
        fetch_listing(&client, &server.url("/d/"), TIMEOUT).await.unwrap();
        assert_eq!(server.user_agents(), vec!["mirror-bot/9".to_string()]);
    }

    #[tokio::test]
    async fn test_redirect_inside_scope_is_followed() {
        let server = TestServer::start(vec![
            Route::redirect("/base/old/", "/base/new/"),
            Route::html("/base/new/", r#"<a href="x.txt">x</a>"#),
        ]);
        let scope = Url::parse(&server.url("/base/")).unwrap();
        let client = build_client(TIMEOUT, "site-mirror-test", &scope).unwrap();

        let html = fetch_listing(&client, &server.url("/base/old/"), TIMEOUT).await.unwrap();

        assert!(html.contains("x.txt"));
        assert_eq!(server.requests(), vec!["/base/old/", "/base/new/"]);
    }

    #[tokio::test]
    async fn test_redirect_out_of_scope_is_not_followed() {
        let elsewhere = TestServer::start(vec![Route::html("/other/", "")]);
        let server = TestServer::start(vec![
            Route::redirect("/base/away/", &elsewhere.url("/other/")),
            Route::redirect("/base/up/", "/outside/"),
            Route::html("/outside/", ""),
        ]);
        let scope = Url::parse(&server.url("/base/")).unwrap();
        let client = build_client(TIMEOUT, "site-mirror-test", &scope).unwrap();

        for path in ["/base/away/", "/base/up/"] {
            let err = fetch_listing(&client, &server.url(path), TIMEOUT).await.unwrap_err();
            assert!(
                matches!(err, MirrorError::Status { status, .. } if status.as_u16() == 302),
                "{path}: {err}"
            );
            assert_eq!(err.kind(), FailureKind::Transport);
        }

        assert!(elsewhere.requests().is_empty());
        assert_eq!(server.hits("/outside/"), 0);
    }

    #[tokio::test]
    async fn test_redirect_loop_is_transport() {
        let server = TestServer::start(vec![
            Route::redirect("/base/a/", "/base/b/"),
            Route::redirect("/base/b/", "/base/a/"),
        ]);
        let scope = Url::parse(&server.url("/base/")).unwrap();
        let client = build_client(TIMEOUT, "site-mirror-test", &scope).unwrap();

        let err = fetch_listing(&client, &server.url("/base/a/"), TIMEOUT).await.unwrap_err();

        assert!(matches!(err, MirrorError::Transport { reason: "too many redirects", .. }), "{err}");
        assert!(server.requests().len() <= MAX_REDIRECTS + 1);
    }
}
