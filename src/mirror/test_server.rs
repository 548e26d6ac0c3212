// src/mirror/test_server.rs
// =============================================================================
// Minimal HTTP/1.1 fixture server for tests.
//
// Serves a fixed table of routes from a background thread and remembers
// every path it was asked for, so tests can assert exactly which URLs the
// crawler contacted (and which it never touched). Unknown paths get 404.
// One request per connection; every response carries Connection: close.
// =============================================================================

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Route {
    path: String,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
    location: Option<String>,
    /// Content-Length to announce when it should not match the body
    content_length: Option<usize>,
    /// Pause between the four pieces the body is sent in
    gap: Duration,
    /// Pause after the body, before the connection is closed
    hold: Duration,
}

impl Route {
    fn new(path: &str, status: u16, content_type: &'static str, body: Vec<u8>) -> Self {
        Route {
            path: path.to_string(),
            status,
            content_type,
            body,
            location: None,
            content_length: None,
            gap: Duration::ZERO,
            hold: Duration::ZERO,
        }
    }

    pub fn html(path: &str, body: &str) -> Self {
        Route::new(path, 200, "text/html; charset=utf-8", body.as_bytes().to_vec())
    }

    pub fn file(path: &str, body: &str) -> Self {
        Route::new(path, 200, "text/plain", body.as_bytes().to_vec())
    }

    pub fn bytes(path: &str, body: Vec<u8>) -> Self {
        Route::new(path, 200, "application/octet-stream", body)
    }

    pub fn status(path: &str, status: u16) -> Self {
        Route::new(path, status, "text/plain", Vec::new())
    }

    pub fn redirect(path: &str, location: &str) -> Self {
        Route {
            location: Some(location.to_string()),
            ..Route::new(path, 302, "text/plain", Vec::new())
        }
    }

    /// Announces `announced` bytes, sends `body`, then hangs up
    pub fn truncated(path: &str, body: &str, announced: usize) -> Self {
        Route {
            content_length: Some(announced),
            ..Route::file(path, body)
        }
    }

    /// Sends `body` in four pieces with `gap` between them
    pub fn trickle(path: &str, body: &str, gap: Duration) -> Self {
        Route {
            gap,
            ..Route::file(path, body)
        }
    }

    /// Announces more than `body`, sends it, then goes quiet for `hold`
    pub fn stall(path: &str, body: &str, hold: Duration) -> Self {
        Route {
            content_length: Some(body.len() + 1024),
            hold,
            ..Route::file(path, body)
        }
    }
}

#[derive(Debug, Default)]
struct Log {
    paths: Vec<String>,
    user_agents: Vec<String>,
}

pub struct TestServer {
    base: String,
    log: Arc<Mutex<Log>>,
}

impl TestServer {
    // Starts serving `routes` on an ephemeral port
    //
    // The listener thread lives until the test process exits.
    pub fn start(routes: Vec<Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("local addr").port();

        let routes: Arc<HashMap<String, Route>> =
            Arc::new(routes.into_iter().map(|r| (r.path.clone(), r)).collect());
        let log = Arc::new(Mutex::new(Log::default()));

        let thread_log = Arc::clone(&log);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let routes = Arc::clone(&routes);
                let log = Arc::clone(&thread_log);
                thread::spawn(move || handle(stream, &routes, &log));
            }
        });

        TestServer {
            base: format!("http://127.0.0.1:{}", port),
            log,
        }
    }

    /// Absolute URL for a path on this server, e.g. url("/base/")
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Every request path received so far, in arrival order
    pub fn requests(&self) -> Vec<String> {
        self.log.lock().unwrap().paths.clone()
    }

    pub fn user_agents(&self) -> Vec<String> {
        self.log.lock().unwrap().user_agents.clone()
    }

    pub fn hits(&self, path: &str) -> usize {
        self.requests().iter().filter(|p| p.as_str() == path).count()
    }
}

fn handle(mut stream: TcpStream, routes: &HashMap<String, Route>, log: &Mutex<Log>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));

    // Read until the end of the header block
    let mut request = Vec::new();
    let mut buf = [0u8; 4096];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }
    let request = String::from_utf8_lossy(&request);

    let mut lines = request.lines();
    let path = lines
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    let user_agent = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("user-agent"))
        .map(|(_, value)| value.trim().to_string())
        .unwrap_or_default();

    {
        let mut log = log.lock().unwrap();
        log.paths.push(path.clone());
        log.user_agents.push(user_agent);
    }

    let missing = Route::status(&path, 404);
    let route = routes.get(&path).unwrap_or(&missing);

    let location = match &route.location {
        Some(location) => format!("Location: {}\r\n", location),
        None => String::new(),
    };
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n",
        route.status,
        reason(route.status),
        route.content_type,
        route.content_length.unwrap_or(route.body.len()),
        location
    );
    let _ = stream.write_all(head.as_bytes());

    if route.gap.is_zero() {
        let _ = stream.write_all(&route.body);
    } else {
        let piece = route.body.len().div_ceil(4).max(1);
        for (i, chunk) in route.body.chunks(piece).enumerate() {
            if i > 0 {
                thread::sleep(route.gap);
            }
            let _ = stream.write_all(chunk);
            let _ = stream.flush();
        }
    }
    let _ = stream.flush();

    if !route.hold.is_zero() {
        thread::sleep(route.hold);
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        302 => "Found",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}
