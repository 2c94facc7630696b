//! Minimal HTTP/1.1 fake of the Twitch token endpoint and the Helix `users`
//! and `clips` endpoints, for integration tests.
//!
//! Accepts client id `cid` / secret `secret`, knows one channel (`streamer`,
//! broadcaster id `42`) and serves two pages of clips linked by a cursor.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub const CLIENT_ID: &str = "cid";
pub const CLIENT_SECRET: &str = "secret";
pub const CHANNEL: &str = "streamer";
const TOKEN: &str = "tok-123";

#[derive(Debug, Clone, Copy, Default)]
pub struct HelixOptions {
    /// Second clips page answers with an error object instead of `data`.
    pub break_second_page: bool,
}

/// Handle to a running fake. Requests are recorded as `METHOD path?query`.
pub struct HelixServer {
    pub base: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl HelixServer {
    pub fn token_url(&self) -> String {
        format!("{}/oauth2/token", self.base)
    }

    pub fn api_base(&self) -> String {
        format!("{}/helix", self.base)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

pub fn start(opts: HelixOptions) -> HelixServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&requests);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let log = Arc::clone(&log);
            thread::spawn(move || handle(stream, &log, opts));
        }
    });
    HelixServer {
        base: format!("http://127.0.0.1:{}", port),
        requests,
    }
}

struct Request {
    method: String,
    path: String,
    query: HashMap<String, String>,
    headers: HashMap<String, String>,
    body: String,
}

fn read_request(stream: &mut TcpStream) -> Option<Request> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let mut lines = head.split("\r\n");
    let mut first = lines.next()?.split_whitespace();
    let method = first.next()?.to_string();
    let target = first.next()?.to_string();
    let headers: HashMap<String, String> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();
    let len: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    while buf.len() < header_end + len {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&buf[header_end..]).into_owned();
    let url = url::Url::parse(&format!("http://fake{}", target)).ok()?;
    Some(Request {
        method,
        path: url.path().to_string(),
        query: url.query_pairs().into_owned().collect(),
        headers,
        body,
    })
}

fn respond(stream: &mut TcpStream, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
}

fn clip(id: &str, views: u64, created_at: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "url": format!("https://clips.twitch.tv/{}", id),
        "view_count": views,
        "created_at": created_at,
        "title": "clip",
    })
}

fn handle(mut stream: TcpStream, log: &Mutex<Vec<String>>, opts: HelixOptions) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let Some(req) = read_request(&mut stream) else {
        return;
    };
    let mut query: Vec<_> = req.query.iter().map(|(k, v)| format!("{k}={v}")).collect();
    query.sort();
    log.lock()
        .unwrap()
        .push(format!("{} {}?{}", req.method, req.path, query.join("&")));

    if req.path == "/oauth2/token" && req.method == "POST" {
        let form: HashMap<String, String> = url::form_urlencoded::parse(req.body.as_bytes())
            .into_owned()
            .collect();
        let ok = form.get("client_id").map(String::as_str) == Some(CLIENT_ID)
            && form.get("client_secret").map(String::as_str) == Some(CLIENT_SECRET)
            && form.get("grant_type").map(String::as_str) == Some("client_credentials");
        if ok {
            respond(
                &mut stream,
                "200 OK",
                &format!(r#"{{"access_token":"{}","expires_in":5000,"token_type":"bearer"}}"#, TOKEN),
            );
        } else {
            respond(
                &mut stream,
                "400 Bad Request",
                r#"{"status":400,"message":"invalid client secret"}"#,
            );
        }
        return;
    }

    let authorized = req.headers.get("authorization").map(String::as_str)
        == Some(&format!("Bearer {}", TOKEN))
        && req.headers.get("client-id").map(String::as_str) == Some(CLIENT_ID);
    if !authorized {
        respond(&mut stream, "401 Unauthorized", r#"{"status":401}"#);
        return;
    }

    match req.path.as_str() {
        "/helix/users" => {
            let body = if req.query.get("login").map(String::as_str) == Some(CHANNEL) {
                r#"{"data":[{"id":"42","login":"streamer"}]}"#
            } else {
                r#"{"data":[]}"#
            };
            respond(&mut stream, "200 OK", body);
        }
        "/helix/clips" => {
            if req.query.get("broadcaster_id").map(String::as_str) != Some("42") {
                respond(&mut stream, "400 Bad Request", r#"{"status":400}"#);
                return;
            }
            let body = match req.query.get("after").map(String::as_str) {
                None => serde_json::json!({
                    "data": [
                        clip("AlphaClip", 900, "2025-03-01T10:00:00Z"),
                        clip("QuietClip", 12, "2025-03-01T11:00:00Z"),
                        clip("BetaClip", 250, "2025-02-27T08:30:00Z"),
                    ],
                    "pagination": {"cursor": "page-2"},
                }),
                Some("page-2") if opts.break_second_page => {
                    serde_json::json!({"error": "Internal Server Error", "status": 500})
                }
                Some("page-2") => serde_json::json!({
                    "data": [
                        clip("GammaClip", 5000, "2025-02-20T23:59:59Z"),
                        clip("AlphaClip", 900, "2025-03-01T10:00:00Z"),
                    ],
                    "pagination": {},
                }),
                Some(_) => serde_json::json!({"data": [], "pagination": {}}),
            };
            respond(&mut stream, "200 OK", &body.to_string());
        }
        _ => respond(&mut stream, "404 Not Found", r#"{"status":404}"#),
    }
}
