//! Minimal blocking HTTP helpers on top of curl easy handles.
//!
//! Runs in the current thread; call from `spawn_blocking` if used from async code.

use anyhow::{Context, Result};
use std::time::Duration;

/// Status code and body of a completed request.
#[derive(Debug)]
pub(crate) struct HttpResponse {
    pub status: u32,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

fn new_easy(url: &str) -> Result<curl::easy::Easy> {
    let mut easy = curl::easy::Easy::new();
    easy.url(url).context("invalid URL")?;
    easy.follow_location(true)?;
    easy.connect_timeout(Duration::from_secs(15))?;
    easy.timeout(Duration::from_secs(30))?;
    Ok(easy)
}

fn perform(mut easy: curl::easy::Easy) -> Result<HttpResponse> {
    let mut body = Vec::new();
    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform().context("HTTP request failed")?;
    }
    let status = easy.response_code().context("no response code")?;
    Ok(HttpResponse { status, body })
}

/// POST `fields` as `application/x-www-form-urlencoded`.
pub(crate) fn post_form(url: &str, fields: &[(&str, &str)]) -> Result<HttpResponse> {
    let encoded = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields)
        .finish();
    let mut easy = new_easy(url)?;
    easy.post(true)?;
    easy.post_fields_copy(encoded.as_bytes())?;
    perform(easy)
}

/// GET `url` with extra request headers (`(name, value)` pairs).
pub(crate) fn get(url: &str, headers: &[(String, String)]) -> Result<HttpResponse> {
    let mut easy = new_easy(url)?;
    if !headers.is_empty() {
        let mut list = curl::easy::List::new();
        for (k, v) in headers {
            list.append(&format!("{}: {}", k.trim(), v.trim()))?;
        }
        easy.http_headers(list)?;
    }
    perform(easy)
}
