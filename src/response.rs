//! HTTP response model and serialization.
use std::io::Write;

use chrono::Utc;
use serde::Serialize;

use crate::{error::GeneralError, headers::HeaderMap, parse, status};

const SERVER_TOKEN: &str = concat!("Boa/", env!("CARGO_PKG_VERSION"));

/// An HTTP/1.1 response under construction.
///
/// A fresh response carries an immutable default header set; body-setting
/// operations record overrides on top of it. The two are merged into a
/// new mapping at serialization time, so the defaults are never mutated
/// and the result does not depend on call order.
///
/// The default `Connection: Keep-Alive` header is cosmetic: the
/// connection layer always closes the transport after one response.
#[derive(Debug)]
pub struct Response {
    defaults: HeaderMap,
    overrides: HeaderMap,
    body: String,
}

impl Response {
    pub fn new() -> Self {
        let mut defaults = HeaderMap::with_capacity(5);

        defaults.insert("Server", SERVER_TOKEN);
        defaults.insert("Content-Type", "text/html");
        defaults.insert(
            "Date",
            Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
        );
        defaults.insert("Connection", "Keep-Alive");
        defaults.insert("Content-Length", "0");

        Self {
            defaults,
            overrides: HeaderMap::new(),
            body: String::new(),
        }
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// The headers as they would be serialized: the default set with
    /// overrides applied, in insertion order.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = self.defaults.clone();

        for (name, value) in &self.overrides {
            headers.insert(name.clone(), value.clone());
        }

        headers
    }

    /// Adds or replaces a single header for this response.
    pub fn insert_header<N: Into<String>, V: Into<String>>(&mut self, name: N, value: V) {
        self.overrides.insert(name, value);
    }

    /// Stores the body and overrides `Content-Type` and `Content-Length`
    /// to match (`Content-Length` is the `char` count of the body).
    ///
    /// A `content_type` of `"json"` normalizes to `"application/json"`.
    /// An empty `value` is a no-op: any prior body and headers survive.
    pub fn set_body(&mut self, value: &str, content_type: &str) {
        if value.is_empty() {
            return;
        }

        let content_type = if content_type == "json" {
            "application/json"
        } else {
            content_type
        };

        self.overrides.insert("Content-Type", content_type);
        self.overrides
            .insert("Content-Length", value.chars().count().to_string());
        self.body = value.to_string();
    }

    /// Like [`set_body`](Self::set_body), but widens raw bytes
    /// byte-for-char first, mirroring how request bodies are read.
    pub fn set_raw_body(&mut self, raw: &[u8], content_type: &str) {
        self.set_body(&parse::widen_bytes(raw), content_type);
    }

    /// Serializes `value` as JSON and stores it as the body with
    /// `Content-Type: application/json`. `None` is a no-op.
    pub fn set_json_body<T: Serialize>(&mut self, value: Option<&T>) -> Result<(), GeneralError> {
        if let Some(value) = value {
            let json = serde_json::to_string(value)?;
            self.set_body(&json, "application/json");
        }

        Ok(())
    }

    /// Writes the status line, merged headers, blank line, and the
    /// accumulated body as a single UTF-8 byte sequence.
    pub fn serialize<W: Write>(&self, status_code: u16, out: W) -> std::io::Result<()> {
        self.serialize_with(status_code, &self.body, out)
    }

    /// Like [`serialize`](Self::serialize), but puts `body` on the wire
    /// in place of the accumulated body. The headers are serialized
    /// as-is, so an empty `body` after an earlier
    /// [`set_body`](Self::set_body) goes out with the stale
    /// `Content-Length` of that body.
    pub fn serialize_with<W: Write>(
        &self,
        status_code: u16,
        body: &str,
        mut out: W,
    ) -> std::io::Result<()> {
        let reason_phrase = status::reason_phrase(status_code);

        let mut buf = Vec::new();
        write!(&mut buf, "HTTP/1.1 {} {}\r\n", status_code, reason_phrase)?;
        self.headers().serialize(&mut buf)?;
        buf.extend_from_slice(body.as_bytes());

        out.write_all(&buf)
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}
