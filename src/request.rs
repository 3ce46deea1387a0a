//! HTTP request model and parser.
use std::io::{BufRead, Read};

use crate::{error::GeneralError, headers::HeaderMap, parse};

/// A parsed HTTP/1.1 request.
///
/// Built once per connection by [`Request::read_from`] and never mutated
/// afterwards. The request-line fields are set together from exactly one
/// line containing `HTTP/`, or all remain `None` (for example when the
/// peer closes the socket before sending anything).
#[derive(Debug, Default)]
pub struct Request {
    method: Option<String>,
    path: Option<String>,
    protocol_version: Option<String>,
    headers: HeaderMap,
    body: Option<String>,
}

impl Request {
    /// Reads one request from the stream.
    ///
    /// Never fails: read and framing errors are logged and the partially
    /// populated request is returned as-is.
    pub fn read_from<R: BufRead>(reader: &mut R) -> Self {
        let mut request = Self::default();

        if let Err(error) = request.parse(reader) {
            tracing::error!(%error, "request read failed");
        }

        request
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn protocol_version(&self) -> Option<&str> {
        self.protocol_version.as_deref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The request body, present only when `Content-Length` declared a
    /// positive length and that many bytes were read.
    ///
    /// Body bytes are widened byte-for-char, so the `char` count always
    /// equals the declared length; multi-byte UTF-8 sequences are not
    /// re-decoded.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    fn parse<R: BufRead>(&mut self, reader: &mut R) -> Result<(), GeneralError> {
        self.parse_header(reader)?;
        self.parse_body(reader)?;

        Ok(())
    }

    fn parse_header<R: BufRead>(&mut self, reader: &mut R) -> Result<(), GeneralError> {
        loop {
            let Some(line) = read_line(reader)? else {
                // socket closed before the blank line
                break;
            };

            if line.is_empty() {
                break;
            }

            if line.contains(parse::REQUEST_LINE_MARKER) {
                self.parse_request_line(&line);
            } else if let Some((name, value)) = parse::header_pair(&line) {
                self.headers.insert(name, value);
            }

            // lines matching neither shape are dropped
        }

        Ok(())
    }

    fn parse_request_line(&mut self, line: &str) {
        // only the first well-formed request line wins
        if self.method.is_some() {
            return;
        }

        if let Some(request_line) = parse::request_line(line) {
            self.method = Some(request_line.method.to_string());
            self.path = Some(request_line.path.to_string());
            self.protocol_version = Some(request_line.http_version.to_string());

            tracing::trace!(
                method = request_line.method,
                path = request_line.path,
                "read request line"
            );
        }
    }

    fn parse_body<R: BufRead>(&mut self, reader: &mut R) -> Result<(), GeneralError> {
        let declared = self.headers.get("Content-Length").unwrap_or("0");
        let content_length = parse::parse_content_length(declared)?;

        if content_length == 0 {
            return Ok(());
        }

        // grow the buffer as bytes arrive; the declared length is
        // attacker-controlled and must not be allocated up front
        let mut data = Vec::new();

        match reader.take(content_length).read_to_end(&mut data) {
            Ok(read_length) if read_length as u64 == content_length => {
                self.body = Some(parse::widen_bytes(&data));
                tracing::trace!(content_length, "read body");
            }
            Ok(read_length) => {
                // body stays unset on a short read
                tracing::error!(read_length, content_length, "body read failed");
            }
            Err(error) => {
                tracing::error!(%error, content_length, "body read failed");
            }
        }

        Ok(())
    }
}

/// Reads one CRLF- or LF-terminated line, without its terminator.
///
/// Returns `None` at end of stream. Bytes are widened byte-for-char, not
/// decoded as UTF-8.
fn read_line<R: BufRead>(reader: &mut R) -> std::io::Result<Option<String>> {
    let mut buf = Vec::new();

    if reader.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();

        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }

    Ok(Some(parse::widen_bytes(&buf)))
}
