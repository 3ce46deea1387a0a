//! Connection lifecycle and response transmission.
//!
//! A [`Connection`] owns the raw transport for exactly one
//! request/response cycle: the request is parsed when the connection is
//! accepted, the caller composes the response, and every `send_*`
//! operation is terminal. After the response bytes are written (or the
//! write fails) the transport is shut down unconditionally.
use std::io::{BufReader, Read, Write};
use std::net::TcpStream;

use serde::Serialize;

use crate::{
    error::{GeneralError, ProtocolError},
    request::Request,
    response::Response,
};

/// Byte-stream transport for a single accepted connection.
pub trait Transport: Read + Write {
    fn shutdown(&mut self) -> std::io::Result<()>;
}

impl Transport for TcpStream {
    fn shutdown(&mut self) -> std::io::Result<()> {
        TcpStream::shutdown(self, std::net::Shutdown::Both)
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn shutdown(&mut self) -> std::io::Result<()> {
        (**self).shutdown()
    }
}

/// One accepted connection with its parsed request and pending response.
///
/// Closing is idempotent: [`close`](Self::close) checks whether the
/// transport is still open before shutting it down, logs a shutdown
/// failure, and never propagates it. Dropping the connection closes it.
pub struct Connection<T: Transport> {
    transport: T,
    open: bool,
    request: Request,
    response: Response,
}

impl<T: Transport> Connection<T> {
    /// Takes ownership of an accepted transport and parses the request
    /// from it. Parse failures leave a partially populated request; they
    /// are logged, never raised.
    pub fn accept(mut transport: T) -> Self {
        let request = {
            let mut reader = BufReader::new(&mut transport);
            Request::read_from(&mut reader)
        };

        Self {
            transport,
            open: true,
            request,
            response: Response::new(),
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// See [`Response::set_body`].
    pub fn set_body(&mut self, value: &str, content_type: &str) {
        self.response.set_body(value, content_type);
    }

    /// See [`Response::set_json_body`].
    pub fn set_json_body<B: Serialize>(&mut self, value: Option<&B>) -> Result<(), GeneralError> {
        self.response.set_json_body(value)
    }

    /// Sends `body` as `text/html` with the given status, then closes.
    ///
    /// The argument is what goes on the wire. An empty argument leaves a
    /// previously accumulated body's headers in place while sending no
    /// body, so the emitted `Content-Length` then describes the earlier
    /// body.
    pub fn send(&mut self, status_code: u16, body: &str) {
        self.response.set_body(body, "text/html");
        self.transmit(status_code, Some(body));
    }

    /// Sends the accumulated body with the given status, then closes.
    pub fn send_status(&mut self, status_code: u16) {
        self.transmit(status_code, None);
    }

    /// Sends `body` with status 200, then closes.
    pub fn send_body(&mut self, body: &str) {
        self.send(200, body);
    }

    /// Sends the accumulated body (possibly empty) with status 200, then
    /// closes.
    pub fn finish(&mut self) {
        self.transmit(200, None);
    }

    /// Writes the serialized response and closes the transport. A write
    /// failure is logged and swallowed; the transport is closed either
    /// way. Sending on an already-closed connection fails the same way,
    /// it is never retried.
    fn transmit(&mut self, status_code: u16, body_override: Option<&str>) {
        let result: Result<(), GeneralError> = if self.open {
            let body = body_override.unwrap_or(self.response.body());

            self.response
                .serialize_with(status_code, body, &mut self.transport)
                .map_err(GeneralError::from)
        } else {
            Err(ProtocolError::ConnectionClosed.into())
        };

        match result {
            Ok(()) => tracing::trace!(status_code, "sent response"),
            Err(error) => tracing::error!(%error, status_code, "response write failed"),
        }

        self.close();
    }

    /// Shuts the transport down if it is still open. Safe to call any
    /// number of times; a shutdown failure is logged, never raised.
    pub fn close(&mut self) {
        if !self.open {
            return;
        }

        self.open = false;

        if let Err(error) = self.transport.shutdown() {
            tracing::warn!(%error, "connection close failed");
        }
    }
}

impl<T: Transport> Drop for Connection<T> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[derive(Debug, Default)]
    struct MemoryTransport {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
        shutdown_count: usize,
        fail_shutdown: bool,
    }

    impl MemoryTransport {
        fn new(input: &[u8]) -> Self {
            Self {
                input: Cursor::new(input.to_vec()),
                ..Default::default()
            }
        }

        fn output_text(&self) -> &str {
            std::str::from_utf8(&self.output).unwrap()
        }
    }

    impl Read for MemoryTransport {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for MemoryTransport {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.output.write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Transport for MemoryTransport {
        fn shutdown(&mut self) -> std::io::Result<()> {
            self.shutdown_count += 1;

            if self.fail_shutdown {
                Err(std::io::Error::other("shutdown refused"))
            } else {
                Ok(())
            }
        }
    }

    fn accept(input: &[u8]) -> Connection<MemoryTransport> {
        Connection::accept(MemoryTransport::new(input))
    }

    #[test]
    fn test_conn_accept_parses_request() {
        let conn = accept(b"GET /x HTTP/1.1\r\nHost: h\r\n\r\n");

        assert!(conn.is_open());
        assert_eq!(conn.request().method(), Some("GET"));
        assert_eq!(conn.request().path(), Some("/x"));
        assert_eq!(conn.request().headers().get("Host"), Some("h"));
    }

    #[test]
    fn test_conn_send_closes() {
        let mut conn = accept(b"GET / HTTP/1.1\r\n\r\n");

        conn.send(404, "");

        assert!(!conn.is_open());
        assert_eq!(conn.transport.shutdown_count, 1);

        let text = conn.transport.output_text();
        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(text.contains("Content-Length: 0\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_conn_send_body() {
        let mut conn = accept(b"GET / HTTP/1.1\r\n\r\n");

        conn.send_body("hi");

        let text = conn.transport.output_text();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Type: text/html\r\n"));
        assert!(text.contains("Content-Length: 2\r\n"));
        assert!(text.ends_with("\r\n\r\nhi"));
    }

    #[test]
    fn test_conn_send_status_uses_accumulated_body() {
        let mut conn = accept(b"GET / HTTP/1.1\r\n\r\n");

        conn.set_body("oops", "text/plain");
        conn.send_status(500);

        let text = conn.transport.output_text();
        assert!(text.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
        assert!(text.contains("Content-Type: text/plain\r\n"));
        assert!(text.ends_with("\r\n\r\noops"));
    }

    #[test]
    fn test_conn_send_empty_argument_keeps_stale_headers() {
        let mut conn = accept(b"GET / HTTP/1.1\r\n\r\n");

        conn.set_body("hello", "text/plain");
        conn.send(404, "");

        // the empty argument body goes on the wire, under the headers
        // the earlier body installed
        let text = conn.transport.output_text();
        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(text.contains("Content-Type: text/plain\r\n"));
        assert!(text.contains("Content-Length: 5\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_conn_send_argument_replaces_accumulated_body() {
        let mut conn = accept(b"GET / HTTP/1.1\r\n\r\n");

        conn.set_body("hello", "text/plain");
        conn.send(200, "new");

        let text = conn.transport.output_text();
        assert!(text.contains("Content-Type: text/html\r\n"));
        assert!(text.contains("Content-Length: 3\r\n"));
        assert!(text.ends_with("\r\n\r\nnew"));
    }

    #[test]
    fn test_conn_finish_empty() {
        let mut conn = accept(b"GET / HTTP/1.1\r\n\r\n");

        conn.finish();

        let text = conn.transport.output_text();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[tracing_test::traced_test]
    #[test]
    fn test_conn_double_send_logged_not_raised() {
        let mut conn = accept(b"GET / HTTP/1.1\r\n\r\n");

        conn.send(200, "first");
        let written = conn.transport.output.len();

        conn.send(200, "second");

        // nothing more was written and nothing panicked
        assert_eq!(conn.transport.output.len(), written);
        assert_eq!(conn.transport.shutdown_count, 1);
        assert!(logs_contain("response write failed"));
    }

    #[test]
    fn test_conn_close_idempotent() {
        let mut conn = accept(b"GET / HTTP/1.1\r\n\r\n");

        conn.close();
        conn.close();
        conn.close();

        assert_eq!(conn.transport.shutdown_count, 1);
    }

    #[tracing_test::traced_test]
    #[test]
    fn test_conn_close_failure_logged() {
        let mut conn = accept(b"GET / HTTP/1.1\r\n\r\n");
        conn.transport.fail_shutdown = true;

        conn.close();

        assert!(!conn.is_open());
        assert!(logs_contain("connection close failed"));
    }

    #[test]
    fn test_conn_drop_closes() {
        let mut transport = MemoryTransport::new(b"GET / HTTP/1.1\r\n\r\n");

        {
            let conn = Connection::accept(&mut transport);
            assert!(conn.is_open());
        }

        assert_eq!(transport.shutdown_count, 1);
    }
}
