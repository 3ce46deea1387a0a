//! Minimal server-side HTTP/1.1 message framer.
//!
//! This crate handles exactly one request/response cycle per accepted
//! connection: it parses the request line, headers, and a
//! `Content-Length`-delimited body from the raw byte stream, lets the
//! caller compose a response, and serializes that response back onto the
//! same stream in a single write.
//!
//! The connection is always closed after the response is written. The
//! default `Connection: Keep-Alive` header is emitted for wire
//! compatibility only; connection reuse is not implemented.
//!
//! Not supported: chunked transfer encoding, HTTP/2, TLS, header line
//! folding, and streaming bodies. There is also no read timeout: a peer
//! that never sends the blank line terminating the header block, or that
//! declares a `Content-Length` larger than it delivers, blocks the owning
//! thread indefinitely.
pub mod conn;
pub mod error;
pub mod headers;
mod parse;
pub mod request;
pub mod response;
pub mod status;
