//! Parsing utilities.
use std::cell::LazyCell;

use nom::{
    IResult, Parser,
    bytes::complete::take_while1,
    character::complete::multispace0,
    combinator::{all_consuming, map},
    sequence::terminated,
};
use regex::Regex;

use crate::error::ProtocolError;

/// Substring that marks a line as the request line.
///
/// Recognition is by substring, not by position, so a header whose value
/// contains `HTTP/` can be consumed as a request-line candidate.
pub(crate) const REQUEST_LINE_MARKER: &str = "HTTP/";

/// Substring that marks a line as a header field.
pub(crate) const HEADER_SEPARATOR: &str = ": ";

pub(crate) struct RequestLineRef<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub http_version: &'a str,
}

/// Splits a request-line candidate on whitespace into exactly three
/// tokens. Returns `None` for any other shape; callers drop such lines
/// silently.
pub(crate) fn request_line(input: &str) -> Option<RequestLineRef<'_>> {
    let parts = (token, whitespace, token, whitespace, token);

    #[allow(clippy::type_complexity)]
    let result: IResult<&str, RequestLineRef<'_>> = all_consuming(terminated(
        map(parts, |output: (&str, &str, &str, &str, &str)| {
            RequestLineRef {
                method: output.0,
                path: output.2,
                http_version: output.4,
            }
        }),
        multispace0,
    ))
    .parse(input);

    match result {
        Ok((_remain, output)) => Some(output),
        Err(_) => None,
    }
}

fn token(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace())(input)
}

fn whitespace(input: &str) -> IResult<&str, &str> {
    take_while1(char::is_whitespace)(input)
}

/// Splits a `Name: Value` line on colon-plus-one-whitespace.
///
/// Trailing empty parts are discarded before counting, and only a split
/// into exactly two parts yields a pair; anything else is dropped.
pub(crate) fn header_pair(line: &str) -> Option<(&str, &str)> {
    if !line.contains(HEADER_SEPARATOR) {
        return None;
    }

    let re = LazyCell::new(|| Regex::new(r":\s").unwrap());
    let mut parts: Vec<&str> = re.split(line).collect();

    while parts.last() == Some(&"") {
        parts.pop();
    }

    if parts.len() == 2 {
        Some((parts[0], parts[1]))
    } else {
        None
    }
}

/// Parse a `Content-Length` value into a `u64`.
///
/// Only ASCII digits are permitted; signs and surrounding whitespace are
/// treated as malformed.
pub(crate) fn parse_content_length(value: &str) -> Result<u64, ProtocolError> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(ProtocolError::InvalidContentLength(value.to_string()));
    }

    value
        .parse()
        .map_err(|_| ProtocolError::InvalidContentLength(value.to_string()))
}

/// Widens each byte to a `char` without charset decoding.
///
/// Bytes above 127 become the corresponding U+0080..U+00FF code points
/// rather than being decoded as UTF-8, so the `char` count of the result
/// always equals the byte count of the input.
pub(crate) fn widen_bytes(data: &[u8]) -> String {
    data.iter().map(|&b| b as char).collect()
}
