//! HTTP name-value header mapping shared by requests and responses.
use std::io::Write;

/// Ordered mapping from header name to header value.
///
/// Names are unique and matched exactly (the original implementation
/// compared header names case-sensitively and this crate preserves that).
/// Inserting an existing name replaces its value in place, so iteration
/// order is the order in which names were first inserted.
///
/// No validation is performed on whether names or values are valid HTTP
/// tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    fields: Vec<(String, String)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.fields.clear()
    }

    pub fn insert<N: Into<String>, V: Into<String>>(&mut self, name: N, value: V) {
        let name = name.into();
        let value = value.into();

        match self.fields.iter_mut().find(|(n, _v)| *n == name) {
            Some((_n, v)) => *v = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.fields.retain(|(n, _v)| n != name);
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _v)| n == name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _v)| n == name)
            .map(|(_n, v)| v.as_str())
    }

    pub fn iter(&self) -> HeaderMapIter<'_> {
        HeaderMapIter::new(&self.fields)
    }

    /// Writes every field as `Name: Value\r\n` followed by the blank line
    /// terminating the header block.
    pub fn serialize<W: Write>(&self, mut buf: W) -> std::io::Result<()> {
        for (name, value) in self {
            buf.write_all(name.as_bytes())?;
            buf.write_all(b": ")?;
            buf.write_all(value.as_bytes())?;
            buf.write_all(b"\r\n")?;
        }

        buf.write_all(b"\r\n")?;

        Ok(())
    }
}

impl IntoIterator for HeaderMap {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a HeaderMap {
    type Item = (&'a String, &'a String);
    type IntoIter = HeaderMapIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for HeaderMap {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut map = Self::new();

        for (name, value) in iter {
            map.insert(name, value);
        }

        map
    }
}

pub struct HeaderMapIter<'a> {
    fields: std::slice::Iter<'a, (String, String)>,
}

impl<'a> HeaderMapIter<'a> {
    fn new(fields: &'a [(String, String)]) -> Self {
        Self {
            fields: fields.iter(),
        }
    }
}

impl<'a> Iterator for HeaderMapIter<'a> {
    type Item = (&'a String, &'a String);

    fn next(&mut self) -> Option<Self::Item> {
        self.fields.next().map(|(n, v)| (n, v))
    }
}
