//! Minimal header representation for already-parsed email input.
//!
//! The MIME parser that turns raw bytes into headers is an external
//! collaborator (see spec §1 "Out of scope"); this module only has to model
//! the result: an ordered list of `(name, value)` pairs with case-insensitive
//! lookup, and the folding rules needed before canonicalization.

use serde::{Deserialize, Serialize};

/// A single header with its name case preserved and its value already
/// unfolded to one logical line (CRLF + WSP continuations resolved).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailHeader {
    pub name: String,
    pub value: String,
}

impl EmailHeader {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: unfold(&value.into()),
        }
    }

    pub fn name_eq(&self, other: &str) -> bool {
        self.name.eq_ignore_ascii_case(other)
    }
}

/// Resolve RFC 5322 header folding (CRLF followed by WSP) to a single
/// logical line. Input may already be unfolded, in which case this is a
/// no-op.
pub fn unfold(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            // A fold is CRLF immediately followed by WSP; swallow the
            // newline and let the following whitespace stand.
            continue;
        }
        if c == '\n' {
            continue;
        }
        out.push(c);
    }
    out
}

/// Ordered, case-insensitively-queryable header list. Order is preserved
/// because DKIM/ARC canonicalization and §4.9 header-consistency checks are
/// order sensitive ("last matching header" per RFC 6376 §5.4.2).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct HeaderList(pub Vec<EmailHeader>);

impl HeaderList {
    pub fn new(headers: Vec<EmailHeader>) -> Self {
        Self(headers)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EmailHeader> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// All headers with the given name, in message order.
    pub fn iter_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a EmailHeader> {
        self.0.iter().filter(move |h| h.name_eq(name))
    }

    /// The first header with the given name.
    pub fn first(&self, name: &str) -> Option<&EmailHeader> {
        self.0.iter().find(|h| h.name_eq(name))
    }

    /// The last header with the given name (RFC 6376 §5.4.2 signing order).
    pub fn last(&self, name: &str) -> Option<&EmailHeader> {
        self.0.iter().rev().find(|h| h.name_eq(name))
    }

    pub fn count(&self, name: &str) -> usize {
        self.iter_named(name).count()
    }

    pub fn push(&mut self, header: EmailHeader) {
        self.0.push(header);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unfold_resolves_continuation() {
        assert_eq!(unfold("foo\r\n bar"), "foo bar");
        assert_eq!(unfold("plain"), "plain");
    }

    #[test]
    fn last_matching_header_wins() {
        let list = HeaderList::new(vec![
            EmailHeader::new("From", "a@example.com"),
            EmailHeader::new("From", "b@example.com"),
        ]);
        assert_eq!(list.last("from").unwrap().value, "b@example.com");
        assert_eq!(list.first("FROM").unwrap().value, "a@example.com");
    }
}
