//! RFC 6376 §3.4 canonicalization.

use memchr::memmem::Finder;
use once_cell::sync::Lazy;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Canon {
    Simple,
    Relaxed,
}

impl Canon {
    pub fn parse(name: &str) -> Self {
        match name {
            "relaxed" => Canon::Relaxed,
            _ => Canon::Simple,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Canon::Simple => "simple",
            Canon::Relaxed => "relaxed",
        }
    }
}

/// Normalize all newlines to CRLF before either body algorithm runs.
fn normalize_newlines(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len());
    let mut i = 0;
    while i < body.len() {
        match body[i] {
            b'\r' => {
                out.push(b'\r');
                out.push(b'\n');
                if i + 1 < body.len() && body[i + 1] == b'\n' {
                    i += 2;
                } else {
                    i += 1;
                }
            }
            b'\n' => {
                out.push(b'\r');
                out.push(b'\n');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    out
}

fn iter_lines(haystack: &[u8]) -> impl Iterator<Item = &[u8]> {
    static CRLF: Lazy<Finder> = Lazy::new(|| Finder::new("\r\n"));
    let mut start = 0;
    let mut done = false;
    let mut matches = CRLF.find_iter(haystack);
    std::iter::from_fn(move || {
        if done {
            return None;
        }
        match matches.next() {
            Some(idx) => {
                let line = &haystack[start..idx + 2];
                start = idx + 2;
                Some(line)
            }
            None => {
                done = true;
                let line = &haystack[start..];
                if line.is_empty() {
                    None
                } else {
                    Some(line)
                }
            }
        }
    })
}

/// RFC 6376 §3.4.3: ignore all trailing empty lines. Body that is
/// genuinely zero-length canonicalizes to a single CRLF; otherwise only
/// trailing `\r\n\r\n` runs are trimmed, with no CRLF forced onto a body
/// that didn't already end with one.
fn body_simple(body: &[u8]) -> Vec<u8> {
    if body.is_empty() {
        return b"\r\n".to_vec();
    }
    let mut end = body.len();
    while end >= 4 && &body[end - 4..end] == b"\r\n\r\n" {
        end -= 2;
    }
    body[..end].to_vec()
}

fn trim_wsp_crlf_end(mut line: &[u8]) -> &[u8] {
    while let Some(&b) = line.last() {
        match b {
            b' ' | b'\t' | b'\r' | b'\n' => line = &line[..line.len() - 1],
            _ => break,
        }
    }
    line
}

/// RFC 6376 §3.4.4. A genuinely zero-length body stays zero-length; a
/// body of nothing but blank lines still reduces to a single CRLF, same
/// as the simple algorithm, because the trailing-empty-line trim applies
/// before line-by-line processing.
fn body_relaxed(body: &[u8]) -> Vec<u8> {
    if body.is_empty() {
        return Vec::new();
    }
    let mut end = body.len();
    while end >= 4 && &body[end - 4..end] == b"\r\n\r\n" {
        end -= 2;
    }
    let trimmed = &body[..end];

    let mut out = Vec::with_capacity(trimmed.len());
    for line in iter_lines(trimmed) {
        let line = trim_wsp_crlf_end(line);
        let mut prior = 0;
        let mut in_run = false;
        for (idx, &b) in line.iter().enumerate() {
            if b == b' ' || b == b'\t' {
                if in_run {
                    continue;
                }
                out.extend_from_slice(&line[prior..idx]);
                out.push(b' ');
                in_run = true;
                prior = idx + 1;
            } else {
                in_run = false;
            }
        }
        out.extend_from_slice(&line[prior..]);
        out.extend_from_slice(b"\r\n");
    }
    out
}

/// Canonicalize a message body (RFC 6376 §3.4.3/§3.4.4).
pub fn canon_body(body: &[u8], canon: Canon) -> Vec<u8> {
    let normalized = normalize_newlines(body);
    match canon {
        Canon::Simple => body_simple(&normalized),
        Canon::Relaxed => body_relaxed(&normalized),
    }
}

/// Canonicalize a single header per RFC 6376 §3.4.1/§3.4.2 and append it
/// (with its own trailing CRLF) to `out`.
pub fn canon_header(name: &str, value: &str, canon: Canon, out: &mut Vec<u8>) {
    match canon {
        Canon::Simple => {
            out.extend_from_slice(name.as_bytes());
            out.push(b':');
            out.extend_from_slice(value.as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        Canon::Relaxed => {
            out.extend_from_slice(name.to_ascii_lowercase().trim_end().as_bytes());
            out.push(b':');
            let value = value.as_bytes();
            let start = value
                .iter()
                .position(|&b| !matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
                .unwrap_or(value.len());
            let value = trim_wsp_crlf_end(&value[start..]);
            let mut in_run = false;
            for &b in value {
                match b {
                    b'\r' | b'\n' => {}
                    b' ' | b'\t' => {
                        if in_run {
                            continue;
                        }
                        in_run = true;
                        out.push(b' ');
                    }
                    _ => {
                        in_run = false;
                        out.push(b);
                    }
                }
            }
            out.extend_from_slice(b"\r\n");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_body_strips_trailing_empty_lines_only() {
        let body = canon_body(b"line one  \r\n\r\n\r\n", Canon::Simple);
        assert_eq!(body, b"line one  \r\n".to_vec());
    }

    #[test]
    fn simple_body_keeps_content_without_trailing_crlf() {
        let body = canon_body(b"hey        \r\n", Canon::Simple);
        assert_eq!(body, b"hey        \r\n".to_vec());
    }

    #[test]
    fn relaxed_body_collapses_whitespace() {
        let body = canon_body(b" C \r\nD \t E\r\n\r\n\r\n", Canon::Relaxed);
        assert_eq!(body, b" C\r\nD E\r\n".to_vec());
    }

    #[test]
    fn empty_body_simple_is_single_crlf() {
        assert_eq!(canon_body(b"", Canon::Simple), b"\r\n".to_vec());
    }

    #[test]
    fn empty_body_relaxed_is_empty() {
        assert_eq!(canon_body(b"", Canon::Relaxed), b"".to_vec());
    }

    #[test]
    fn all_blank_lines_reduce_to_single_crlf() {
        assert_eq!(canon_body(b"\r\n\r\n\r\n", Canon::Simple), b"\r\n".to_vec());
        assert_eq!(canon_body(b"\r\n\r\n\r\n", Canon::Relaxed), b"\r\n".to_vec());
    }

    #[test]
    fn relaxed_header_collapses_and_lowercases_name() {
        let mut out = vec![];
        canon_header("Subject", "  Hello   World  ", Canon::Relaxed, &mut out);
        assert_eq!(out, b"subject:Hello World\r\n".to_vec());
    }

    #[test]
    fn canonicalization_is_idempotent() {
        let once = canon_body(b"line   one  \r\nline two\r\n\r\n", Canon::Relaxed);
        let twice = canon_body(&once, Canon::Relaxed);
        assert_eq!(once, twice);
    }
}
