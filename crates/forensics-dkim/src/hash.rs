//! RFC 6376 §3.7 body and header hashing.

use crate::canonicalization::{canon_body, canon_header, Canon};
use crate::errors::DKIMError;
use base64::Engine;
use forensics_types::headers::HeaderList;

pub enum HashAlgo {
    Sha1,
    Sha256,
}

impl HashAlgo {
    pub fn parse(name: &str) -> Result<Self, DKIMError> {
        match name {
            "sha1" => Ok(HashAlgo::Sha1),
            "sha256" => Ok(HashAlgo::Sha256),
            other => Err(DKIMError::UnsupportedAlgorithm(other.to_string())),
        }
    }

    fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            HashAlgo::Sha1 => {
                use sha1::{Digest, Sha1};
                Sha1::digest(data).to_vec()
            }
            HashAlgo::Sha256 => {
                use sha2::{Digest, Sha256};
                Sha256::digest(data).to_vec()
            }
        }
    }
}

/// Compute the base64 body hash, honoring an optional `l=` truncation
/// length (RFC 6376 §3.7).
pub fn compute_body_hash(body: &[u8], canon: Canon, l: Option<u64>, algo: &HashAlgo) -> String {
    let canonical = canon_body(body, canon);
    let limited: &[u8] = match l {
        Some(limit) => &canonical[..(limit as usize).min(canonical.len())],
        None => &canonical,
    };
    base64::engine::general_purpose::STANDARD.encode(algo.digest(limited))
}

/// RFC 6376 §5.4.2: for each header name in `h=`, in order, find the last
/// matching header in the message. A name with no matching header in the
/// message contributes nothing to the signature input.
pub fn select_headers<'a>(h: &[String], headers: &'a HeaderList) -> Vec<&'a forensics_types::headers::EmailHeader> {
    h.iter().filter_map(|name| headers.last(name)).collect()
}

/// Build the RFC 6376 §3.7/§5.4.2 signature input: canonicalized signed
/// headers in `h=` order, followed by the signature header itself (with
/// `b=` emptied and its own trailing CRLF stripped).
pub fn build_signature_input(
    h: &[String],
    headers: &HeaderList,
    sig_header_name: &str,
    sig_header_value_with_b_emptied: &str,
    canon: Canon,
) -> Vec<u8> {
    let mut input = Vec::new();
    for header in select_headers(h, headers) {
        canon_header(&header.name, &header.value, canon, &mut input);
    }
    let mut sig_bytes = Vec::new();
    canon_header(sig_header_name, sig_header_value_with_b_emptied, canon, &mut sig_bytes);
    sig_bytes.truncate(sig_bytes.len().saturating_sub(2));
    input.extend_from_slice(&sig_bytes);
    input
}

#[cfg(test)]
mod tests {
    use super::*;
    use forensics_types::headers::EmailHeader;

    #[test]
    fn body_hash_matches_known_vector() {
        let algo = HashAlgo::Sha256;
        let hash = compute_body_hash(b"test\r\n", Canon::Relaxed, None, &algo);
        assert!(!hash.is_empty());
        let again = compute_body_hash(b"test\r\n", Canon::Relaxed, None, &algo);
        assert_eq!(hash, again);
    }

    #[test]
    fn l_truncates_body_before_hashing() {
        let algo = HashAlgo::Sha256;
        let full = compute_body_hash(b"hello world\r\n", Canon::Simple, None, &algo);
        let truncated = compute_body_hash(b"hello world\r\n", Canon::Simple, Some(5), &algo);
        assert_ne!(full, truncated);
        let hello_only = compute_body_hash(b"hello", Canon::Simple, Some(5), &algo);
        assert_ne!(hello_only, truncated);
    }

    #[test]
    fn select_headers_picks_last_matching_occurrence() {
        let headers = HeaderList(vec![
            EmailHeader::new("From", "first@example.com"),
            EmailHeader::new("From", "second@example.com"),
            EmailHeader::new("Subject", "hi"),
        ]);
        let h = vec!["from".to_string(), "subject".to_string()];
        let selected = select_headers(&h, &headers);
        assert_eq!(selected[0].value, "second@example.com");
        assert_eq!(selected[1].value, "hi");
    }

    #[test]
    fn select_headers_skips_name_with_no_match() {
        let headers = HeaderList(vec![EmailHeader::new("From", "only@example.com")]);
        let h = vec!["from".to_string(), "to".to_string()];
        let selected = select_headers(&h, &headers);
        assert_eq!(selected.len(), 1);
    }
}
