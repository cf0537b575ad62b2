//! `Received:` header path reconstruction and TLS-in-transit analysis
//! (spec §4.4).

use forensics_types::results::{Risk, TLSHop, TLSResult};
use once_cell::sync::Lazy;
use regex::Regex;

static FROM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)from\s+(\S+)").unwrap());
static BY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)by\s+(\S+)").unwrap());
static PROTOCOL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(ESMTPSA|ESMTPS|ESMTP|SMTP|LMTP)\b").unwrap());
static TLS_VERSION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)TLSv?1\.(\d)").unwrap());

fn parse_hop(value: &str) -> TLSHop {
    let from = FROM_RE.captures(value).map(|c| c[1].to_string());
    let by = BY_RE.captures(value).map(|c| c[1].to_string());
    let timestamp = value.rsplit(';').next().map(|s| s.trim().to_string());
    let protocol = PROTOCOL_RE.captures(value).map(|c| c[1].to_string());

    let has_tls_keyword = value.to_ascii_lowercase().contains("with tls") || value.contains("cipher=");
    let tls_version = TLS_VERSION_RE.captures(value).map(|c| format!("1.{}", &c[1]));
    let protocol_ends_in_s = protocol.as_deref().map(|p| p.ends_with('S')).unwrap_or(false);
    let encrypted = protocol_ends_in_s || has_tls_keyword || tls_version.is_some();

    TLSHop {
        from,
        by,
        timestamp,
        protocol,
        encrypted,
        tls_version,
    }
}

/// Reconstruct the delivery path from `Received:` header values, given in
/// message order (top-of-message first, i.e. most recent hop first).
/// Received headers are prepended on each hop, so the message order is
/// recipient→origin; this returns origin→recipient.
pub fn analyze_tls(received_values: &[String]) -> TLSResult {
    let mut hops: Vec<TLSHop> = received_values.iter().map(|v| parse_hop(v)).collect();
    hops.reverse();

    let mut issues = Vec::new();
    if hops.iter().any(|h| matches!(h.tls_version.as_deref(), Some("1.0") | Some("1.1"))) {
        issues.push("deprecated TLS version in path".to_string());
    }

    let risk = if hops.is_empty() {
        Risk::Safe
    } else {
        let unencrypted = hops.iter().filter(|h| !h.encrypted).count();
        let first_unencrypted = !hops[0].encrypted;
        if first_unencrypted || unencrypted * 2 > hops.len() {
            Risk::Dangerous
        } else if unencrypted > 0 {
            Risk::Suspicious
        } else {
            Risk::Safe
        }
    };

    TLSResult { risk, hops, issues }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_encrypted_hops_are_safe() {
        let received = vec![
            "from mail.example.com by mx.example.org with ESMTPS; Wed, 1 Jan 2025 00:00:00 +0000".to_string(),
        ];
        let result = analyze_tls(&received);
        assert_eq!(result.risk, Risk::Safe);
        assert!(result.hops[0].encrypted);
    }

    #[test]
    fn unencrypted_first_hop_is_dangerous() {
        let received = vec![
            "from recent.example.com by mx.example.org with ESMTPS; now".to_string(),
            "from origin.example.com by relay.example.com with SMTP; earlier".to_string(),
        ];
        let result = analyze_tls(&received);
        // reversed: origin (SMTP, unencrypted) is first
        assert_eq!(result.risk, Risk::Dangerous);
    }

    #[test]
    fn deprecated_tls_version_is_flagged() {
        let received = vec!["from a by b with ESMTPS (TLS1.0); now".to_string()];
        let result = analyze_tls(&received);
        assert!(result.issues.iter().any(|i| i.contains("deprecated TLS")));
    }
}
