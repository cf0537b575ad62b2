//! Cross-header consistency checks (spec §4.9).

use chrono::{DateTime, Duration, Utc};
use forensics_types::headers::HeaderList;
use forensics_types::results::HeaderConsistencyResult;
use once_cell::sync::Lazy;
use regex::Regex;

static MESSAGE_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)^<.+@.+>$").unwrap());

fn domain_of(address_field: &str) -> Option<String> {
    // Address fields may carry a display name, e.g. `"Name" <user@host>`.
    let addr = address_field
        .rsplit_once('<')
        .map(|(_, rest)| rest.trim_end_matches('>'))
        .unwrap_or(address_field)
        .trim();
    addr.rsplit_once('@').map(|(_, host)| host.trim().to_ascii_lowercase())
}

/// Compare `Return-Path`/`Reply-To`/`Date`/`Message-ID` against `From`
/// per the §4.9 rules. Headers absent from the message are not flagged as
/// mismatches; only a present-but-divergent header counts as an issue.
pub fn analyze_header_consistency(headers: &HeaderList) -> HeaderConsistencyResult {
    let mut issues = Vec::new();

    let from_domain = headers.first("From").and_then(|h| domain_of(&h.value));

    let return_path_mismatch = match (&from_domain, headers.first("Return-Path").and_then(|h| domain_of(&h.value))) {
        (Some(from), Some(rp)) if from != &rp => {
            issues.push("Return-Path domain does not match From domain".to_string());
            true
        }
        _ => false,
    };

    let reply_to_mismatch = match (&from_domain, headers.first("Reply-To").and_then(|h| domain_of(&h.value))) {
        (Some(from), Some(rt)) if from != &rt => {
            issues.push("Reply-To domain does not match From domain".to_string());
            true
        }
        _ => false,
    };

    let date_valid = match headers.first("Date") {
        Some(h) => match DateTime::parse_from_rfc2822(h.value.trim()) {
            Ok(date) => {
                let date = date.with_timezone(&Utc);
                let now = Utc::now();
                let valid = date <= now + Duration::days(1) && date >= now - Duration::days(365);
                if !valid {
                    issues.push("Date header is outside the plausible range".to_string());
                }
                valid
            }
            Err(_) => {
                issues.push("Date header could not be parsed".to_string());
                false
            }
        },
        None => {
            issues.push("Date header is missing".to_string());
            false
        }
    };

    let message_id_valid = match headers.first("Message-ID") {
        Some(h) => {
            let valid = MESSAGE_ID_RE.is_match(h.value.trim());
            if !valid {
                issues.push("Message-ID does not match <local@domain> form".to_string());
            }
            valid
        }
        None => {
            issues.push("Message-ID header is missing".to_string());
            false
        }
    };

    HeaderConsistencyResult {
        return_path_mismatch,
        reply_to_mismatch,
        date_valid,
        message_id_valid,
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forensics_types::headers::EmailHeader;

    fn headers(pairs: &[(&str, &str)]) -> HeaderList {
        HeaderList::new(pairs.iter().map(|(n, v)| EmailHeader::new(*n, *v)).collect())
    }

    #[test]
    fn matching_domains_have_no_mismatch() {
        let h = headers(&[
            ("From", "Alice <alice@example.com>"),
            ("Return-Path", "<alice@example.com>"),
            ("Reply-To", "alice@example.com"),
            ("Date", "Mon, 1 Jan 2024 10:00:00 +0000"),
            ("Message-ID", "<abc123@example.com>"),
        ]);
        let result = analyze_header_consistency(&h);
        assert!(!result.return_path_mismatch);
        assert!(!result.reply_to_mismatch);
        assert!(result.message_id_valid);
    }

    #[test]
    fn return_path_domain_mismatch_is_flagged() {
        let h = headers(&[
            ("From", "Alice <alice@example.com>"),
            ("Return-Path", "<bounce@evil.com>"),
        ]);
        let result = analyze_header_consistency(&h);
        assert!(result.return_path_mismatch);
    }

    #[test]
    fn missing_date_is_invalid() {
        let h = headers(&[("From", "alice@example.com")]);
        let result = analyze_header_consistency(&h);
        assert!(!result.date_valid);
        assert!(result.issues.iter().any(|i| i.contains("Date header is missing")));
    }

    #[test]
    fn malformed_message_id_is_invalid() {
        let h = headers(&[("Message-ID", "not-a-valid-id")]);
        let result = analyze_header_consistency(&h);
        assert!(!result.message_id_valid);
    }

    #[test]
    fn date_far_in_the_past_is_invalid() {
        let h = headers(&[("Date", "Mon, 1 Jan 1990 10:00:00 +0000")]);
        let result = analyze_header_consistency(&h);
        assert!(!result.date_valid);
    }
}
