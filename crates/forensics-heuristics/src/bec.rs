//! Business Email Compromise phrase catalog (spec §4.7).

use forensics_types::results::{BECIndicator, BECResult, Severity};
use once_cell::sync::Lazy;
use regex::Regex;

struct Pattern {
    name: &'static str,
    category: &'static str,
    severity: Severity,
    re: Lazy<Regex>,
}

macro_rules! pattern {
    ($name:expr, $category:expr, $severity:expr, $re:expr) => {
        Pattern {
            name: $name,
            category: $category,
            severity: $severity,
            re: Lazy::new(|| Regex::new($re).unwrap()),
        }
    };
}

static CATALOG: &[Pattern] = &[
    pattern!(
        "urgent-action-required",
        "urgency",
        Severity::Medium,
        r"(?i)\b(urgent|immediately|asap|right away|time.sensitive)\b"
    ),
    pattern!(
        "deadline-pressure",
        "urgency",
        Severity::Low,
        r"(?i)\b(act now|before end of day|within the hour|expires (today|soon))\b"
    ),
    pattern!(
        "wire-transfer-request",
        "financial",
        Severity::High,
        r"(?i)\b(wire transfer|bank transfer|routing number|swift code|ach payment)\b"
    ),
    pattern!(
        "invoice-payment",
        "financial",
        Severity::Medium,
        r"(?i)\b(outstanding invoice|overdue payment|update (your )?payment (details|information))\b"
    ),
    pattern!(
        "gift-card-request",
        "financial",
        Severity::High,
        r"(?i)\b(gift cards?|itunes cards?|google play cards?)\b"
    ),
    pattern!(
        "executive-impersonation",
        "authority",
        Severity::High,
        r"(?i)\b(ceo|cfo|president|on behalf of the (ceo|cfo))\b"
    ),
    pattern!(
        "authority-request",
        "authority",
        Severity::Medium,
        r"(?i)\b(i need you to|this is a direct request from|per (my|the) request)\b"
    ),
    pattern!(
        "confidentiality-request",
        "secrecy",
        Severity::Medium,
        r"(?i)\b(keep this (confidential|between us)|do not (discuss|tell|share) (this|with anyone))\b"
    ),
    pattern!(
        "avoid-verification",
        "secrecy",
        Severity::High,
        r"(?i)\b(do not call|don.t verify|avoid calling|no need to confirm by phone)\b"
    ),
    pattern!(
        "credential-harvest",
        "credential",
        Severity::High,
        r"(?i)\b(verify your (account|password|identity)|confirm your (login|credentials)|click (here|below) to (verify|unlock))\b"
    ),
    pattern!(
        "password-reset-lure",
        "credential",
        Severity::Medium,
        r"(?i)\b(reset your password|your account (has been|will be) (locked|suspended))\b"
    ),
    pattern!(
        "direct-action-request",
        "action",
        Severity::Low,
        r"(?i)\b(please process|please handle|take care of this)\b"
    ),
    pattern!("送金要求", "financial", Severity::High, r"振込(先)?(変更|先変更)?"),
    pattern!("口止め", "secrecy", Severity::High, r"誰にも言わないで"),
    pattern!("緊急性の強調", "urgency", Severity::Medium, r"至急"),
];

/// Scan `corpus` (subject + body text with HTML stripped) against the BEC
/// phrase catalog, deduplicated by pattern name.
pub fn detect_bec(corpus: &str) -> BECResult {
    let mut indicators = Vec::new();
    for pattern in CATALOG {
        if pattern.re.is_match(corpus) {
            indicators.push(BECIndicator {
                name: pattern.name.to_string(),
                category: pattern.category.to_string(),
                severity: pattern.severity,
            });
        }
    }

    let mut result = BECResult {
        indicators,
        composite: Vec::new(),
    };

    if result.high_count() >= 2 {
        result.composite.push("complex high-risk".to_string());
    }
    if result.has_category("financial") && result.has_category("secrecy") {
        result.composite.push("financial+secrecy combo".to_string());
    }

    result.indicators.sort_by(|a, b| b.severity.cmp(&a.severity));
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_match_on_benign_text() {
        let result = detect_bec("Hi, just checking in on the project status. Thanks!");
        assert!(result.indicators.is_empty());
        assert!(result.composite.is_empty());
    }

    #[test]
    fn wire_transfer_request_is_high_severity() {
        let result = detect_bec("Please process a wire transfer to the new vendor account.");
        assert!(result.indicators.iter().any(|i| i.name == "wire-transfer-request" && i.severity == Severity::High));
    }

    #[test]
    fn financial_and_secrecy_combo_is_flagged() {
        let corpus = "Please process the wire transfer and keep this confidential, do not tell anyone.";
        let result = detect_bec(corpus);
        assert!(result.composite.contains(&"financial+secrecy combo".to_string()));
    }

    #[test]
    fn complex_high_risk_requires_two_high_severity_matches() {
        let corpus = "Send gift cards immediately, this is a wire transfer request from the CEO.";
        let result = detect_bec(corpus);
        assert!(result.high_count() >= 2);
        assert!(result.composite.contains(&"complex high-risk".to_string()));
    }

    #[test]
    fn japanese_wire_transfer_and_secrecy_combo_is_flagged() {
        let corpus = "【至急】振込先変更のお願い\n他の誰にも言わないでください";
        let result = detect_bec(corpus);
        assert!(result.indicators.iter().any(|i| i.name == "送金要求"));
        assert!(result.indicators.iter().any(|i| i.name == "口止め"));
        assert!(result.indicators.iter().any(|i| i.name == "緊急性の強調"));
        assert!(result.composite.contains(&"financial+secrecy combo".to_string()));
    }

    #[test]
    fn results_sorted_high_to_low() {
        let corpus = "Please process this. Keep this confidential. Wire transfer needed immediately.";
        let result = detect_bec(corpus);
        let severities: Vec<_> = result.indicators.iter().map(|i| i.severity).collect();
        let mut sorted = severities.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(severities, sorted);
    }
}
