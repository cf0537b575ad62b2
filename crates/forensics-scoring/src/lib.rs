//! Weighted multi-factor security scorer (spec §4.10).

use forensics_types::results::{
    AttachmentAnalysisResult, AuthStatus, BECResult, DKIMResult, DomainResult,
    HeaderConsistencyResult, LinkAnalysisResult, Risk, ScoreFactor, SecurityScore, TLSResult,
};
use std::collections::HashMap;

/// Every per-factor result the scorer reduces to a single `SecurityScore`.
/// Borrowed rather than owned since the caller (the orchestrator) still
/// needs these values to build the full `AnalysisResult`.
pub struct ScoringInput<'a> {
    pub auth_results: &'a HashMap<String, String>,
    pub dkim: &'a DKIMResult,
    pub domain: &'a DomainResult,
    pub links: &'a LinkAnalysisResult,
    pub attachments: &'a AttachmentAnalysisResult,
    pub bec: &'a BECResult,
    pub tls: &'a TLSResult,
    pub header_consistency: &'a HeaderConsistencyResult,
}

fn clamp(value: i32, max: u8) -> u8 {
    value.clamp(0, max as i32) as u8
}

fn auth_factor(auth_results: &HashMap<String, String>) -> ScoreFactor {
    const MAX: u8 = 25;
    let mut score: i32 = MAX as i32;
    let mut notes = Vec::new();
    for check in ["spf", "dkim", "dmarc"] {
        let pass = auth_results
            .get(check)
            .map(|v| v.eq_ignore_ascii_case("pass"))
            .unwrap_or(false);
        if !pass {
            score -= 8;
            notes.push(format!("{} not pass", check.to_ascii_uppercase()));
        }
    }
    ScoreFactor {
        name: "Authentication".to_string(),
        max: MAX,
        awarded: clamp(score, MAX),
        notes,
    }
}

fn dkim_factor(dkim: &DKIMResult) -> ScoreFactor {
    const MAX: u8 = 15;
    let mut notes = Vec::new();
    if dkim.status != AuthStatus::Pass {
        notes.push(format!("DKIM status is {:?}, not pass", dkim.status));
        return ScoreFactor {
            name: "DKIM".to_string(),
            max: MAX,
            awarded: 0,
            notes,
        };
    }

    let mut score = MAX as i32;
    if dkim.algorithm.as_deref().map(|a| a.ends_with("sha1")).unwrap_or(false) {
        score -= 5;
        notes.push("weak hash algorithm (sha1)".to_string());
    }
    if dkim.key_size.map(|k| k < 2048).unwrap_or(false) {
        score -= 3;
        notes.push("key size below 2048 bits".to_string());
    }
    ScoreFactor {
        name: "DKIM".to_string(),
        max: MAX,
        awarded: clamp(score, MAX),
        notes,
    }
}

fn domain_factor(domain: &DomainResult) -> ScoreFactor {
    const MAX: u8 = 15;
    let mut score = MAX as i32;
    let mut notes = Vec::new();

    let deduction = if domain.risk == Risk::Safe {
        0
    } else if domain
        .techniques
        .iter()
        .any(|t| t == "homograph exact match" || t.contains("high similarity"))
    {
        20
    } else if domain.techniques.iter().any(|t| t.contains("medium similarity")) {
        15
    } else {
        10
    };
    if deduction > 0 {
        score -= deduction;
        notes.push(format!("domain risk {} ({} deduction)", domain.risk.as_str(), deduction));
    }

    if domain.is_idn && domain.techniques.iter().any(|t| t.starts_with("mixed-script:")) {
        score -= 5;
        notes.push("IDN uses multiple scripts".to_string());
    }

    ScoreFactor {
        name: "Domain".to_string(),
        max: MAX,
        awarded: clamp(score, MAX),
        notes,
    }
}

fn links_factor(links: &LinkAnalysisResult) -> ScoreFactor {
    const MAX: u8 = 15;
    let dangerous = links.links.iter().filter(|l| l.risk == Risk::Dangerous).count();
    let suspicious = links.links.iter().filter(|l| l.risk == Risk::Suspicious).count();

    let dangerous_deduction = (dangerous as i32 * 8).min(15);
    let suspicious_deduction = (suspicious as i32 * 3).min(10);

    let mut notes = Vec::new();
    if dangerous > 0 {
        notes.push(format!("{} dangerous link(s)", dangerous));
    }
    if suspicious > 0 {
        notes.push(format!("{} suspicious link(s)", suspicious));
    }

    ScoreFactor {
        name: "Links".to_string(),
        max: MAX,
        awarded: clamp(MAX as i32 - dangerous_deduction - suspicious_deduction, MAX),
        notes,
    }
}

fn attachments_factor(attachments: &AttachmentAnalysisResult) -> ScoreFactor {
    const MAX: u8 = 10;
    let dangerous = attachments.attachments.iter().filter(|a| a.risk == Risk::Dangerous).count();
    let suspicious = attachments.attachments.iter().filter(|a| a.risk == Risk::Suspicious).count();

    let mut notes = Vec::new();
    if dangerous > 0 {
        notes.push(format!("{} dangerous attachment(s)", dangerous));
    }
    if suspicious > 0 {
        notes.push(format!("{} flagged attachment(s)", suspicious));
    }

    let deduction = dangerous as i32 * 10 + suspicious as i32 * 5;
    ScoreFactor {
        name: "Attachments".to_string(),
        max: MAX,
        awarded: clamp(MAX as i32 - deduction, MAX),
        notes,
    }
}

fn bec_factor(bec: &BECResult) -> ScoreFactor {
    const MAX: u8 = 10;
    let high = bec.high_count();
    let medium = bec.medium_count();

    let high_deduction = (high as i32 * 5).min(10);
    let medium_deduction = (medium as i32 * 2).min(5);

    let mut notes = Vec::new();
    if high > 0 {
        notes.push(format!("{} high-severity BEC indicator(s)", high));
    }
    if medium > 0 {
        notes.push(format!("{} medium-severity BEC indicator(s)", medium));
    }

    ScoreFactor {
        name: "BEC".to_string(),
        max: MAX,
        awarded: clamp(MAX as i32 - high_deduction - medium_deduction, MAX),
        notes,
    }
}

fn tls_factor(tls: &TLSResult) -> ScoreFactor {
    const MAX: u8 = 5;
    let (awarded, notes) = match tls.risk {
        Risk::Dangerous => (0, vec!["unencrypted delivery path".to_string()]),
        Risk::Suspicious => (2, vec!["partially unencrypted delivery path".to_string()]),
        Risk::Safe => (MAX, vec![]),
    };
    ScoreFactor {
        name: "TLS".to_string(),
        max: MAX,
        awarded,
        notes,
    }
}

fn header_consistency_factor(hc: &HeaderConsistencyResult) -> ScoreFactor {
    const MAX: u8 = 5;
    let mut score = MAX as i32;
    let mut notes = Vec::new();
    if hc.return_path_mismatch {
        score -= 2;
        notes.push("Return-Path domain mismatch".to_string());
    }
    if hc.reply_to_mismatch {
        score -= 2;
        notes.push("Reply-To domain mismatch".to_string());
    }
    if !hc.date_valid {
        score -= 1;
        notes.push("Date header invalid or out of range".to_string());
    }
    ScoreFactor {
        name: "HeaderConsistency".to_string(),
        max: MAX,
        awarded: clamp(score, MAX),
        notes,
    }
}

fn grade_for(score: u8) -> &'static str {
    match score {
        90..=100 => "A",
        75..=89 => "B",
        60..=74 => "C",
        40..=59 => "D",
        _ => "F",
    }
}

fn verdict_for(score: u8, input: &ScoringInput) -> &'static str {
    let any_dangerous_link = input.links.links.iter().any(|l| l.risk == Risk::Dangerous);
    let any_dangerous_attachment = input.attachments.attachments.iter().any(|a| a.risk == Risk::Dangerous);
    let high_bec_low_score = score < 60 && input.bec.high_count() > 0;

    if any_dangerous_link || any_dangerous_attachment || high_bec_low_score {
        return "danger";
    }
    match score {
        90..=u8::MAX => "safe",
        75..=89 => "caution",
        50..=74 => "warning",
        _ => "danger",
    }
}

/// Compute the full weighted score from every factor's already-computed
/// result. Pure function: no I/O, no async.
pub fn score(input: &ScoringInput) -> SecurityScore {
    let factors = vec![
        auth_factor(input.auth_results),
        dkim_factor(input.dkim),
        domain_factor(input.domain),
        links_factor(input.links),
        attachments_factor(input.attachments),
        bec_factor(input.bec),
        tls_factor(input.tls),
        header_consistency_factor(input.header_consistency),
    ];

    let total: u32 = factors.iter().map(|f| f.awarded as u32).sum();
    let total = total.min(100) as u8;

    SecurityScore {
        score: total,
        grade: grade_for(total).to_string(),
        verdict: verdict_for(total, input).to_string(),
        factors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forensics_types::results::AuthStatus;

    fn clean_dkim() -> DKIMResult {
        DKIMResult {
            status: AuthStatus::Pass,
            domain: Some("example.com".to_string()),
            selector: Some("sel".to_string()),
            algorithm: Some("rsa-sha256".to_string()),
            key_size: Some(2048),
            body_hash_valid: Some(true),
            signature_valid: Some(true),
            issues: vec![],
        }
    }

    fn clean_domain() -> DomainResult {
        DomainResult {
            domain: "example.com".to_string(),
            normalized: "example.com".to_string(),
            risk: Risk::Safe,
            matched_domain: None,
            similarity: None,
            techniques: vec![],
            replacements: vec![],
            is_idn: false,
            punycode: None,
        }
    }

    fn all_pass_auth() -> HashMap<String, String> {
        let mut m = HashMap::new();
        m.insert("spf".to_string(), "pass".to_string());
        m.insert("dkim".to_string(), "pass".to_string());
        m.insert("dmarc".to_string(), "pass".to_string());
        m
    }

    #[test]
    fn clean_message_scores_perfectly() {
        let dkim = clean_dkim();
        let domain = clean_domain();
        let links = LinkAnalysisResult::default();
        let attachments = AttachmentAnalysisResult::default();
        let bec = BECResult::default();
        let tls = TLSResult {
            risk: Risk::Safe,
            hops: vec![],
            issues: vec![],
        };
        let hc = HeaderConsistencyResult {
            return_path_mismatch: false,
            reply_to_mismatch: false,
            date_valid: true,
            message_id_valid: true,
            issues: vec![],
        };
        let auth = all_pass_auth();
        let input = ScoringInput {
            auth_results: &auth,
            dkim: &dkim,
            domain: &domain,
            links: &links,
            attachments: &attachments,
            bec: &bec,
            tls: &tls,
            header_consistency: &hc,
        };
        let result = score(&input);
        assert_eq!(result.score, 100);
        assert_eq!(result.grade, "A");
        assert_eq!(result.verdict, "safe");
    }

    #[test]
    fn dangerous_link_forces_danger_verdict_regardless_of_score() {
        use forensics_types::results::LinkResult;
        let dkim = clean_dkim();
        let domain = clean_domain();
        let links = LinkAnalysisResult {
            links: vec![LinkResult {
                url: "http://192.168.1.1/x".to_string(),
                host: Some("192.168.1.1".to_string()),
                risk: Risk::Dangerous,
                checks: vec![],
                issues: vec![],
            }],
        };
        let attachments = AttachmentAnalysisResult::default();
        let bec = BECResult::default();
        let tls = TLSResult {
            risk: Risk::Safe,
            hops: vec![],
            issues: vec![],
        };
        let hc = HeaderConsistencyResult {
            return_path_mismatch: false,
            reply_to_mismatch: false,
            date_valid: true,
            message_id_valid: true,
            issues: vec![],
        };
        let auth = all_pass_auth();
        let input = ScoringInput {
            auth_results: &auth,
            dkim: &dkim,
            domain: &domain,
            links: &links,
            attachments: &attachments,
            bec: &bec,
            tls: &tls,
            header_consistency: &hc,
        };
        let result = score(&input);
        assert_eq!(result.verdict, "danger");
    }

    #[test]
    fn failed_authentication_deducts_per_check() {
        let dkim = clean_dkim();
        let domain = clean_domain();
        let links = LinkAnalysisResult::default();
        let attachments = AttachmentAnalysisResult::default();
        let bec = BECResult::default();
        let tls = TLSResult {
            risk: Risk::Safe,
            hops: vec![],
            issues: vec![],
        };
        let hc = HeaderConsistencyResult {
            return_path_mismatch: false,
            reply_to_mismatch: false,
            date_valid: true,
            message_id_valid: true,
            issues: vec![],
        };
        let mut auth = HashMap::new();
        auth.insert("spf".to_string(), "fail".to_string());
        let input = ScoringInput {
            auth_results: &auth,
            dkim: &dkim,
            domain: &domain,
            links: &links,
            attachments: &attachments,
            bec: &bec,
            tls: &tls,
            header_consistency: &hc,
        };
        let result = score(&input);
        let auth_factor = result.factors.iter().find(|f| f.name == "Authentication").unwrap();
        assert_eq!(auth_factor.awarded, 1);
    }

    #[test]
    fn score_never_exceeds_bounds() {
        let dkim = clean_dkim();
        let domain = clean_domain();
        let links = LinkAnalysisResult::default();
        let attachments = AttachmentAnalysisResult::default();
        let bec = BECResult::default();
        let tls = TLSResult {
            risk: Risk::Safe,
            hops: vec![],
            issues: vec![],
        };
        let hc = HeaderConsistencyResult::default();
        let auth = all_pass_auth();
        let input = ScoringInput {
            auth_results: &auth,
            dkim: &dkim,
            domain: &domain,
            links: &links,
            attachments: &attachments,
            bec: &bec,
            tls: &tls,
            header_consistency: &hc,
        };
        let result = score(&input);
        assert!(result.score <= 100);
    }
}
