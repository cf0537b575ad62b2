//! Confusable/homograph and typosquat domain analysis (spec §4.8).

pub mod brands;
pub mod confusables;
pub mod edit_distance;
pub mod normalize;

use brands::BRANDS;
use edit_distance::similarity_percent;
use forensics_types::results::{ConfusableReplacement, DomainResult, Risk};
use normalize::normalize;
use std::collections::BTreeSet;

/// "mixed-script: Cyrillic, Latin"-style technique, listing every script a
/// replacement came from alongside Latin (the host alphabet being spoofed).
fn mixed_script_technique(replacements: &[ConfusableReplacement]) -> Option<String> {
    if replacements.is_empty() {
        return None;
    }
    let mut scripts: BTreeSet<&str> = replacements.iter().map(|r| r.script.as_str()).collect();
    scripts.insert("Latin");
    Some(format!("mixed-script: {}", scripts.into_iter().collect::<Vec<_>>().join(", ")))
}

fn is_idn(domain: &str) -> bool {
    domain.chars().any(|c| !c.is_ascii()) || domain.to_ascii_lowercase().contains("xn--")
}

fn punycode_of(domain: &str) -> Option<String> {
    idna::domain_to_ascii(domain).ok()
}

fn best_brand_match(normalized: &str) -> Option<(&'static str, f64)> {
    BRANDS
        .iter()
        .map(|&brand| (brand, similarity_percent(normalized, brand)))
        .filter(|(_, sim)| *sim >= 70.0)
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
}

/// Analyze `domain` for homograph impersonation and typosquatting against
/// the brand list.
pub fn analyze_domain(domain: &str) -> DomainResult {
    let out = normalize(domain);
    let has_confusables = !out.replacements.is_empty();
    let idn = is_idn(domain);
    let punycode = punycode_of(domain);

    if has_confusables && BRANDS.contains(&out.normalized.as_str()) {
        let mut techniques = vec!["homograph exact match".to_string()];
        techniques.extend(mixed_script_technique(&out.replacements));
        return DomainResult {
            domain: domain.to_string(),
            normalized: out.normalized.clone(),
            risk: Risk::Dangerous,
            matched_domain: Some(out.normalized),
            similarity: Some(100.0),
            techniques,
            replacements: out.replacements,
            is_idn: idn,
            punycode,
        };
    }

    let Some((brand, similarity)) = best_brand_match(&out.normalized) else {
        return DomainResult {
            domain: domain.to_string(),
            normalized: out.normalized,
            risk: Risk::Safe,
            matched_domain: None,
            similarity: None,
            techniques: vec![],
            replacements: out.replacements,
            is_idn: idn,
            punycode,
        };
    };

    let (risk, technique) = if has_confusables {
        if similarity >= 90.0 {
            (Risk::Dangerous, "homograph high similarity")
        } else if similarity >= 80.0 {
            (Risk::Suspicious, "homograph medium similarity")
        } else {
            (Risk::Suspicious, "homograph low similarity")
        }
    } else if similarity >= 95.0 {
        (Risk::Dangerous, "typosquatting high similarity")
    } else if similarity >= 85.0 {
        (Risk::Suspicious, "typosquatting medium similarity")
    } else {
        (Risk::Safe, "name similarity below risk threshold")
    };

    let mut techniques = vec![technique.to_string()];
    if has_confusables {
        techniques.extend(mixed_script_technique(&out.replacements));
    }

    DomainResult {
        domain: domain.to_string(),
        normalized: out.normalized,
        risk,
        matched_domain: Some(brand.to_string()),
        similarity: Some(similarity),
        techniques,
        replacements: out.replacements,
        is_idn: idn,
        punycode,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn homograph_exact_match_is_dangerous() {
        let result = analyze_domain("pаypal.com"); // Cyrillic а
        assert_eq!(result.risk, Risk::Dangerous);
        assert!(result.techniques.contains(&"homograph exact match".to_string()));
        assert!(result.techniques.iter().any(|t| t.starts_with("mixed-script:")));
        assert!(result.is_idn);
    }

    #[test]
    fn clean_unrelated_domain_is_safe() {
        let result = analyze_domain("example.com");
        assert_eq!(result.risk, Risk::Safe);
        assert!(result.matched_domain.is_none());
    }

    #[test]
    fn typosquat_without_confusables_is_flagged() {
        let result = analyze_domain("paypa1.com");
        assert_eq!(result.matched_domain.as_deref(), Some("paypal.com"));
        assert_ne!(result.risk, Risk::Safe);
    }

    #[test]
    fn legitimate_brand_domain_has_no_replacements() {
        let result = analyze_domain("paypal.com");
        assert!(result.replacements.is_empty());
    }
}
