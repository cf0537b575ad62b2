//! URL extraction and risk scoring from HTML/plain-text bodies (spec §4.5).

use forensics_types::results::{LinkAnalysisResult, LinkResult, Risk};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::net::IpAddr;

static ANCHOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)<a\s+[^>]*href\s*=\s*["']([^"']+)["'][^>]*>(.*?)</a>"#).unwrap());
static PLAIN_URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bhttps?://[^\s<>"']+"#).unwrap());
static HTML_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]+>").unwrap());

const SHORTENERS: &[&str] = &[
    "bit.ly", "tinyurl.com", "goo.gl", "t.co", "ow.ly", "is.gd", "buff.ly", "rebrand.ly",
];
const SUSPICIOUS_TLDS: &[&str] = &[".tk", ".xyz", ".top", ".club", ".gq", ".cf", ".ml", ".ga", ".work", ".click"];
const STANDARD_PORTS: &[u16] = &[80, 443, 8080, 8443];
const CREDENTIAL_PATHS: &[&str] = &["/login", "/verify", "/reset", "/update", "/signin", "/confirm"];
const TRUSTED_TLDS: &[&str] = &[".com", ".org", ".net", ".gov", ".edu", ".mil"];

struct Extracted {
    url: String,
    display_text: Option<String>,
}

fn decode_percent_iteratively(input: &str) -> String {
    let mut current = input.to_string();
    for _ in 0..4 {
        let decoded = percent_encoding::percent_decode_str(&current)
            .decode_utf8_lossy()
            .into_owned();
        if decoded == current {
            break;
        }
        current = decoded;
    }
    current
}

fn extract_urls(html: Option<&str>, text: Option<&str>) -> Vec<Extracted> {
    let mut out = Vec::new();
    if let Some(html) = html {
        for cap in ANCHOR_RE.captures_iter(html) {
            let url = cap[1].trim().to_string();
            let inner = HTML_TAG_RE.replace_all(&cap[2], "").trim().to_string();
            out.push(Extracted {
                url,
                display_text: if inner.is_empty() { None } else { Some(inner) },
            });
        }
    }
    if let Some(text) = text {
        for m in PLAIN_URL_RE.find_iter(text) {
            out.push(Extracted {
                url: m.as_str().to_string(),
                display_text: None,
            });
        }
    }
    out
}

fn is_rfc1918(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback() || v4.is_link_local(),
        IpAddr::V6(v6) => v6.is_loopback() || (v6.segments()[0] & 0xfe00) == 0xfc00,
    }
}

fn host_dot_count(host: &str) -> usize {
    host.matches('.').count()
}

/// Analyze a single already-decoded URL against the §4.5 check table.
/// `brand_names` are the lowercase strings to look for in `display_text`;
/// if a brand is present but the parsed host isn't that brand's own
/// domain, the link is treated as a brand-impersonation attempt.
fn analyze_one(url: &str, display_text: Option<&str>) -> LinkResult {
    let decoded = decode_percent_iteratively(url);
    let mut checks: Vec<String> = Vec::new();
    let mut issues: Vec<String> = Vec::new();
    let mut risk = Risk::Safe;

    fn bump(r: Risk, check: &str, issue: Option<String>, risk: &mut Risk, checks: &mut Vec<String>, issues: &mut Vec<String>) {
        checks.push(check.to_string());
        if let Some(issue) = issue {
            issues.push(issue);
        }
        if r > *risk {
            *risk = r;
        }
    }

    let scheme_lower = decoded.split(':').next().unwrap_or("").to_ascii_lowercase();
    if scheme_lower == "data" || scheme_lower == "javascript" {
        bump(Risk::Dangerous, "dangerous-scheme", Some(format!("{scheme_lower}: scheme")), &mut risk, &mut checks, &mut issues);
        return LinkResult {
            url: url.to_string(),
            host: None,
            risk,
            checks,
            issues,
        };
    }

    let parsed = url::Url::parse(&decoded).ok();
    let host = parsed.as_ref().and_then(|u| u.host_str()).map(|h| h.to_ascii_lowercase());

    if scheme_lower != "https" {
        bump(Risk::Suspicious, "non-https", Some("link does not use HTTPS".to_string()), &mut risk, &mut checks, &mut issues);
    }

    if let Some(host) = &host {
        if SHORTENERS.contains(&host.as_str()) {
            bump(Risk::Suspicious, "shortener", Some("known URL shortener".to_string()), &mut risk, &mut checks, &mut issues);
        }
        if SUSPICIOUS_TLDS.iter().any(|tld| host.ends_with(tld)) {
            bump(Risk::Suspicious, "suspicious-tld", Some("suspicious TLD".to_string()), &mut risk, &mut checks, &mut issues);
        }
        if let Ok(ip) = host.parse::<IpAddr>() {
            let r = if is_rfc1918(&ip) { Risk::Dangerous } else { Risk::Suspicious };
            bump(r, "ip-literal", Some("host is an IP literal".to_string()), &mut risk, &mut checks, &mut issues);
        }
        if host_dot_count(host) > 5 {
            bump(Risk::Suspicious, "excess-subdomains", Some("more than 5 subdomain labels".to_string()), &mut risk, &mut checks, &mut issues);
        }
        if let Some(port) = parsed.as_ref().and_then(|u| u.port()) {
            if !STANDARD_PORTS.contains(&port) {
                bump(Risk::Suspicious, "non-standard-port", Some(format!("non-standard port {port}")), &mut risk, &mut checks, &mut issues);
            }
        }

        let domain_result = forensics_confusables::analyze_domain(host);
        if domain_result.risk != Risk::Safe {
            bump(domain_result.risk, "confusable-host", Some("host resembles a known brand".to_string()), &mut risk, &mut checks, &mut issues);
        }

        let path = parsed.as_ref().map(|u| u.path().to_ascii_lowercase()).unwrap_or_default();
        if CREDENTIAL_PATHS.iter().any(|p| path.starts_with(p)) && !TRUSTED_TLDS.iter().any(|tld| host.ends_with(tld)) {
            bump(Risk::Suspicious, "credential-bait-path", Some("credential-harvesting path on untrusted TLD".to_string()), &mut risk, &mut checks, &mut issues);
        }

        if let Some(display) = display_text {
            let trimmed = display.trim();
            let display_host = url::Url::parse(trimmed)
                .ok()
                .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
                .or_else(|| {
                    // Bare-host display text (no scheme, e.g. "amazon.co.jp")
                    // doesn't parse as an absolute URL on its own; treat it as
                    // a host by prepending a scheme before comparing.
                    if trimmed.contains('.') && !trimmed.contains(' ') {
                        url::Url::parse(&format!("http://{trimmed}"))
                            .ok()
                            .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
                    } else {
                        None
                    }
                });
            if let Some(display_host) = display_host {
                if !display_host.eq_ignore_ascii_case(host) {
                    bump(
                        Risk::Dangerous,
                        "display-href-mismatch",
                        Some(format!("display URL ({trimmed}) and actual URL ({host}) differ")),
                        &mut risk,
                        &mut checks,
                        &mut issues,
                    );
                }
            }
        }
    }

    LinkResult {
        url: url.to_string(),
        host,
        risk,
        checks,
        issues,
    }
}

/// Extract and score every unique link referenced from `html` and/or
/// `text`, sorted dangerous→suspicious→safe.
pub fn analyze_links(html: Option<&str>, text: Option<&str>) -> LinkAnalysisResult {
    let extracted = extract_urls(html, text);
    let mut seen = BTreeSet::new();
    let mut links = Vec::new();
    for item in extracted {
        if !seen.insert(item.url.clone()) {
            continue;
        }
        links.push(analyze_one(&item.url, item.display_text.as_deref()));
    }
    links.sort_by(|a, b| b.risk.cmp(&a.risk));
    LinkAnalysisResult { links }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_http_link_is_suspicious() {
        let result = analyze_links(None, Some("visit http://example.com/page"));
        assert_eq!(result.links.len(), 1);
        assert_eq!(result.links[0].risk, Risk::Suspicious);
    }

    #[test]
    fn data_scheme_is_dangerous() {
        let html = r#"<a href="data:text/html,evil">click</a>"#;
        let result = analyze_links(Some(html), None);
        assert_eq!(result.links[0].risk, Risk::Dangerous);
    }

    #[test]
    fn ip_literal_rfc1918_is_dangerous() {
        let result = analyze_links(None, Some("http://192.168.1.1/admin"));
        assert_eq!(result.links[0].risk, Risk::Dangerous);
    }

    #[test]
    fn public_ip_literal_is_suspicious_not_dangerous() {
        let result = analyze_links(None, Some("http://8.8.8.8/"));
        assert_eq!(result.links[0].risk, Risk::Suspicious);
    }

    #[test]
    fn duplicate_urls_are_deduplicated() {
        let text = "http://example.com/a http://example.com/a";
        let result = analyze_links(None, Some(text));
        assert_eq!(result.links.len(), 1);
    }

    #[test]
    fn shortener_host_is_suspicious() {
        let result = analyze_links(None, Some("https://bit.ly/abc123"));
        assert!(result.links[0].checks.contains(&"shortener".to_string()));
    }

    #[test]
    fn results_sorted_dangerous_first() {
        let text = "https://example.com/safe http://192.168.1.1/bad";
        let result = analyze_links(None, Some(text));
        assert_eq!(result.links[0].risk, Risk::Dangerous);
    }
}
