//! RFC 8617 ARC chain verification (spec §4.3).
//!
//! Full per-seal RSA verification shares the DKIM machinery but is out of
//! scope here; this performs the structural/cv-coherence checks the spec
//! calls acceptable and always reports that signature verification itself
//! was not performed.

use crate::tags::ArcCommonTags;
use dns_resolver::Resolver;
use forensics_types::headers::HeaderList;
use forensics_types::results::{ARCResult, AuthStatus};
use std::collections::BTreeMap;

const ARC_SEAL_HEADER: &str = "ARC-Seal";
const ARC_MESSAGE_SIGNATURE_HEADER: &str = "ARC-Message-Signature";
const ARC_AUTH_RESULTS_HEADER: &str = "ARC-Authentication-Results";

fn extract_instance(raw_value: &str) -> Option<u32> {
    raw_value.split(';').find_map(|part| {
        part.trim().strip_prefix("i=").and_then(|n| n.trim().parse().ok())
    })
}

struct ArcSet {
    seal: ArcCommonTags,
}

/// Verify the ARC chain present in `headers`.
pub async fn verify_arc(headers: &HeaderList, resolver: &dyn Resolver) -> ARCResult {
    let mut seals: BTreeMap<u32, Vec<ArcCommonTags>> = BTreeMap::new();
    let mut sigs: BTreeMap<u32, u32> = BTreeMap::new();
    let mut aars: BTreeMap<u32, u32> = BTreeMap::new();
    let mut issues = Vec::new();

    for hdr in headers.iter_named(ARC_SEAL_HEADER) {
        match ArcCommonTags::parse(&hdr.value) {
            Ok(tags) => seals.entry(tags.instance).or_default().push(tags),
            Err(err) => issues.push(format!("ARC-Seal parse error: {err}")),
        }
    }
    for hdr in headers.iter_named(ARC_MESSAGE_SIGNATURE_HEADER) {
        match ArcCommonTags::parse(&hdr.value) {
            Ok(tags) => *sigs.entry(tags.instance).or_insert(0) += 1,
            Err(err) => issues.push(format!("ARC-Message-Signature parse error: {err}")),
        }
    }
    for hdr in headers.iter_named(ARC_AUTH_RESULTS_HEADER) {
        match extract_instance(&hdr.value) {
            Some(instance) => *aars.entry(instance).or_insert(0) += 1,
            None => issues.push("ARC-Authentication-Results missing i=".to_string()),
        }
    }

    let max_instance = [seals.keys().max(), sigs.keys().max(), aars.keys().max()]
        .into_iter()
        .flatten()
        .max()
        .copied();

    let Some(n) = max_instance else {
        return ARCResult::none();
    };

    let mut structure_valid = true;
    let mut arc_sets: BTreeMap<u32, ArcSet> = BTreeMap::new();

    for instance in 1..=n {
        let seal_group = seals.get(&instance);
        let has_sig = sigs.contains_key(&instance);
        let has_aar = aars.contains_key(&instance);

        match seal_group {
            Some(group) if group.len() == 1 && has_sig && has_aar => {
                arc_sets.insert(instance, ArcSet { seal: group[0].clone() });
            }
            Some(group) if group.len() > 1 => {
                issues.push(format!("duplicate ARC instance {instance}"));
                structure_valid = false;
            }
            _ => {
                issues.push(format!("instance {instance} incomplete"));
                structure_valid = false;
            }
        }
    }

    let mut chain_broken = false;
    let mut seen_fail = false;
    for instance in 1..=n {
        let Some(set) = arc_sets.get(&instance) else { continue };
        let cv = set.seal.cv.as_deref().unwrap_or("");
        if instance == 1 && cv != "none" {
            issues.push("instance 1 seal must have cv=none".to_string());
            structure_valid = false;
        }
        if instance > 1 && cv != "pass" && cv != "fail" {
            issues.push(format!("instance {instance} seal has invalid cv={cv}"));
            structure_valid = false;
        }
        if cv == "fail" {
            seen_fail = true;
        } else if cv == "pass" && seen_fail {
            issues.push("broken ARC chain: cv=pass seen after cv=fail".to_string());
            chain_broken = true;
        }
    }

    for instance in 1..=n {
        if let Some(set) = arc_sets.get(&instance) {
            if crate::public_key::retrieve_public_key(resolver, &set.seal.d, &set.seal.s)
                .await
                .is_err()
            {
                issues.push(format!("could not resolve ARC-Seal key for instance {instance}"));
            }
        }
    }
    issues.push("ARC signature verification not performed".to_string());

    let any_fail_cv = arc_sets.values().any(|s| s.seal.cv.as_deref() == Some("fail"));
    let last_cv_ok = arc_sets
        .get(&n)
        .map(|set| {
            let cv = set.seal.cv.as_deref().unwrap_or("");
            if n == 1 {
                cv == "none"
            } else {
                cv == "pass"
            }
        })
        .unwrap_or(false);

    let status = if structure_valid && !chain_broken && !any_fail_cv && last_cv_ok {
        AuthStatus::Pass
    } else {
        AuthStatus::Fail
    };

    ARCResult {
        status,
        instance_count: n,
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dns_resolver::StaticResolver;
    use forensics_types::headers::EmailHeader;

    fn seal(instance: u32, cv: &str) -> EmailHeader {
        EmailHeader::new(
            ARC_SEAL_HEADER,
            format!("i={instance}; a=rsa-sha256; d=example.com; s=sel; cv={cv}; b=x"),
        )
    }

    fn sig(instance: u32) -> EmailHeader {
        EmailHeader::new(
            ARC_MESSAGE_SIGNATURE_HEADER,
            format!("i={instance}; a=rsa-sha256; d=example.com; s=sel; c=relaxed/relaxed; h=from; bh=x; b=y"),
        )
    }

    fn aar(instance: u32) -> EmailHeader {
        EmailHeader::new(ARC_AUTH_RESULTS_HEADER, format!("i={instance}; mx.example.com; spf=pass"))
    }

    #[tokio::test]
    async fn no_arc_headers_is_none() {
        let headers = HeaderList(vec![]);
        let resolver = StaticResolver::new();
        let result = verify_arc(&headers, &resolver).await;
        assert_eq!(result.status, AuthStatus::None);
    }

    #[tokio::test]
    async fn single_valid_instance_with_cv_none_passes_structurally() {
        let headers = HeaderList(vec![seal(1, "none"), sig(1), aar(1)]);
        let resolver = StaticResolver::new().with_txt("sel._domainkey.example.com", "v=DKIM1; p=abc");
        let result = verify_arc(&headers, &resolver).await;
        assert_eq!(result.status, AuthStatus::Pass);
        assert!(result.issues.iter().any(|i| i.contains("not performed")));
    }

    #[tokio::test]
    async fn missing_header_in_instance_fails() {
        let headers = HeaderList(vec![seal(1, "none"), aar(1)]);
        let resolver = StaticResolver::new();
        let result = verify_arc(&headers, &resolver).await;
        assert_eq!(result.status, AuthStatus::Fail);
        assert!(result.issues.iter().any(|i| i.contains("incomplete")));
    }

    #[tokio::test]
    async fn cv_pass_after_cv_fail_is_broken_chain() {
        let headers = HeaderList(vec![
            seal(1, "none"),
            sig(1),
            aar(1),
            seal(2, "fail"),
            sig(2),
            aar(2),
            seal(3, "pass"),
            sig(3),
            aar(3),
        ]);
        let resolver = StaticResolver::new();
        let result = verify_arc(&headers, &resolver).await;
        assert_eq!(result.status, AuthStatus::Fail);
        assert!(result.issues.iter().any(|i| i.contains("broken ARC chain")));
    }
}
