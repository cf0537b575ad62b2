//! RFC 6376 DKIM verification orchestration (spec §4.2).

use crate::canonicalization::Canon;
use crate::errors::{DKIMError, Status};
use crate::hash::{build_signature_input, compute_body_hash, HashAlgo};
use crate::tags::{empty_b_tag, DKIMTags};
use base64::Engine;
use dns_resolver::Resolver;
use forensics_types::headers::HeaderList;
use forensics_types::results::{AuthStatus, DKIMResult};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Sign, RsaPublicKey};

const DKIM_SIGNATURE_HEADER: &str = "DKIM-Signature";

fn error_result(err: DKIMError, domain: Option<String>, selector: Option<String>) -> DKIMResult {
    let status = match err.status() {
        Status::Permfail => AuthStatus::Permerror,
        Status::Tempfail => AuthStatus::Temperror,
    };
    DKIMResult {
        status,
        domain,
        selector,
        algorithm: None,
        key_size: None,
        body_hash_valid: None,
        signature_valid: None,
        issues: vec![err.to_string()],
    }
}

/// Verify the first `DKIM-Signature` header in `headers` against `body`.
pub async fn verify_dkim(headers: &HeaderList, body: &[u8], resolver: &dyn Resolver) -> DKIMResult {
    let Some(sig_header) = headers.first(DKIM_SIGNATURE_HEADER) else {
        return DKIMResult::none();
    };

    let tags = match DKIMTags::parse(&sig_header.value) {
        Ok(t) => t,
        Err(err) => return error_result(err, None, None),
    };

    let (key_algo, hash_name) = match tags.algorithm() {
        Ok(pair) => pair,
        Err(err) => return error_result(err, Some(tags.d.clone()), Some(tags.s.clone())),
    };

    if key_algo == "ed25519" {
        return error_result(
            DKIMError::UnsupportedAlgorithm("ed25519-sha256 not supported".to_string()),
            Some(tags.d.clone()),
            Some(tags.s.clone()),
        );
    }
    if key_algo != "rsa" {
        return error_result(
            DKIMError::UnsupportedAlgorithm(tags.a.clone()),
            Some(tags.d.clone()),
            Some(tags.s.clone()),
        );
    }

    let mut issues = Vec::new();
    if hash_name == "sha1" {
        issues.push("weak hash algorithm (rsa-sha1)".to_string());
    }

    let hash_algo = match HashAlgo::parse(hash_name) {
        Ok(a) => a,
        Err(err) => return error_result(err, Some(tags.d.clone()), Some(tags.s.clone())),
    };

    if let Some(x) = tags.x {
        let now = chrono::Utc::now().timestamp();
        if x < now {
            let mut result = error_result(
                DKIMError::SignatureExpired,
                Some(tags.d.clone()),
                Some(tags.s.clone()),
            );
            result.status = AuthStatus::Fail;
            return result;
        }
    }

    let (header_canon_name, body_canon_name) = tags.canon_names();
    let header_canon = Canon::parse(header_canon_name);
    let body_canon = Canon::parse(body_canon_name);

    let public_key = match crate::public_key::retrieve_public_key(resolver, &tags.d, &tags.s).await {
        Ok(key) => key,
        Err(err) => return error_result(err, Some(tags.d.clone()), Some(tags.s.clone())),
    };
    let key_size = (public_key.n().bits()) as u32;

    let computed_bh = compute_body_hash(body, body_canon, tags.l, &hash_algo);
    let body_hash_valid = computed_bh == tags.bh;
    if !body_hash_valid {
        issues.push("body hash did not match bh=".to_string());
    }

    let blanked = empty_b_tag(&sig_header.value);
    let signature_input = build_signature_input(&tags.h, headers, DKIM_SIGNATURE_HEADER, &blanked, header_canon);

    let signature = match base64::engine::general_purpose::STANDARD.decode(&tags.b) {
        Ok(sig) => sig,
        Err(err) => {
            return error_result(
                DKIMError::KeySyntaxError(format!("invalid b= base64: {err}")),
                Some(tags.d.clone()),
                Some(tags.s.clone()),
            )
        }
    };

    let signature_valid = verify_signature(&public_key, &hash_algo, &signature_input, &signature);
    if !signature_valid {
        issues.push("signature did not verify".to_string());
    }

    let status = if body_hash_valid && signature_valid {
        AuthStatus::Pass
    } else {
        AuthStatus::Fail
    };

    DKIMResult {
        status,
        domain: Some(tags.d),
        selector: Some(tags.s),
        algorithm: Some(tags.a),
        key_size: Some(key_size),
        body_hash_valid: Some(body_hash_valid),
        signature_valid: Some(signature_valid),
        issues,
    }
}

fn verify_signature(key: &RsaPublicKey, hash_algo: &HashAlgo, input: &[u8], signature: &[u8]) -> bool {
    match hash_algo {
        HashAlgo::Sha1 => {
            use sha1::Digest;
            let digest = sha1::Sha1::digest(input);
            key.verify(Pkcs1v15Sign::new::<sha1::Sha1>(), &digest, signature).is_ok()
        }
        HashAlgo::Sha256 => {
            use sha2::Digest;
            let digest = sha2::Sha256::digest(input);
            key.verify(Pkcs1v15Sign::new::<sha2::Sha256>(), &digest, signature).is_ok()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dns_resolver::StaticResolver;
    use forensics_types::headers::EmailHeader;

    #[tokio::test]
    async fn missing_signature_header_is_none() {
        let headers = HeaderList(vec![EmailHeader::new("From", "a@example.com")]);
        let resolver = StaticResolver::new();
        let result = verify_dkim(&headers, b"body", &resolver).await;
        assert_eq!(result.status, AuthStatus::None);
    }

    #[tokio::test]
    async fn malformed_signature_is_permerror() {
        let headers = HeaderList(vec![EmailHeader::new(
            DKIM_SIGNATURE_HEADER,
            "v=1; a=rsa-sha256; d=example.com; s=sel",
        )]);
        let resolver = StaticResolver::new();
        let result = verify_dkim(&headers, b"body", &resolver).await;
        assert_eq!(result.status, AuthStatus::Permerror);
    }

    #[tokio::test]
    async fn ed25519_is_temperror() {
        let headers = HeaderList(vec![EmailHeader::new(
            DKIM_SIGNATURE_HEADER,
            "v=1; a=ed25519-sha256; d=example.com; s=sel; h=from; bh=x; b=y",
        )]);
        let resolver = StaticResolver::new();
        let result = verify_dkim(&headers, b"body", &resolver).await;
        assert_eq!(result.status, AuthStatus::Temperror);
    }

    #[tokio::test]
    async fn no_key_published_is_temperror() {
        let headers = HeaderList(vec![EmailHeader::new(
            DKIM_SIGNATURE_HEADER,
            "v=1; a=rsa-sha256; d=example.com; s=sel; h=from; bh=x; b=y",
        )]);
        let resolver = StaticResolver::new();
        let result = verify_dkim(&headers, b"body", &resolver).await;
        assert_eq!(result.status, AuthStatus::Temperror);
    }

    #[tokio::test]
    async fn revoked_key_is_permerror() {
        let headers = HeaderList(vec![EmailHeader::new(
            DKIM_SIGNATURE_HEADER,
            "v=1; a=rsa-sha256; d=example.com; s=sel; h=from; bh=x; b=y",
        )]);
        let resolver = StaticResolver::new().with_txt("sel._domainkey.example.com", "v=DKIM1; p=");
        let result = verify_dkim(&headers, b"body", &resolver).await;
        assert_eq!(result.status, AuthStatus::Permerror);
        assert!(result.issues.iter().any(|i| i.contains("revoked")));
    }
}
