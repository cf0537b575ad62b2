//! RFC 6376 §6.1.2 public key retrieval.

use crate::errors::DKIMError;
use base64::Engine;
use dns_resolver::Resolver;
use rsa::{pkcs1, pkcs8, RsaPublicKey};
use std::collections::HashMap;

const RSA_KEY_TYPE: &str = "rsa";

/// Fetch and parse the DKIM public key TXT record for `selector._domainkey.domain`.
pub async fn retrieve_public_key(
    resolver: &dyn Resolver,
    domain: &str,
    selector: &str,
) -> Result<RsaPublicKey, DKIMError> {
    let name = format!("{selector}._domainkey.{domain}");
    let records = resolver.resolve_txt(&name).await?;
    let txt = records.first().ok_or(DKIMError::NoKeyForSignature)?;

    let tags = crate::tags::parse_tag_list(txt)?;
    let tags: HashMap<String, String> = tags.into_iter().collect();

    if let Some(v) = tags.get("v") {
        if v != "DKIM1" {
            return Err(DKIMError::KeyIncompatibleVersion(v.clone()));
        }
    }

    let key_type = tags.get("k").cloned().unwrap_or_else(|| RSA_KEY_TYPE.to_string());
    if key_type != RSA_KEY_TYPE {
        return Err(DKIMError::InappropriateKeyAlgorithm(key_type));
    }

    let p = tags.get("p").ok_or(DKIMError::NoKeyForSignature)?;
    if p.is_empty() {
        return Err(DKIMError::KeyRevoked);
    }

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(p)
        .map_err(|err| DKIMError::KeySyntaxError(err.to_string()))?;

    pkcs8::DecodePublicKey::from_public_key_der(&bytes)
        .or_else(|_| pkcs1::DecodeRsaPublicKey::from_pkcs1_der(&bytes))
        .map_err(|err| DKIMError::KeySyntaxError(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dns_resolver::StaticResolver;

    const TEST_KEY: &str = "v=DKIM1; k=rsa; p=MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEA6gmVDBSBJ0l1/33uAF0gwIsrjQV6nnYjL9DMX6+ez4NNJ2um0InYy128Rd+OlIhmdSld6g3tj3O6R+BwsYsQgU8RWE8VJaRybvPw2P3Asgms4uPrFWHSFiWMPH0P9i/oPwnUO9jZKHiz4+MzFC3bG8BacX7YIxCuWnDU8XNmNsRaLmrv9CHX4/3GHyoHSmDA1ETtyz9JHRCOC8ho8C7b4f2Auwedlau9Lid9LGBhozhgRFhrFwFMe93y34MO1clPbY6HwxpudKWBkMQCTlmXVRnkKxHlJ+fYCyC2jjpCIbGWj2oLxBtFOASWMESR4biW0ph2bsZXslcUSPMTVTkFxQIDAQAB";

    #[tokio::test]
    async fn retrieves_and_parses_rsa_key() {
        let resolver = StaticResolver::new().with_txt("dkim._domainkey.example.com", TEST_KEY);
        retrieve_public_key(&resolver, "example.com", "dkim").await.unwrap();
    }

    #[tokio::test]
    async fn empty_p_is_key_revoked() {
        let resolver = StaticResolver::new().with_txt("dkim._domainkey.example.com", "v=DKIM1; p=");
        let err = retrieve_public_key(&resolver, "example.com", "dkim").await.unwrap_err();
        assert_eq!(err, DKIMError::KeyRevoked);
    }

    #[tokio::test]
    async fn incompatible_version_is_rejected() {
        let resolver = StaticResolver::new().with_txt("dkim._domainkey.example.com", "v=DKIM6; p=abc");
        let err = retrieve_public_key(&resolver, "example.com", "dkim").await.unwrap_err();
        assert_eq!(err, DKIMError::KeyIncompatibleVersion("DKIM6".to_string()));
    }

    #[tokio::test]
    async fn missing_record_is_no_key_for_signature() {
        let resolver = StaticResolver::new();
        let err = retrieve_public_key(&resolver, "example.com", "dkim").await.unwrap_err();
        assert_eq!(err, DKIMError::NoKeyForSignature);
    }
}
