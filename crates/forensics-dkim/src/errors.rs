/// DKIM/ARC error status, used to decide whether a failure maps to
/// `permerror` or `temperror` (spec §4.2).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Status {
    Permfail,
    Tempfail,
}

quick_error::quick_error! {
    #[derive(Debug, PartialEq, Clone)]
    pub enum DKIMError {
        MissingTag(name: String) {
            display("missing required tag: {}", name)
        }
        TagSyntaxError(value: String) {
            display("tag syntax error: {}", value)
        }
        UnsupportedAlgorithm(value: String) {
            display("unsupported signature algorithm: {}", value)
        }
        UnsupportedCanonicalization(value: String) {
            display("unsupported canonicalization: {}", value)
        }
        HeaderNotSigned(name: String) {
            display("required header not present for signing: {}", name)
        }
        SignatureExpired {
            display("signature expired")
        }
        KeyUnavailable(err: String) {
            display("key unavailable: {}", err)
        }
        NoKeyForSignature {
            display("no key found for signature")
        }
        KeyRevoked {
            display("public key revoked (empty p=)")
        }
        KeyIncompatibleVersion(v: String) {
            display("key record has incompatible version: {}", v)
        }
        KeySyntaxError(err: String) {
            display("key syntax error: {}", err)
        }
        InappropriateKeyAlgorithm(value: String) {
            display("inappropriate key algorithm: {}", value)
        }
        BodyHashMismatch {
            display("body hash did not verify")
        }
        SignatureDidNotVerify {
            display("signature did not verify")
        }
        InvalidARCInstance(i: String) {
            display("invalid ARC instance: {}", i)
        }
        MissingARCInstance(i: u32) {
            display("ARC instance {} incomplete", i)
        }
        DuplicateARCInstance(i: u32) {
            display("duplicate ARC instance {}", i)
        }
        BrokenChain {
            display("broken ARC chain: cv=pass seen after cv=fail")
        }
        DnsError(err: String) {
            display("DNS lookup failed: {}", err)
        }
    }
}

impl DKIMError {
    pub fn status(&self) -> Status {
        use DKIMError::*;
        match self {
            KeyUnavailable(_) | DnsError(_) | NoKeyForSignature => Status::Tempfail,
            _ => Status::Permfail,
        }
    }
}

impl From<dns_resolver::DnsError> for DKIMError {
    fn from(err: dns_resolver::DnsError) -> Self {
        match err {
            dns_resolver::DnsError::NoRecords => DKIMError::NoKeyForSignature,
            other => DKIMError::DnsError(other.to_string()),
        }
    }
}
