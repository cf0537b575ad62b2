use crate::errors::DKIMError;
use indexmap::IndexMap;

/// Tolerant `tag=value; tag=value; ...` splitter (RFC 6376 §3.2). Strips
/// all internal whitespace from every value, which is required for `b=`
/// and `bh=` (folded base64) and harmless for the rest.
pub fn parse_tag_list(input: &str) -> Result<IndexMap<String, String>, DKIMError> {
    let mut map = IndexMap::new();
    for part in input.split(';') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (name, value) = part
            .split_once('=')
            .ok_or_else(|| DKIMError::TagSyntaxError(part.to_string()))?;
        let name = name.trim().to_string();
        let value: String = value.chars().filter(|c| !c.is_whitespace()).collect();
        map.insert(name, value);
    }
    Ok(map)
}

#[derive(Clone, Debug, PartialEq)]
pub struct DKIMTags {
    pub v: String,
    pub a: String,
    pub b: String,
    pub bh: String,
    pub c: String,
    pub d: String,
    pub h: Vec<String>,
    pub s: String,
    pub l: Option<u64>,
    pub t: Option<i64>,
    pub x: Option<i64>,
    pub q: Option<String>,
}

fn require<'a>(map: &'a IndexMap<String, String>, tag: &str) -> Result<&'a str, DKIMError> {
    map.get(tag)
        .map(|s| s.as_str())
        .ok_or_else(|| DKIMError::MissingTag(tag.to_string()))
}

impl DKIMTags {
    pub fn parse(raw_value: &str) -> Result<Self, DKIMError> {
        let map = parse_tag_list(raw_value)?;
        let v = require(&map, "v")?.to_string();
        let a = require(&map, "a")?.to_string();
        let b = require(&map, "b")?.to_string();
        let bh = require(&map, "bh")?.to_string();
        let d = require(&map, "d")?.to_string();
        let s = require(&map, "s")?.to_string();
        let h_raw = require(&map, "h")?;
        let h = h_raw.split(':').map(|s| s.to_string()).collect();
        let c = map.get("c").cloned().unwrap_or_else(|| "simple/simple".to_string());
        let l = map.get("l").and_then(|v| v.parse().ok());
        let t = map.get("t").and_then(|v| v.parse().ok());
        let x = map.get("x").and_then(|v| v.parse().ok());
        let q = map.get("q").cloned();

        Ok(Self { v, a, b, bh, c, d, h, s, l, t, x, q })
    }

    /// Split `c=` into `(header, body)` canonicalization names, defaulting
    /// to `simple/simple` per RFC 6376 §3.5.
    pub fn canon_names(&self) -> (&str, &str) {
        match self.c.split_once('/') {
            Some((h, b)) => (h, b),
            None => (self.c.as_str(), "simple"),
        }
    }

    /// `(key algorithm, hash algorithm)` from `a=`, e.g. `rsa-sha256`.
    pub fn algorithm(&self) -> Result<(&str, &str), DKIMError> {
        self.a
            .split_once('-')
            .ok_or_else(|| DKIMError::UnsupportedAlgorithm(self.a.clone()))
    }
}

/// Return `raw_value` with the `b=` tag's value removed, leaving the `b=`
/// label and every other tag (including original fold whitespace) intact.
/// Used to build the signature input per RFC 6376 §3.5: the signature
/// header is hashed with its own signature value blanked out.
pub fn empty_b_tag(raw_value: &str) -> String {
    let mut out = String::with_capacity(raw_value.len());
    for (i, part) in raw_value.split(';').enumerate() {
        if i > 0 {
            out.push(';');
        }
        let trimmed_start = part.trim_start();
        let leading_ws_len = part.len() - trimmed_start.len();
        if let Some(rest) = trimmed_start.strip_prefix('b') {
            if let Some(rest) = rest.trim_start().strip_prefix('=') {
                let _ = rest;
                out.push_str(&part[..leading_ws_len]);
                out.push_str("b=");
                continue;
            }
        }
        out.push_str(part);
    }
    out
}

/// ARC tags share the DKIM signature tag set plus `i=` (instance) and, for
/// `ARC-Seal`, `cv=` (chain validation) instead of `bh=`/`h=`/`l=`.
#[derive(Clone, Debug, PartialEq)]
pub struct ArcCommonTags {
    pub instance: u32,
    pub a: String,
    pub b: String,
    pub d: String,
    pub s: String,
    pub c: String,
    pub cv: Option<String>,
    pub t: Option<i64>,
}

impl ArcCommonTags {
    pub fn parse(raw_value: &str) -> Result<Self, DKIMError> {
        let map = parse_tag_list(raw_value)?;
        let instance_raw = require(&map, "i")?;
        let instance: u32 = instance_raw
            .parse()
            .map_err(|_| DKIMError::InvalidARCInstance(instance_raw.to_string()))?;
        let a = require(&map, "a")?.to_string();
        let b = require(&map, "b")?.to_string();
        let d = require(&map, "d")?.to_string();
        let s = require(&map, "s")?.to_string();
        let c = map.get("c").cloned().unwrap_or_else(|| "simple/simple".to_string());
        let cv = map.get("cv").cloned();
        let t = map.get("t").and_then(|v| v.parse().ok());

        Ok(Self { instance, a, b, d, s, c, cv, t })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folded_base64_whitespace_is_stripped() {
        let tags = DKIMTags::parse(
            "v=1; a=rsa-sha256; d=example.com; s=sel; h=from:subject; bh=AAA\r\n BBB=; b=CCC\r\n DDD==",
        )
        .unwrap();
        assert_eq!(tags.bh, "AAABBB=");
        assert_eq!(tags.b, "CCCDDD==");
    }

    #[test]
    fn default_canon_is_simple_simple() {
        let tags = DKIMTags::parse("v=1; a=rsa-sha256; d=d; s=s; h=from; bh=x; b=y").unwrap();
        assert_eq!(tags.canon_names(), ("simple", "simple"));
    }

    #[test]
    fn missing_mandatory_tag_is_an_error() {
        let err = DKIMTags::parse("v=1; a=rsa-sha256; d=d; s=s; bh=x; b=y").unwrap_err();
        assert_eq!(err, DKIMError::MissingTag("h".to_string()));
    }

    #[test]
    fn empty_b_tag_blanks_only_the_signature_value() {
        let raw = "v=1; bh=XYZ; b=AAA\r\n BBB==";
        let blanked = empty_b_tag(raw);
        assert_eq!(blanked, "v=1; bh=XYZ; b=");
    }
}
