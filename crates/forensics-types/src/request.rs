use crate::headers::HeaderList;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata about an attachment. Attachment *contents* are never inspected
/// (virus scanning is an explicit Non-goal); only what the upstream MIME
/// parser reports about it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttachmentMeta {
    pub filename: String,
    pub mime: String,
    pub size: u64,
}

/// Input to a single analysis. Immutable for the duration of the analysis;
/// built by the caller (an external MIME-parsing collaborator) and
/// discarded once the response has been produced.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Ordered sequence of headers, in on-the-wire order. Must be non-empty.
    pub headers: HeaderList,
    /// Raw header block, if the caller has it handy (used only as a
    /// fallback when an individual header's raw value matters for
    /// canonicalization corner cases).
    #[serde(default)]
    pub raw_headers: Option<String>,
    /// Raw body bytes, CRLF-normalized or not; canonicalization handles
    /// both.
    #[serde(default, with = "body_b64")]
    pub body: Vec<u8>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub attachments: Vec<AttachmentMeta>,
    /// Precomputed `Authentication-Results`-derived verdicts, e.g.
    /// `{"spf": "pass", "dmarc": "fail"}`. Populated by the caller; this
    /// engine does not itself evaluate SPF/DMARC policy (Non-goal).
    #[serde(default)]
    pub auth_results: HashMap<String, String>,
}

impl AnalysisRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.headers.is_empty() {
            return Err("headers must not be empty".to_string());
        }
        Ok(())
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.last(name).map(|h| h.value.as_str())
    }

    /// Concatenation of subject, text, and a crude HTML-to-text strip of
    /// html, used as the BEC scan corpus (§4.7).
    pub fn bec_corpus(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.subject);
        out.push('\n');
        if let Some(text) = &self.text {
            out.push_str(text);
            out.push('\n');
        }
        if let Some(html) = &self.html {
            out.push_str(&strip_html_tags(html));
        }
        out
    }
}

/// Very small tag stripper: good enough to feed a regex corpus, not a
/// rendering engine. Drops `<script>`/`<style>` contents entirely.
pub fn strip_html_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    loop {
        match rest.find('<') {
            None => {
                out.push_str(rest);
                break;
            }
            Some(lt) => {
                out.push_str(&rest[..lt]);
                let after = &rest[lt..];
                let lower = after.to_ascii_lowercase();
                let (skip_tag, tag_end) = if lower.starts_with("<script") {
                    (Some("</script"), after.find('>'))
                } else if lower.starts_with("<style") {
                    (Some("</style"), after.find('>'))
                } else {
                    (None, after.find('>'))
                };
                let Some(tag_end) = tag_end else {
                    break;
                };
                if let Some(close) = skip_tag {
                    match lower.find(close) {
                        Some(close_pos) => {
                            let close_tag_end =
                                after[close_pos..].find('>').map(|e| close_pos + e + 1);
                            match close_tag_end {
                                Some(end) => rest = &after[end..],
                                None => break,
                            }
                        }
                        None => break,
                    }
                } else {
                    rest = &after[tag_end + 1..];
                }
            }
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

mod body_b64 {
    use data_encoding::BASE64;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        BASE64.encode(bytes).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        BASE64.decode(s.as_bytes()).map_err(serde::de::Error::custom)
    }
}
