use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Risk ordering shared by the link, attachment and domain analyzers.
/// `Ord` is derived so "maximum risk across checks wins" (§4.5/§4.6) can be
/// expressed as `checks.map(..).max()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Risk {
    Safe,
    Suspicious,
    Dangerous,
}

impl Risk {
    pub fn as_str(&self) -> &'static str {
        match self {
            Risk::Safe => "safe",
            Risk::Suspicious => "suspicious",
            Risk::Dangerous => "dangerous",
        }
    }
}

impl Default for Risk {
    fn default() -> Self {
        Risk::Safe
    }
}

/// §4.2 DKIM verification status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthStatus {
    None,
    Pass,
    Fail,
    Permerror,
    Temperror,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DKIMResult {
    pub status: AuthStatus,
    pub domain: Option<String>,
    pub selector: Option<String>,
    pub algorithm: Option<String>,
    pub key_size: Option<u32>,
    pub body_hash_valid: Option<bool>,
    pub signature_valid: Option<bool>,
    pub issues: Vec<String>,
}

impl DKIMResult {
    pub fn none() -> Self {
        Self {
            status: AuthStatus::None,
            domain: None,
            selector: None,
            algorithm: None,
            key_size: None,
            body_hash_valid: None,
            signature_valid: None,
            issues: vec![],
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ARCResult {
    pub status: AuthStatus,
    pub instance_count: u32,
    pub issues: Vec<String>,
}

impl ARCResult {
    pub fn none() -> Self {
        Self {
            status: AuthStatus::None,
            instance_count: 0,
            issues: vec![],
        }
    }
}

/// §4.4 TLS path reconstruction.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TLSHop {
    pub from: Option<String>,
    pub by: Option<String>,
    pub timestamp: Option<String>,
    pub protocol: Option<String>,
    pub encrypted: bool,
    pub tls_version: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TLSResult {
    pub risk: Risk,
    pub hops: Vec<TLSHop>,
    pub issues: Vec<String>,
}

/// §4.5 link analysis.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LinkResult {
    pub url: String,
    pub host: Option<String>,
    pub risk: Risk,
    pub checks: Vec<String>,
    pub issues: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LinkAnalysisResult {
    pub links: Vec<LinkResult>,
}

/// §4.6 attachment analysis.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttachmentResult {
    pub filename: String,
    pub risk: Risk,
    pub checks: Vec<String>,
    pub issues: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AttachmentAnalysisResult {
    pub attachments: Vec<AttachmentResult>,
}

/// §4.7 BEC detector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BECIndicator {
    pub name: String,
    pub category: String,
    pub severity: Severity,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BECResult {
    pub indicators: Vec<BECIndicator>,
    pub composite: Vec<String>,
}

impl BECResult {
    pub fn high_count(&self) -> usize {
        self.indicators
            .iter()
            .filter(|i| i.severity == Severity::High)
            .count()
    }

    pub fn medium_count(&self) -> usize {
        self.indicators
            .iter()
            .filter(|i| i.severity == Severity::Medium)
            .count()
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.indicators.iter().any(|i| i.category == category)
    }
}

/// §4.8 confusables / domain analysis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusableReplacement {
    pub original: char,
    pub position: usize,
    pub normalized: char,
    pub script: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainResult {
    pub domain: String,
    pub normalized: String,
    pub risk: Risk,
    pub matched_domain: Option<String>,
    pub similarity: Option<f64>,
    pub techniques: Vec<String>,
    pub replacements: Vec<ConfusableReplacement>,
    pub is_idn: bool,
    pub punycode: Option<String>,
}

/// §4.9 header consistency.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderConsistencyResult {
    pub return_path_mismatch: bool,
    pub reply_to_mismatch: bool,
    pub date_valid: bool,
    pub message_id_valid: bool,
    pub issues: Vec<String>,
}

/// §4.10 scorer output.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SecurityScore {
    pub score: u8,
    pub grade: String,
    pub verdict: String,
    pub factors: Vec<ScoreFactor>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScoreFactor {
    pub name: String,
    pub max: u8,
    pub awarded: u8,
    pub notes: Vec<String>,
}

/// Full analysis response: all eight factors plus the aggregate score.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub dkim: Option<DKIMResult>,
    pub arc: Option<ARCResult>,
    pub tls: TLSResult,
    pub links: LinkAnalysisResult,
    pub attachments: AttachmentAnalysisResult,
    pub bec: BECResult,
    pub domain: DomainResult,
    pub header_consistency: HeaderConsistencyResult,
    pub score: SecurityScore,
    pub analyzed_at: DateTime<Utc>,
    pub version: String,
    pub request_id: uuid::Uuid,
}
