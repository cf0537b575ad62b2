//! Heuristic content analyzers: TLS path (§4.4), links (§4.5), attachments
//! (§4.6), BEC phrases (§4.7), and header consistency (§4.9).

pub mod attachment;
pub mod bec;
pub mod header_consistency;
pub mod link;
pub mod tls;

use forensics_types::request::AnalysisRequest;
use forensics_types::results::{
    AttachmentAnalysisResult, BECResult, HeaderConsistencyResult, LinkAnalysisResult, TLSResult,
};

pub use attachment::analyze_attachments;
pub use bec::detect_bec;
pub use header_consistency::analyze_header_consistency;
pub use link::analyze_links;
pub use tls::analyze_tls;

/// Bundle of every heuristic result an [`AnalysisRequest`] feeds.
pub struct HeuristicsResult {
    pub tls: TLSResult,
    pub links: LinkAnalysisResult,
    pub attachments: AttachmentAnalysisResult,
    pub bec: BECResult,
    pub header_consistency: HeaderConsistencyResult,
}

/// Run every heuristic analyzer over a single request.
pub fn analyze(request: &AnalysisRequest) -> HeuristicsResult {
    let received: Vec<String> = request
        .headers
        .iter_named("Received")
        .map(|h| h.value.clone())
        .collect();

    HeuristicsResult {
        tls: analyze_tls(&received),
        links: analyze_links(request.html.as_deref(), request.text.as_deref()),
        attachments: analyze_attachments(&request.attachments),
        bec: detect_bec(&request.bec_corpus()),
        header_consistency: analyze_header_consistency(&request.headers),
    }
}
