//! Fan-out orchestration (spec §4.1, §5): one task per analysis factor,
//! joined by a barrier before scoring. DKIM and ARC do DNS I/O and each get
//! an independent deadline; a cancelled factor returns its default-neutral
//! result with a "analysis timed out" issue rather than failing the whole
//! analysis. Everything else is pure-CPU and runs to completion.

use chrono::Utc;
use dns_resolver::Resolver;
use forensics_scoring::{score, ScoringInput};
use forensics_types::request::AnalysisRequest;
use forensics_types::results::{ARCResult, AnalysisResult, AuthStatus, DKIMResult};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub const DEFAULT_FACTOR_DEADLINE: Duration = Duration::from_secs(5);

async fn with_deadline<T>(deadline: Duration, timed_out: T, fut: impl std::future::Future<Output = T>) -> T {
    tokio::time::timeout(deadline, fut).await.unwrap_or(timed_out)
}

fn timed_out_dkim() -> DKIMResult {
    DKIMResult {
        status: AuthStatus::Temperror,
        issues: vec!["analysis timed out".to_string()],
        ..DKIMResult::none()
    }
}

fn timed_out_arc() -> ARCResult {
    ARCResult {
        status: AuthStatus::Temperror,
        issues: vec!["analysis timed out".to_string()],
        ..ARCResult::none()
    }
}

fn from_header_domain(request: &AnalysisRequest) -> String {
    request
        .headers
        .last("From")
        .and_then(|h| h.value.rsplit_once('@'))
        .map(|(_, domain)| domain.trim_end_matches('>').trim().to_string())
        .unwrap_or_default()
}

async fn run(request: AnalysisRequest, resolver: Arc<dyn Resolver>, with_auth: bool) -> AnalysisResult {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("analyze", %request_id, quick = !with_auth);
    let _enter = span.enter();

    let heuristics = forensics_heuristics::analyze(&request);
    let domain = forensics_confusables::analyze_domain(&from_header_domain(&request));

    let (dkim, arc) = if with_auth {
        let headers = request.headers.clone();
        let body = request.body.clone();
        let dkim_resolver = resolver.clone();
        let dkim_task = tokio::spawn(async move {
            with_deadline(
                DEFAULT_FACTOR_DEADLINE,
                timed_out_dkim(),
                forensics_dkim::verify_dkim(&headers, &body, dkim_resolver.as_ref()),
            )
            .await
        });

        let headers = request.headers.clone();
        let arc_resolver = resolver.clone();
        let arc_task = tokio::spawn(async move {
            with_deadline(
                DEFAULT_FACTOR_DEADLINE,
                timed_out_arc(),
                forensics_dkim::verify_arc(&headers, arc_resolver.as_ref()),
            )
            .await
        });

        let (dkim, arc) = tokio::join!(dkim_task, arc_task);
        (
            Some(dkim.unwrap_or_else(|err| {
                tracing::warn!(%err, "dkim factor task panicked");
                timed_out_dkim()
            })),
            Some(arc.unwrap_or_else(|err| {
                tracing::warn!(%err, "arc factor task panicked");
                timed_out_arc()
            })),
        )
    } else {
        (None, None)
    };

    let neutral_dkim = DKIMResult::none();
    let scoring_dkim = dkim.as_ref().unwrap_or(&neutral_dkim);

    let scoring_input = ScoringInput {
        auth_results: &request.auth_results,
        dkim: scoring_dkim,
        domain: &domain,
        links: &heuristics.links,
        attachments: &heuristics.attachments,
        bec: &heuristics.bec,
        tls: &heuristics.tls,
        header_consistency: &heuristics.header_consistency,
    };
    let score_result = score(&scoring_input);

    AnalysisResult {
        dkim,
        arc,
        tls: heuristics.tls,
        links: heuristics.links,
        attachments: heuristics.attachments,
        bec: heuristics.bec,
        domain,
        header_consistency: heuristics.header_consistency,
        score: score_result,
        analyzed_at: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        request_id,
    }
}

pub async fn analyze_full(request: AnalysisRequest, resolver: Arc<dyn Resolver>) -> AnalysisResult {
    run(request, resolver, true).await
}

pub async fn analyze_quick(request: AnalysisRequest, resolver: Arc<dyn Resolver>) -> AnalysisResult {
    run(request, resolver, false).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use dns_resolver::StaticResolver;
    use forensics_types::headers::{EmailHeader, HeaderList};

    fn sample_request() -> AnalysisRequest {
        AnalysisRequest {
            headers: HeaderList::new(vec![EmailHeader::new("From", "person@example.com")]),
            raw_headers: None,
            body: b"hello\r\n".to_vec(),
            subject: "hi".to_string(),
            html: None,
            text: Some("hello there".to_string()),
            attachments: vec![],
            auth_results: Default::default(),
        }
    }

    #[tokio::test]
    async fn quick_analysis_skips_dkim_and_arc() {
        let resolver: Arc<dyn Resolver> = Arc::new(StaticResolver::new());
        let result = analyze_quick(sample_request(), resolver).await;
        assert!(result.dkim.is_none());
        assert!(result.arc.is_none());
    }

    #[tokio::test]
    async fn full_analysis_reports_dkim_none_when_header_absent() {
        let resolver: Arc<dyn Resolver> = Arc::new(StaticResolver::new());
        let result = analyze_full(sample_request(), resolver).await;
        assert_eq!(result.dkim.unwrap().status, AuthStatus::None);
        assert_eq!(result.arc.unwrap().status, AuthStatus::None);
    }

    #[tokio::test]
    async fn result_score_is_within_bounds() {
        let resolver: Arc<dyn Resolver> = Arc::new(StaticResolver::new());
        let result = analyze_full(sample_request(), resolver).await;
        assert!(result.score.score <= 100);
    }
}
