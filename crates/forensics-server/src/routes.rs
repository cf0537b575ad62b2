//! Route table and handlers (spec §6). Each handler is a thin adapter
//! between the wire shapes in `dto` and the pure analysis crates; the
//! heavy lifting lives in `forensics-dkim`, `forensics-heuristics`,
//! `forensics-confusables`, `forensics-scoring`, and `forensics-audit`.

use crate::auth::require_admin;
use crate::dto::*;
use crate::errors::AppError;
use crate::orchestrator;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use dns_resolver::RecordType;
use forensics_types::audit::ListFilters;
use forensics_types::request::AnalysisRequest;
use forensics_types::ApiError;
use std::collections::HashMap;
use std::str::FromStr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/records", get(admin_list))
        .route("/records/{id}/download", get(admin_download_record))
        .route("/records/{id}/presign", post(admin_presign_record))
        .route("/records/{id}/verify", post(admin_verify_record))
        .route("/summary", get(admin_summary))
        .route("/domains", get(admin_domains))
        .route("/stats", get(admin_stats))
        .route("/export", get(admin_export))
        .route("/bulk-delete", post(admin_bulk_delete))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/api/verify", post(verify))
        .route("/api/store", post(store))
        .route("/api/analyze", post(analyze_full_handler))
        .route("/api/analyze/quick", post(analyze_quick_handler))
        .route("/api/security/dkim", post(security_dkim))
        .route("/api/security/arc", post(security_arc))
        .route("/api/security/confusables", post(security_confusables))
        .route("/api/dns/{rrtype}/{name}", get(dns_passthrough))
        .route("/api/health", get(health))
        .route("/api/download/{token}", get(download_token))
        .route("/api/export/prepare", post(export_prepare))
        .route("/api/export/download/{token}", get(export_download))
        .nest("/api/admin", admin)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn lookup_txt_prefixed(state: &AppState, name: &str, prefix: &str) -> RecordLookup {
    match state.resolver.resolve_txt(name).await {
        Ok(records) => match records.into_iter().find(|r| r.starts_with(prefix)) {
            Some(record) => RecordLookup {
                found: true,
                record: Some(record),
            },
            None => RecordLookup {
                found: false,
                record: None,
            },
        },
        Err(_) => RecordLookup {
            found: false,
            record: None,
        },
    }
}

async fn verify(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, AppError> {
    if req.domain.trim().is_empty() {
        return Err(ApiError::BadRequest("domain must not be empty".to_string()).into());
    }

    let spf = lookup_txt_prefixed(&state, &req.domain, "v=spf1").await;
    let dmarc = lookup_txt_prefixed(&state, &format!("_dmarc.{}", req.domain), "v=DMARC1").await;
    let dkim = match &req.dkim_selector {
        Some(selector) => Some(
            lookup_txt_prefixed(&state, &format!("{selector}._domainkey.{}", req.domain), "v=DKIM1").await,
        ),
        None => None,
    };

    Ok(Json(VerifyResponse {
        domain: req.domain,
        spf,
        dmarc,
        dkim,
    }))
}

async fn store(
    State(state): State<AppState>,
    Json(req): Json<StoreRequest>,
) -> Result<Json<forensics_types::audit::StoreResult>, AppError> {
    let result = state.audit.store(&req.eml_base64, req.metadata).await.map_err(|err| {
        tracing::error!(%err, "failed to store eml record");
        err
    })?;
    Ok(Json(result))
}

async fn analyze_full_handler(
    State(state): State<AppState>,
    Json(req): Json<AnalysisRequest>,
) -> Result<Json<forensics_types::results::AnalysisResult>, AppError> {
    req.validate().map_err(ApiError::BadRequest)?;
    let result = orchestrator::analyze_full(req, state.resolver.clone()).await;
    Ok(Json(result))
}

async fn analyze_quick_handler(
    State(state): State<AppState>,
    Json(req): Json<AnalysisRequest>,
) -> Result<Json<forensics_types::results::AnalysisResult>, AppError> {
    req.validate().map_err(ApiError::BadRequest)?;
    let result = orchestrator::analyze_quick(req, state.resolver.clone()).await;
    Ok(Json(result))
}

async fn security_dkim(
    State(state): State<AppState>,
    Json(req): Json<SecurityDkimRequest>,
) -> Json<forensics_types::results::DKIMResult> {
    let result = forensics_dkim::verify_dkim(&req.headers, &req.body, state.resolver.as_ref()).await;
    Json(result)
}

async fn security_arc(
    State(state): State<AppState>,
    Json(req): Json<SecurityArcRequest>,
) -> Json<forensics_types::results::ARCResult> {
    let result = forensics_dkim::verify_arc(&req.headers, state.resolver.as_ref()).await;
    Json(result)
}

async fn security_confusables(Json(req): Json<ConfusablesRequest>) -> Json<ConfusablesResponse> {
    match req {
        ConfusablesRequest::One { domain } => {
            Json(ConfusablesResponse::One(forensics_confusables::analyze_domain(&domain)))
        }
        ConfusablesRequest::Many { domains } => Json(ConfusablesResponse::Many(
            domains.iter().map(|d| forensics_confusables::analyze_domain(d)).collect(),
        )),
    }
}

async fn dns_passthrough(
    State(state): State<AppState>,
    Path((rrtype, name)): Path<(String, String)>,
) -> Result<Json<Vec<dns_resolver::DnsRecord>>, AppError> {
    let rrtype = RecordType::from_str(&rrtype).map_err(|err| ApiError::BadRequest(err.to_string()))?;
    let records = state.resolver.resolve(&name, rrtype).await.map_err(|err| {
        let message = err.to_string();
        match err {
            dns_resolver::DnsError::NoRecords => ApiError::NotFound(message),
            dns_resolver::DnsError::InvalidName(_) => ApiError::BadRequest(message),
            dns_resolver::DnsError::QueryFailed(_) | dns_resolver::DnsError::Timeout => {
                ApiError::Internal(message)
            }
        }
    })?;
    Ok(Json(records))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}

/// Pages through the catalog until every record matching `filters` has been
/// collected. Accepted simplification for the admin-only aggregation
/// routes, which are low-traffic and never paginated client-side.
async fn fetch_all(state: &AppState, mut filters: ListFilters) -> Result<Vec<forensics_types::audit::EmlRecord>, AppError> {
    let mut all = Vec::new();
    let mut page = 1;
    filters.page_size = Some(ListFilters::MAX_PAGE_SIZE);
    loop {
        filters.page = Some(page);
        let result = state.audit.list(&filters).await?;
        let got = result.records.len();
        all.extend(result.records);
        if got < ListFilters::MAX_PAGE_SIZE as usize || (all.len() as u64) >= result.total {
            break;
        }
        page += 1;
    }
    Ok(all)
}

async fn admin_list(
    State(state): State<AppState>,
    Query(filters): Query<ListFilters>,
) -> Result<Json<forensics_types::audit::ListResult>, AppError> {
    let result = state.audit.list(&filters).await?;
    Ok(Json(result))
}

async fn admin_summary(State(state): State<AppState>, Query(filters): Query<ListFilters>) -> Result<Json<SummaryResponse>, AppError> {
    let records = fetch_all(&state, filters).await?;
    let oldest = records.iter().map(|r| r.stored_at).min();
    let newest = records.iter().map(|r| r.stored_at).max();
    Ok(Json(SummaryResponse {
        total_records: records.len() as u64,
        oldest,
        newest,
    }))
}

async fn admin_domains(State(state): State<AppState>, Query(filters): Query<ListFilters>) -> Result<Json<HashMap<String, u64>>, AppError> {
    let records = fetch_all(&state, filters).await?;
    let mut counts: HashMap<String, u64> = HashMap::new();
    for record in &records {
        let domain = record.from_domain.clone().unwrap_or_else(|| "unknown".to_string());
        *counts.entry(domain).or_insert(0) += 1;
    }
    Ok(Json(counts))
}

async fn admin_stats(State(state): State<AppState>, Query(filters): Query<ListFilters>) -> Result<Json<StatsResponse>, AppError> {
    let records = fetch_all(&state, filters).await?;
    let mut domains: HashMap<String, u64> = HashMap::new();
    for record in &records {
        let domain = record.from_domain.clone().unwrap_or_else(|| "unknown".to_string());
        *domains.entry(domain).or_insert(0) += 1;
    }
    Ok(Json(StatsResponse {
        total_records: records.len() as u64,
        domains,
    }))
}

async fn admin_export(State(state): State<AppState>, Query(filters): Query<ListFilters>) -> Result<Json<Vec<forensics_types::audit::EmlRecord>>, AppError> {
    let records = fetch_all(&state, filters).await?;
    Ok(Json(records))
}

async fn admin_bulk_delete(
    State(state): State<AppState>,
    Json(req): Json<BulkDeleteRequest>,
) -> Result<Json<BulkDeleteResponse>, AppError> {
    let mut deleted = 0;
    let mut failed = Vec::new();
    for id in req.ids {
        match state.audit.delete(&id).await {
            Ok(()) => deleted += 1,
            Err(err) => {
                tracing::warn!(%err, id = %id, "failed to delete record");
                failed.push(id);
            }
        }
    }
    Ok(Json(BulkDeleteResponse { deleted, failed }))
}

async fn admin_download_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let bytes = state
        .audit
        .fetch(&id)
        .await
        .map_err(|_| ApiError::NotFound(format!("no record {id}")))?;
    Ok((
        [(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{id}.eml\""),
        )],
        bytes,
    ))
}

async fn admin_presign_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PresignQuery>,
) -> Result<Json<forensics_types::audit::PresignResult>, AppError> {
    state
        .audit
        .presign(&id, query.expires)
        .map(Json)
        .ok_or_else(|| ApiError::BadRequest("expires must be positive".to_string()).into())
}

async fn admin_verify_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<forensics_types::audit::VerifyResult>, AppError> {
    let result = state.audit.verify(&id).await?;
    Ok(Json(result))
}

async fn download_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (id, bytes) = state
        .audit
        .download(&token)
        .await?
        .ok_or_else(|| ApiError::Forbidden("invalid or expired download token".to_string()))?;
    Ok((
        [(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{id}.eml\""),
        )],
        bytes,
    ))
}

async fn export_prepare(
    State(state): State<AppState>,
    Json(req): Json<ExportPrepareRequest>,
) -> Result<Json<forensics_types::audit::PresignResult>, AppError> {
    let result = state
        .audit
        .prepare_export(req.bytes, &req.content_type, &req.filename, req.expires)
        .await?
        .ok_or_else(|| ApiError::BadRequest("expires must be positive".to_string()))?;
    Ok(Json(result))
}

async fn export_download(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let export = state
        .audit
        .download_export(&token)
        .await?
        .ok_or_else(|| ApiError::Forbidden("invalid or expired export token".to_string()))?;
    Ok((
        [
            (header::CONTENT_TYPE, export.content_type),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export.filename),
            ),
        ],
        export.bytes,
    ))
}
