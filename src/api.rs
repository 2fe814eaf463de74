//! # API Server Module
//!
//! ## Purpose
//! Thin REST transport exposing the orchestrator's tool surface as JSON
//! endpoints: search, single-article lookup, keyword article search, law
//! validity, statute structure, case-to-basis lookup, citation
//! verification, and cache invalidation.
//!
//! ## Key Features
//! - One route per tool operation, request/response as JSON
//! - CORS support for web frontends
//! - Structured error responses; a degraded retrieval path never surfaces
//!   as an HTTP error, only a genuine orchestrator failure does

use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use serde::{Deserialize, Serialize};

use crate::errors::SearchError;
use crate::{AppState, LawStatus, Result};

/// Application state for the API server
pub struct ApiServer {
    app_state: AppState,
}

#[derive(Debug, Deserialize)]
pub struct SearchLawsRequest {
    pub query: String,
    pub category: Option<String>,
    pub status: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct GetArticleRequest {
    pub law_title: String,
    pub article_number: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchArticleContentRequest {
    pub keywords: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct LawTitleRequest {
    pub law_title: String,
}

#[derive(Debug, Deserialize)]
pub struct GetLegalBasisRequest {
    pub case_description: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct BatchVerifyCitationsRequest {
    pub text: String,
}

/// Every tool-surface response is rendered markdown text, matched to what a
/// calling agent would render directly.
#[derive(Debug, Serialize)]
pub struct ToolResponse {
    pub result: String,
    pub query_time_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub components: HealthComponents,
}

#[derive(Debug, Serialize)]
pub struct HealthComponents {
    pub storage: String,
    pub vector_index: String,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_laws: u64,
    pub total_articles: u64,
    pub database_size_bytes: u64,
    pub vector_index_loaded: bool,
    pub vector_index_count: usize,
}

impl ApiServer {
    pub async fn new(app_state: AppState) -> Result<Self> {
        Ok(Self { app_state })
    }

    pub async fn run(self) -> Result<()> {
        let bind_addr = format!(
            "{}:{}",
            self.app_state.engine.config().server.host,
            self.app_state.engine.config().server.port
        );

        tracing::info!("starting API server on {}", bind_addr);

        let enable_cors = self.app_state.engine.config().server.enable_cors;

        let server = HttpServer::new(move || {
            let cors = if enable_cors {
                Cors::permissive()
            } else {
                Cors::default()
            };
            App::new()
                .app_data(web::Data::new(self.app_state.clone()))
                .wrap(cors)
                .route("/search-laws", web::post().to(search_laws_handler))
                .route("/get-article", web::post().to(get_article_handler))
                .route(
                    "/search-article-content",
                    web::post().to(search_article_content_handler),
                )
                .route("/check-law-validity", web::post().to(check_law_validity_handler))
                .route("/get-law-structure", web::post().to(get_law_structure_handler))
                .route("/get-legal-basis", web::post().to(get_legal_basis_handler))
                .route(
                    "/batch-verify-citations",
                    web::post().to(batch_verify_citations_handler),
                )
                .route("/admin/clear-caches", web::post().to(clear_caches_handler))
                .route("/health", web::get().to(health_handler))
                .route("/stats", web::get().to(stats_handler))
                .route("/", web::get().to(index_handler))
        })
        .bind(&bind_addr)
        .map_err(|e| SearchError::Internal {
            message: format!("failed to bind server to {bind_addr}: {e}"),
        })?
        .run();

        server.await.map_err(|e| SearchError::Internal {
            message: format!("server error: {e}"),
        })?;

        Ok(())
    }
}

fn tool_response(result: String, start: std::time::Instant) -> HttpResponse {
    HttpResponse::Ok().json(ToolResponse {
        result,
        query_time_ms: start.elapsed().as_millis() as u64,
    })
}

fn tool_error(e: SearchError) -> HttpResponse {
    tracing::error!(error = %e, category = e.category(), "tool operation failed");
    HttpResponse::InternalServerError().json(serde_json::json!({
        "error": e.category(),
        "message": e.to_string(),
    }))
}

async fn search_laws_handler(
    app_state: web::Data<AppState>,
    request: web::Json<SearchLawsRequest>,
) -> ActixResult<HttpResponse> {
    let start = std::time::Instant::now();
    let status = request.status.as_deref().and_then(LawStatus::parse);
    match app_state
        .engine
        .orchestrator()
        .search_laws(&request.query, request.category.clone(), status, request.limit)
        .await
    {
        Ok(result) => Ok(tool_response(result, start)),
        Err(e) => Ok(tool_error(e)),
    }
}

async fn get_article_handler(
    app_state: web::Data<AppState>,
    request: web::Json<GetArticleRequest>,
) -> ActixResult<HttpResponse> {
    let start = std::time::Instant::now();
    match app_state
        .engine
        .orchestrator()
        .get_article(&request.law_title, &request.article_number)
        .await
    {
        Ok(result) => Ok(tool_response(result, start)),
        Err(e) => Ok(tool_error(e)),
    }
}

async fn search_article_content_handler(
    app_state: web::Data<AppState>,
    request: web::Json<SearchArticleContentRequest>,
) -> ActixResult<HttpResponse> {
    let start = std::time::Instant::now();
    match app_state
        .engine
        .orchestrator()
        .search_article_content(&request.keywords, request.limit)
        .await
    {
        Ok(result) => Ok(tool_response(result, start)),
        Err(e) => Ok(tool_error(e)),
    }
}

async fn check_law_validity_handler(
    app_state: web::Data<AppState>,
    request: web::Json<LawTitleRequest>,
) -> ActixResult<HttpResponse> {
    let start = std::time::Instant::now();
    match app_state.engine.orchestrator().check_law_validity(&request.law_title) {
        Ok(result) => Ok(tool_response(result, start)),
        Err(e) => Ok(tool_error(e)),
    }
}

async fn get_law_structure_handler(
    app_state: web::Data<AppState>,
    request: web::Json<LawTitleRequest>,
) -> ActixResult<HttpResponse> {
    let start = std::time::Instant::now();
    match app_state.engine.orchestrator().get_law_structure(&request.law_title) {
        Ok(result) => Ok(tool_response(result, start)),
        Err(e) => Ok(tool_error(e)),
    }
}

async fn get_legal_basis_handler(
    app_state: web::Data<AppState>,
    request: web::Json<GetLegalBasisRequest>,
) -> ActixResult<HttpResponse> {
    let start = std::time::Instant::now();
    match app_state
        .engine
        .orchestrator()
        .get_legal_basis(&request.case_description, request.limit)
        .await
    {
        Ok(result) => Ok(tool_response(result, start)),
        Err(e) => Ok(tool_error(e)),
    }
}

async fn batch_verify_citations_handler(
    app_state: web::Data<AppState>,
    request: web::Json<BatchVerifyCitationsRequest>,
) -> ActixResult<HttpResponse> {
    let start = std::time::Instant::now();
    match app_state
        .engine
        .orchestrator()
        .batch_verify_citations(&request.text)
        .await
    {
        Ok(result) => Ok(tool_response(result, start)),
        Err(e) => Ok(tool_error(e)),
    }
}

async fn clear_caches_handler(app_state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    app_state.engine.clear_caches();
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "caches cleared" })))
}

async fn health_handler(app_state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let storage_status = match app_state.engine.storage().health_check() {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };
    let vector_status = if app_state.engine.vector_index().is_loaded() {
        "ready"
    } else {
        "loading"
    };

    let response = HealthResponse {
        status: if storage_status == "healthy" { "healthy".to_string() } else { "unhealthy".to_string() },
        version: env!("CARGO_PKG_VERSION").to_string(),
        components: HealthComponents {
            storage: storage_status.to_string(),
            vector_index: vector_status.to_string(),
        },
    };

    Ok(HttpResponse::Ok().json(response))
}

async fn stats_handler(app_state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let storage_stats = match app_state.engine.storage().stats() {
        Ok(stats) => stats,
        Err(e) => return Ok(tool_error(e)),
    };

    let response = StatsResponse {
        total_laws: storage_stats.total_laws,
        total_articles: storage_stats.total_articles,
        database_size_bytes: storage_stats.database_size_bytes,
        vector_index_loaded: app_state.engine.vector_index().is_loaded(),
        vector_index_count: app_state.engine.vector_index().load_count(),
    };

    Ok(HttpResponse::Ok().json(response))
}

async fn index_handler() -> ActixResult<HttpResponse> {
    let html = r#"
    <!DOCTYPE html>
    <html>
    <head>
        <title>Chinese Statutory Law Retrieval Engine</title>
        <style>
            body { font-family: Arial, sans-serif; margin: 40px; }
            .header { color: #2c3e50; }
            .endpoint { margin: 20px 0; padding: 15px; background: #f8f9fa; border-radius: 5px; }
            .method { font-weight: bold; color: #27ae60; }
        </style>
    </head>
    <body>
        <h1 class="header">Chinese Statutory Law Retrieval Engine</h1>
        <p>Hybrid retrieval and ranking over national laws, regulations, and judicial interpretations.</p>

        <h2>Available Endpoints</h2>

        <div class="endpoint"><span class="method">POST</span> /search-laws</div>
        <div class="endpoint"><span class="method">POST</span> /get-article</div>
        <div class="endpoint"><span class="method">POST</span> /search-article-content</div>
        <div class="endpoint"><span class="method">POST</span> /check-law-validity</div>
        <div class="endpoint"><span class="method">POST</span> /get-law-structure</div>
        <div class="endpoint"><span class="method">POST</span> /get-legal-basis</div>
        <div class="endpoint"><span class="method">POST</span> /batch-verify-citations</div>
        <div class="endpoint"><span class="method">POST</span> /admin/clear-caches</div>
        <div class="endpoint"><span class="method">GET</span> /health</div>
        <div class="endpoint"><span class="method">GET</span> /stats</div>

        <h2>Example Request</h2>
        <pre>{
  "query": "合同法",
  "limit": 10
}</pre>
    </body>
    </html>
    "#;

    Ok(HttpResponse::Ok().content_type("text/html").body(html))
}
