//! Web API Module
//!
//! Exposes RESTful endpoints for the company directory and resume store.
//! All endpoints return JSON (downloads excepted) and require no
//! authentication (prototype mode).

use crate::artifacts::ArtifactStore;
use crate::companies::{self, CompanyFields};
use crate::config::Config;
use crate::error::ApiError;
use crate::import;
use crate::lookup::ReferenceLookup;
use crate::mirror::CsvMirror;
use crate::resumes;
use crate::store::Store;
use actix_cors::Cors;
use actix_multipart::{Field, Multipart};
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use futures_util::TryStreamExt;
use serde::Serialize;
use std::sync::Arc;

// ============================================================
// APPLICATION STATE
// ============================================================

/// Shared application state; every handle is constructed once at startup and
/// injected, nothing is process-global.
pub struct AppState {
    pub store: Store,
    pub mirror: CsvMirror,
    pub artifacts: ArtifactStore,
    pub lookup: ReferenceLookup,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        Ok(Self {
            store: Store::open(&config.database_path)?,
            mirror: CsvMirror::new(config.mirror_path.clone()),
            artifacts: ArtifactStore::new(
                config.upload_dir.clone(),
                config.public_base_url.clone(),
            )?,
            lookup: ReferenceLookup::new(),
        })
    }
}

// ============================================================
// API RESPONSE ENVELOPE
// ============================================================

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

// ============================================================
// MULTIPART HELPERS
// ============================================================

async fn read_field_bytes(field: &mut Field) -> Result<Vec<u8>, ApiError> {
    let mut data = Vec::new();
    while let Some(chunk) = field.try_next().await? {
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

async fn read_field_string(field: &mut Field) -> Result<String, ApiError> {
    let bytes = read_field_bytes(field).await?;
    String::from_utf8(bytes)
        .map_err(|_| ApiError::Validation("form field is not valid UTF-8".to_string()))
}

/// The multipart shape shared by resume upload and update: two text fields
/// plus an optional file part.
struct ResumeForm {
    job_title: Option<String>,
    field: Option<String>,
    file: Option<(String, Vec<u8>)>,
}

async fn read_resume_form(payload: &mut Multipart) -> Result<ResumeForm, ApiError> {
    let mut form = ResumeForm {
        job_title: None,
        field: None,
        file: None,
    };

    while let Some(mut part) = payload.try_next().await? {
        let name = part.name().to_string();
        match name.as_str() {
            "job_title" => form.job_title = Some(read_field_string(&mut part).await?),
            "field" => form.field = Some(read_field_string(&mut part).await?),
            "file" => {
                let original = part
                    .content_disposition()
                    .get_filename()
                    .map(|s| s.to_string())
                    .ok_or_else(|| {
                        ApiError::Validation("file part is missing a filename".to_string())
                    })?;
                let bytes = read_field_bytes(&mut part).await?;
                form.file = Some((original, bytes));
            }
            _ => {
                // Unknown parts are drained and ignored.
                while part.try_next().await?.is_some() {}
            }
        }
    }

    Ok(form)
}

fn require(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value.ok_or_else(|| ApiError::Validation(format!("missing required field: {}", field)))
}

// ============================================================
// COMPANY HANDLERS
// ============================================================

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "Talent Registry API",
        "version": "0.1.0"
    }))
}

/// List companies, syncing the CSV mirror into the store first.
async fn list_companies(state: web::Data<Arc<AppState>>) -> Result<HttpResponse, ApiError> {
    let listed = companies::list_companies(&state.store, &state.mirror)?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(listed)))
}

async fn create_company(
    state: web::Data<Arc<AppState>>,
    req: web::Json<CompanyFields>,
) -> Result<HttpResponse, ApiError> {
    let created = companies::create_company(&state.store, req.into_inner())?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(created)))
}

async fn update_company(
    state: web::Data<Arc<AppState>>,
    path: web::Path<i64>,
    req: web::Json<CompanyFields>,
) -> Result<HttpResponse, ApiError> {
    let updated = companies::update_company(
        &state.store,
        &state.mirror,
        path.into_inner(),
        req.into_inner(),
    )?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(updated)))
}

async fn delete_company(
    state: web::Data<Arc<AppState>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let deleted = companies::delete_company(&state.store, &state.mirror, path.into_inner())?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(deleted)))
}

/// Bulk import: multipart upload of a CSV payload, merged by company name.
async fn import_companies(
    state: web::Data<Arc<AppState>>,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let mut outcome = None;

    while let Some(mut part) = payload.try_next().await? {
        if part.name() != "file" {
            while part.try_next().await?.is_some() {}
            continue;
        }
        let filename = part
            .content_disposition()
            .get_filename()
            .unwrap_or_default()
            .to_string();
        if !filename.ends_with(".csv") {
            return Err(ApiError::Validation(
                "Invalid file type. Please upload a CSV file.".to_string(),
            ));
        }
        let bytes = read_field_bytes(&mut part).await?;
        outcome = Some(import::import_companies(&state.store, &bytes)?);
    }

    let outcome =
        outcome.ok_or_else(|| ApiError::Validation("missing required field: file".to_string()))?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(outcome)))
}

async fn company_details(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let details = state.lookup.fetch(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(details)))
}

// ============================================================
// RESUME HANDLERS
// ============================================================

async fn list_resumes(state: web::Data<Arc<AppState>>) -> Result<HttpResponse, ApiError> {
    let listed = state.store.list_resumes()?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(listed)))
}

async fn upload_resume(
    state: web::Data<Arc<AppState>>,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let form = read_resume_form(&mut payload).await?;
    let job_title = require(form.job_title, "job_title")?;
    let field = require(form.field, "field")?;
    let (original_name, bytes) = form
        .file
        .ok_or_else(|| ApiError::Validation("missing required field: file".to_string()))?;

    let resume = resumes::create_resume(
        &state.store,
        &state.artifacts,
        job_title,
        field,
        &original_name,
        &bytes,
    )?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(resume)))
}

async fn update_resume(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let form = read_resume_form(&mut payload).await?;
    let job_title = require(form.job_title, "job_title")?;
    let field = require(form.field, "field")?;

    let resume = resumes::update_resume(
        &state.store,
        &state.artifacts,
        &path.into_inner(),
        job_title,
        field,
        form.file,
    )?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(resume)))
}

async fn delete_resume(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let deleted = resumes::delete_resume(&state.store, &state.artifacts, &path.into_inner())?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(deleted)))
}

/// Return an artifact as a generic octet stream.
async fn download_resume(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let filename = path.into_inner();
    let bytes = state.artifacts.read(&filename)?;
    Ok(HttpResponse::Ok()
        .content_type("application/octet-stream")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", filename),
        ))
        .body(bytes))
}

// ============================================================
// SERVER CONFIGURATION
// ============================================================

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/companies", web::get().to(list_companies))
        .route("/companies", web::post().to(create_company))
        .route("/companies/{company_id}", web::put().to(update_company))
        .route("/companies/{company_id}", web::delete().to(delete_company))
        .route("/import-companies", web::post().to(import_companies))
        .route(
            "/company-details/{company_name}",
            web::get().to(company_details),
        )
        .route("/resumes", web::get().to(list_resumes))
        .route("/resumes/upload", web::post().to(upload_resume))
        .route("/resumes/download/{filename}", web::get().to(download_resume))
        .route("/resumes/{resume_id}", web::put().to(update_resume))
        .route("/resumes/{resume_id}", web::delete().to(delete_resume));
}

/// Configure and run the API server
pub async fn run_server(config: Config) -> std::io::Result<()> {
    let state = Arc::new(AppState::new(&config).expect("Failed to initialize app state"));

    log::info!(
        "Talent Registry API starting at http://{}:{}",
        config.host,
        config.port
    );
    log::info!("database: {:?}", config.database_path);
    log::info!("CSV mirror: {:?}", config.mirror_path);
    log::info!("upload dir: {:?}", config.upload_dir);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .wrap(cors)
            .app_data(web::Data::new(state.clone()))
            .configure(routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test;
    use tempfile::tempdir;

    fn test_state(dir: &std::path::Path) -> Arc<AppState> {
        Arc::new(AppState {
            store: Store::in_memory().unwrap(),
            mirror: CsvMirror::new(dir.join("companies.csv")),
            artifacts: ArtifactStore::new(dir.join("uploads"), "http://localhost:8080").unwrap(),
            lookup: ReferenceLookup::new(),
        })
    }

    #[actix_web::test]
    async fn test_health_check() {
        let dir = tempdir().unwrap();
        let state = test_state(dir.path());
        let app = test::init_service(
            App::new().app_data(web::Data::new(state)).configure(routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }

    #[actix_web::test]
    async fn test_company_create_then_list() {
        let dir = tempdir().unwrap();
        let state = test_state(dir.path());
        // Listing requires the mirror file to exist.
        state.mirror.write_all(&[]).unwrap();

        let app = test::init_service(
            App::new().app_data(web::Data::new(state)).configure(routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/companies")
            .set_json(serde_json::json!({
                "company_name": "Acme",
                "location": "Springfield",
                "industry": "Tech",
                "website": "https://acme.example.com"
            }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["id"], 1);

        let req = test::TestRequest::get().uri("/companies").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["company_name"], "Acme");
    }

    #[actix_web::test]
    async fn test_list_without_mirror_is_404() {
        let dir = tempdir().unwrap();
        let state = test_state(dir.path());
        let app = test::init_service(
            App::new().app_data(web::Data::new(state)).configure(routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/companies").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }

    #[actix_web::test]
    async fn test_delete_missing_company_is_404() {
        let dir = tempdir().unwrap();
        let state = test_state(dir.path());
        let app = test::init_service(
            App::new().app_data(web::Data::new(state)).configure(routes),
        )
        .await;

        let req = test::TestRequest::delete().uri("/companies/99").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Company not found");
    }

    #[actix_web::test]
    async fn test_download_missing_artifact_is_404() {
        let dir = tempdir().unwrap();
        let state = test_state(dir.path());
        let app = test::init_service(
            App::new().app_data(web::Data::new(state)).configure(routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/resumes/download/nope.pdf")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }

    #[actix_web::test]
    async fn test_download_returns_stored_bytes() {
        let dir = tempdir().unwrap();
        let state = test_state(dir.path());
        state.artifacts.write("abc_cv.pdf", b"pdf bytes").unwrap();

        let app = test::init_service(
            App::new().app_data(web::Data::new(state)).configure(routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/resumes/download/abc_cv.pdf")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        assert_eq!(
            resp.headers().get("content-type").unwrap(),
            "application/octet-stream"
        );
        let body = test::read_body(resp).await;
        assert_eq!(&body[..], b"pdf bytes");
    }
}
