// Cloud Dependency Explorer - REST API
// Router, handlers and per-session state for the web dashboard

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{info, warn};
use uuid::Uuid;

use crate::add_flow::{AddFlowState, Completion, PendingDetection};
use crate::aggregate::DashboardStats;
use crate::catalog::{Catalog, CompanyRecord};
use crate::classifier::ProviderClassifier;
use crate::error::{AddCompanyError, ClassifierError};
use crate::explorer::{heading_for, Explorer};
use crate::filter::FilterState;
use crate::logo::{company_logo_chain, provider_logo_chain, LogoCandidate};
use crate::provider::Provider;

/// Sessions untouched for this long are dropped on the next sweep
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

struct Session {
    explorer: Explorer,
    last_seen: Instant,
}

impl Session {
    fn touch(&mut self) -> &mut Explorer {
        self.last_seen = Instant::now();
        &mut self.explorer
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    base: Catalog,
    big_three: Vec<Provider>,
    classifier: Arc<dyn ProviderClassifier>,
    sessions: Arc<Mutex<HashMap<Uuid, Session>>>,
    session_ttl: Duration,
}

impl AppState {
    pub fn new(
        base: Catalog,
        big_three: Vec<Provider>,
        classifier: Arc<dyn ProviderClassifier>,
    ) -> Self {
        Self {
            base,
            big_three,
            classifier,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<Uuid, Session>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn session_count(&self) -> usize {
        self.sessions().len()
    }

    /// Drop sessions idle for longer than the TTL; returns how many went
    fn evict_idle(&self) -> usize {
        let ttl = self.session_ttl;
        let mut sessions = self.sessions();
        let before = sessions.len();

        sessions.retain(|_, session| session.last_seen.elapsed() < ttl);
        before - sessions.len()
    }
}

/// Fails the session's detection if the request future is dropped before
/// the classifier answers (client gone, proxy timeout), so the add flow
/// never stays in `Detecting`.
struct DetectionGuard {
    state: AppState,
    id: Uuid,
    pending: PendingDetection,
    armed: bool,
}

impl DetectionGuard {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for DetectionGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let mut sessions = self.state.sessions();
        if let Some(session) = sessions.get_mut(&self.id) {
            warn!(
                "Request for {} dropped while detecting, failing the attempt",
                self.pending.domain()
            );
            session.explorer.complete_add(
                self.pending.clone(),
                Err(ClassifierError::Transport("request cancelled".to_string())),
            );
        }
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
        }
    }

    fn err(message: String, code: &'static str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            code: Some(code),
        }
    }
}

fn error_response(status: StatusCode, message: String, code: &'static str) -> Response {
    (status, Json(ApiResponse::<()>::err(message, code))).into_response()
}

fn session_not_found(id: Uuid) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        format!("Unknown session {}", id),
        "unknown_session",
    )
}

fn add_error_response(err: &AddCompanyError) -> Response {
    let status = match err {
        AddCompanyError::EmptyInput | AddCompanyError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
        AddCompanyError::AlreadyExists { .. } | AddCompanyError::DetectionInProgress => {
            StatusCode::CONFLICT
        }
        AddCompanyError::ClassificationFailed(_) => StatusCode::BAD_GATEWAY,
    };
    error_response(status, err.to_string(), err.code())
}

// ============================================================================
// Response shapes
// ============================================================================

/// Company as the page renders it, logo chain included
#[derive(Serialize)]
struct CompanyView {
    name: String,
    symbol: String,
    domain: String,
    provider: Provider,
    color: String,
    logos: Vec<LogoCandidate>,
}

impl From<&CompanyRecord> for CompanyView {
    fn from(record: &CompanyRecord) -> Self {
        Self {
            name: record.name.clone(),
            symbol: record.symbol.clone(),
            domain: record.domain.clone(),
            provider: record.provider,
            color: record.provider.color_hex().to_string(),
            logos: company_logo_chain(record),
        }
    }
}

#[derive(Serialize)]
struct ProviderView {
    provider: Provider,
    color: &'static str,
    logos: Vec<LogoCandidate>,
}

#[derive(Serialize)]
struct SessionCreated {
    session_id: Uuid,
}

#[derive(Serialize)]
struct AddStateView {
    state: &'static str,
    input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct DashboardResponse {
    heading: String,
    stats: DashboardStats,
    companies: Vec<CompanyView>,
    offer_add: bool,
    add_state: AddStateView,
}

#[derive(Deserialize)]
struct DashboardQuery {
    #[serde(default)]
    q: String,
    provider: Option<String>,
    hover: Option<String>,
}

#[derive(Deserialize)]
struct AddCompanyRequest {
    url: String,
}

fn parse_provider(label: Option<&str>) -> Result<Option<Provider>, Response> {
    match label.map(str::trim).filter(|l| !l.is_empty()) {
        None => Ok(None),
        Some(label) => Provider::from_label(label).map(Some).ok_or_else(|| {
            error_response(
                StatusCode::BAD_REQUEST,
                format!("Unknown provider: {}", label),
                "unknown_provider",
            )
        }),
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/providers - Provider enumeration with colors and logos
async fn get_providers() -> impl IntoResponse {
    let providers: Vec<ProviderView> = Provider::ALL
        .iter()
        .map(|p| ProviderView {
            provider: *p,
            color: p.color_hex(),
            logos: provider_logo_chain(*p),
        })
        .collect();

    Json(ApiResponse::ok(providers))
}

/// GET /api/catalog - Base catalog
async fn get_catalog(State(state): State<AppState>) -> impl IntoResponse {
    let companies: Vec<CompanyView> = state.base.records().iter().map(CompanyView::from).collect();
    Json(ApiResponse::ok(companies))
}

/// POST /api/sessions - Start a dashboard session
async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    let evicted = state.evict_idle();
    if evicted > 0 {
        info!("Evicted {} idle session(s)", evicted);
    }

    let id = Uuid::new_v4();
    let explorer = Explorer::new(&state.base).with_big_three(state.big_three.clone());
    state.sessions().insert(
        id,
        Session {
            explorer,
            last_seen: Instant::now(),
        },
    );

    info!("Session {} started", id);
    (
        StatusCode::CREATED,
        Json(ApiResponse::ok(SessionCreated { session_id: id })),
    )
}

/// DELETE /api/sessions/:id - End a session; in-flight detections are void
async fn delete_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let removed = state.sessions().remove(&id);

    match removed {
        Some(mut session) => {
            session.explorer.reset();
            info!("Session {} ended", id);
            StatusCode::NO_CONTENT.into_response()
        }
        None => session_not_found(id),
    }
}

/// GET /api/sessions/:id/dashboard - Stats and visible companies
async fn get_dashboard(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<DashboardQuery>,
) -> Response {
    let selected = match parse_provider(params.provider.as_deref()) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let hovered = match parse_provider(params.hover.as_deref()) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let filter = FilterState {
        query: params.q,
        selected_provider: selected,
        hovered_provider: hovered,
    };

    let mut sessions = state.sessions();
    let explorer = match sessions.get_mut(&id) {
        Some(session) => session.touch(),
        None => return session_not_found(id),
    };

    let flow = explorer.add_flow();
    let add_state = AddStateView {
        state: flow.state().name(),
        input: flow.input().to_string(),
        error: match flow.state() {
            AddFlowState::Failed(err) => Some(err.to_string()),
            _ => None,
        },
    };

    let response = DashboardResponse {
        heading: heading_for(&filter),
        stats: explorer.stats(),
        companies: explorer
            .visible_with(&filter)
            .into_iter()
            .map(CompanyView::from)
            .collect(),
        offer_add: explorer.offers_add_for(&filter.query),
        add_state,
    };

    (StatusCode::OK, Json(ApiResponse::ok(response))).into_response()
}

/// POST /api/sessions/:id/companies - Classify a URL and append it
async fn add_company(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddCompanyRequest>,
) -> Response {
    let pending = {
        let mut sessions = state.sessions();
        let explorer = match sessions.get_mut(&id) {
            Some(session) => session.touch(),
            None => return session_not_found(id),
        };

        match explorer.begin_add(&req.url) {
            Ok(pending) => pending,
            Err(err) => return add_error_response(&err),
        }
    };

    let guard = DetectionGuard {
        state: state.clone(),
        id,
        pending: pending.clone(),
        armed: true,
    };

    // Lock released: other requests for this session stay responsive
    let result = state.classifier.classify(pending.url()).await;
    guard.disarm();

    let mut sessions = state.sessions();
    let explorer = match sessions.get_mut(&id) {
        Some(session) => session.touch(),
        None => {
            warn!("Session {} ended before {} was classified", id, pending.domain());
            return session_not_found(id);
        }
    };

    match explorer.complete_add(pending, result) {
        Completion::Added(record) => (
            StatusCode::CREATED,
            Json(ApiResponse::ok(CompanyView::from(&record))),
        )
            .into_response(),
        Completion::Failed(err) => add_error_response(&err),
        Completion::Discarded => error_response(
            StatusCode::CONFLICT,
            "Session was reset while detecting".to_string(),
            "discarded",
        ),
    }
}

/// GET / - Serve the dashboard page
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/providers", get(get_providers))
        .route("/catalog", get(get_catalog))
        .route("/sessions", post(create_session))
        .route("/sessions/:id", delete(delete_session))
        .route("/sessions/:id/dashboard", get(get_dashboard))
        .route("/sessions/:id/companies", post(add_company))
        .with_state(state);

    Router::new()
        .route("/", get(serve_index))
        .nest("/api", api_routes)
        .nest_service("/static", ServeDir::new("web"))
        .layer(CorsLayer::permissive())
}
