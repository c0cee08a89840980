use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use tutorplan_core::catalog::{CatalogError, TopicCatalog};
use tutorplan_core::plan::{
    ComposeError, PlanComposer, PlanRequest, ResourceCatalog, SectionSplit, SectionWeights,
    StudyPlan, TopicAttempt, summarize_plan,
};
use tutorplan_core::service::{self, StudentNotFound};
use tutorplan_core::source::PlanDataSource;

use crate::config::PlannerSection;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: msg.into(),
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{err:#}"),
        }
    }

    /// Map a service error by its outermost type. Errors that only carry a
    /// validation error deeper in their chain (a corrupt stored row, say)
    /// stay internal.
    pub fn classify(err: anyhow::Error) -> Self {
        let outer: &(dyn std::error::Error + 'static) = err.as_ref();
        if outer.is::<ComposeError>() || outer.is::<CatalogError>() {
            Self::unprocessable(err.to_string())
        } else if outer.is::<StudentNotFound>() {
            Self::not_found(err.to_string())
        } else {
            Self::internal(err)
        }
    }

    fn rejected(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<ComposeError> for AppError {
    fn from(err: ComposeError) -> Self {
        Self::unprocessable(err.to_string())
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        Self::unprocessable(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Shared handler state.
///
/// `pool` is `None` in demo mode; stored-plan routes are unavailable then.
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn PlanDataSource>,
    pub pool: Option<PgPool>,
    pub composer: Arc<PlanComposer>,
    pub planner: PlannerSection,
}

impl AppState {
    pub fn new(
        source: Arc<dyn PlanDataSource>,
        pool: Option<PgPool>,
        planner: PlannerSection,
    ) -> Self {
        Self {
            source,
            pool,
            composer: Arc::new(PlanComposer::default()),
            planner,
        }
    }

    fn pool(&self) -> Result<&PgPool, AppError> {
        self.pool.as_ref().ok_or_else(|| {
            AppError::internal(anyhow::anyhow!(
                "stored plans are not available without a database"
            ))
        })
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Body of `POST /api/plan/generate`. Omitted plan parameters fall back to
/// the configured planner defaults.
#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    pub student_id: String,
    pub start_date: String,
    #[serde(default)]
    pub weeks: Option<i64>,
    #[serde(default, alias = "cap_per_week")]
    pub cap_per_week_minutes: Option<f64>,
    #[serde(default)]
    pub section_split: Option<SectionSplit>,
    #[serde(default)]
    pub section_priority: Option<SectionWeights>,
    #[serde(default)]
    pub topic_priority: HashMap<String, i64>,
}

impl GenerateBody {
    fn into_request(self, planner: &PlannerSection) -> (String, PlanRequest) {
        let request = PlanRequest {
            start_date: self.start_date,
            weeks: self.weeks.unwrap_or(planner.weeks),
            cap_per_week_minutes: self
                .cap_per_week_minutes
                .unwrap_or(planner.cap_per_week_minutes),
            section_split: self.section_split.unwrap_or_else(|| planner.split()),
            section_priority: self.section_priority,
            topic_priority: self.topic_priority,
        };
        (self.student_id, request)
    }
}

/// Body of `POST /api/plan/compose`: everything the composer needs, no data
/// source involved.
#[derive(Debug, Deserialize)]
pub struct ComposeBody {
    pub owner_id: String,
    pub attempts: Vec<TopicAttempt>,
    pub request: PlanRequest,
    #[serde(default)]
    pub catalog: ResourceCatalog,
    #[serde(default)]
    pub student_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlansQuery {
    pub owner: Option<String>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/students", get(list_students))
        .route("/api/plan/generate", post(generate_plan))
        .route("/api/plan/compose", post(compose_plan))
        .route("/api/plan/summary", post(summarize))
        .route("/api/plans", get(list_plans))
        .route("/api/plans/{id}", get(get_plan))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    let source = state.source.name().to_owned();
    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!(source = %source, "tutorplan serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("tutorplan serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn list_students(State(state): State<AppState>) -> Result<axum::response::Response, AppError> {
    let students = state
        .source
        .list_students()
        .await
        .map_err(AppError::internal)?;
    Ok(Json(students).into_response())
}

async fn generate_plan(
    State(state): State<AppState>,
    payload: Result<Json<GenerateBody>, JsonRejection>,
) -> Result<axum::response::Response, AppError> {
    let Json(body) = payload.map_err(AppError::rejected)?;
    let (student_id, request) = body.into_request(&state.planner);

    let plan = service::generate_for_student(
        state.source.as_ref(),
        &state.composer,
        &student_id,
        &request,
    )
    .await
    .map_err(AppError::classify)?;

    Ok(Json(plan).into_response())
}

async fn compose_plan(
    State(state): State<AppState>,
    payload: Result<Json<ComposeBody>, JsonRejection>,
) -> Result<axum::response::Response, AppError> {
    let Json(body) = payload.map_err(AppError::rejected)?;
    TopicCatalog::load().validate_attempts(&body.attempts)?;

    let plan = state
        .composer
        .compose(&body.owner_id, &body.attempts, &body.request, &body.catalog)?;
    let plan = match body.student_name {
        Some(name) => plan.with_student_name(name),
        None => plan,
    };
    Ok(Json(plan).into_response())
}

async fn summarize(
    payload: Result<Json<StudyPlan>, JsonRejection>,
) -> Result<axum::response::Response, AppError> {
    let Json(plan) = payload.map_err(AppError::rejected)?;
    Ok(Json(summarize_plan(&plan)).into_response())
}

async fn list_plans(
    State(state): State<AppState>,
    Query(query): Query<PlansQuery>,
) -> Result<axum::response::Response, AppError> {
    let plans = service::list_saved_plans(state.pool()?, query.owner.as_deref())
        .await
        .map_err(AppError::internal)?;
    Ok(Json(plans).into_response())
}

async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    let saved = service::get_saved_plan(state.pool()?, id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("plan {id} not found")))?;
    Ok(Json(saved).into_response())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use serde_json::json;
    use tower::ServiceExt;

    use tutorplan_core::plan::{PlanRequest, StudyPlan};
    use tutorplan_core::service;
    use tutorplan_core::source::{DemoDataSource, PgDataSource};
    use tutorplan_test_utils::{create_test_db, drop_test_db};

    use super::{AppState, build_router};
    use crate::config::PlannerSection;

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    fn demo_state() -> AppState {
        let demo = DemoDataSource::load().unwrap();
        AppState::new(Arc::new(demo), None, PlannerSection::default())
    }

    async fn get(state: AppState, uri: &str) -> axum::response::Response {
        build_router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn post(state: AppState, uri: &str, body: serde_json::Value) -> axum::response::Response {
        build_router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    // -----------------------------------------------------------------------
    // Demo-backed routes
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn lists_demo_student() {
        let resp = get(demo_state(), "/api/students").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        let arr = json.as_array().expect("response should be an array");
        assert_eq!(arr.len(), 1);
        assert_eq!(arr[0]["id"], DemoDataSource::STUDENT_ID);
        assert_eq!(arr[0]["first_name"], "Alex");
    }

    #[tokio::test]
    async fn generates_plan_for_demo_student() {
        let resp = post(
            demo_state(),
            "/api/plan/generate",
            json!({
                "student_id": DemoDataSource::STUDENT_ID,
                "start_date": "2025-09-01",
                "weeks": 2,
                "cap_per_week": 240
            }),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["owner_id"], DemoDataSource::STUDENT_ID);
        assert_eq!(json["meta"]["cap_per_week_minutes"], 240);
        assert_eq!(json["meta"]["student_name"], "Alex Johnson");
        assert_eq!(json["weeks"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn generate_accepts_fractional_cap() {
        let resp = post(
            demo_state(),
            "/api/plan/generate",
            json!({
                "student_id": DemoDataSource::STUDENT_ID,
                "start_date": "2025-09-01",
                "cap_per_week_minutes": 239.6
            }),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["meta"]["cap_per_week_minutes"], 240);
    }

    #[tokio::test]
    async fn generate_uses_planner_defaults() {
        let mut state = demo_state();
        state.planner.weeks = 5;
        let resp = post(
            state,
            "/api/plan/generate",
            json!({ "student_id": DemoDataSource::STUDENT_ID, "start_date": "2025-09-01" }),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["weeks"].as_array().unwrap().len(), 5);
        assert_eq!(json["meta"]["cap_per_week_minutes"], 360);
    }

    #[tokio::test]
    async fn generate_unknown_student_is_404() {
        let resp = post(
            demo_state(),
            "/api/plan/generate",
            json!({ "student_id": "nobody", "start_date": "2025-09-01" }),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let json = body_json(resp).await;
        assert!(json["error"].as_str().unwrap().contains("nobody"));
    }

    #[tokio::test]
    async fn generate_invalid_parameters_is_422() {
        for body in [
            json!({ "student_id": "demo_user_123", "start_date": "2025-09-01", "weeks": 0 }),
            json!({ "student_id": "demo_user_123", "start_date": "2025-09-01", "cap_per_week": -5 }),
            json!({ "student_id": "demo_user_123", "start_date": "next tuesday" }),
            json!({
                "student_id": "demo_user_123",
                "start_date": "2025-09-01",
                "section_split": { "RW": 0.7, "Math": 0.7 }
            }),
            json!({
                "student_id": "demo_user_123",
                "start_date": "2025-09-01",
                "topic_priority": { "Circles": 9 }
            }),
        ] {
            let resp = post(demo_state(), "/api/plan/generate", body.clone()).await;
            assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY, "body: {body}");
            let json = body_json(resp).await;
            assert!(json.get("error").is_some());
        }
    }

    #[tokio::test]
    async fn malformed_body_returns_json_error() {
        let resp = post(demo_state(), "/api/plan/generate", json!({ "start_date": "2025-09-01" })).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(resp).await;
        assert!(json["error"].as_str().unwrap().contains("student_id"));
    }

    #[tokio::test]
    async fn composes_without_data_source() {
        let resp = post(
            demo_state(),
            "/api/plan/compose",
            json!({
                "owner_id": "walk-in",
                "attempts": [
                    { "section": "Math", "topic": "Circles", "mastery": "MASTERED" },
                    { "section": "RW", "topic": "Inferences", "mastery": "PRIORITY_GAP" }
                ],
                "request": { "start_date": "2025-09-01" },
                "catalog": { "Inferences": ["rw-inferences-1"] }
            }),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["owner_id"], "walk-in");
        let first = &json["weeks"][0]["blocks"][0];
        assert_eq!(first["topic"], "Inferences");
        assert_eq!(first["resource_slugs"], json!(["rw-inferences-1"]));
        assert_eq!(json["weeks"][0]["blocks"][1]["resource_slugs"], json!(["TBD:Circles"]));
    }

    #[tokio::test]
    async fn compose_rejects_unknown_topic() {
        let resp = post(
            demo_state(),
            "/api/plan/compose",
            json!({
                "owner_id": "walk-in",
                "attempts": [{ "section": "Math", "topic": "Astronomy", "mastery": "DEVELOPING" }],
                "request": { "start_date": "2025-09-01" }
            }),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(resp).await;
        assert!(json["error"].as_str().unwrap().contains("Astronomy"));
    }

    #[tokio::test]
    async fn summarizes_posted_plan() {
        let demo = DemoDataSource::load().unwrap();
        let plan: StudyPlan = service::generate_for_student(
            &demo,
            &Default::default(),
            DemoDataSource::STUDENT_ID,
            &PlanRequest::new("2025-09-01"),
        )
        .await
        .unwrap();

        let resp = post(
            demo_state(),
            "/api/plan/summary",
            serde_json::to_value(&plan).unwrap(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["total_blocks"], 11);
        assert_eq!(json["mastery_distribution"].as_object().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn stored_plans_need_a_database() {
        let resp = get(demo_state(), &format!("/api/plans/{}", uuid::Uuid::new_v4())).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    // -----------------------------------------------------------------------
    // Database-backed routes
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn stored_plan_round_trip() {
        let (pool, db_name) = create_test_db().await;
        let state = AppState::new(
            Arc::new(PgDataSource::new(pool.clone())),
            Some(pool.clone()),
            PlannerSection::default(),
        );

        let demo = DemoDataSource::load().unwrap();
        let plan = service::generate_for_student(
            &demo,
            &Default::default(),
            DemoDataSource::STUDENT_ID,
            &PlanRequest::new("2025-09-01"),
        )
        .await
        .unwrap();
        let id = service::save_plan(&pool, &plan).await.unwrap();

        let resp = get(state.clone(), &format!("/api/plans/{id}")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["id"], id.to_string());
        assert_eq!(json["plan"]["owner_id"], DemoDataSource::STUDENT_ID);

        let resp = get(state.clone(), &format!("/api/plans/{}", uuid::Uuid::new_v4())).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = get(state.clone(), "/api/plans?owner=someone-else").await;
        assert_eq!(body_json(resp).await, json!([]));

        let resp = get(state, "/api/students").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!([]));

        pool.close().await;
        drop_test_db(&db_name).await;
    }
}
