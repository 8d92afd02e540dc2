//! Integration tests for the HTTP server

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt; // for oneshot
use trialparse_domain::EligibilityRelation;
use trialparse_engine::{Dictionaries, Dictionary, Engine, MockEngine};
use trialparse_pipeline::{PipelineAggregator, PipelineConfig};
use trialparse_server::config::ServerConfig;
use trialparse_server::handlers::{create_router, AppState, ErrorResponse, HealthCheckResponse};
use trialparse_server::{build_state, ServerError};

const NCT001_OUTPUT: &str =
    "NCT001\tinclusion\tAge\t0\tage 18\tWhat is the minimum age?\t{\"op\":\">=\",\"value\":18}\n";

/// Helper to create test application state
fn create_test_state(engine: MockEngine, config: PipelineConfig) -> AppState {
    let engine: Engine = engine.into();
    let dictionaries = Dictionaries {
        variables: Dictionary::parse(
            "variables",
            Path::new("variables.tsv"),
            "# name\tcategory\nage\tdemographic\nbmi\tmeasurement\npregnancy\tstatus\n",
        )
        .unwrap(),
        units: Dictionary::parse("units", Path::new("units.tsv"), "years\nkg/m2\n").unwrap(),
    };

    AppState {
        aggregator: Arc::new(PipelineAggregator::new(engine, config).unwrap()),
        dictionaries: Arc::new(dictionaries),
    }
}

fn default_app() -> Router {
    let mut engine = MockEngine::default();
    engine.add_response("NCT001", NCT001_OUTPUT);
    create_router(create_test_state(engine, PipelineConfig::default()))
}

fn post(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> axum::body::Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

fn rows(ids: &[&str]) -> String {
    let rows: Vec<Value> = ids
        .iter()
        .map(|id| {
            json!([
                id,
                "Title X",
                "false",
                "Cond A Exclusion Criteria: Cond B",
                "Inclusion Criteria: - age 18 Exclusion Criteria: - pregnant"
            ])
        })
        .collect();
    Value::Array(rows).to_string()
}

#[tokio::test]
async fn test_health_check_endpoint() {
    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = default_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let health: HealthCheckResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.variables, 3);
    assert_eq!(health.units, 2);
}

#[tokio::test]
async fn test_parse_returns_relations() {
    let response = default_app()
        .oneshot(post("/parse", rows(&["NCT001"])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(
        body,
        json!([{
            "nct_id": "NCT001",
            "eligibility_type": "inclusion",
            "variable_type": "Age",
            "criterion_index": "0",
            "criterion": "age 18",
            "question": "What is the minimum age?",
            "relation": {"op": ">=", "value": 18}
        }])
    );
}

#[tokio::test]
async fn test_parse_preserves_registry_order() {
    let mut engine = MockEngine::default();
    for id in ["B", "A", "C"] {
        engine.add_response(id, format!("{id}\tinclusion\tAge\t0\tage 18\tq\t{{\"v\":1}}\n"));
    }
    let app = create_router(create_test_state(engine, PipelineConfig::parallel(3)));

    let response = app.oneshot(post("/parse", rows(&["B", "A", "C"]))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let relations: Vec<EligibilityRelation> =
        serde_json::from_slice(&body_bytes(response).await).unwrap();
    let ids: Vec<&str> = relations.iter().map(|r| r.nct_id.as_str()).collect();
    assert_eq!(ids, ["B", "A", "C"]);
}

#[tokio::test]
async fn test_parse_empty_batch() {
    let response = default_app().oneshot(post("/parse", "[]")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await.as_ref(), b"[]");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let response = default_app()
        .oneshot(post("/parse", "[[\"NCT001\", "))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: ErrorResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(error.kind, "malformed_request");
    assert_eq!(error.row_index, None);
}

#[tokio::test]
async fn test_short_row_is_bad_request() {
    let body = json!([
        ["NCT001", "T", "false", "Cond", "text"],
        ["NCT002", "T", "false"]
    ])
    .to_string();

    let response = default_app().oneshot(post("/parse", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: ErrorResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(error.kind, "malformed_row");
    assert_eq!(error.row_index, Some(1));
}

#[tokio::test]
async fn test_extraction_failure_is_server_error() {
    let mut engine = MockEngine::default();
    engine.add_response("NCT001", NCT001_OUTPUT);
    engine.add_error("NCT002");
    let app = create_router(create_test_state(engine, PipelineConfig::default()));

    let response = app
        .oneshot(post("/parse", rows(&["NCT001", "NCT002"])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let error: ErrorResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(error.kind, "extraction");
    assert_eq!(error.study_id.as_deref(), Some("NCT002"));
}

#[tokio::test]
async fn test_malformed_relation_is_server_error() {
    let mut engine = MockEngine::default();
    engine.add_response("NCT001", "NCT001\tinclusion\tAge\t0\tage 18\tq\t[1, 2]\n");
    let app = create_router(create_test_state(engine, PipelineConfig::default()));

    let response = app.oneshot(post("/parse", rows(&["NCT001"]))).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let error: ErrorResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(error.kind, "malformed_relation");
}

#[tokio::test]
async fn test_report_with_skip_and_report() {
    let mut engine = MockEngine::default();
    engine.add_response("NCT001", NCT001_OUTPUT);
    engine.add_error("NCT002");
    let app = create_router(create_test_state(engine, PipelineConfig::best_effort()));

    let response = app
        .oneshot(post("/parse/report", rows(&["NCT001", "NCT002"])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let report: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(report["batch_id"].is_string());
    assert_eq!(report["metrics"]["studies_ingested"], 2);
    assert_eq!(report["metrics"]["studies_failed"], 1);
    assert_eq!(report["metrics"]["relations_per_criterion_percent"], 100.0);
    assert_eq!(report["relations"].as_array().unwrap().len(), 1);
    assert_eq!(report["outcomes"][0]["status"], "parsed");
    assert_eq!(report["outcomes"][1]["status"], "failed");
    assert_eq!(report["outcomes"][1]["kind"], "extraction");
}

#[test]
fn test_build_state_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("resources")).unwrap();
    std::fs::write(dir.path().join("resources/variables.tsv"), "age\nbmi\n").unwrap();
    std::fs::write(dir.path().join("resources/units.tsv"), "years\n").unwrap();

    let config_path = dir.path().join("server.toml");
    std::fs::write(
        &config_path,
        r#"
        bind_address = "127.0.0.1"
        bind_port = 0

        [resources]
        variable_file = "resources/variables.tsv"
        unit_file = "resources/units.tsv"

        [engine]
        kind = "command"
        program = "ct-extract"
        "#,
    )
    .unwrap();

    let config = ServerConfig::from_file(&config_path).unwrap();
    let state = build_state(&config).unwrap();
    assert_eq!(state.dictionaries.variables.len(), 2);
    assert_eq!(state.dictionaries.units.len(), 1);
}

#[test]
fn test_build_state_empty_dictionary() {
    let dir = tempfile::tempdir().unwrap();
    let variables = dir.path().join("variables.tsv");
    let units = dir.path().join("units.tsv");
    std::fs::write(&variables, "# nothing here\n").unwrap();
    std::fs::write(&units, "years\n").unwrap();

    let mut config = ServerConfig::default_test_config();
    config.resources.variable_file = variables;
    config.resources.unit_file = units;

    assert!(matches!(build_state(&config), Err(ServerError::Engine(_))));
}
