use std::path::PathBuf;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::tempdir;
use tower::ServiceExt;

use sentinel_core::logic::artifacts::TrainingReport;
use sentinel_core::logic::synthetic;
use sentinel_core::{ArtifactStore, ForestParams, Pipeline, Theme};

use crate::config::Config;
use crate::create_router;
use crate::state::{AppState, LoadedModel, ServiceContext};

fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        artifact_dir: PathBuf::from("unused"),
        theme: Theme::Flows,
        require_model: false,
        environment: "test".to_string(),
    }
}

fn trained_context() -> ServiceContext {
    let params = ForestParams {
        n_estimators: 10,
        ..ForestParams::default()
    };
    let pipeline = Pipeline::new(Theme::Flows.builder("label")).with_params(params);
    let rows = synthetic::generate(Theme::Flows, 200, 42);
    let (model, schema) = pipeline.train(&rows).unwrap();
    ServiceContext::with_model(LoadedModel::new(model, schema).unwrap())
}

fn app(ctx: ServiceContext) -> Router {
    create_router(AppState::new(ctx, test_config()))
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: impl Into<String>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.into()))
        .unwrap()
}

#[tokio::test]
async fn health_reports_no_model() {
    let (status, body) = send(app(ServiceContext::empty()), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["model_loaded"], false);
    assert_eq!(body["n_features"], 0);
}

#[tokio::test]
async fn health_reports_loaded_model() {
    let ctx = trained_context();
    let n_features = ctx.model().unwrap().schema.len();
    let classes = ctx.model().unwrap().model.classes().to_vec();

    let (status, body) = send(app(ctx), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_loaded"], true);
    assert_eq!(body["n_features"], n_features);
    assert_eq!(body["classes"], json!(classes));
}

#[tokio::test]
async fn predict_returns_a_distribution() {
    let record = json!({
        "src_ip": "10.0.0.1", "dst_ip": "192.168.1.5", "src_port": 50000,
        "dst_port": 443, "protocol": "TCP",
        "bytes_in": 900000, "bytes_out": 300, "packet_count": 12
    });
    let (status, body) = send(app(trained_context()), post("/predict", record.to_string())).await;

    assert_eq!(status, StatusCode::OK);
    let prediction = &body["prediction"];
    let label = prediction["class_label"].as_str().unwrap();
    let probabilities = prediction["probabilities"].as_object().unwrap();
    assert!(probabilities.contains_key(label));

    let total: f64 = probabilities.values().map(|p| p.as_f64().unwrap()).sum();
    assert!((total - 1.0).abs() < 1e-9);
    assert_eq!(prediction["confidence"], probabilities[label]);
}

#[tokio::test]
async fn predict_tolerates_unknown_and_missing_fields() {
    let (status, body) = send(
        app(trained_context()),
        post("/predict", r#"{"something_else": 1}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["prediction"]["class_label"].is_string());
}

#[tokio::test]
async fn predict_rejects_malformed_json() {
    let (status, body) = send(app(trained_context()), post("/predict", "{not json")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn predict_rejects_non_object() {
    let (status, _) = send(app(trained_context()), post("/predict", "[1, 2, 3]")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn predict_rejects_colliding_columns() {
    let body = json!({"protocol": "TCP", "protocol_TCP": 1, "bytes_in": 10}).to_string();
    let (status, body) = send(app(trained_context()), post("/predict", body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("protocol_TCP"));
}

#[tokio::test]
async fn predict_without_model_is_unavailable() {
    let (status, body) = send(app(ServiceContext::empty()), post("/predict", "{}")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Model not loaded");
}

#[tokio::test]
async fn batch_scores_every_record() {
    let batch = json!([
        {"bytes_in": 100, "bytes_out": 80, "packet_count": 10, "dst_port": 80, "protocol": "TCP"},
        {"bytes_in": 5000000, "bytes_out": 10, "packet_count": 15, "dst_port": 443, "protocol": "UDP"},
        {}
    ]);
    let (status, body) = send(app(trained_context()), post("/predict/batch", batch.to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predictions"].as_array().unwrap().len(), 3);
    assert_eq!(body["summary"]["num_scored"], 3);

    let counted: u64 = body["summary"]["label_counts"]
        .as_object()
        .unwrap()
        .values()
        .map(|v| v.as_u64().unwrap())
        .sum();
    assert_eq!(counted, 3);
}

#[tokio::test]
async fn batch_requires_an_array() {
    let (status, _) = send(app(trained_context()), post("/predict/batch", r#"{"a": 1}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(app(trained_context()), post("/predict/batch", r#"[{"a": [1]}]"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn model_info_lists_schema_columns() {
    let ctx = trained_context();
    let columns = ctx.model().unwrap().schema.columns().to_vec();

    let (status, body) = send(app(ctx), get("/model")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["columns"], json!(columns));
    assert_eq!(body["metadata"]["deriver"], "flows");

    let (status, _) = send(app(ServiceContext::empty()), get("/model")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[test]
fn context_load_respects_require_model() {
    let dir = tempdir().unwrap();
    let store = ArtifactStore::new(dir.path());

    assert!(ServiceContext::load(&store, true).is_err());
    assert!(!ServiceContext::load(&store, false).unwrap().is_loaded());
}

#[test]
fn context_loads_persisted_artifacts() {
    let dir = tempdir().unwrap();
    let store = ArtifactStore::new(dir.path());

    let pipeline = Pipeline::new(Theme::Iam.builder("label")).with_params(ForestParams {
        n_estimators: 5,
        ..ForestParams::default()
    });
    let (model, schema) = pipeline.train(&synthetic::generate(Theme::Iam, 100, 1)).unwrap();
    store.save(&model, &schema, None).unwrap();

    let ctx = ServiceContext::load(&store, true).unwrap();
    let loaded = ctx.model().unwrap();
    assert_eq!(loaded.model.run_id(), model.run_id());
    assert_eq!(loaded.pipeline.builder().deriver_name(), "iam");
}

#[test]
fn context_drops_report_from_another_run() {
    let dir = tempdir().unwrap();
    let store = ArtifactStore::new(dir.path());

    let pipeline = Pipeline::new(Theme::Iam.builder("label")).with_params(ForestParams {
        n_estimators: 5,
        ..ForestParams::default()
    });
    let (model, schema) = pipeline.train(&synthetic::generate(Theme::Iam, 100, 1)).unwrap();
    let report = TrainingReport {
        run_id: model.run_id(),
        model: "random_forest".to_string(),
        deriver: "iam".to_string(),
        num_samples: 100,
        num_train: 100,
        num_test: 0,
        num_features: schema.len(),
        classes: model.classes().to_vec(),
        evaluation: None,
    };
    store.save(&model, &schema, Some(&report)).unwrap();

    let ctx = ServiceContext::load(&store, true).unwrap();
    assert_eq!(ctx.model().unwrap().report.as_ref(), Some(&report));

    // Same pair, report rewritten by some other run
    let mut raw: Value = serde_json::from_slice(&std::fs::read(store.report_path()).unwrap()).unwrap();
    raw["run_id"] = json!("00000000-0000-4000-8000-000000000000");
    std::fs::write(store.report_path(), serde_json::to_vec(&raw).unwrap()).unwrap();

    let ctx = ServiceContext::load(&store, true).unwrap();
    assert!(ctx.model().unwrap().report.is_none());

    // Unreadable report never blocks startup
    std::fs::write(store.report_path(), "{not json").unwrap();
    let ctx = ServiceContext::load(&store, true).unwrap();
    assert!(ctx.model().unwrap().report.is_none());
}

fn iam_context() -> ServiceContext {
    let pipeline = Pipeline::new(Theme::Iam.builder("label")).with_params(ForestParams {
        n_estimators: 10,
        ..ForestParams::default()
    });
    let (model, schema) = pipeline.train(&synthetic::generate(Theme::Iam, 300, 4)).unwrap();
    ServiceContext::with_model(LoadedModel::new(model, schema).unwrap())
}

#[tokio::test]
async fn analyze_policy_combines_rules_and_iam_model() {
    let policy = json!({
        "name": "ops-admin",
        "policy": {
            "Version": "2012-10-17",
            "Statement": [{"Effect": "Allow", "Action": ["iam:*"], "Resource": "*"}]
        }
    });
    let (status, body) = send(app(iam_context()), post("/analyze/policy", policy.to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["num_statements"], 1);
    assert_eq!(body["rules"]["num_findings"], 3);
    assert_eq!(body["rules"]["risk_level"], "high");
    assert_eq!(body["rules"]["findings"][0]["location"], "Statement[0]");
    assert_eq!(body["record"]["policy_name"], "ops-admin");
    assert!(body["prediction"]["class_label"].is_string());
}

#[tokio::test]
async fn analyze_policy_without_iam_model_reports_rules_only() {
    let policy = json!({"Statement": {"Effect": "Allow", "Action": "s3:GetObject", "Resource": "arn:aws:s3:::b/k"}});

    for ctx in [ServiceContext::empty(), trained_context()] {
        let (status, body) = send(app(ctx), post("/analyze/policy", policy.to_string())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rules"]["risk_level"], "none");
        assert_eq!(body["record"]["policy_name"], "policy");
        assert!(body["prediction"].is_null());
    }
}

#[tokio::test]
async fn analyze_policy_rejects_malformed_documents() {
    let (status, body) = send(app(iam_context()), post("/analyze/policy", r#"{"Statement": 5}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);

    let (status, _) = send(app(iam_context()), post("/analyze/policy", "{nope")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn analyze_flows_runs_rules_and_flow_model() {
    let flows: Vec<Value> = (0..30)
        .map(|i| json!({"src_ip": "10.0.0.9", "dst_port": 22, "protocol": "TCP",
                         "bytes_in": 100 + i, "bytes_out": 80, "packet_count": 12}))
        .collect();
    let (status, body) = send(app(trained_context()), post("/analyze/flows", Value::from(flows).to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rules"]["findings"][0]["rule_id"], "PV02_BRUTEFORCE_LIKE");
    assert_eq!(body["rules"]["findings"][0]["flows_affected"], 30);
    assert_eq!(body["predictions"].as_array().unwrap().len(), 30);
    assert_eq!(body["summary"]["num_scored"], 30);

    let (status, body) = send(app(ServiceContext::empty()), post("/analyze/flows", "[]")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rules"]["risk_level"], "none");
    assert!(body["predictions"].is_null());
}

#[tokio::test]
async fn analyze_flows_requires_an_array() {
    let (status, _) = send(app(trained_context()), post("/analyze/flows", r#"{"src_ip": "10.0.0.1"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
