use axum::extract::{Path, RawQuery};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use bespoke_adapters::{CoordinatorClient, HttpWorkerClient};
use bespoke_core::{Status, TransportError, WorkerClient, WorkerFamily};
use serde_json::{json, Value};

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn worker_app() -> Router {
    Router::new().route("/api/v1/:family",
                        post(|Path(family): Path<String>, Json(body): Json<Value>| async move {
                            if body.get("smiles").is_none() {
                                return Err((StatusCode::UNPROCESSABLE_ENTITY, "missing smiles".to_string()));
                            }
                            Ok(Json(json!({"id": format!("{family}-1"), "type": "fragmentation"})))
                        }).get(|RawQuery(q): RawQuery| async move {
                              let q = q.unwrap_or_default();
                              let ids: Vec<Value> = q.split('&')
                                                     .filter_map(|p| p.strip_prefix("ids="))
                                                     .map(|id| json!({"id": id, "type": "hessian", "status": "waiting"}))
                                                     .collect();
                              Json(Value::Array(ids))
                          }))
                 .route("/api/v1/:family/:id",
                        get(|Path((_family, id)): Path<(String, String)>| async move {
                            if id == "broken" {
                                return Err((StatusCode::BAD_GATEWAY, "upstream down".to_string()));
                            }
                            Ok(Json(json!({"id": id, "type": "fragmentation", "status": "success", "result": {"ok": true}})))
                        }))
}

#[tokio::test]
async fn worker_client_speaks_the_job_protocol() {
    let base = serve(worker_app()).await;
    let client = HttpWorkerClient::new(&base, "/api/v1").unwrap();

    let handle = client.submit(WorkerFamily::Fragmentations, &json!({"smiles": "CCO"})).await.unwrap();
    assert_eq!(handle.id, "fragmentations-1");

    let report = client.report(WorkerFamily::Fragmentations, "abc").await.unwrap();
    assert_eq!(report.status, Status::Success);
    assert_eq!(report.result, Some(json!({"ok": true})));

    let many = client.report_many(WorkerFamily::QcCalcs, &["a".into(), "b".into()]).await.unwrap();
    let ids: Vec<_> = many.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[tokio::test]
async fn non_success_responses_keep_status_and_body() {
    let base = serve(worker_app()).await;
    let client = HttpWorkerClient::new(&base, "api/v1").unwrap();

    let err = client.submit(WorkerFamily::Fragmentations, &json!({})).await.unwrap_err();
    assert_eq!(err, TransportError::Status { status: 422, body: "missing smiles".into() });
    assert!(!err.is_transient());

    let err = client.report(WorkerFamily::Fragmentations, "broken").await.unwrap_err();
    assert!(err.is_transient());
    assert!(err.to_string().contains("upstream down"));
}

#[tokio::test]
async fn unreachable_service_is_a_transient_connection_error() {
    // puerto reservado y liberado: nadie escucha
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpWorkerClient::new(&format!("http://{addr}"), "/api/v1").unwrap();
    let err = client.report(WorkerFamily::QcCalcs, "x").await.unwrap_err();
    assert!(matches!(err, TransportError::Connection(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn coordinator_client_submits_and_lists() {
    let app = Router::new().route("/api/v1/optimizations",
                                  post(|Json(body): Json<Value>| async move {
                                      assert!(body.get("input_schema").is_some());
                                      (StatusCode::CREATED, Json(json!({"id": "1", "self": "/api/v1/optimizations/1"})))
                                  }).get(|RawQuery(q): RawQuery| async move {
                                        let q = q.unwrap_or_default();
                                        assert!(q.contains("status=errored"));
                                        Json(json!([{"id": "1", "self": "/api/v1/optimizations/1", "status": "errored"}]))
                                    }));
    let base = serve(app).await;
    let client = CoordinatorClient::new(&base, "/api/v1").unwrap();

    let created = client.submit(json!({"smiles": "CCO"})).await.unwrap();
    assert_eq!(created.id, "1");
    assert_eq!(created.self_link, "/api/v1/optimizations/1");

    let listed = client.list(Some(Status::Errored), 0, 10).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].status, Status::Errored);
}
