//! Axum router configuration with middleware.
//!
//! REST routes live under `/api/v1/`, agent RPCs under `/rpc/v1/`.
//! Middleware: CORS, tracing.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use exprflow_types::rpc::{GET_TASK_PATH, SUBMIT_RESULT_PATH};

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/calculate", post(handlers::expression::calculate))
        .route("/expressions", get(handlers::expression::list_expressions))
        .route("/expressions/{id}", get(handlers::expression::get_expression))
        .route("/health", get(health_check));

    Router::new()
        .nest("/api/v1", api_routes)
        .route(GET_TASK_PATH, post(handlers::rpc::get_task))
        .route(SUBMIT_RESULT_PATH, post(handlers::rpc::submit_result))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /api/v1/health - Health check with a database ping (no auth required).
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let (status, database) = match state.db_pool.ping().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!(error = %e, "health check database ping failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };

    (
        status,
        Json(serde_json::json!({
            "status": if status == StatusCode::OK { "ok" } else { "degraded" },
            "database": database,
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::time::Duration;

    use super::*;
    use exprflow_core::repository::user::UserRepository;
    use exprflow_core::worker::{Agent, TaskTransport, WorkerSettings};
    use exprflow_infra::rpc::HttpTaskTransport;
    use exprflow_infra::sqlite::pool::DatabasePool;
    use exprflow_types::config::{OperationDurations, ServiceConfig};
    use exprflow_types::rpc::TaskReport;
    use serde_json::Value;
    use tokio_util::sync::CancellationToken;

    struct Server {
        _dir: tempfile::TempDir,
        addr: SocketAddr,
        api_key: String,
        http: reqwest::Client,
    }

    impl Server {
        fn url(&self, path: &str) -> String {
            format!("http://{}{}", self.addr, path)
        }

        async fn submit(&self, expression: &str) -> reqwest::Response {
            self.http
                .post(self.url("/api/v1/calculate"))
                .bearer_auth(&self.api_key)
                .json(&serde_json::json!({ "expression": expression }))
                .send()
                .await
                .unwrap()
        }

        async fn expression(&self, id: i64) -> Value {
            self.http
                .get(self.url(&format!("/api/v1/expressions/{id}")))
                .header("x-api-key", &self.api_key)
                .send()
                .await
                .unwrap()
                .json::<Value>()
                .await
                .unwrap()["data"]
                .clone()
        }
    }

    async fn spawn_server() -> Server {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
        let pool = DatabasePool::new(&url).await.unwrap();
        let state = AppState::from_parts(pool, ServiceConfig::default(), dir.path().to_path_buf());
        let api_key = state.users.create_user("tester").await.unwrap().api_key;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = build_router(state);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Server {
            _dir: dir,
            addr,
            api_key,
            http: reqwest::Client::new(),
        }
    }

    #[tokio::test]
    async fn test_health_needs_no_key() {
        let server = spawn_server().await;
        let resp = server.http.get(server.url("/api/v1/health")).send().await.unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], "ok");
    }

    #[tokio::test]
    async fn test_rest_routes_require_key() {
        let server = spawn_server().await;
        let resp = server
            .http
            .get(server.url("/api/v1/expressions"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);

        let resp = server
            .http
            .get(server.url("/api/v1/expressions"))
            .bearer_auth("exf_not_a_key")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);
    }

    #[tokio::test]
    async fn test_compile_error_is_422_with_code() {
        let server = spawn_server().await;
        let resp = server.submit("(1 + 2").await;
        assert_eq!(resp.status(), 422);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["errors"][0]["code"], "unclosed-parenthesis");
    }

    #[tokio::test]
    async fn test_unknown_expression_is_404() {
        let server = spawn_server().await;
        let resp = server
            .http
            .get(server.url("/api/v1/expressions/77"))
            .bearer_auth(&server.api_key)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn test_rpc_round_trip() {
        let server = spawn_server().await;
        let transport = HttpTaskTransport::new(server.url(""));

        assert!(transport.get_task().await.unwrap().is_none());

        let resp = server.submit("6 / 3").await;
        assert_eq!(resp.status(), 201);
        let id = resp.json::<Value>().await.unwrap()["data"]["id"].as_i64().unwrap();

        let task = transport.get_task().await.unwrap().unwrap();
        assert_eq!(task.operation, "/");
        assert_eq!(task.args, [Some(6.0), Some(3.0)]);
        assert_eq!(task.expression_id, id);
        assert_eq!(server.expression(id).await["status"], "processing");

        transport
            .submit_result(&TaskReport::success(task.id, id, 2.0))
            .await
            .unwrap();

        let expr = server.expression(id).await;
        assert_eq!(expr["status"], "completed");
        assert_eq!(expr["result"], 2.0);
    }

    #[tokio::test]
    async fn test_malformed_report_is_400() {
        let server = spawn_server().await;
        let resp = server
            .http
            .post(server.url(SUBMIT_RESULT_PATH))
            .body(vec![0xc1u8])
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
    }

    #[tokio::test]
    async fn test_agent_evaluates_submitted_expressions() {
        let server = spawn_server().await;
        let ok = server.submit("2 + 3 * (4 - 1)").await.json::<Value>().await.unwrap()["data"]["id"]
            .as_i64()
            .unwrap();
        let inf = server.submit("1000 ^ 1000").await.json::<Value>().await.unwrap()["data"]["id"]
            .as_i64()
            .unwrap();

        let settings = WorkerSettings {
            poll_interval: Duration::from_millis(10),
            error_backoff: Duration::from_millis(10),
            durations: OperationDurations::uniform(5),
        };
        let agent = Agent::new(HttpTaskTransport::new(server.url("")), settings, 2);
        let cancel = CancellationToken::new();
        let handle = {
            let cancel = cancel.clone();
            tokio::spawn(async move { agent.run(cancel).await })
        };

        let mut finished = false;
        for _ in 0..200 {
            let a = server.expression(ok).await;
            let b = server.expression(inf).await;
            if a["status"] == "completed" && b["status"] == "error" {
                assert_eq!(a["result"], 11.0);
                assert_eq!(b["error"], "result is +Inf");
                finished = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        cancel.cancel();
        handle.await.unwrap().unwrap();
        assert!(finished, "expressions did not finish in time");
    }
}
