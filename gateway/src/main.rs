use anyhow::Result;
use axum::{
    routing::{get, post},
    Json, Router,
};
use risk_engine::{EngineConfig, RiskEngine};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod routes;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RiskEngine>,
    /// One refresh at a time; a second caller waits for the first
    pub refresh_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(engine: RiskEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            refresh_lock: Arc::new(Mutex::new(())),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let risk_routes = Router::new()
        .route(
            "/suppliers",
            get(routes::list_suppliers).put(routes::upload_suppliers),
        )
        .route("/suppliers/:name/breakdown", get(routes::get_breakdown))
        .route("/suppliers/:name/alternatives", get(routes::get_alternatives))
        .route("/suppliers/:name/recommendations", get(routes::get_recommendations))
        .route("/suppliers/:name/predictions", get(routes::get_predictions))
        .route("/scores/recompute", post(routes::recompute_scores))
        .route("/events", get(routes::list_events))
        .route("/events/refresh", post(routes::refresh_events))
        .route("/countdowns", get(routes::list_countdowns))
        .route("/map", get(routes::supplier_map))
        .with_state(state);

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", risk_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "risk_gateway=debug,risk_engine=info,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = EngineConfig::from_env();
    tracing::info!("   Data directory: {}", config.data_dir.display());
    tracing::info!(
        "   Semantic filter: {}",
        if config.oracle.is_some() { "enabled" } else { "keyword layers only" }
    );
    let engine = RiskEngine::from_config(config)?;
    let app = build_router(AppState::new(engine));

    let port = std::env::var("RISK_GATEWAY_PORT")
        .or_else(|_| std::env::var("PORT"))
        .unwrap_or_else(|_| "18640".to_string());
    let addr = format!("0.0.0.0:{}", port);

    tracing::info!("Risk gateway starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "risk-gateway",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn make_app() -> Router {
        build_router(AppState::new(RiskEngine::in_memory(EngineConfig::default())))
    }

    async fn read_body(resp: axum::http::Response<Body>) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let resp = make_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(read_body(resp).await["service"], "risk-gateway");
    }

    #[tokio::test]
    async fn upload_rejects_duplicate_names() {
        let body = serde_json::json!([
            {"name": "Acme", "country": "China"},
            {"name": "Acme", "country": "Vietnam"}
        ]);
        let resp = make_app()
            .oneshot(json_request("PUT", "/api/v1/suppliers", body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn breakdown_for_unknown_supplier_is_not_found() {
        let resp = make_app()
            .oneshot(
                Request::get("/api/v1/suppliers/Nobody/breakdown")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn outlook_for_unknown_supplier_is_not_found() {
        let app = make_app();
        for uri in [
            "/api/v1/suppliers/Nobody/recommendations",
            "/api/v1/suppliers/Nobody/predictions",
        ] {
            let resp = app
                .clone()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", uri);
        }
    }

    #[tokio::test]
    async fn upload_refresh_recompute_breakdown() {
        let app = make_app();

        let upload = serde_json::json!([
            {"Supplier Name": "Acme Electronics", "Category": "Electronics", "City": "Shenzhen", "Country": "China", "Tier": 1},
            {"Supplier Name": "Euro Components", "Category": "Electronics", "City": "Munich", "Country": "Germany", "Tier": 2}
        ]);
        let resp = app
            .clone()
            .oneshot(json_request("PUT", "/api/v1/suppliers", upload))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(read_body(resp).await["suppliers"], 2);

        let published = chrono::Utc::now() - chrono::Duration::hours(6);
        let refresh = serde_json::json!({
            "articles": [
                {"title": "Port strike shuts Shenzhen terminal", "published": published.to_rfc3339()},
                {"title": "Football final tickets sell out"}
            ]
        });
        let resp = app
            .clone()
            .oneshot(json_request("POST", "/api/v1/events/refresh", refresh))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let report = read_body(resp).await;
        assert_eq!(report["report"]["stored"], 1);
        assert!(report["run_id"].is_string());

        let resp = app
            .clone()
            .oneshot(json_request("POST", "/api/v1/scores/recompute", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let scored = read_body(resp).await;
        assert_eq!(scored["suppliers"].as_array().unwrap().len(), 2);

        let resp = app
            .clone()
            .oneshot(
                Request::get("/api/v1/suppliers/Acme%20Electronics/breakdown")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let breakdown = read_body(resp).await;
        assert_eq!(breakdown["supplier"], "Acme Electronics");
        assert!(breakdown["score"].as_f64().unwrap() > 0.0);

        let resp = app
            .clone()
            .oneshot(
                Request::get("/api/v1/suppliers/Acme%20Electronics/alternatives")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let alternatives = read_body(resp).await;
        assert_eq!(alternatives["internal_alternatives"][0]["name"], "Euro Components");

        let resp = app
            .clone()
            .oneshot(
                Request::get("/api/v1/suppliers/Acme%20Electronics/recommendations")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let plan = read_body(resp).await;
        assert_eq!(plan["disruption_types"][0], "labor_strike");
        assert_eq!(plan["actions"][0]["action"], "Confirm Strike Scope with Supplier");
        assert!(plan["urgency"].is_string());

        let resp = app
            .oneshot(
                Request::get("/api/v1/suppliers/Acme%20Electronics/predictions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let outlook = read_body(resp).await;
        assert_eq!(outlook["horizons"].as_array().unwrap().len(), 3);
        assert_eq!(outlook["horizons"][0]["timeframe"], "72 hours");
    }
}
