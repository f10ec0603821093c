//! Admin API.
//!
//! # Endpoints
//! - `GET /admin/status`: daemon and server state
//! - `GET /admin/config`: committed aggregate text
//! - `GET /admin/rules`: configured rewrite rules
//!
//! All endpoints require `Authorization: Bearer <api_key>`.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::daemon::StatusHandle;
use crate::synthesis::RuleSet;
use self::auth::admin_auth_middleware;
use self::handlers::*;

/// State shared by admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub status: StatusHandle,
    pub api_key: Arc<str>,
    pub rules: Arc<Vec<RuleSummary>>,
}

impl AdminState {
    pub fn new(status: StatusHandle, api_key: &str, rules: &RuleSet) -> Self {
        let rules = rules
            .rules()
            .iter()
            .map(|rule| RuleSummary {
                source: rule.source_glob().to_string(),
                pattern: rule.pattern().to_string(),
                default_template: rule
                    .default_template()
                    .map(|p| p.to_string_lossy().into_owned()),
            })
            .collect();
        Self {
            status,
            api_key: Arc::from(api_key),
            rules: Arc::new(rules),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/config", get(get_config))
        .route("/admin/rules", get(get_rules))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the admin API until shutdown.
pub async fn serve(
    listener: TcpListener,
    state: AdminState,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Admin API listening");

    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;

    tracing::info!("Admin API stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthesis::RewriteRule;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn state() -> AdminState {
        let mut rules = RuleSet::new();
        rules.push(RewriteRule::new("/srv/*", "example.com:@1.internal", None).unwrap());
        AdminState::new(StatusHandle::new(), "secret", &rules)
    }

    fn get(uri: &str, key: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(key) = key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_requires_api_key() {
        let app = setup_admin_router(state());
        let res = app.clone().oneshot(get("/admin/status", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = app.oneshot(get("/admin/status", Some("wrong"))).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_status_and_rules() {
        let app = setup_admin_router(state());

        let res = app
            .clone()
            .oneshot(get("/admin/status", Some("secret")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = axum::body::to_bytes(res.into_body(), 1 << 20).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["server"], "stopped");
        assert_eq!(json["passes"], 0);

        let res = app.oneshot(get("/admin/rules", Some("secret"))).await.unwrap();
        let body = axum::body::to_bytes(res.into_body(), 1 << 20).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json[0]["pattern"], "example.com:@1.internal");
        assert!(json[0]["default_template"].is_null());
    }

    #[tokio::test]
    async fn test_config_is_plain_text() {
        let state = state();
        state.status.publish_committed("a.com {\n    root /srv/a\n}\n");
        let app = setup_admin_router(state);

        let res = app.oneshot(get("/admin/config", Some("secret"))).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = axum::body::to_bytes(res.into_body(), 1 << 20).await.unwrap();
        assert_eq!(&body[..], b"a.com {\n    root /srv/a\n}\n");
    }
}
