//! Webhook receiver and liveness endpoints.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use teloxide::types::Update;
use tracing::{error, warn};

use crate::bot::{self, AppState};
use crate::webhook::WEBHOOK_PATH;

/// Header the platform echoes the registered secret token in.
const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

#[derive(Debug, Serialize)]
struct Health {
    ok: bool,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(WEBHOOK_PATH, post(receive_update))
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .with_state(state)
}

/// Acknowledge right away and handle the update on its own task, so slow
/// processing never triggers redelivery.
async fn receive_update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if let Some(secret) = &state.webhook_secret {
        let presented = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
        if presented != Some(secret.as_str()) {
            warn!("Rejected webhook call with missing or wrong secret token");
            return StatusCode::UNAUTHORIZED;
        }
    }

    // Decode straight from the body: teloxide's `Update` does not round-trip
    // through `serde_json::Value`.
    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            error!("handleUpdate error: malformed update body: {}", e);
            return StatusCode::OK;
        }
    };

    tokio::spawn(async move {
        if let Err(e) = bot::dispatch(&state, update).await {
            error!("handleUpdate error: {:#}", e);
        }
    });

    StatusCode::OK
}

async fn root() -> &'static str {
    "OK"
}

async fn healthz() -> Json<Health> {
    Json(Health { ok: true })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::platform::testing::RecordingPlatform;
    use crate::platform::{ButtonTarget, OutgoingMessage};
    use crate::reply::deep_link;
    use axum::body::Body;
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt as _;
    use url::Url;

    fn config(secret: Option<&str>) -> Config {
        Config {
            bot_token: "t".to_string(),
            public_url: "https://bot.example.com".to_string(),
            webapp_url: Url::parse("https://pastorjeff.netlify.app").unwrap(),
            port: 3000,
            allowed_chats: vec![GROUP.to_string()],
            bot_username: "PastorJeffBot".to_string(),
            webhook_secret: secret.map(str::to_string),
        }
    }

    fn app(platform: Arc<RecordingPlatform>, secret: Option<&str>) -> Router {
        router(Arc::new(AppState::new(&config(secret), platform)))
    }

    fn post_update(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/bot")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    const GROUP: i64 = -1002490222362;

    const GROUP_COMMAND_UPDATE: &str = r#"{
        "update_id": 2,
        "message": {
            "message_id": 11,
            "date": 1700000000,
            "chat": { "id": -1002490222362, "type": "supergroup", "title": "CHeRCH" },
            "from": { "id": 7, "is_bot": false, "first_name": "Bo" },
            "text": "/call_pastor_jeff",
            "entities": [{ "type": "bot_command", "offset": 0, "length": 17 }]
        }
    }"#;

    const INTENT_UPDATE: &str = r#"{
        "update_id": 1,
        "message": {
            "message_id": 10,
            "date": 1700000000,
            "chat": { "id": 555, "type": "private", "first_name": "Ann" },
            "from": { "id": 555, "is_bot": false, "first_name": "Ann" },
            "text": "call pastor jeff"
        }
    }"#;

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_root_ok() {
        let app = app(Arc::new(RecordingPlatform::default()), None);
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "OK");
    }

    #[tokio::test]
    async fn test_healthz_json() {
        let app = app(Arc::new(RecordingPlatform::default()), None);
        let response = app
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json, serde_json::json!({ "ok": true }));
    }

    #[tokio::test]
    async fn test_invalid_json_still_acknowledged() {
        let platform = Arc::new(RecordingPlatform::default());
        let response = app(platform.clone(), None)
            .oneshot(post_update("{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.is_empty());
        assert!(platform.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_update_still_acknowledged() {
        let platform = Arc::new(RecordingPlatform::default());
        let response = app(platform.clone(), None)
            .oneshot(post_update(r#"{"unexpected": true}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_update_dispatched_in_background() {
        let platform = Arc::new(RecordingPlatform::default());
        let response = app(platform.clone(), None)
            .oneshot(post_update(INTENT_UPDATE))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let sent = wait_for_reply(&platform).await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, 555);
        assert!(matches!(sent[0].1.target, ButtonTarget::WebApp(_)));
    }

    async fn wait_for_reply(platform: &RecordingPlatform) -> Vec<(i64, OutgoingMessage)> {
        for _ in 0..100 {
            let sent = platform.sent().await;
            if !sent.is_empty() {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        platform.sent().await
    }

    #[tokio::test]
    async fn test_group_command_gets_deep_link() {
        let platform = Arc::new(RecordingPlatform::default());
        let response = app(platform.clone(), None)
            .oneshot(post_update(GROUP_COMMAND_UPDATE))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let sent = wait_for_reply(&platform).await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, GROUP);
        assert_eq!(
            sent[0].1.target,
            ButtonTarget::Link(deep_link("PastorJeffBot").unwrap())
        );
    }

    #[tokio::test]
    async fn test_wrong_secret_rejected() {
        let platform = Arc::new(RecordingPlatform::default());
        let response = app(platform.clone(), Some("s3cret"))
            .oneshot(post_update(INTENT_UPDATE))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(platform.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_matching_secret_accepted() {
        let platform = Arc::new(RecordingPlatform::default());
        let mut request = post_update(INTENT_UPDATE);
        request
            .headers_mut()
            .insert(SECRET_HEADER, "s3cret".parse().unwrap());

        let response = app(platform, Some("s3cret"))
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
