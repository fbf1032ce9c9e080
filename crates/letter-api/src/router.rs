use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use tower_http::services::ServeDir;

use crate::auth::{self, AppState};
use crate::middleware::require_auth;
use crate::{accounts, friends, messages};

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/health", get(health));

    let protected_routes = Router::new()
        .route("/users/me", get(accounts::me))
        .route("/users/me/avatar", put(accounts::upload_avatar))
        .route("/users/search", get(accounts::search))
        .route("/users/{id}", get(accounts::get_account))
        .route("/friends", get(friends::list_friends).post(friends::add_friend))
        .route("/friends/{friend_id}", delete(friends::delete_friend))
        .route(
            "/messages/{other_id}",
            get(messages::get_messages).post(messages::send_message),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .nest_service("/avatars", ServeDir::new(&state.upload_dir))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Method, Request, StatusCode, header},
    };
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use uuid::Uuid;

    use letter_core::Core;
    use letter_crypto::credential::Params;
    use letter_crypto::{CredentialCodec, TokenKeys};
    use letter_db::Database;

    use super::*;
    use crate::auth::AppStateInner;

    struct TestApp {
        app: Router,
        upload_dir: PathBuf,
    }

    impl TestApp {
        fn new() -> Self {
            let codec = CredentialCodec::with_params(b"letter-test-salt", Params::new(8, 1, 1, None).unwrap())
                .unwrap();
            let tokens = TokenKeys::new(b"letter-test-signing-key", chrono::Duration::hours(1));
            let core = Core::new(Database::open_in_memory().unwrap(), codec, tokens);
            let upload_dir = std::env::temp_dir().join(format!("letter-api-test-{}", Uuid::new_v4()));

            let state = Arc::new(AppStateInner {
                core,
                upload_dir: upload_dir.clone(),
            });
            Self {
                app: router(state),
                upload_dir,
            }
        }

        async fn call(&self, req: Request<Body>) -> (StatusCode, Value) {
            let resp = self.app.clone().oneshot(req).await.unwrap();
            let status = resp.status();
            let bytes = resp.into_body().collect().await.unwrap().to_bytes();
            let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, body)
        }

        async fn json(&self, method: Method, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
            let mut req = Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json");
            if let Some(token) = token {
                req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
            }
            self.call(req.body(Body::from(body.to_string())).unwrap()).await
        }

        async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
            let mut req = Request::builder().uri(uri);
            if let Some(token) = token {
                req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
            }
            self.call(req.body(Body::empty()).unwrap()).await
        }

        async fn signup(&self, name: &str) -> (i64, String) {
            let creds = json!({ "name": name, "password": format!("pw-{}", name) });
            let (status, body) = self.json(Method::POST, "/auth/register", None, creds.clone()).await;
            assert_eq!(status, StatusCode::CREATED);
            let id = body["id"].as_i64().unwrap();

            let (status, body) = self.json(Method::POST, "/auth/login", None, creds).await;
            assert_eq!(status, StatusCode::OK);
            (id, body["token"].as_str().unwrap().to_string())
        }
    }

    impl Drop for TestApp {
        fn drop(&mut self) {
            std::fs::remove_dir_all(&self.upload_dir).ok();
        }
    }

    #[tokio::test]
    async fn protected_routes_require_a_valid_token() {
        let t = TestApp::new();

        let (status, body) = t.get("/friends", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid token");

        let (status, _) = t.get("/users/me", Some("definitely.not.valid")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = t.get("/health", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn non_bearer_authorization_is_unauthorized() {
        let t = TestApp::new();
        let req = Request::builder()
            .uri("/friends")
            .header(header::AUTHORIZATION, "Basic abc")
            .body(Body::empty())
            .unwrap();

        let (status, body) = t.call(req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "invalid token" }));
    }

    #[tokio::test]
    async fn malformed_input_is_a_json_validation_error() {
        let t = TestApp::new();
        let (_, token) = t.signup("anna").await;

        let missing = json!({ "name": "bob" });
        let (status, body) = t.json(Method::POST, "/auth/register", None, missing).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("password"));

        let extra = json!({ "name": "bob", "password": "pw", "admin": true });
        let (status, body) = t.json(Method::POST, "/auth/register", None, extra).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, body) = t.get("/users/abc", Some(&token)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, body) = t.json(Method::POST, "/messages/abc", Some(&token), json!({ "body": "hi" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, body) = t.json(Method::POST, "/friends", Some(&token), json!({ "friend_id": "x" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn registration_and_login_failures() {
        let t = TestApp::new();
        t.signup("anna").await;

        let dup = json!({ "name": "anna", "password": "whatever" });
        let (status, body) = t.json(Method::POST, "/auth/register", None, dup).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "user already exists");

        let wrong = json!({ "name": "anna", "password": "wrong" });
        let (status, _) = t.json(Method::POST, "/auth/login", None, wrong).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn friends_and_messages_flow() {
        let t = TestApp::new();
        let (anna, anna_token) = t.signup("anna").await;
        let (bob, bob_token) = t.signup("bob").await;

        let (status, body) = t.get("/users/me", Some(&anna_token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "anna");

        let add = json!({ "friend_id": bob });
        let (status, _) = t.json(Method::POST, "/friends", Some(&anna_token), add.clone()).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = t.json(Method::POST, "/friends", Some(&anna_token), add).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "already friends");

        let (_, friends) = t.get("/friends", Some(&anna_token)).await;
        assert_eq!(friends, json!([{ "id": bob, "name": "bob", "avatar": null }]));
        let (_, friends) = t.get("/friends", Some(&bob_token)).await;
        assert_eq!(friends, json!([]));

        let uri = format!("/messages/{}", bob);
        let (status, _) = t.json(Method::POST, &uri, Some(&anna_token), json!({ "body": "hi" })).await;
        assert_eq!(status, StatusCode::CREATED);
        let uri = format!("/messages/{}", anna);
        let (status, _) = t.json(Method::POST, &uri, Some(&bob_token), json!({ "body": "yo" })).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, convo) = t.get(&uri, Some(&bob_token)).await;
        assert_eq!(status, StatusCode::OK);
        let convo = convo.as_array().unwrap();
        assert_eq!(convo.len(), 2);
        assert_eq!(convo[0]["body"], "hi");
        assert_eq!(convo[0]["sender_id"], anna);
        assert_eq!(convo[1]["body"], "yo");
        assert_eq!(convo[1]["created_at"].as_str().unwrap().len(), 19);

        let uri = format!("/friends/{}", bob);
        for _ in 0..2 {
            let (status, _) = t.json(Method::DELETE, &uri, Some(&anna_token), Value::Null).await;
            assert_eq!(status, StatusCode::NO_CONTENT);
        }
        let (_, friends) = t.get("/friends", Some(&anna_token)).await;
        assert_eq!(friends, json!([]));
    }

    #[tokio::test]
    async fn search_by_fragment() {
        let t = TestApp::new();
        let (_, token) = t.signup("Anna").await;
        t.signup("Dan").await;
        t.signup("Bob").await;

        let (status, body) = t.get("/users/search?name=an", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["Anna", "Dan"]);

        let (status, _) = t.get("/users/search?name=", Some(&token)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn avatar_upload_is_stored_and_served() {
        let t = TestApp::new();
        let (anna, token) = t.signup("anna").await;
        let png = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

        let upload = |content_type: &'static str, bytes: Vec<u8>| {
            Request::builder()
                .method(Method::PUT)
                .uri("/users/me/avatar")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(bytes))
                .unwrap()
        };

        let (status, _) = t.call(upload("image/svg+xml", png.clone())).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let (status, _) = t.call(upload("image/png", Vec::new())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = t.call(upload("image/png", png.clone())).await;
        assert_eq!(status, StatusCode::OK);
        let avatar = body["avatar"].as_str().unwrap().to_string();
        assert!(avatar.ends_with(".png"));
        assert_eq!(std::fs::read(t.upload_dir.join(&avatar)).unwrap(), png);

        let (_, body) = t.get(&format!("/users/{}", anna), Some(&token)).await;
        assert_eq!(body["avatar"], avatar.as_str());

        let resp = t
            .app
            .clone()
            .oneshot(Request::builder().uri(format!("/avatars/{}", avatar)).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let jpeg = vec![0xff, 0xd8, 0xff, 0xe0];
        let (status, body) = t.call(upload("image/jpeg", jpeg.clone())).await;
        assert_eq!(status, StatusCode::OK);
        let replacement = body["avatar"].as_str().unwrap().to_string();
        assert_ne!(replacement, avatar);
        assert_eq!(std::fs::read(t.upload_dir.join(&replacement)).unwrap(), jpeg);
        assert!(!t.upload_dir.join(&avatar).exists());
    }
}
