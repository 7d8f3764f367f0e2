use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use memehub_api::{AppState, create_router};
use memehub_auth::{JwtManager, cookie_key};
use memehub_db::{MemoryStore, NewUser, UserRole, UserStore};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    state: AppState,
}

fn spawn_app() -> TestApp {
    let store: Arc<dyn UserStore> = Arc::new(MemoryStore::new());
    let jwt = Arc::new(JwtManager::new("test-jwt-secret", 168));
    let state = AppState::new(
        store,
        jwt,
        cookie_key("test-cookie-secret"),
        chrono::Duration::hours(1),
    );

    TestApp {
        router: create_router(state.clone(), None),
        state,
    }
}

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

impl TestResponse {
    /// `name=value` part of the session cookie set by this response
    fn session_cookie(&self) -> String {
        self.set_cookie()
            .split(';')
            .next()
            .unwrap()
            .to_string()
    }

    fn set_cookie(&self) -> &str {
        self.headers
            .get(header::SET_COOKIE)
            .expect("response sets a cookie")
            .to_str()
            .unwrap()
    }
}

impl TestApp {
    async fn send(&self, method: &str, uri: &str, cookie: Option<&str>, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        TestResponse {
            status,
            headers,
            body,
        }
    }

    async fn register(&self, username: &str, email: &str, password: &str) -> TestResponse {
        self.send(
            "POST",
            "/api/v1/users/register",
            None,
            Some(json!({ "username": username, "email": email, "password": password })),
        )
        .await
    }

    async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.send(
            "POST",
            "/api/v1/users/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Register and log in, returning the session cookie
    async fn signed_in(&self, username: &str, email: &str) -> String {
        let registered = self.register(username, email, "secret").await;
        assert_eq!(registered.status, StatusCode::CREATED);
        self.login(email, "secret").await.session_cookie()
    }
}

#[tokio::test]
async fn test_first_registration_becomes_admin() {
    let app = spawn_app();

    let a = app.register("alice", "alice@example.com", "pw").await;
    assert_eq!(a.status, StatusCode::CREATED);
    assert_eq!(
        a.body,
        json!({ "name": "alice", "email": "alice@example.com", "msg": "User Created Successfully" })
    );
    let cookie = a.set_cookie();
    assert!(cookie.starts_with("user="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Path=/"));
    assert!(!cookie.contains("Max-Age"));

    let b = app.register("bob", "bob@example.com", "pw").await;
    assert_eq!(b.status, StatusCode::CREATED);

    let store = &app.state.store;
    let alice = store.get_user_by_email("alice@example.com").await.unwrap().unwrap();
    let bob = store.get_user_by_email("bob@example.com").await.unwrap().unwrap();
    assert_eq!(alice.role, UserRole::Admin);
    assert_eq!(bob.role, UserRole::Member);
}

#[tokio::test]
async fn test_register_validation() {
    let app = spawn_app();

    let missing = app
        .send(
            "POST",
            "/api/v1/users/register",
            None,
            Some(json!({ "email": "a@example.com", "password": "pw" })),
        )
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body["msg"], "Provide email, password, and username");

    app.register("a", "a@example.com", "pw").await;
    let duplicate = app.register("a2", "a@example.com", "pw").await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
    assert_eq!(duplicate.body["code"], "INVALID_INPUT");

    let oversized = app.register("b", "b@example.com", &"x".repeat(257)).await;
    assert_eq!(oversized.status, StatusCode::BAD_REQUEST);
    assert_eq!(oversized.body["msg"], "Password exceeds maximum length of 256 characters");
    assert_eq!(app.state.store.count_users().await.unwrap(), 1);
}

#[tokio::test]
async fn test_login_sets_week_long_cookie() {
    let app = spawn_app();
    app.register("alice", "alice@example.com", "pw").await;

    let response = app.login("alice@example.com", "pw").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({ "msg": "Success" }));

    let cookie = response.set_cookie();
    assert!(cookie.starts_with("user="));
    assert!(cookie.contains("Max-Age=604800"));
    assert!(cookie.contains("HttpOnly"));

    let me = app
        .send("GET", "/api/v1/users/me", Some(&response.session_cookie()), None)
        .await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body, json!({ "email": "alice@example.com", "username": "alice" }));
}

#[tokio::test]
async fn test_login_failures_look_identical() {
    let app = spawn_app();
    app.register("alice", "alice@example.com", "pw").await;

    let wrong_password = app.login("alice@example.com", "nope").await;
    let unknown_email = app.login("nobody@example.com", "pw").await;

    assert_eq!(wrong_password.status, StatusCode::NOT_FOUND);
    assert_eq!(wrong_password.status, unknown_email.status);
    assert_eq!(wrong_password.body, unknown_email.body);
    assert_eq!(wrong_password.body["msg"], "Invalid credentials");
    assert!(wrong_password.headers.get(header::SET_COOKIE).is_none());

    let missing = app
        .send("POST", "/api/v1/users/login", None, Some(json!({ "email": "alice@example.com" })))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body["msg"], "Provide email and password");
}

#[tokio::test]
async fn test_protected_routes_reject_missing_and_forged_sessions() {
    let app = spawn_app();
    app.register("alice", "alice@example.com", "pw").await;

    let anonymous = app.send("GET", "/api/v1/users/me", None, None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
    assert_eq!(anonymous.body["msg"], "You are not authenticated.");

    let forged = app
        .send("GET", "/api/v1/users/me", Some("user=not-a-token"), None)
        .await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);
    assert_eq!(forged.body, anonymous.body);
}

#[tokio::test]
async fn test_listing_is_admin_only() {
    let app = spawn_app();
    let admin = app.signed_in("alice", "alice@example.com").await;
    let member = app.signed_in("bob", "bob@example.com").await;

    let listed = app.send("GET", "/api/v1/users", Some(&admin), None).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body["n"], 2);
    let users = listed.body["users"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    for user in users {
        assert!(user.get("passwordHash").is_none());
        assert!(user.get("otpVerifyEmail").is_none());
        assert!(user.get("passwordChangeToken").is_none());
    }

    let denied = app.send("GET", "/api/v1/users", Some(&member), None).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_role_changes_apply_to_existing_sessions() {
    let app = spawn_app();
    app.signed_in("alice", "alice@example.com").await;
    let member = app.signed_in("bob", "bob@example.com").await;

    let bob = app
        .state
        .store
        .get_user_by_email("bob@example.com")
        .await
        .unwrap()
        .unwrap();
    app.state.store.delete_user(&bob.id).await.unwrap();
    app.state
        .store
        .insert_user(NewUser {
            username: bob.username,
            email: bob.email,
            password_hash: bob.password_hash,
            role: UserRole::Admin,
        })
        .await
        .unwrap();

    let listed = app.send("GET", "/api/v1/users", Some(&member), None).await;
    assert_eq!(listed.status, StatusCode::OK);
}

#[tokio::test]
async fn test_get_user_by_id() {
    let app = spawn_app();
    let admin = app.signed_in("alice", "alice@example.com").await;
    let alice = app
        .state
        .store
        .get_user_by_email("alice@example.com")
        .await
        .unwrap()
        .unwrap();

    let found = app
        .send("GET", &format!("/api/v1/users/{}", alice.id), Some(&admin), None)
        .await;
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(
        found.body,
        json!({
            "user": {
                "id": alice.id,
                "username": "alice",
                "email": "alice@example.com",
                "role": "admin",
                "isVerified": false,
            }
        })
    );

    let missing = app
        .send("GET", "/api/v1/users/does-not-exist", Some(&admin), None)
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["msg"], "User not found");
}

#[tokio::test]
async fn test_email_verification_flow() {
    let app = spawn_app();
    app.signed_in("alice", "alice@example.com").await;
    let bob = app.signed_in("bob", "bob@example.com").await;

    let issued = app.send("GET", "/api/v1/users/verify", Some(&bob), None).await;
    assert_eq!(issued.status, StatusCode::OK);
    assert_eq!(issued.body, json!({ "msg": "Verification code issued." }));

    let stored = app
        .state
        .store
        .get_user_by_email("bob@example.com")
        .await
        .unwrap()
        .unwrap();
    let code = stored.otp_verify_email.clone();
    assert_eq!(code.len(), 5);
    assert!(!issued.body.to_string().contains(&code));

    let wrong = app
        .send("POST", "/api/v1/users/verify", Some(&bob), Some(json!({ "otp": "00000" })))
        .await;
    assert_eq!(wrong.status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong.body["msg"], "Wrong OTP.");

    let missing = app
        .send("POST", "/api/v1/users/verify", Some(&bob), Some(json!({})))
        .await;
    assert_eq!(missing.body["msg"], "Provide OTP");

    let verified = app
        .send("POST", "/api/v1/users/verify", Some(&bob), Some(json!({ "otp": code })))
        .await;
    assert_eq!(verified.status, StatusCode::OK);
    assert_eq!(verified.body, json!({ "msg": "Email Verified Successfully" }));

    let stored = app
        .state
        .store
        .get_user_by_email("bob@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(stored.is_verified);
    assert!(stored.otp_verify_email.is_empty());

    let replay = app
        .send("POST", "/api/v1/users/verify", Some(&bob), Some(json!({ "otp": code })))
        .await;
    assert_eq!(replay.status, StatusCode::BAD_REQUEST);

    let again = app.send("GET", "/api/v1/users/verify", Some(&bob), None).await;
    assert_eq!(again.body, json!({ "msg": "User is already verified." }));
}

#[tokio::test]
async fn test_password_reset_flow() {
    let app = spawn_app();
    app.register("alice", "alice@example.com", "old-pw").await;

    let unknown = app
        .send(
            "POST",
            "/api/v1/users/password",
            None,
            Some(json!({ "email": "nobody@example.com" })),
        )
        .await;
    let known = app
        .send(
            "POST",
            "/api/v1/users/password",
            None,
            Some(json!({ "email": "alice@example.com" })),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::OK);
    assert_eq!(unknown.status, known.status);
    assert_eq!(unknown.body, known.body);
    assert_eq!(known.body, json!({ "msg": "Check your email!" }));

    let token = app
        .state
        .store
        .get_user_by_email("alice@example.com")
        .await
        .unwrap()
        .unwrap()
        .password_change_token;
    assert_eq!(token.len(), 32);

    let bad = app
        .send(
            "POST",
            "/api/v1/users/reset-password",
            None,
            Some(json!({ "email": "alice@example.com", "token": "nope", "newPassword": "new-pw" })),
        )
        .await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad.body["msg"], "Invalid password token");

    let done = app
        .send(
            "POST",
            "/api/v1/users/reset-password",
            None,
            Some(json!({ "email": "alice@example.com", "token": token, "newPassword": "new-pw" })),
        )
        .await;
    assert_eq!(done.status, StatusCode::OK);
    assert_eq!(done.body, json!({ "msg": "Success" }));

    assert_eq!(app.login("alice@example.com", "new-pw").await.status, StatusCode::OK);
    assert_eq!(
        app.login("alice@example.com", "old-pw").await.status,
        StatusCode::NOT_FOUND
    );

    let missing = app
        .send("POST", "/api/v1/users/password", None, Some(json!({})))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body["msg"], "Provide an Email");
}

#[tokio::test]
async fn test_member_can_delete_another_account() {
    let app = spawn_app();
    app.signed_in("alice", "alice@example.com").await;
    let member = app.signed_in("bob", "bob@example.com").await;
    let alice = app
        .state
        .store
        .get_user_by_email("alice@example.com")
        .await
        .unwrap()
        .unwrap();

    let deleted = app
        .send("DELETE", &format!("/api/v1/users/{}", alice.id), Some(&member), None)
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(
        deleted.body,
        json!({
            "user": { "name": "alice", "email": "alice@example.com" },
            "msg": "Deleted Successfully.",
        })
    );
    assert_eq!(app.state.store.count_users().await.unwrap(), 1);

    let again = app
        .send("DELETE", &format!("/api/v1/users/{}", alice.id), Some(&member), None)
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
    assert_eq!(again.body["msg"], "User not found.");
}

#[tokio::test]
async fn test_profile_update() {
    let app = spawn_app();
    app.signed_in("alice", "alice@example.com").await;
    let bob = app.signed_in("bob", "bob@example.com").await;
    let carol = app.signed_in("carol", "carol@example.com").await;
    let bob_id = app
        .state
        .store
        .get_user_by_email("bob@example.com")
        .await
        .unwrap()
        .unwrap()
        .id;

    let updated = app
        .send(
            "POST",
            &format!("/api/v1/users/update/{bob_id}"),
            Some(&bob),
            Some(json!({ "shortDescription": "meme lord" })),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["msg"], "Updated Successfully.");
    assert_eq!(updated.body["user"]["shortDescription"], "meme lord");
    assert!(updated.body["user"].get("passwordHash").is_none());

    let denied = app
        .send(
            "POST",
            &format!("/api/v1/users/update/{bob_id}"),
            Some(&carol),
            Some(json!({ "username": "hijacked" })),
        )
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = spawn_app();
    app.register("alice", "alice@example.com", "pw").await;

    let response = app.send("GET", "/api/v1/users/logout", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({ "msg": "Success" }));
    let cookie = response.set_cookie();
    assert!(cookie.starts_with("user=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_banner_health_and_fallback() {
    let app = spawn_app();

    let banner = app.send("GET", "/", None, None).await;
    assert_eq!(banner.status, StatusCode::OK);
    assert_eq!(banner.body, Value::String("Meme Project API".to_string()));

    let health = app.send("GET", "/health", None, None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["status"], "healthy");

    let missing = app.send("GET", "/no/such/route", None, None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["msg"], "Route does not exist");
}
