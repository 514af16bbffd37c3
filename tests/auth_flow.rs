// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 e-Docs Contributors

//! Black-box tests against a real server bound to an ephemeral port.

use base64::Engine;
use reqwest::StatusCode;
use serde_json::json;

use edocs_server::{
    api,
    auth::{hash_password, Role, RoleRegistry, TokenService},
    config::Config,
    seed,
    state::AppState,
    storage::{Db, NewAccount, UserRepository},
};

const SECRET: &str = "test-secret";
const ADMIN_PASS: &str = "Adm1n-pass!";
const EDITOR_PASS: &str = "Ed1tor-pass!";
const VIEWER_PASS: &str = "V1ewer-pass!";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
    _dir: tempfile::TempDir,
}

impl TestServer {
    /// Start a server on an ephemeral port with a fresh database seeded
    /// with one account per role.
    async fn spawn() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            jwt_secret: SECRET.to_string(),
            ..Config::default()
        };

        let db = Db::open(&config.db_path()).expect("failed to open database");
        let roles = RoleRegistry::default();
        seed::run(&db, &roles, &config).expect("seeding failed");

        let users = UserRepository::new(&db);
        for (username, password, role) in [
            ("AdminUser", ADMIN_PASS, Role::Admin),
            ("EditorUser", EDITOR_PASS, Role::Editor),
            ("ViewerUser", VIEWER_PASS, Role::Viewer),
        ] {
            users
                .create(NewAccount {
                    username: username.to_string(),
                    password_hash: hash_password(password).unwrap(),
                    role_id: roles.id_of(role).unwrap(),
                    is_active: true,
                })
                .unwrap();
        }

        let state = AppState::new(db, config);
        let app = api::router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{addr}");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            handle,
            _dir: dir,
        }
    }

    async fn login(&self, client: &reqwest::Client, username: &str, password: &str) -> String {
        let res = client
            .post(format!("{}/api/auth/login", self.base_url))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK, "login for {username} failed");
        let body: serde_json::Value = res.json().await.unwrap();
        body["data"]["token"].as_str().unwrap().to_string()
    }

    async fn audit_actions(&self, client: &reqwest::Client, admin_token: &str) -> Vec<String> {
        let res = client
            .get(format!("{}/api/audit/all?limit=500", self.base_url))
            .bearer_auth(admin_token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: serde_json::Value = res.json().await.unwrap();
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["action"].as_str().unwrap().to_string())
            .collect()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn login_issues_a_working_token() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let token = srv.login(&client, "ViewerUser", VIEWER_PASS).await;

    let res = client
        .get(format!("{}/api/auth/me", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["data"]["username"], "ViewerUser");
    assert_eq!(body["data"]["role"], "viewer");
}

#[tokio::test]
async fn three_consecutive_failures_lock_the_account() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // First two mismatches: plain 401s.
    for _ in 0..2 {
        let res = client
            .post(format!("{}/api/auth/login", srv.base_url))
            .json(&json!({ "username": "ViewerUser", "password": "wrong-P4ss!" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    // Third mismatch trips the lockout; 401, but with the lockout message.
    let res = client
        .post(format!("{}/api/auth/login", srv.base_url))
        .json(&json!({ "username": "ViewerUser", "password": "wrong-P4ss!" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("disabled after 3 failed login attempts"));

    // Even the correct password is refused now: inactive-account path, and
    // the credential is never re-evaluated.
    let res = client
        .post(format!("{}/api/auth/login", srv.base_url))
        .json(&json!({ "username": "ViewerUser", "password": VIEWER_PASS }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("inactive"));

    // The trail shows the full story: two failures, the lock, the block.
    let admin = srv.login(&client, "AdminUser", ADMIN_PASS).await;
    let actions = srv.audit_actions(&client, &admin).await;
    assert_eq!(
        actions.iter().filter(|a| *a == "LOGIN_FAILED").count(),
        2
    );
    assert_eq!(
        actions.iter().filter(|a| *a == "ACCOUNT_LOCKED").count(),
        1
    );
    assert_eq!(
        actions
            .iter()
            .filter(|a| *a == "LOGIN_BLOCKED_INACTIVE")
            .count(),
        1
    );
}

#[tokio::test]
async fn successful_login_resets_the_failure_counter() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for _ in 0..2 {
        let res = client
            .post(format!("{}/api/auth/login", srv.base_url))
            .json(&json!({ "username": "EditorUser", "password": "wrong-P4ss!" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    // A success wipes the slate.
    srv.login(&client, "EditorUser", EDITOR_PASS).await;

    // Two more failures still do not lock (counter restarted at zero).
    for _ in 0..2 {
        let res = client
            .post(format!("{}/api/auth/login", srv.base_url))
            .json(&json!({ "username": "EditorUser", "password": "wrong-P4ss!" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
    srv.login(&client, "EditorUser", EDITOR_PASS).await;
}

#[tokio::test]
async fn unknown_username_is_a_generic_401() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/auth/login", srv.base_url))
        .json(&json!({ "username": "NoSuchUser", "password": "whatever-P4ss!" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Invalid credentials.");
}

#[tokio::test]
async fn expired_and_malformed_tokens_get_distinct_messages() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // Mint an already-expired token with the server's secret.
    let expired = TokenService::new(SECRET, -3600)
        .issue(3, 1, "viewer", "ViewerUser")
        .unwrap();
    let res = client
        .get(format!("{}/api/documents", srv.base_url))
        .bearer_auth(&expired)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("session has ended"));

    // Tamper with a valid token's payload: signature check must fail.
    let valid = srv.login(&client, "ViewerUser", VIEWER_PASS).await;
    let mut parts: Vec<&str> = valid.split('.').collect();
    let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    let mut payload = engine.decode(parts[1]).unwrap();
    payload[0] ^= 0x01;
    let tampered_payload = engine.encode(&payload);
    parts[1] = &tampered_payload;
    let tampered = parts.join(".");

    let res = client
        .get(format!("{}/api/documents", srv.base_url))
        .bearer_auth(&tampered)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("Invalid token"));

    // Both rejections were audited.
    let admin = srv.login(&client, "AdminUser", ADMIN_PASS).await;
    let actions = srv.audit_actions(&client, &admin).await;
    assert_eq!(actions.iter().filter(|a| *a == "AUTH_FAILED").count(), 2);
}

#[tokio::test]
async fn missing_token_is_rejected_without_an_audit_record() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/documents", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Access denied. No token provided.");

    let admin = srv.login(&client, "AdminUser", ADMIN_PASS).await;
    let actions = srv.audit_actions(&client, &admin).await;
    assert_eq!(actions.iter().filter(|a| *a == "AUTH_FAILED").count(), 0);
}

#[tokio::test]
async fn editor_is_denied_on_admin_routes() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let editor = srv.login(&client, "EditorUser", EDITOR_PASS).await;
    let res = client
        .get(format!("{}/api/users", srv.base_url))
        .bearer_auth(&editor)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let admin = srv.login(&client, "AdminUser", ADMIN_PASS).await;
    let actions = srv.audit_actions(&client, &admin).await;
    assert_eq!(actions.iter().filter(|a| *a == "ACCESS_DENIED").count(), 1);
}

#[tokio::test]
async fn every_role_can_read_documents() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for (username, password) in [
        ("AdminUser", ADMIN_PASS),
        ("EditorUser", EDITOR_PASS),
        ("ViewerUser", VIEWER_PASS),
    ] {
        let token = srv.login(&client, username, password).await;
        let res = client
            .get(format!("{}/api/documents", srv.base_url))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK, "{username}");
    }
}

#[tokio::test]
async fn document_lifecycle_create_read_update() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let editor = srv.login(&client, "EditorUser", EDITOR_PASS).await;
    let viewer = srv.login(&client, "ViewerUser", VIEWER_PASS).await;

    // Viewer cannot create.
    let res = client
        .post(format!("{}/api/documents", srv.base_url))
        .bearer_auth(&viewer)
        .json(&json!({ "title": "Denied", "markdown_content": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Editor creates: slug derived from the title.
    let res = client
        .post(format!("{}/api/documents", srv.base_url))
        .bearer_auth(&editor)
        .json(&json!({
            "title": "Release Notes 1.0",
            "markdown_content": "# Notes\n\nInitial release.",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["data"]["slug"], "release-notes-10");
    assert_eq!(body["data"]["status"], "draft");
    let checksum = body["data"]["checksum"].as_str().unwrap().to_string();
    assert_eq!(checksum.len(), 64);

    // Duplicate title conflicts.
    let res = client
        .post(format!("{}/api/documents", srv.base_url))
        .bearer_auth(&editor)
        .json(&json!({ "title": "Release Notes 1.0", "markdown_content": "dup" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // Viewer reads by slug.
    let res = client
        .get(format!("{}/api/documents/release-notes-10", srv.base_url))
        .bearer_auth(&viewer)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Editor updates the content: checksum changes.
    let res = client
        .put(format!("{}/api/documents/release-notes-10", srv.base_url))
        .bearer_auth(&editor)
        .json(&json!({ "markdown_content": "# Notes\n\nPatched.", "status": "approved" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_ne!(body["data"]["checksum"].as_str().unwrap(), checksum);
    assert_eq!(body["data"]["status"], "approved");
}

#[tokio::test]
async fn admin_manages_accounts_and_reactivation_unlocks() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = srv.login(&client, "AdminUser", ADMIN_PASS).await;

    // Register a fresh account.
    let res = client
        .post(format!("{}/api/users", srv.base_url))
        .bearer_auth(&admin)
        .json(&json!({ "username": "NewUser1", "password": "N3w-pass!x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    let new_id = body["data"]["id"].as_u64().unwrap();
    assert_eq!(body["data"]["role_name"], "viewer");

    // Lock it out with three bad attempts.
    for _ in 0..3 {
        client
            .post(format!("{}/api/auth/login", srv.base_url))
            .json(&json!({ "username": "NewUser1", "password": "wrong-P4ss!" }))
            .send()
            .await
            .unwrap();
    }
    let res = client
        .post(format!("{}/api/auth/login", srv.base_url))
        .json(&json!({ "username": "NewUser1", "password": "N3w-pass!x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Reactivation clears the counter and restores access.
    let res = client
        .put(format!("{}/api/users/{new_id}/active", srv.base_url))
        .bearer_auth(&admin)
        .json(&json!({ "is_active": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    srv.login(&client, "NewUser1", "N3w-pass!x").await;

    // Neither the system account nor the acting admin can be deactivated.
    for id in [1u64, 2] {
        let res = client
            .put(format!("{}/api/users/{id}/active", srv.base_url))
            .bearer_auth(&admin)
            .json(&json!({ "is_active": false }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "id {id}");
    }

    // Weak passwords are rejected up front.
    let res = client
        .post(format!("{}/api/users", srv.base_url))
        .bearer_auth(&admin)
        .json(&json!({ "username": "OtherUser", "password": "short" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Deletion frees the username.
    let res = client
        .delete(format!("{}/api/users/{new_id}", srv.base_url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let res = client
        .post(format!("{}/api/auth/login", srv.base_url))
        .json(&json!({ "username": "NewUser1", "password": "N3w-pass!x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_is_public_and_always_succeeds() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // Works with no token at all, and with an undecodable one.
    for request in [
        client.post(format!("{}/api/auth/logout", srv.base_url)),
        client
            .post(format!("{}/api/auth/logout", srv.base_url))
            .bearer_auth("not-a-token"),
    ] {
        let res = request.send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    // With a token, the logout is recorded against its subject.
    let token = srv.login(&client, "ViewerUser", VIEWER_PASS).await;
    let res = client
        .post(format!("{}/api/auth/logout", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Logged out successfully.");

    // The audit write is detached; give it a moment to land.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    // Only the identified logout left a record. The anonymous requests
    // above must not have produced system-attributed entries.
    let admin = srv.login(&client, "AdminUser", ADMIN_PASS).await;
    let actions = srv.audit_actions(&client, &admin).await;
    assert_eq!(
        actions.iter().filter(|a| *a == "USER_LOGOUT").count(),
        1,
        "expected exactly one USER_LOGOUT record: {actions:?}"
    );
}

#[tokio::test]
async fn issued_token_carries_the_stored_role_name() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let token = srv.login(&client, "EditorUser", EDITOR_PASS).await;

    // The role name in the claims comes from the seeded roles table.
    let tokens = TokenService::new(SECRET, 3600);
    let claims = tokens.decode_unverified(&token).unwrap();
    assert_eq!(claims.role_name, "editor");
    assert_eq!(claims.username, "EditorUser");
}
