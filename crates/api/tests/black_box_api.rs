use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use reqwest::{header::CONTENT_TYPE, StatusCode};
use serde_json::json;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(jwt_secret: &str) -> Self {
        // Build app (same router as prod), but bind to an ephemeral port.
        let app = vulndemo_api::app::build_app(jwt_secret);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(jwt_secret: &str, claims: serde_json::Value) -> String {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn login(client: &reqwest::Client, srv: &TestServer, username: &str) -> String {
    let res = client
        .post(srv.url("/login"))
        .json(&json!({ "username": username, "password": "hunter2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

// -------------------------
// /login
// -------------------------

#[tokio::test]
async fn login_issues_token_signed_with_configured_secret() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();

    let token = login(&client, &srv, "alice").await;

    let decoded = jsonwebtoken::decode::<serde_json::Value>(
        &token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .expect("token should verify with the configured secret");

    assert_eq!(decoded.claims["username"], "alice");
    let iat = decoded.claims["iat"].as_i64().unwrap();
    let exp = decoded.claims["exp"].as_i64().unwrap();
    assert_eq!(exp - iat, 3600);
}

#[tokio::test]
async fn login_rejects_missing_or_falsy_credentials() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let bodies = [
        json!({}),
        json!({ "username": "alice" }),
        json!({ "password": "hunter2" }),
        json!({ "username": "", "password": "hunter2" }),
        json!({ "username": "alice", "password": 0 }),
        json!({ "username": null, "password": "hunter2" }),
        json!(["alice", "hunter2"]),
    ];

    for body in bodies {
        let res = client.post(srv.url("/login")).json(&body).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "body {body} should be rejected");

        let err: serde_json::Value = res.json().await.unwrap();
        assert_eq!(err["error"], "Invalid credentials");
    }
}

#[tokio::test]
async fn login_accepts_form_encoded_credentials() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/login"))
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body("username=bob&password=pw")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["token"].as_str().is_some_and(|t| t.split('.').count() == 3));
}

// -------------------------
// /protected
// -------------------------

#[tokio::test]
async fn protected_accepts_token_from_login() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let token = login(&client, &srv, "alice").await;

    let res = client
        .get(srv.url("/protected"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Access granted");
    assert_eq!(body["user"]["username"], "alice");
    assert!(body["user"]["exp"].is_number());
}

#[tokio::test]
async fn protected_without_bearer_token_reports_no_token() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/protected")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "No token provided");

    for header in ["Basic dXNlcjpwYXNz", "Bearer", "Token abc"] {
        let res = client
            .get(srv.url("/protected"))
            .header(reqwest::header::AUTHORIZATION, header)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["error"], "No token provided", "header {header:?}");
    }
}

#[tokio::test]
async fn protected_rejects_forged_expired_and_malformed_tokens_alike() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();

    let now = Utc::now();
    let forged = mint_jwt(
        "some-other-secret",
        json!({ "username": "mallory", "iat": now.timestamp(), "exp": (now + ChronoDuration::hours(1)).timestamp() }),
    );
    let expired = mint_jwt(
        jwt_secret,
        json!({
            "username": "alice",
            "iat": (now - ChronoDuration::hours(2)).timestamp(),
            "exp": (now - ChronoDuration::hours(1)).timestamp(),
        }),
    );

    for token in [forged.as_str(), expired.as_str(), "not-a-jwt"] {
        let res = client
            .get(srv.url("/protected"))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["error"], "Invalid token");
    }
}

#[tokio::test]
async fn weak_default_secret_lets_anyone_mint_tokens() {
    let srv = TestServer::spawn("weak-secret").await;
    let client = reqwest::Client::new();

    let token = mint_jwt("weak-secret", json!({ "username": "admin", "role": "root" }));

    let res = client
        .get(srv.url("/protected"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["user"]["username"], "admin");
    assert_eq!(body["user"]["role"], "root");
}

// -------------------------
// /fetch-url
// -------------------------

#[tokio::test]
async fn fetch_url_reaches_loopback_targets() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/fetch-url"))
        .json(&json!({ "url": srv.url("/health") }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn fetch_url_surfaces_upstream_status() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    // The outbound GET carries no Authorization header.
    let res = client
        .post(srv.url("/fetch-url"))
        .json(&json!({ "url": srv.url("/protected") }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Request failed with status code 401");
}

#[tokio::test]
async fn fetch_url_failures_collapse_to_500() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let bodies = [
        json!({ "url": "not a url" }),
        json!({ "url": "http://127.0.0.1:1/" }),
        json!({}),
        json!({ "url": srv.url("/does-not-exist") }),
    ];

    for body in bodies {
        let res = client.post(srv.url("/fetch-url")).json(&body).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR, "body {body}");

        let err: serde_json::Value = res.json().await.unwrap();
        assert!(
            err["error"].as_str().is_some_and(|m| !m.is_empty()),
            "expected an error message for {body}"
        );
    }
}

// -------------------------
// /render-template
// -------------------------

#[tokio::test]
async fn render_template_interpolates_data() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/render-template"))
        .json(&json!({ "template": "Hello <%= name %>!", "data": { "name": "World" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let content_type = res.headers()[CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"));
    assert_eq!(res.text().await.unwrap(), "Hello World!");
}

#[tokio::test]
async fn render_template_executes_injected_expressions() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/render-template"))
        .json(&json!({ "template": "<%= 7 * 7 %>" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "49");
}

#[tokio::test]
async fn render_template_failures_are_500_with_message() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/render-template"))
        .json(&json!({ "template": "<%= unclosed", "data": {} }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Could not find matching close tag for \"<%=\".");

    let res = client
        .post(srv.url("/render-template"))
        .json(&json!({ "data": {} }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// -------------------------
// /parse-data
// -------------------------

#[tokio::test]
async fn parse_data_echoes_json_bodies() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let payload = json!({ "a": { "b": [1, 2, { "c": null }] }, "flag": true });
    let res = client
        .post(srv.url("/parse-data"))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Data parsed successfully");
    assert_eq!(body["received"], payload);
}

#[tokio::test]
async fn parse_data_expands_bracket_notation_form_keys() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/parse-data"))
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body("user[name]=eve&user[roles][]=admin&user[roles][]=ops&__proto__[polluted]=yes")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(
        body["received"],
        json!({
            "user": { "name": "eve", "roles": ["admin", "ops"] },
            "__proto__": { "polluted": "yes" }
        })
    );
}

#[tokio::test]
async fn parse_data_nests_deep_and_repeated_form_keys() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/parse-data"))
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body("a[b][c][d][e][f][g]=deep&list[0]=x&list[0]=y&big[99]=z")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(
        body["received"],
        json!({
            "a": { "b": { "c": { "d": { "e": { "f": { "g": "deep" } } } } } },
            "list": [["x", "y"]],
            "big": ["z"]
        })
    );
}

#[tokio::test]
async fn parse_data_refuses_more_than_a_thousand_form_parameters() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let body = (0..1001).map(|i| format!("k{i}=v")).collect::<Vec<_>>().join("&");
    let res = client
        .post(srv.url("/parse-data"))
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let err: serde_json::Value = res.json().await.unwrap();
    assert_eq!(err["error"], "too many parameters");
}

#[tokio::test]
async fn malformed_and_oversized_bodies_are_rejected() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/parse-data"))
        .header(CONTENT_TYPE, "application/json")
        .body("{oops")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    for scalar in ["123", "\"x\""] {
        let res = client
            .post(srv.url("/parse-data"))
            .header(CONTENT_TYPE, "application/json")
            .body(scalar)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "body {scalar}");

        let err: serde_json::Value = res.json().await.unwrap();
        assert!(err["error"].as_str().is_some_and(|m| m.starts_with("Unexpected token")));
    }

    let big = json!({ "blob": "x".repeat(200 * 1024) });
    let res = client.post(srv.url("/parse-data")).json(&big).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

// -------------------------
// /health
// -------------------------

#[tokio::test]
async fn health_reports_current_iso_timestamp() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let before = Utc::now() - ChronoDuration::seconds(5);
    let res = client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    let ts = chrono::DateTime::parse_from_rfc3339(body["timestamp"].as_str().unwrap())
        .expect("timestamp should be ISO-8601");
    assert!(ts.with_timezone(&Utc) >= before);
}
