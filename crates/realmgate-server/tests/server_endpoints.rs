use std::collections::BTreeMap;

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use realmgate_auth::config::{PrincipalConfig, RealmConfig, RealmKind};
use realmgate_auth::password::hash_password;
use realmgate_server::{AppConfig, build_app};
use serde_json::Value;
use tokio::task::JoinHandle;

fn test_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.auth.issuer = "PlanB".into();
    cfg.auth.allow_test_realms = true;
    cfg.auth.realms = vec![
        RealmConfig {
            name: "/test".into(),
            kind: RealmKind::InMemory,
            scopes: Vec::new(),
            principals: Vec::new(),
        },
        RealmConfig {
            name: "/services".into(),
            kind: RealmKind::Service,
            scopes: Vec::new(),
            principals: vec![PrincipalConfig {
                name: "test-service".into(),
                password_hashes: vec![
                    hash_password("p455W0rD").expect("hash"),
                    hash_password("fooBar").expect("hash"),
                ],
                scopes: BTreeMap::from([("uid".to_string(), "test-service".to_string())]),
            }],
        },
    ];
    cfg
}

async fn start_server(
    cfg: AppConfig,
) -> (String, tokio::sync::oneshot::Sender<()>, JoinHandle<()>) {
    let app = build_app(&cfg).await.expect("build app");

    // Bind to an ephemeral port
    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await;
    });

    (format!("http://{addr}"), tx, server)
}

async fn request_token(
    client: &reqwest::Client,
    base: &str,
    form: &[(&str, &str)],
) -> reqwest::Response {
    client
        .post(format!("{base}/oauth2/access_token"))
        .form(form)
        .send()
        .await
        .unwrap()
}

fn password_form<'a>(
    realm: &'a str,
    username: &'a str,
    password: &'a str,
    scope: &'a str,
) -> Vec<(&'static str, &'a str)> {
    vec![
        ("realm", realm),
        ("grant_type", "password"),
        ("username", username),
        ("password", password),
        ("scope", scope),
    ]
}

/// Verifies `token` against the key set published by the server.
async fn verify_with_published_keys(client: &reqwest::Client, base: &str, token: &str) -> Value {
    let jwks: Value = client
        .get(format!("{base}/oauth2/v3/certs"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let kid = decode_header(token).unwrap().kid.expect("kid in header");
    let jwk = jwks["keys"]
        .as_array()
        .unwrap()
        .iter()
        .find(|k| k["kid"] == kid.as_str())
        .expect("kid published in JWKS");
    assert_eq!(jwk["kty"], "EC");
    assert_eq!(jwk["crv"], "P-256");
    assert_eq!(jwk["alg"], "ES256");

    let key =
        DecodingKey::from_ec_components(jwk["x"].as_str().unwrap(), jwk["y"].as_str().unwrap())
            .unwrap();
    let mut validation = Validation::new(Algorithm::ES256);
    validation.validate_aud = false;
    validation.set_issuer(&["PlanB"]);
    decode::<Value>(token, &key, &validation).unwrap().claims
}

#[tokio::test]
async fn service_realm_issues_verifiable_tokens() {
    let (base, shutdown_tx, handle) = start_server(test_config()).await;
    let client = reqwest::Client::new();

    let mut subjects = Vec::new();
    for password in ["p455W0rD", "fooBar"] {
        let form = password_form("/services", "test-service", password, "uid");
        let resp = request_token(&client, &base, &form).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get("cache-control").unwrap(),
            "no-store"
        );

        let body: Value = resp.json().await.unwrap();
        assert!(body["id_token"].is_null());
        assert_eq!(body["token_type"], "Bearer");
        assert_eq!(body["scope"], "uid");
        assert_eq!(body["realm"], "/services");

        let token = body["access_token"].as_str().unwrap();
        assert_eq!(token.split('.').count(), 3);

        let claims = verify_with_published_keys(&client, &base, token).await;
        assert_eq!(claims["realm"], "/services");
        assert_eq!(claims["uid"], "test-service");
        assert_eq!(claims["scope"], serde_json::json!(["uid"]));
        assert_eq!(claims["exp"], body["expires_in"]);
        assert_eq!(
            claims["exp"].as_i64().unwrap() - claims["iat"].as_i64().unwrap(),
            28_800
        );
        subjects.push(claims["sub"].clone());
    }
    assert_eq!(subjects, vec!["test-service", "test-service"]);

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn test_realm_accepts_shared_secret() {
    let (base, shutdown_tx, handle) = start_server(test_config()).await;
    let client = reqwest::Client::new();

    let resp = request_token(&client, &base, &password_form("/test", "svc1", "test", "uid")).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();

    let claims =
        verify_with_published_keys(&client, &base, body["access_token"].as_str().unwrap()).await;
    assert_eq!(claims["sub"], "svc1");
    assert_eq!(claims["realm"], "/test");
    assert_eq!(claims["scope"], serde_json::json!(["uid"]));

    let resp = request_token(&client, &base, &password_form("/test", "svc1", "wrong", "uid")).await;
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "invalid_grant");
    assert!(body.get("access_token").is_none());

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn token_endpoint_errors() {
    let (base, shutdown_tx, handle) = start_server(test_config()).await;
    let client = reqwest::Client::new();

    // Unknown realm
    let resp = request_token(
        &client,
        &base,
        &password_form("/nowhere", "test-service", "fooBar", "uid"),
    )
    .await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "invalid_realm");

    // Scope the principal does not hold
    let resp = request_token(
        &client,
        &base,
        &password_form("/services", "test-service", "fooBar", "uid admin"),
    )
    .await;
    assert_eq!(resp.status(), 403);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "invalid_scope");

    // Unsupported grant type
    let resp = request_token(
        &client,
        &base,
        &[("realm", "/services"), ("grant_type", "client_credentials")],
    )
    .await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "unsupported_grant_type");

    // Missing parameters
    let resp = request_token(&client, &base, &[("grant_type", "password")]).await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "invalid_request");

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn unknown_realm_can_be_concealed() {
    let mut cfg = test_config();
    cfg.auth.conceal_unknown_realm = true;
    let (base, shutdown_tx, handle) = start_server(cfg).await;
    let client = reqwest::Client::new();

    let unknown = request_token(
        &client,
        &base,
        &password_form("/nowhere", "test-service", "fooBar", "uid"),
    )
    .await;
    let wrong = request_token(
        &client,
        &base,
        &password_form("/services", "test-service", "nope", "uid"),
    )
    .await;

    assert_eq!(unknown.status(), 401);
    assert_eq!(wrong.status(), 401);
    let unknown: Value = unknown.json().await.unwrap();
    let wrong: Value = wrong.json().await.unwrap();
    assert_eq!(unknown, wrong);

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn discovery_and_health_endpoints() {
    let (base, shutdown_tx, handle) = start_server(test_config()).await;
    let client = reqwest::Client::new();

    // GET /healthz
    let resp = client.get(format!("{base}/healthz")).send().await.unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    // Discovery without forwarded proto: issuer is http://<Host>
    let resp = client
        .get(format!("{base}/.well-known/openid-configuration"))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let doc: Value = resp.json().await.unwrap();
    assert_eq!(doc["issuer"], base.as_str());
    assert_eq!(doc["token_endpoint"], format!("{base}/oauth2/access_token"));
    assert_eq!(doc["jwks_uri"], format!("{base}/oauth2/v3/certs"));
    assert_eq!(doc["id_token_signing_alg_values_supported"][0], "ES256");

    // Behind a TLS-terminating proxy
    let resp = client
        .get(format!("{base}/.well-known/openid-configuration"))
        .header("x-forwarded-proto", "https")
        .send()
        .await
        .unwrap();
    let doc: Value = resp.json().await.unwrap();
    let expected = base.replacen("http://", "https://", 1);
    assert_eq!(doc["issuer"], expected.as_str());

    // JWKS
    let resp = client.get(format!("{base}/oauth2/v3/certs")).send().await.unwrap();
    assert!(resp.status().is_success());
    let jwks: Value = resp.json().await.unwrap();
    assert_eq!(jwks["keys"].as_array().unwrap().len(), 1);
    assert_eq!(jwks["keys"][0]["use"], "sig");

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn metrics_count_issued_tokens_per_realm() {
    let (base, shutdown_tx, handle) = start_server(test_config()).await;
    let client = reqwest::Client::new();

    let resp = request_token(
        &client,
        &base,
        &password_form("/services", "test-service", "fooBar", "uid"),
    )
    .await;
    assert_eq!(resp.status(), 200);

    let resp = client.get(format!("{base}/metrics")).send().await.unwrap();
    assert!(resp.status().is_success());
    let text = resp.text().await.unwrap();
    assert!(
        text.lines().any(|l| l.starts_with("realmgate_tokens_issued_total")
            && l.contains("realm=\"/services\"")),
        "missing issuance counter in:\n{text}"
    );

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}
