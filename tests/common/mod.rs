#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response, StatusCode};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use p256::ecdsa::{Signature, SigningKey, signature::Signer};
use p256::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use rand::rngs::OsRng;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use tower::ServiceExt;

use fare_api::app::build_router;
use fare_api::config::Config;
use fare_api::services::auth::replay::{MemoryReplayStore, ReplayStore};
use fare_api::services::auth::{KeyMaterial, PopGateway};
use fare_api::state::AppState;

pub const BASE: &str = "https://api.example.com";
pub const LOGIN_PATH: &str = "/api/v1/auth/line_login";
pub const PROFILE_PATH: &str = "/api/v1/auth/profile";

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn url(path: &str) -> String {
    format!("{BASE}{path}")
}

pub fn server_keys() -> KeyMaterial {
    let key = SigningKey::random(&mut OsRng);
    let private_pem = key.to_pkcs8_pem(LineEnding::LF).unwrap();
    let public_pem = key
        .verifying_key()
        .to_public_key_pem(LineEnding::LF)
        .unwrap();
    KeyMaterial::from_pem(&private_pem, &public_pem).unwrap()
}

/// Router with throwaway server keys, the in-memory replay store and
/// `PUBLIC_BASE_URL` pointing at `BASE`.
pub fn app() -> Router {
    app_with_replay(Some(Arc::new(MemoryReplayStore::new())))
}

pub fn app_with_replay(replay: Option<Arc<dyn ReplayStore>>) -> Router {
    let config = Config::from_lookup(|key| match key {
        "PUBLIC_BASE_URL" => Some(BASE.to_string()),
        _ => None,
    })
    .unwrap();

    let pop = Arc::new(PopGateway::new(Arc::new(server_keys())));
    let state = AppState::new(pop, replay, config.public_base_url.clone());
    build_router(state, &config)
}

pub struct ClientKey {
    signing_key: SigningKey,
}

impl ClientKey {
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut OsRng),
        }
    }

    fn coordinates(&self) -> (String, String) {
        let point = self.signing_key.verifying_key().to_encoded_point(false);
        (
            URL_SAFE_NO_PAD.encode(point.x().unwrap()),
            URL_SAFE_NO_PAD.encode(point.y().unwrap()),
        )
    }

    pub fn thumbprint(&self) -> String {
        let (x, y) = self.coordinates();
        let canonical = format!(r#"{{"crv":"P-256","kty":"EC","x":"{x}","y":"{y}"}}"#);
        URL_SAFE_NO_PAD.encode(Sha256::digest(canonical.as_bytes()))
    }

    pub fn proof(&self, method: &str, htu: &str) -> String {
        let t = now();
        self.proof_with(method, htu, t, t + 60, &uuid::Uuid::new_v4().to_string())
    }

    pub fn proof_with(&self, method: &str, htu: &str, iat: i64, exp: i64, jti: &str) -> String {
        let (x, y) = self.coordinates();
        let header = json!({
            "typ": "dpop+jwt",
            "alg": "ES256",
            "jwk": {"kty": "EC", "crv": "P-256", "x": x, "y": y},
        });
        let claims = json!({"htm": method, "htu": htu, "jti": jti, "iat": iat, "exp": exp});

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header.to_string()),
            URL_SAFE_NO_PAD.encode(claims.to_string())
        );
        let signature: Signature = self.signing_key.sign(signing_input.as_bytes());
        format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature.to_bytes()))
    }
}

pub fn login_request(proof: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::post(LOGIN_PATH).header("content-type", "application/json");
    if let Some(proof) = proof {
        builder = builder.header("DPoP", proof);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn profile_request(path: &str, authorization: Option<&str>, proof: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(path);
    if let Some(authorization) = authorization {
        builder = builder.header("authorization", authorization);
    }
    if let Some(proof) = proof {
        builder = builder.header("DPoP", proof);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res: Response<Body> = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// Log `client` in and return the access token.
pub async fn login(app: &Router, client: &ClientKey) -> String {
    let proof = client.proof("POST", &url(LOGIN_PATH));
    let (status, body) = send(
        app,
        login_request(Some(&proof), r#"{"sub":"U4af4980629","username":"Taro"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["access_token"].as_str().unwrap().to_string()
}
