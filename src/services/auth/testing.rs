//! Test-only helpers: client proof signing and throwaway server key pairs.

use p256::ecdsa::{Signature, SigningKey, signature::Signer};
use p256::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use rand::rngs::OsRng;
use serde_json::json;

use crate::services::auth::dpop::codec::base64url_encode;
use crate::services::auth::dpop::thumbprint::jwk_thumbprint;
use crate::services::auth::dpop::types::EcJwk;
use crate::services::auth::keys::KeyMaterial;

pub(crate) fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// The client side of the protocol: a P-256 key that signs proofs.
pub(crate) struct ClientKey {
    signing_key: SigningKey,
}

impl ClientKey {
    pub(crate) fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut OsRng),
        }
    }

    pub(crate) fn jwk(&self) -> EcJwk {
        let point = self.signing_key.verifying_key().to_encoded_point(false);
        EcJwk::p256(
            base64url_encode(point.x().unwrap()),
            base64url_encode(point.y().unwrap()),
        )
    }

    pub(crate) fn thumbprint(&self) -> String {
        jwk_thumbprint(&self.jwk())
    }

    /// A fresh proof: `iat = now`, `exp = now + 60`.
    pub(crate) fn proof(&self, method: &str, uri: &str) -> String {
        let t = now();
        self.proof_with(method, uri, t, t + 60, &uuid::Uuid::new_v4().to_string())
    }

    pub(crate) fn proof_with(&self, method: &str, uri: &str, iat: i64, exp: i64, jti: &str) -> String {
        let payload = json!({"htm": method, "htu": uri, "jti": jti, "iat": iat, "exp": exp});
        self.sign_payload(&payload)
    }

    /// Header carries this key's JWK; `payload` is signed as given.
    pub(crate) fn sign_payload(&self, payload: &serde_json::Value) -> String {
        self.sign_with_jwk(serde_json::to_value(self.jwk()).unwrap(), payload)
    }

    /// Like `sign_payload` but with an arbitrary `jwk` header member.
    pub(crate) fn sign_with_jwk(
        &self,
        jwk: serde_json::Value,
        payload: &serde_json::Value,
    ) -> String {
        let header = json!({"typ": "dpop+jwt", "alg": "ES256", "jwk": jwk});

        let signing_input = format!(
            "{}.{}",
            base64url_encode(header.to_string()),
            base64url_encode(payload.to_string())
        );
        let signature: Signature = self.signing_key.sign(signing_input.as_bytes());

        format!("{signing_input}.{}", base64url_encode(signature.to_bytes()))
    }
}

/// PKCS#8 private key PEM and SPKI public key PEM for a fresh P-256 pair.
pub(crate) fn server_key_pems() -> (String, String) {
    let key = SigningKey::random(&mut OsRng);
    let private_pem = key.to_pkcs8_pem(LineEnding::LF).unwrap().to_string();
    let public_pem = key
        .verifying_key()
        .to_public_key_pem(LineEnding::LF)
        .unwrap();
    (private_pem, public_pem)
}

pub(crate) fn server_keys() -> KeyMaterial {
    let (private_pem, public_pem) = server_key_pems();
    KeyMaterial::from_pem(&private_pem, &public_pem).unwrap()
}
