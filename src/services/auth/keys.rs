use std::{fs, path::Path};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::services::auth::error::PopError;

/// The service's own ES256 key pair.
///
/// Loaded once at startup and shared read-only; the private half only signs
/// access tokens and the public half only verifies them.
#[derive(Clone)]
pub struct KeyMaterial {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("KeyMaterial").finish_non_exhaustive()
    }
}

impl KeyMaterial {
    /// Read both PEM files. Either file missing is `KeyMaterialMissing`.
    pub fn load(private_key_path: &Path, public_key_path: &Path) -> Result<Self, PopError> {
        let private_pem = read_key_file(private_key_path)?;
        let public_pem = read_key_file(public_key_path)?;

        let keys = Self::from_pem(&private_pem, &public_pem)?;
        info!(
            private_key = %private_key_path.display(),
            public_key = %public_key_path.display(),
            "loaded access token key pair"
        );
        Ok(keys)
    }

    /// `private_pem` must be a P-256 key in PKCS#8 PEM, `public_pem` its SPKI PEM.
    ///
    /// The pair is checked by signing and verifying a probe token, so a
    /// mismatched pair fails at startup instead of on the first request.
    pub fn from_pem(private_pem: &str, public_pem: &str) -> Result<Self, PopError> {
        let encoding_key = EncodingKey::from_ec_pem(private_pem.as_bytes()).map_err(|e| {
            error!(error = %e, "failed to parse private key PEM (expected P-256 PKCS#8 PEM)");
            PopError::KeyMaterialInvalid
        })?;
        let decoding_key = DecodingKey::from_ec_pem(public_pem.as_bytes()).map_err(|e| {
            error!(error = %e, "failed to parse public key PEM (expected P-256 SPKI PEM)");
            PopError::KeyMaterialInvalid
        })?;

        let keys = Self {
            encoding_key,
            decoding_key,
        };
        keys.check_pair()?;
        Ok(keys)
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }

    fn check_pair(&self) -> Result<(), PopError> {
        #[derive(Serialize, Deserialize)]
        struct Probe {
            probe: bool,
        }

        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::ES256),
            &Probe { probe: true },
            &self.encoding_key,
        )
        .map_err(|e| {
            error!(error = %e, "failed to sign with private key");
            PopError::KeyMaterialInvalid
        })?;

        let mut validation = Validation::new(Algorithm::ES256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_aud = false;

        jsonwebtoken::decode::<Probe>(&token, &self.decoding_key, &validation)
            .map(|_| ())
            .map_err(|e| {
                error!(error = %e, "public key does not match private key");
                PopError::KeyMaterialInvalid
            })
    }
}

fn read_key_file(path: &Path) -> Result<String, PopError> {
    if !path.is_file() {
        error!(path = %path.display(), "key file is missing");
        return Err(PopError::KeyMaterialMissing);
    }

    fs::read_to_string(path).map_err(|e| {
        error!(path = %path.display(), error = %e, "failed to read key file");
        PopError::KeyMaterialMissing
    })
}
