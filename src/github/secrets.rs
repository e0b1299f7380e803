//! Actions secrets. GitHub only accepts values sealed (libsodium
//! `crypto_box_seal`) to the repository's public key.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use crypto_box::PublicKey;
use crypto_box::aead::OsRng;
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::GitHubClient;
use crate::errors::SiteError;

#[derive(Debug, Deserialize)]
struct RepoPublicKey {
    key_id: String,
    /// Base64 X25519 public key
    key: String,
}

#[derive(Serialize)]
struct PutSecretRequest<'a> {
    encrypted_value: String,
    key_id: &'a str,
}

/// Seal `plaintext` to a base64 X25519 public key and base64 the result.
pub fn seal_secret(name: &str, public_key_b64: &str, plaintext: &str) -> Result<String, SiteError> {
    let fail = |message: String| SiteError::Encryption {
        name: name.to_string(),
        message,
    };

    let key_bytes = STANDARD
        .decode(public_key_b64)
        .map_err(|e| fail(format!("public key is not base64: {}", e)))?;
    let public_key = PublicKey::from_slice(&key_bytes)
        .map_err(|_| fail(format!("public key has {} bytes, expected 32", key_bytes.len())))?;
    let sealed = public_key
        .seal(&mut OsRng, plaintext.as_bytes())
        .map_err(|e| fail(e.to_string()))?;

    Ok(STANDARD.encode(sealed))
}

impl GitHubClient {
    pub(super) async fn put_actions_secret(
        &self,
        repo: &str,
        name: &str,
        value: &SecretString,
    ) -> Result<(), SiteError> {
        let req = self.request(
            Method::GET,
            &self.repo_path(repo, "actions/secrets/public-key"),
        );
        let public_key: RepoPublicKey = self.send_json(req).await?;

        let body = PutSecretRequest {
            encrypted_value: seal_secret(name, &public_key.key, value.expose_secret())?,
            key_id: &public_key.key_id,
        };
        let req = self
            .request(
                Method::PUT,
                &self.repo_path(repo, &format!("actions/secrets/{}", name)),
            )
            .json(&body);
        self.send_empty(req).await?;

        tracing::debug!(repo, secret = name, key_id = %public_key.key_id, "Stored Actions secret");
        Ok(())
    }
}
