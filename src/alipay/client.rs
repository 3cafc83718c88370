//! Signed Alipay V3 HTTP client (§4.I, §6), grounded on
//! `original_source/app/task/alipay_mck.go`'s `AlipayV3Client`.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::keys::{self, KeyError};

#[derive(Debug, Error)]
pub enum AlipayError {
    #[error("key error: {0}")]
    Key(#[from] KeyError),
    #[error("signing failed: {0}")]
    Sign(rsa::Error),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("response signature verification failed")]
    VerificationFailed,
    #[error("alipay error response: {0}")]
    ErrorResponse(String),
}

pub struct AlipayClient {
    app_id: String,
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
    host: String,
    http: reqwest::Client,
}

impl AlipayClient {
    pub fn new(app_id: String, private_key_pem: &str, public_key_pem: &str) -> Result<Self, AlipayError> {
        let private_key = keys::parse_private_key(&keys::normalize_private_key_pem(private_key_pem))?;
        let public_key = keys::parse_public_key(&keys::normalize_public_key_pem(public_key_pem))?;

        Ok(AlipayClient {
            app_id,
            private_key,
            public_key,
            host: "openapi.alipay.com".to_string(),
            http: reqwest::Client::new(),
        })
    }

    /// `generateSign`: sign `auth_string\nGET\npath_with_query\n{}\n` with
    /// PKCS#1 v1.5 / SHA-256 and base64-encode the signature.
    fn generate_sign(&self, auth_string: &str, path_with_query: &str) -> Result<String, AlipayError> {
        let content = format!("{auth_string}\nGET\n{path_with_query}\n{{}}\n");
        let hashed = Sha256::digest(content.as_bytes());
        let signature = self
            .private_key
            .sign(Pkcs1v15Sign::new::<Sha256>(), &hashed)
            .map_err(AlipayError::Sign)?;
        Ok(BASE64.encode(signature))
    }

    /// `verify`: accept if the signature header is absent (compat, §9b);
    /// if present, it must validate against `timestamp\nnonce\nbody\n`.
    fn verify_response(&self, body: &str, signature: Option<&str>, timestamp: &str, nonce: &str) -> bool {
        let Some(signature) = signature.filter(|s| !s.is_empty()) else {
            return true;
        };

        let Ok(decoded) = BASE64.decode(signature) else {
            return false;
        };
        let content = format!("{timestamp}\n{nonce}\n{body}\n");
        let hashed = Sha256::digest(content.as_bytes());
        self.public_key
            .verify(Pkcs1v15Sign::new::<Sha256>(), &hashed, &decoded)
            .is_ok()
    }

    /// Signed GET to `path` with `query_params`, returning the raw JSON
    /// response body once signature verification has passed.
    pub async fn get(&self, path: &str, query_params: &[(&str, String)]) -> Result<String, AlipayError> {
        let query_string = query_params
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let path_with_query = format!("{path}?{query_string}");
        let url = format!("https://{}{}", self.host, path_with_query);

        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        let nonce = now.as_nanos().to_string();
        let timestamp = now.as_millis().to_string();
        let auth_string = format!("app_id={},nonce={},timestamp={}", self.app_id, nonce, timestamp);

        let signature = self.generate_sign(&auth_string, &path_with_query)?;
        let authorization = format!("ALIPAY-SHA256withRSA {auth_string},sign={signature}");

        let resp = self
            .http
            .get(&url)
            .timeout(std::time::Duration::from_secs(10))
            .header("Authorization", authorization)
            .header("Content-Type", "application/json")
            .send()
            .await?;

        let resp_timestamp = resp
            .headers()
            .get("alipay-timestamp")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let resp_nonce = resp
            .headers()
            .get("alipay-nonce")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let resp_signature = resp
            .headers()
            .get("alipay-signature")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = resp.text().await?;

        if !self.verify_response(&body, resp_signature.as_deref(), &resp_timestamp, &resp_nonce) {
            return Err(AlipayError::VerificationFailed);
        }

        Ok(body)
    }
}

fn urlencode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(b as char),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urlencode_leaves_unreserved_characters_untouched() {
        assert_eq!(urlencode("2024-01-02 15:04:05"), "2024-01-02%2015%3A04%3A05");
    }
}
