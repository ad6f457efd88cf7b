use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use bloxtrack_core::time::unix_now;

use crate::config::AuthFileConfig;
use crate::error::AppError;
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Username of the authenticated caller, inserted into request extensions by
/// [`require_bearer`].
#[derive(Debug, Clone)]
pub struct AuthedUser(pub String);

/// Bearer token issuing and verification.
///
/// Tokens are `{username}.{expires_unix}.{hex(hmac_sha256(secret, payload))}`.
/// Signature verification is constant-time via `Mac::verify_slice`.
#[derive(Clone)]
pub struct AuthConfig {
    secret: String,
    token_ttl_secs: u64,
}

impl AuthConfig {
    pub fn from_file_config(file: &AuthFileConfig) -> Self {
        let secret = match &file.token_secret {
            Some(s) => s.clone(),
            None => {
                tracing::info!(
                    "No token_secret configured, generating a per-process secret; \
                     issued tokens will not survive a restart"
                );
                hex::encode(rand::random::<[u8; 32]>())
            },
        };
        Self {
            secret,
            token_ttl_secs: file.token_ttl_secs,
        }
    }

    #[cfg(test)]
    pub fn for_tests(secret: &str, ttl_secs: u64) -> Self {
        Self {
            secret: secret.to_string(),
            token_ttl_secs: ttl_secs,
        }
    }

    /// Issue a signed token for a username, expiring `token_ttl_secs` from now.
    pub fn issue_token(&self, username: &str) -> String {
        let expires = unix_now() + self.token_ttl_secs;
        let payload = format!("{username}.{expires}");
        format!("{payload}.{}", self.sign(&payload))
    }

    /// Verify a token and return the username it was issued to.
    /// Rejects bad shapes, bad signatures, and expired tokens.
    pub fn verify_token(&self, token: &str) -> Option<String> {
        let (payload, sig_hex) = token.rsplit_once('.')?;
        let (username, expires) = payload.rsplit_once('.')?;
        if username.is_empty() {
            return None;
        }

        let expected = hex::decode(sig_hex).ok()?;
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes()).ok()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&expected).ok()?;

        let expires: u64 = expires.parse().ok()?;
        if expires <= unix_now() {
            return None;
        }
        Some(username.to_string())
    }

    fn sign(&self, payload: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

/// Axum middleware guarding the account endpoints. 401 when no token is
/// presented, 403 when the token is invalid or expired.
pub async fn require_bearer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let provided = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let Some(token) = provided else {
        return Err(AppError::Unauthorized("No token provided".to_string()));
    };

    match state.auth.verify_token(token) {
        Some(username) => {
            request.extensions_mut().insert(AuthedUser(username));
            Ok(next.run(request).await)
        },
        None => Err(AppError::Forbidden("Invalid or expired token".to_string())),
    }
}
