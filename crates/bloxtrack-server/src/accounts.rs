use std::collections::HashMap;

use axum::Extension;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use bloxtrack_core::time::unix_now;

use crate::auth::AuthedUser;
use crate::error::AppError;
use crate::state::AppState;

/// A registered account. Passwords are stored as `hex(sha256(salt || password))`
/// with a random 16-byte salt, never in the clear.
#[derive(Debug, Clone)]
pub struct Account {
    pub username: String,
    pub email: String,
    salt: [u8; 16],
    password_hash: String,
    pub created_at: u64,
}

/// Outcome of an insert attempt, so the handler can pick the right status.
#[derive(Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    Created,
    Duplicate,
    Full,
}

/// Bounded in-memory account store keyed by lowercased username.
pub struct UserStore {
    accounts: HashMap<String, Account>,
    max_accounts: usize,
}

impl UserStore {
    pub fn with_capacity(max_accounts: usize) -> Self {
        Self {
            accounts: HashMap::new(),
            max_accounts,
        }
    }

    /// Register a new account. Usernames and emails are both unique,
    /// case-insensitively.
    pub fn insert(&mut self, username: &str, email: &str, password: &str) -> InsertOutcome {
        let key = username.to_lowercase();
        let email_lower = email.to_lowercase();
        if self.accounts.contains_key(&key)
            || self
                .accounts
                .values()
                .any(|a| a.email.to_lowercase() == email_lower)
        {
            return InsertOutcome::Duplicate;
        }
        if self.accounts.len() >= self.max_accounts {
            return InsertOutcome::Full;
        }

        let salt: [u8; 16] = rand::random();
        self.accounts.insert(
            key,
            Account {
                username: username.to_string(),
                email: email.to_string(),
                salt,
                password_hash: hash_password(&salt, password),
                created_at: unix_now(),
            },
        );
        InsertOutcome::Created
    }

    /// Check credentials. Returns the account on success.
    pub fn verify(&self, username: &str, password: &str) -> Option<&Account> {
        let account = self.accounts.get(&username.to_lowercase())?;
        if account.password_hash == hash_password(&account.salt, password) {
            Some(account)
        } else {
            None
        }
    }

    pub fn get(&self, username: &str) -> Option<&Account> {
        self.accounts.get(&username.to_lowercase())
    }

    pub fn remove(&mut self, username: &str) -> bool {
        self.accounts.remove(&username.to_lowercase()).is_some()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

fn hash_password(salt: &[u8; 16], password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Deserialize)]
pub struct SignupBody {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub username: String,
    pub email: String,
    pub created_at: u64,
}

/// POST /signup — register a username/password account.
pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupBody>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    if body.username.trim().is_empty() || body.email.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::BadRequest("All fields are required".to_string()));
    }
    if body.password.len() < 6 {
        return Err(AppError::BadRequest(
            "Password must be at least 6 characters".to_string(),
        ));
    }

    let mut users = state.users.write().await;
    match users.insert(body.username.trim(), body.email.trim(), &body.password) {
        InsertOutcome::Created => {
            tracing::info!(username = %body.username.trim(), "Account created");
            Ok((
                StatusCode::CREATED,
                Json(serde_json::json!({ "message": "User created successfully" })),
            ))
        },
        InsertOutcome::Duplicate => Err(AppError::Conflict(
            "Username or email already exists".to_string(),
        )),
        InsertOutcome::Full => Err(AppError::Internal("Account limit reached".to_string())),
    }
}

/// POST /login — check credentials and issue a bearer token.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<Json<LoginResponse>, AppError> {
    if body.username.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::BadRequest(
            "Username and password required".to_string(),
        ));
    }

    let users = state.users.read().await;
    let Some(account) = users.verify(body.username.trim(), &body.password) else {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    };

    let token = state.auth.issue_token(&account.username);
    Ok(Json(LoginResponse {
        token,
        user: UserInfo {
            username: account.username.clone(),
            email: account.email.clone(),
        },
    }))
}

/// GET /profile — account details for the authenticated caller.
pub async fn profile(
    State(state): State<AppState>,
    Extension(AuthedUser(username)): Extension<AuthedUser>,
) -> Result<Json<ProfileResponse>, AppError> {
    let users = state.users.read().await;
    let account = users
        .get(&username)
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(ProfileResponse {
        username: account.username.clone(),
        email: account.email.clone(),
        created_at: account.created_at,
    }))
}

/// POST /logout — tokens are stateless, the client just drops its copy.
pub async fn logout(
    Extension(AuthedUser(username)): Extension<AuthedUser>,
) -> Json<serde_json::Value> {
    tracing::debug!(%username, "Logout");
    Json(serde_json::json!({ "message": "Logged out successfully" }))
}

/// DELETE /account — remove the authenticated caller's account.
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(AuthedUser(username)): Extension<AuthedUser>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut users = state.users.write().await;
    if users.remove(&username) {
        tracing::info!(%username, "Account deleted");
        Ok(Json(
            serde_json::json!({ "message": "Account deleted successfully" }),
        ))
    } else {
        Err(AppError::NotFound("User not found".to_string()))
    }
}
