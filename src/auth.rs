use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ApiError;

/// Identity
///
/// The resolved identity of a bearer token, as reported by the external
/// identity service. `role` is read from the identity record's user metadata
/// and defaults to "user" when absent; the only other recognized value is
/// "admin".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub role: String,
}

/// VerifyError
///
/// Failure modes of token verification. Both variants collapse to a single
/// 401 at the gate — the distinction exists only for logging.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("token rejected by identity service")]
    Rejected,
    #[error("identity service unreachable: {0}")]
    Transport(String),
}

/// IdentityVerifier
///
/// Defines the abstract contract for resolving a bearer token into an
/// Identity. This mirrors the Store abstraction: handlers and extractors
/// never know whether tokens are checked against the real identity service
/// (SupabaseVerifier) or a test fixture (MockVerifier).
///
/// Every authenticated request re-verifies its token; no verification result
/// is cached and no session/revocation state lives in this process.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Identity, VerifyError>;
}

/// VerifierState
///
/// The concrete type used to share the verifier across the application state.
pub type VerifierState = Arc<dyn IdentityVerifier>;

// --- The Real Implementation (Supabase Auth) ---

/// Shape of the identity record returned by GET /auth/v1/user.
#[derive(Deserialize)]
struct SupabaseUser {
    id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    user_metadata: serde_json::Map<String, serde_json::Value>,
}

/// SupabaseVerifier
///
/// Resolves tokens by calling the external identity service's user endpoint
/// with the project API key and the presented bearer token. Any non-success
/// response — malformed token, revoked token, expired session — is reported
/// as Rejected; network failures as Transport.
pub struct SupabaseVerifier {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SupabaseVerifier {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl IdentityVerifier for SupabaseVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, VerifyError> {
        let response = self
            .http
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.api_key)
            .header(header::AUTHORIZATION.as_str(), format!("Bearer {token}"))
            .send()
            .await
            .map_err(|e| VerifyError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(VerifyError::Rejected);
        }

        let user = response
            .json::<SupabaseUser>()
            .await
            .map_err(|e| VerifyError::Transport(e.to_string()))?;

        let role = user
            .user_metadata
            .get("role")
            .and_then(|value| value.as_str())
            .unwrap_or("user")
            .to_string();

        Ok(Identity {
            id: user.id,
            email: user.email,
            role,
        })
    }
}

// --- The Mock Implementation (For Tests) ---

/// MockVerifier
///
/// An in-memory token → identity map used exclusively for tests, so the
/// authorization gate can be exercised without a network connection to the
/// identity service.
#[derive(Default)]
pub struct MockVerifier {
    users: HashMap<String, Identity>,
}

impl MockVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, token: &str, identity: Identity) -> Self {
        self.users.insert(token.to_string(), identity);
        self
    }
}

#[async_trait]
impl IdentityVerifier for MockVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, VerifyError> {
        self.users.get(token).cloned().ok_or(VerifyError::Rejected)
    }
}

// --- Extractors (The Authorization Gate) ---

/// AuthUser
///
/// The resolved identity of an authenticated request. Implements Axum's
/// FromRequestParts trait, making it usable as a function argument in any
/// handler that requires authentication — this cleanly separates the gate
/// from the business logic.
///
/// The flow: extract the `Authorization: Bearer <token>` header, verify the
/// token against the external identity service, and pass the identity
/// through. Every failure mode rejects with 401.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    // Allows the extractor to pull the verifier from the app state.
    VerifierState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let verifier = VerifierState::from_ref(state);

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Authentication)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Authentication)?;

        let identity = verifier.verify(token).await.map_err(|e| {
            tracing::warn!("token verification failed: {e}");
            ApiError::Authentication
        })?;

        Ok(AuthUser {
            id: identity.id,
            email: identity.email,
            role: identity.role,
        })
    }
}

/// AdminUser
///
/// Composes over AuthUser: first requires authentication (401 on failure),
/// then requires the "admin" role (403 otherwise). There is no hierarchy
/// beyond these two roles and no per-resource ownership checks — any admin
/// can mutate any resource.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub id: String,
    pub email: String,
}

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    VerifierState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != "admin" {
            return Err(ApiError::Forbidden);
        }
        Ok(AdminUser {
            id: user.id,
            email: user.email,
        })
    }
}
