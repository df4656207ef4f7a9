//! HTTP Basic authentication and the read/write access guard.
//!
//! Every request passes [`access_guard`] before reaching a handler. The
//! route policy lives in [`required_capability`].

use crate::{errors::AppError, AppState};
use axum::{
    extract::{Request, State},
    http::{header, Method},
    middleware::Next,
    response::Response,
};
use base64::Engine;
use std::{fmt, sync::Arc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Capability {
    Read,
    Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// ADMIN implies USER, so Write implies Read.
    pub fn grants(self, capability: Capability) -> bool {
        match self {
            Role::Admin => true,
            Role::User => capability == Capability::Read,
        }
    }
}

#[derive(Clone)]
pub struct UserAccount {
    pub username: String,
    password: String,
    pub role: Role,
}

impl UserAccount {
    pub fn new(username: impl Into<String>, password: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            role,
        }
    }
}

impl fmt::Debug for UserAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserAccount")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .field("role", &self.role)
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    accounts: Vec<UserAccount>,
}

impl UserDirectory {
    pub fn new(accounts: Vec<UserAccount>) -> Self {
        Self { accounts }
    }

    pub fn authenticate(&self, username: &str, password: &str) -> Option<&UserAccount> {
        self.accounts
            .iter()
            .find(|a| a.username == username && a.password == password)
    }
}

/// Capability a request needs, or `None` for public routes.
pub fn required_capability(method: &Method, path: &str) -> Option<Capability> {
    let path = path.trim_end_matches('/');
    let read = *method == Method::GET || *method == Method::HEAD;
    if read && (path == "/api/v1/jokes/today" || path == "/jotd") {
        return None;
    }
    if read {
        Some(Capability::Read)
    } else {
        Some(Capability::Write)
    }
}

/// Decodes `Authorization: Basic <base64(user:password)>`. The scheme name
/// is case-insensitive.
pub fn basic_credentials(value: &str) -> Option<(String, String)> {
    let (scheme, encoded) = value.trim_start().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let encoded = encoded.trim();
    let decoded = base64::engine::general_purpose::STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}

pub async fn access_guard(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(capability) = required_capability(request.method(), request.uri().path()) else {
        return Ok(next.run(request).await);
    };

    let credentials = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(basic_credentials);
    let Some((username, password)) = credentials else {
        tracing::debug!(path = %request.uri().path(), "Rejecting request without credentials");
        return Err(AppError::Unauthorized);
    };

    let Some(account) = state.users.authenticate(&username, &password) else {
        tracing::warn!(%username, "Rejecting request with bad credentials");
        return Err(AppError::Unauthorized);
    };

    if !account.role.grants(capability) {
        tracing::warn!(%username, ?capability, "Rejecting request lacking capability");
        return Err(AppError::Forbidden);
    }

    Ok(next.run(request).await)
}
