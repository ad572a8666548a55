//! Explicit session state handed to the client at each call site.

use serde::{Deserialize, Serialize};

/// Profile returned by the auth backend alongside the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// Login response of the auth backend: `{token, id, username, email}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub id: i64,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    token: Option<String>,
    user: Option<SessionUser>,
}

impl SessionContext {
    /// No credentials; requests are sent without an `Authorization` header.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            user: None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Value for the `Authorization` header, if any.
    pub fn bearer_header(&self) -> Option<String> {
        self.token.as_ref().map(|token| format!("Bearer {}", token))
    }
}

impl From<LoginResponse> for SessionContext {
    fn from(login: LoginResponse) -> Self {
        Self {
            token: Some(login.token),
            user: Some(SessionUser {
                id: login.id,
                username: login.username,
                email: login.email,
            }),
        }
    }
}
