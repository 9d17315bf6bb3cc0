//! Subject context extracted from gateway headers.
//!
//! `X-User-ID` and `X-User-Role` are set by the authenticating gateway in
//! front of this service; they are trusted as given.

use crate::models::validate_subject_id;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use service_core::error::AppError;

pub const USER_ID_HEADER: &str = "X-User-ID";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Client,
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "client" => Ok(Role::Client),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Authenticated caller.
#[derive(Debug, Clone)]
pub struct SubjectContext {
    pub subject_id: String,
    pub role: Role,
}

impl SubjectContext {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden(anyhow::anyhow!(
                "Administrator role required"
            )))
        }
    }

    /// Admins may act on any subject; clients only on themselves.
    pub fn authorize_subject(&self, subject_id: &str) -> Result<(), AppError> {
        if self.is_admin() || self.subject_id == subject_id {
            Ok(())
        } else {
            Err(AppError::Forbidden(anyhow::anyhow!(
                "Access to another subject is not permitted"
            )))
        }
    }

    /// Subject a list query is restricted to. Clients are pinned to
    /// themselves whatever they asked for.
    pub fn list_scope(&self, requested: Option<String>) -> Result<Option<String>, AppError> {
        match (self.role, requested) {
            (Role::Admin, requested) => Ok(requested),
            (Role::Client, Some(other)) if other != self.subject_id => Err(AppError::Forbidden(
                anyhow::anyhow!("Access to another subject is not permitted"),
            )),
            (Role::Client, _) => Ok(Some(self.subject_id.clone())),
        }
    }

    /// Subject a create call acts for: the caller, or for admins the
    /// explicitly named subject.
    pub fn acting_for(&self, requested: Option<String>) -> Result<String, AppError> {
        match requested {
            Some(subject_id) => {
                self.authorize_subject(&subject_id)?;
                Ok(subject_id)
            }
            None => Ok(self.subject_id.clone()),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SubjectContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let subject_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Unauthorized(anyhow::anyhow!("Missing X-User-ID header"))
            })?;
        validate_subject_id(subject_id)
            .map_err(|e| AppError::Unauthorized(anyhow::anyhow!("Invalid X-User-ID: {}", e)))?;

        let role: Role = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Unauthorized(anyhow::anyhow!("Missing X-User-Role header"))
            })?
            .parse()
            .map_err(|e: String| AppError::Unauthorized(anyhow::anyhow!(e)))?;

        // Add to tracing span for observability
        tracing::Span::current().record("subject_id", subject_id);

        Ok(SubjectContext {
            subject_id: subject_id.to_string(),
            role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(id: &str) -> SubjectContext {
        SubjectContext {
            subject_id: id.to_string(),
            role: Role::Client,
        }
    }

    #[test]
    fn test_client_scope_is_pinned() {
        let ctx = client("alice");
        assert_eq!(ctx.list_scope(None).unwrap(), Some("alice".to_string()));
        assert!(matches!(
            ctx.list_scope(Some("bob".to_string())),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_admin_scope_is_free() {
        let ctx = SubjectContext {
            subject_id: "root".to_string(),
            role: Role::Admin,
        };
        assert_eq!(ctx.list_scope(None).unwrap(), None);
        assert_eq!(ctx.acting_for(Some("bob".to_string())).unwrap(), "bob");
    }

    #[test]
    fn test_client_cannot_act_for_others() {
        assert!(matches!(
            client("alice").acting_for(Some("bob".to_string())),
            Err(AppError::Forbidden(_))
        ));
        assert!(client("alice").require_admin().is_err());
    }
}
