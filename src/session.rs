//! Request-scoped session.
//!
//! Sign-in happens at the identity provider; its proxy forwards the caller
//! as `x-user-id` and `x-user-role` headers. Handlers take a [`Session`]
//! argument instead of reading shared user state.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Guest,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "host" => Some(Role::Host),
            "guest" => Some(Role::Guest),
            _ => None,
        }
    }
}

/// The authenticated caller of one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub role: Role,
}

impl Session {
    pub fn host(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: Role::Host,
        }
    }

    pub fn guest(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: Role::Guest,
        }
    }

    pub fn require_host(&self) -> Result<(), AppError> {
        match self.role {
            Role::Host => Ok(()),
            Role::Guest => Err(AppError::forbidden("host account required")),
        }
    }

    pub fn require_guest(&self) -> Result<(), AppError> {
        match self.role {
            Role::Guest => Ok(()),
            Role::Host => Err(AppError::forbidden("guest account required")),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
        };

        let user_id = header(USER_ID_HEADER)
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .ok_or(AppError::Unauthorized)?;
        let role = header(USER_ROLE_HEADER)
            .and_then(Role::parse)
            .ok_or(AppError::Unauthorized)?;

        Ok(Session { user_id, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(headers: &[(&str, &str)]) -> Result<Session, AppError> {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        Session::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_session_from_headers() {
        let id = Uuid::new_v4();
        let id_header = id.to_string();
        let session = extract(&[(USER_ID_HEADER, id_header.as_str()), (USER_ROLE_HEADER, "Host")])
            .await
            .unwrap();
        assert_eq!(session, Session::host(id));
    }

    #[tokio::test]
    async fn test_missing_or_bad_headers_are_unauthorized() {
        assert!(matches!(extract(&[]).await, Err(AppError::Unauthorized)));
        assert!(matches!(
            extract(&[(USER_ID_HEADER, "not-a-uuid"), (USER_ROLE_HEADER, "guest")]).await,
            Err(AppError::Unauthorized)
        ));
        let id_header = Uuid::new_v4().to_string();
        assert!(matches!(
            extract(&[(USER_ID_HEADER, id_header.as_str()), (USER_ROLE_HEADER, "admin")]).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_role_guards() {
        let id = Uuid::new_v4();
        assert!(Session::host(id).require_host().is_ok());
        assert!(Session::host(id).require_guest().is_err());
        assert!(Session::guest(id).require_guest().is_ok());
        assert!(Session::guest(id).require_host().is_err());
    }
}
