//! Caller Authentication
//!
//! HS256 JWT verification. The token subject becomes the `performedBy` of
//! every history record; the role decides whether the caller may change a
//! student's placement.

pub mod middleware;

pub use middleware::{jwt_auth_middleware, require_placement_role};

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::placement::Actor;

/// Portal role carried in the token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
    Parent,
}

impl Role {
    /// Admin and staff may transfer, promote, graduate and withdraw
    pub fn can_modify_placement(&self) -> bool {
        matches!(self, Role::Admin | Role::Staff)
    }
}

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // Subject (staff/admin/parent id)
    pub role: Role,
    pub exp: usize, // Expiration time (as UTC timestamp)
    pub iat: usize, // Issued at
}

impl Claims {
    pub fn actor(&self) -> Actor {
        Actor::new(self.sub.clone())
    }
}

pub struct JwtAuth {
    jwt_secret: String,
}

impl JwtAuth {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
        }
    }

    /// Issue a token (used by tooling and tests; login lives elsewhere)
    pub fn issue(&self, sub: &str, role: Role, ttl: Duration) -> Result<String> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(ttl)
            .context("Token expiry out of range")?
            .timestamp();

        let claims = Claims {
            sub: sub.to_string(),
            role,
            exp: expiration as usize,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .context("Failed to generate token")
    }

    /// Verify JWT token
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let decoding_key = DecodingKey::from_secret(self.jwt_secret.as_bytes());
        let validation = Validation::new(Algorithm::HS256);
        let token_data = decode::<Claims>(token, &decoding_key, &validation)?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let auth = JwtAuth::new("secret");
        let token = auth.issue("staff-7", Role::Staff, Duration::hours(1)).unwrap();
        let claims = auth.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "staff-7");
        assert_eq!(claims.role, Role::Staff);
        assert_eq!(claims.actor().as_str(), "staff-7");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = JwtAuth::new("secret")
            .issue("admin-1", Role::Admin, Duration::hours(1))
            .unwrap();
        assert!(JwtAuth::new("other").verify_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let auth = JwtAuth::new("secret");
        let token = auth.issue("admin-1", Role::Admin, Duration::hours(-2)).unwrap();
        assert!(auth.verify_token(&token).is_err());
    }

    #[test]
    fn test_role_permissions() {
        assert!(Role::Admin.can_modify_placement());
        assert!(Role::Staff.can_modify_placement());
        assert!(!Role::Parent.can_modify_placement());
    }
}
