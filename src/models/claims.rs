//! JWT claims issued by the user management service

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Role granting access to every loan
const ADMIN_ROLES: [&str; 2] = ["ADMINISTRADOR", "ADMIN"];

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    #[serde(default)]
    pub role: String,
    /// Borrower id; absent for service accounts
    #[serde(default, rename = "userId", alias = "user_id")]
    pub user_id: Option<i64>,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn is_admin(&self) -> bool {
        ADMIN_ROLES.contains(&self.role.to_uppercase().as_str())
    }

    /// Require admin privileges
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator privileges required".to_string()))
        }
    }

    /// Borrowers may only act on their own loans; admins on any
    pub fn require_self_or_admin(&self, user_id: i64) -> Result<(), AppError> {
        if self.is_admin() || self.user_id == Some(user_id) {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Access to another user's loans is not allowed".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: &str, user_id: Option<i64>) -> UserClaims {
        UserClaims {
            sub: "reader@library.test".to_string(),
            role: role.to_string(),
            user_id,
            exp: chrono::Utc::now().timestamp() + 3600,
            iat: chrono::Utc::now().timestamp(),
        }
    }

    #[test]
    fn test_token_round_trip() {
        let original = claims("USUARIO", Some(4));
        let token = original.create_token("secret").unwrap();

        let parsed = UserClaims::from_token(&token, "secret").unwrap();
        assert_eq!(parsed.user_id, Some(4));
        assert_eq!(parsed.role, "USUARIO");

        assert!(UserClaims::from_token(&token, "other-secret").is_err());
    }

    #[test]
    fn test_access_rules() {
        let reader = claims("USUARIO", Some(4));
        assert!(!reader.is_admin());
        assert!(reader.require_self_or_admin(4).is_ok());
        assert!(reader.require_self_or_admin(5).is_err());
        assert!(reader.require_admin().is_err());

        let admin = claims("administrador", None);
        assert!(admin.is_admin());
        assert!(admin.require_self_or_admin(5).is_ok());
    }
}
