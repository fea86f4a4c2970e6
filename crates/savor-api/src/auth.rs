use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use tracing::warn;

use savor_db::Database;
use savor_types::api::{Claims, Identity};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub identity: Box<dyn IdentityResolver>,
}

impl AppStateInner {
    pub fn new(db: Database, identity: impl IdentityResolver + 'static) -> AppState {
        Arc::new(Self {
            db,
            identity: Box::new(identity),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No usable credential was presented.
    #[error("unauthorized")]
    Unauthorized,
    /// A credential was presented and rejected.
    #[error("forbidden")]
    Forbidden,
}

/// Turns a bearer credential into the caller's identity.
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, token: &str) -> Result<Identity, AuthError>;
}

/// HS256 JWT verification against a shared secret.
pub struct JwtIdentityResolver {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityResolver {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn with_audience(mut self, audience: &str) -> Self {
        self.validation.validate_aud = true;
        self.validation.set_audience(&[audience]);
        self
    }

    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.validation.set_issuer(&[issuer]);
        self
    }
}

impl IdentityResolver for JwtIdentityResolver {
    fn resolve(&self, token: &str) -> Result<Identity, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            warn!("Rejected token: {}", e);
            AuthError::Forbidden
        })?;

        if data.claims.sub.is_empty() {
            warn!("Rejected token with empty subject");
            return Err(AuthError::Forbidden);
        }

        Ok(data.claims.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn token(secret: &str, sub: &str, exp_offset: i64) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            name: Some("Ada".into()),
            picture: None,
            exp: (chrono::Utc::now().timestamp() + exp_offset) as usize,
        };
        let key = EncodingKey::from_secret(secret.as_bytes());
        encode(&Header::default(), &claims, &key).unwrap()
    }

    #[test]
    fn resolves_valid_token() {
        let resolver = JwtIdentityResolver::new("s3cret");
        let identity = resolver.resolve(&token("s3cret", "uid-1", 3600)).unwrap();
        assert_eq!(identity.uid, "uid-1");
        assert_eq!(identity.name.as_deref(), Some("Ada"));
        assert_eq!(identity.picture, None);
    }

    #[test]
    fn wrong_secret_is_forbidden() {
        let resolver = JwtIdentityResolver::new("s3cret");
        let err = resolver.resolve(&token("other", "uid-1", 3600)).unwrap_err();
        assert_eq!(err, AuthError::Forbidden);
    }

    #[test]
    fn expired_token_is_forbidden() {
        let resolver = JwtIdentityResolver::new("s3cret");
        assert!(resolver.resolve(&token("s3cret", "uid-1", -3600)).is_err());
    }

    #[test]
    fn empty_subject_is_forbidden() {
        let resolver = JwtIdentityResolver::new("s3cret");
        assert_eq!(
            resolver.resolve(&token("s3cret", "", 3600)).unwrap_err(),
            AuthError::Forbidden
        );
    }

    #[test]
    fn audience_is_enforced_when_configured() {
        let resolver = JwtIdentityResolver::new("s3cret").with_audience("savor");
        assert!(resolver.resolve(&token("s3cret", "uid-1", 3600)).is_err());
    }

    #[test]
    fn garbage_is_forbidden() {
        let resolver = JwtIdentityResolver::new("s3cret");
        assert_eq!(resolver.resolve("not-a-jwt").unwrap_err(), AuthError::Forbidden);
    }
}
