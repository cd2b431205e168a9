//! Token decoding + validation.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use crate::claims::{JwtClaims, TokenValidationError, validate_claims};

/// Validates a raw bearer token into claims.
///
/// Object-safe so the HTTP layer can hold it as `Arc<dyn JwtValidator>`.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError>;
}

/// HS256 validator over a shared secret.
pub struct Hs256JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256JwtValidator {
    pub fn new(secret: Vec<u8>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // The claim time window is chrono-based (issued_at / expires_at), so the
        // library's numeric `exp`/`iat` handling is disabled and the window is
        // checked deterministically in `validate_claims`.
        validation.validate_exp = false;
        validation.set_required_spec_claims::<&str>(&[]);

        Self {
            key: DecodingKey::from_secret(&secret),
            validation,
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError> {
        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.key, &self.validation)
            .map_err(|e| TokenValidationError::Rejected(e.to_string()))?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bodega_core::{CompanyId, PrincipalId};
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header};

    use crate::Role;

    fn mint(secret: &[u8], issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> String {
        let claims = JwtClaims {
            sub: PrincipalId::new(),
            company_id: CompanyId::new(),
            roles: vec![Role::new("admin")],
            issued_at,
            expires_at,
        };
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    #[test]
    fn accepts_valid_token() {
        let now = Utc::now();
        let token = mint(b"secret", now - Duration::minutes(1), now + Duration::minutes(10));
        let validator = Hs256JwtValidator::new(b"secret".to_vec());
        let claims = validator.validate(&token, now).unwrap();
        assert!(claims.roles.iter().any(|r| r.as_str() == "admin"));
    }

    #[test]
    fn rejects_wrong_secret() {
        let now = Utc::now();
        let token = mint(b"secret", now - Duration::minutes(1), now + Duration::minutes(10));
        let validator = Hs256JwtValidator::new(b"other".to_vec());
        let err = validator.validate(&token, now).unwrap_err();
        assert!(matches!(err, TokenValidationError::Rejected(_)));
    }

    #[test]
    fn rejects_expired_token() {
        let now = Utc::now();
        let token = mint(b"secret", now - Duration::minutes(20), now - Duration::minutes(10));
        let validator = Hs256JwtValidator::new(b"secret".to_vec());
        let err = validator.validate(&token, now).unwrap_err();
        assert_eq!(err, TokenValidationError::Expired);
    }
}
