//! Session token creation and validation.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use super::types::{AuthConfig, Claims};
use crate::provider::AccessToken;

/// Create a session token carrying the user's Google access token.
///
/// The session expires together with the access token it wraps.
pub fn create_token(
    config: &AuthConfig,
    email: &str,
    name: Option<String>,
    access_token: &AccessToken,
    lifetime: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let exp = now + lifetime;

    let claims = Claims {
        sub: email.to_string(),
        name,
        access_token: access_token.secret().to_string(),
        iat: now.timestamp(),
        exp: exp.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
}

/// Validate a session token and return claims.
pub fn validate_token(
    config: &AuthConfig,
    token: &str,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::types::test_config;

    #[test]
    fn test_create_and_validate_token() {
        let config = test_config();
        let token = create_token(
            &config,
            "test@example.com",
            Some("Test User".to_string()),
            &AccessToken::new("ya29.token"),
            Duration::hours(1),
        )
        .expect("should create token");

        let claims = validate_token(&config, &token).expect("should validate token");
        assert_eq!(claims.sub, "test@example.com");
        assert_eq!(claims.name, Some("Test User".to_string()));
        assert_eq!(claims.access_token, "ya29.token");
    }

    #[test]
    fn test_invalid_token_rejected() {
        let config = test_config();
        let result = validate_token(&config, "invalid-token");
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let config = test_config();
        let token = create_token(
            &config,
            "test@example.com",
            None,
            &AccessToken::new("ya29.token"),
            Duration::hours(1),
        )
        .expect("should create token");

        let mut wrong_config = config;
        wrong_config.jwt_secret = "wrong-secret".to_string();

        let result = validate_token(&wrong_config, &token);
        assert!(result.is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let config = test_config();
        let token = create_token(
            &config,
            "test@example.com",
            None,
            &AccessToken::new("ya29.token"),
            Duration::hours(-2),
        )
        .expect("should create token");

        assert!(validate_token(&config, &token).is_err());
    }
}
