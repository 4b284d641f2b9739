use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use super::errors::ServerError;
use super::models::Claims;

/// Validates an HS256 session token and returns the user id (`sub`).
///
/// Expiry is always checked; the audience only when one is configured.
pub fn validate_token(token: &str, secret: &str, audience: Option<&str>) -> Result<String, ServerError> {
    let key = DecodingKey::from_secret(secret.as_ref());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    match audience {
        Some(aud) => validation.set_audience(&[aud]),
        None => validation.validate_aud = false,
    }

    let claims = decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|err| ServerError::Auth(format!("JWT validation failed: {}", err)))?;

    if claims.sub.trim().is_empty() {
        return Err(ServerError::Auth("missing or empty 'sub' claim".to_string()));
    }
    Ok(claims.sub)
}
