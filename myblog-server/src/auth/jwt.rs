use std::{fmt, sync::Arc};

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;
use thiserror::Error;

use super::jwks::KeySource;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("invalid audience")]
    InvalidAudience,
    #[error("invalid issuer")]
    InvalidIssuer,
    #[error("unable to find appropriate key")]
    KeyNotFound,
    #[error("unable to fetch JWKS: {0}")]
    Jwks(String),
    #[error(transparent)]
    Token(#[from] jsonwebtoken::errors::Error),
}

/// `aud` may be a single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    pub fn contains(&self, expected: &str) -> bool {
        match self {
            Audience::One(aud) => aud == expected,
            Audience::Many(auds) => auds.iter().any(|aud| aud == expected),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub aud: Option<Audience>,
    #[serde(default)]
    pub iss: Option<String>,
    #[serde(default)]
    pub exp: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct UnverifiedClaims {
    #[serde(default)]
    aud: Option<Audience>,
    #[serde(default)]
    iss: Option<String>,
}

/// Verifies bearer tokens issued for one audience by one issuer.
///
/// Claims are checked before the signature so that a token minted for another
/// API fails with the audience or issuer error instead of a key lookup.
#[derive(Clone)]
pub struct JwtVerifier {
    audience: String,
    issuer: String,
    algorithms: Vec<Algorithm>,
    keys: Arc<dyn KeySource>,
}

impl fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("audience", &self.audience)
            .field("issuer", &self.issuer)
            .field("algorithms", &self.algorithms)
            .finish_non_exhaustive()
    }
}

impl JwtVerifier {
    pub fn new(
        audience: impl Into<String>,
        issuer: impl Into<String>,
        keys: Arc<dyn KeySource>,
    ) -> Self {
        Self {
            audience: audience.into(),
            issuer: issuer.into(),
            algorithms: vec![Algorithm::RS256],
            keys,
        }
    }

    pub fn with_algorithms(mut self, algorithms: Vec<Algorithm>) -> Self {
        if !algorithms.is_empty() {
            self.algorithms = algorithms;
        }
        self
    }

    pub async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let unverified = peek_claims(token)?;

        if !unverified
            .aud
            .as_ref()
            .is_some_and(|aud| aud.contains(&self.audience))
        {
            return Err(AuthError::InvalidAudience);
        }
        if unverified.iss.as_deref() != Some(self.issuer.as_str()) {
            return Err(AuthError::InvalidIssuer);
        }

        let header = decode_header(token)?;
        let kid = header.kid.ok_or(AuthError::KeyNotFound)?;
        let jwk = self.keys.find(&kid).await?.ok_or(AuthError::KeyNotFound)?;
        let key = DecodingKey::from_jwk(&jwk)?;

        let mut validation = Validation::new(self.algorithms[0]);
        validation.algorithms = self.algorithms.clone();
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&[&self.issuer]);

        Ok(decode::<Claims>(token, &key, &validation)?.claims)
    }
}

fn peek_claims(token: &str) -> Result<UnverifiedClaims, AuthError> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err(AuthError::Malformed("expected three segments".into())),
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|err| AuthError::Malformed(err.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|err| AuthError::Malformed(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwks::StaticKeySource;
    use jsonwebtoken::{EncodingKey, Header, encode, jwk::Jwk};
    use serde_json::json;

    const AUDIENCE: &str = "https://www.example.com";
    const ISSUER: &str = "https://example.auth0.com/";
    const SECRET: &[u8] = b"secret";

    fn hmac_jwk(kid: &str) -> Jwk {
        serde_json::from_value(json!({
            "kty": "oct",
            "kid": kid,
            "k": URL_SAFE_NO_PAD.encode(SECRET),
        }))
        .expect("valid jwk")
    }

    fn verifier(keys: StaticKeySource) -> JwtVerifier {
        JwtVerifier::new(AUDIENCE, ISSUER, Arc::new(keys)).with_algorithms(vec![Algorithm::HS256])
    }

    fn token(kid: &str, claims: serde_json::Value) -> String {
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(kid.to_string());
        encode(&header, &claims, &EncodingKey::from_secret(SECRET)).expect("encode token")
    }

    fn exp() -> u64 {
        (chrono::Utc::now().timestamp() + 3600) as u64
    }

    #[tokio::test]
    async fn rejects_foreign_audience() {
        let jwt = token("k1", json!({"sub": "u", "aud": "https://other", "iss": ISSUER, "exp": exp()}));
        let err = verifier(StaticKeySource::default()).verify(&jwt).await.expect_err("audience");
        assert_eq!(err.to_string(), "invalid audience");
    }

    #[tokio::test]
    async fn rejects_foreign_issuer() {
        let jwt = token("k1", json!({"sub": "u", "aud": [AUDIENCE, "x"], "iss": "https://evil/", "exp": exp()}));
        let err = verifier(StaticKeySource::default()).verify(&jwt).await.expect_err("issuer");
        assert_eq!(err.to_string(), "invalid issuer");
    }

    #[tokio::test]
    async fn rejects_unknown_key_id() {
        let jwt = token("missing", json!({"sub": "u", "aud": AUDIENCE, "iss": ISSUER, "exp": exp()}));
        let keys = StaticKeySource::new([hmac_jwk("k1")]);
        let err = verifier(keys).verify(&jwt).await.expect_err("kid");
        assert_eq!(err.to_string(), "unable to find appropriate key");
    }

    #[tokio::test]
    async fn accepts_valid_token() {
        let jwt = token("k1", json!({"sub": "auth0|42", "aud": AUDIENCE, "iss": ISSUER, "exp": exp()}));
        let keys = StaticKeySource::new([hmac_jwk("k1")]);
        let claims = verifier(keys).verify(&jwt).await.expect("valid token");
        assert_eq!(claims.sub, "auth0|42");
    }

    #[tokio::test]
    async fn rejects_garbage() {
        let err = verifier(StaticKeySource::default())
            .verify("not-a-token")
            .await
            .expect_err("garbage");
        assert!(matches!(err, AuthError::Malformed(_)));
    }
}
