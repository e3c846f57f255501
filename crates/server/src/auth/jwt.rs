use jsonwebtoken::{decode, encode, errors::Error as JwtError, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    time::{SystemTime, UNIX_EPOCH},
};

/// Represents the claims we put in, and expect to find in, the JWT.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The subject of the token: the user id.
    pub sub: String,
    /// The expiration timestamp, in seconds since the epoch.
    pub exp: usize,
}

/// Signing and verification keys derived from the configured secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: u64,
}

impl fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtKeys")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// `now + ttl`, pinned to the largest representable instant on overflow.
fn expiry_after(now: u64, ttl_secs: u64) -> usize {
    usize::try_from(now.saturating_add(ttl_secs)).unwrap_or(usize::MAX)
}

impl JwtKeys {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    /// Issues a session token for `user_id`.
    pub fn issue(&self, user_id: &str) -> Result<String, JwtError> {
        let claims = Claims {
            sub: user_id.to_string(),
            exp: expiry_after(now_secs(), self.ttl_secs),
        };
        encode(&Header::default(), &claims, &self.encoding)
    }

    /// Verifies a token's signature and expiry and returns its user id.
    pub fn verify(&self, token: &str) -> Result<String, JwtError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims.sub)
    }
}
