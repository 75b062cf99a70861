//! Signed bearer tokens.
//!
//! Tokens are HS256 JWTs signed with the process-wide secret. The payload
//! carries the subject and the issue/expiry instants in Unix seconds:
//!
//! ```json
//! {"sub": 42, "iat": 1704067200, "exp": 1706659200}
//! ```

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use waymark_core::UserId;

/// Reasons a token is refused.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Not a JWT, wrong algorithm, or claims of the wrong shape.
    #[error("malformed token")]
    Malformed,

    /// Signature does not match the header and payload.
    #[error("bad signature")]
    BadSignature,

    /// The token's expiry instant has passed.
    #[error("token expired")]
    Expired,

    /// Claims could not be signed.
    #[error("token encoding failed: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: UserId,
    iat: i64,
    exp: i64,
}

impl Claims {
    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// Issues and verifies bearer tokens.
///
/// Stateless: verification needs only the secret and the clock, so there is
/// no revocation list.
#[derive(Clone)]
pub struct TokenAuthority {
    header: Header,
    validation: Validation,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: TimeDelta,
}

impl std::fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthority")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenAuthority {
    #[must_use]
    pub fn new(secret: &SecretString, ttl: TimeDelta) -> Self {
        let key = secret.expose_secret().as_bytes();

        // Expiry is checked against the caller's clock in `verify_at`.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            header: Header::new(Algorithm::HS256),
            validation,
            encoding_key: EncodingKey::from_secret(key),
            decoding_key: DecodingKey::from_secret(key),
            ttl,
        }
    }

    /// Issue a token for `user` valid from now for the configured lifetime.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Encode` if signing fails.
    pub fn issue(&self, user: UserId) -> Result<String, TokenError> {
        self.issue_at(user, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Encode` if signing fails.
    pub fn issue_at(&self, user: UserId, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            sub: user,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        Ok(jsonwebtoken::encode(&self.header, &claims, &self.encoding_key)?)
    }

    /// Verify a token and return its subject.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Malformed`, `TokenError::BadSignature` or
    /// `TokenError::Expired`.
    pub fn verify(&self, token: &str) -> Result<UserId, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as if the current time were `now`.
    ///
    /// # Errors
    ///
    /// See [`Self::verify`].
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<UserId, TokenError> {
        let claims = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })?
            .claims;

        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }
        Ok(claims.sub)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn authority(secret: &str) -> TokenAuthority {
        TokenAuthority::new(&SecretString::from(secret), TimeDelta::days(30))
    }

    #[test]
    fn test_issue_then_verify_returns_subject() {
        let tokens = authority("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%");
        let token = tokens.issue(UserId::new(42)).unwrap();

        assert_eq!(token.split('.').count(), 3);
        assert_eq!(tokens.verify(&token).unwrap(), UserId::new(42));
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = authority("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%");
        let issued = Utc::now() - TimeDelta::days(31);
        let token = tokens.issue_at(UserId::new(1), issued).unwrap();

        assert!(matches!(tokens.verify(&token), Err(TokenError::Expired)));

        // Still valid one second before expiry.
        let just_before = issued + TimeDelta::days(30) - TimeDelta::seconds(1);
        assert!(tokens.verify_at(&token, just_before).is_ok());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let tokens = authority("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%");
        let alice = tokens.issue(UserId::new(1)).unwrap();
        let bob = tokens.issue(UserId::new(2)).unwrap();

        // Bob's header and payload under Alice's signature.
        let (signed, _) = bob.rsplit_once('.').unwrap();
        let (_, signature) = alice.rsplit_once('.').unwrap();
        let forged = format!("{signed}.{signature}");

        assert!(matches!(
            tokens.verify(&forged),
            Err(TokenError::BadSignature)
        ));
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let tokens = authority("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%");
        let issued = Utc::now();
        let token = tokens.issue_at(UserId::new(7), issued).unwrap();
        let expiry = issued + TimeDelta::days(30);

        assert!(matches!(
            tokens.verify_at(&token, expiry),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_other_secret_rejected() {
        let issuer = authority("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%");
        let verifier = authority("Zq8#Lm2!Wx5@Rt9$Yp3&Kd7*Hs1^Vb4%");
        let token = issuer.issue(UserId::new(1)).unwrap();

        assert!(matches!(
            verifier.verify(&token),
            Err(TokenError::BadSignature)
        ));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let tokens = authority("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%");
        for garbage in ["", "abc", "a.b", "a.b.c.d", "!!.??.**"] {
            assert!(
                matches!(tokens.verify(garbage), Err(TokenError::Malformed)),
                "{garbage:?} should be malformed"
            );
        }
    }
}
