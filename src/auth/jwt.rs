use std::{collections::HashSet, time::Duration};

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::Claims;
use crate::config::JwtConfig;

/// One year.
pub const MAX_TTL_MINUTES: u64 = 365 * 24 * 60;

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("jwt signing secret is not configured")]
    MissingSecret,

    #[error("jwt ttl of {0} minutes must be between one minute and one year")]
    InvalidTtl(u64),

    #[error("token expiry falls outside the supported date range")]
    ExpiryOutOfRange,

    #[error("jwt encode failed: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),
}

/// Why a presented token was refused. Logged, never shown to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenRejection {
    #[error("malformed token")]
    Malformed,

    #[error("signature does not verify")]
    BadSignature,

    #[error("token expired")]
    Expired,

    #[error("token not yet valid")]
    NotYetValid,

    #[error("issuer or audience mismatch")]
    UntrustedIssuer,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

/// Signing and verification keys, built once at startup from config.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Result<Self, SigningError> {
        if cfg.secret.is_empty() {
            return Err(SigningError::MissingSecret);
        }
        if !(1..=MAX_TTL_MINUTES).contains(&cfg.ttl_minutes) {
            return Err(SigningError::InvalidTtl(cfg.ttl_minutes));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs(cfg.ttl_minutes * 60),
        })
    }

    /// Signs a token valid over `[now, now + ttl)`, at whole-second precision.
    pub fn issue(&self, user_id: i64, now: OffsetDateTime) -> Result<IssuedToken, SigningError> {
        let issued_at = now - TimeDuration::nanoseconds(i64::from(now.nanosecond()));
        let ttl = TimeDuration::try_from(self.ttl).map_err(|_| SigningError::ExpiryOutOfRange)?;
        let expires_at = issued_at
            .checked_add(ttl)
            .ok_or(SigningError::ExpiryOutOfRange)?;
        let iat = issued_at.unix_timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            iat,
            nbf: iat,
            exp: expires_at.unix_timestamp(),
            jti: format!("{}.{}.{}", user_id, iat, Uuid::new_v4().simple()),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id, exp = claims.exp, "jwt signed");
        Ok(IssuedToken { token, expires_at })
    }

    /// Checks signature, issuer/audience and the validity window against
    /// `now`, returning the subject user id.
    pub fn validate(&self, token: &str, now: OffsetDateTime) -> Result<i64, TokenRejection> {
        let claims = self.decode_claims(token)?;
        let at = now.unix_timestamp();
        if at < claims.nbf {
            return Err(TokenRejection::NotYetValid);
        }
        if at >= claims.exp {
            return Err(TokenRejection::Expired);
        }
        let user_id = claims.user_id().ok_or(TokenRejection::Malformed)?;
        debug!(user_id, jti = %claims.jti, "jwt verified");
        Ok(user_id)
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, TokenRejection> {
        // Window checks happen in `validate` against the caller's clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims = ["exp", "nbf", "sub"]
            .into_iter()
            .map(String::from)
            .collect::<HashSet<_>>();
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.set_audience(std::slice::from_ref(&self.audience));

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenRejection::BadSignature,
                ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience => {
                    TokenRejection::UntrustedIssuer
                }
                _ => TokenRejection::Malformed,
            })
    }
}
