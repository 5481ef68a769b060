use std::time::Duration;

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::{Claims, IdentityDomain};
use crate::config::JwtConfig;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
    #[error("token belongs to the {0:?} domain")]
    WrongDomain(IdentityDomain),
}

/// Signing and verification keys for one identity domain.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Option<Duration>,
    domain: IdentityDomain,
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig, domain: IdentityDomain) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: cfg
                .ttl_minutes
                .map(|m| Duration::from_secs((m as u64) * 60)),
            domain,
        }
    }

    pub fn domain(&self) -> IdentityDomain {
        self.domain
    }

    pub fn issue(&self, id: Uuid, name: &str) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = self
            .ttl
            .map(|ttl| (now + TimeDuration::seconds(ttl.as_secs() as i64)).unix_timestamp() as usize);
        let claims = Claims {
            sub: id,
            name: name.to_string(),
            iat: now.unix_timestamp() as usize,
            exp,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            domain: self.domain,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(id = %id, domain = ?self.domain, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        if self.ttl.is_some() {
            validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        } else {
            validation.set_required_spec_claims(&["sub", "iss", "aud"]);
        }
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        if data.claims.domain != self.domain {
            return Err(TokenError::WrongDomain(data.claims.domain));
        }
        debug!(id = %data.claims.sub, domain = ?self.domain, "jwt verified");
        Ok(data.claims)
    }
}
