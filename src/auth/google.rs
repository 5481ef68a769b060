use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Identity asserted by an external provider after its token checked out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> anyhow::Result<ExternalIdentity>;
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    iss: String,
    email: Option<String>,
    email_verified: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

impl TokenInfo {
    fn into_identity(self, client_id: &str) -> anyhow::Result<ExternalIdentity> {
        anyhow::ensure!(self.aud == client_id, "token audience mismatch");
        anyhow::ensure!(
            GOOGLE_ISSUERS.contains(&self.iss.as_str()),
            "unexpected issuer {}",
            self.iss
        );
        anyhow::ensure!(
            self.email_verified.as_deref() == Some("true"),
            "email not verified"
        );
        let email = self.email.context("token carries no email")?;
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());
        Ok(ExternalIdentity {
            email,
            name,
            picture: self.picture,
        })
    }
}

/// Checks Google ID tokens against the `tokeninfo` endpoint.
#[derive(Clone)]
pub struct GoogleVerifier {
    http: reqwest::Client,
    client_id: Option<String>,
}

impl GoogleVerifier {
    pub fn new(client_id: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id,
        }
    }
}

#[async_trait]
impl IdentityVerifier for GoogleVerifier {
    async fn verify(&self, id_token: &str) -> anyhow::Result<ExternalIdentity> {
        let client_id = self
            .client_id
            .as_deref()
            .context("GOOGLE_CLIENT_ID is not configured")?;
        let info = self
            .http
            .get(TOKENINFO_URL)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .context("tokeninfo request")?
            .error_for_status()
            .context("tokeninfo rejected token")?
            .json::<TokenInfo>()
            .await
            .context("tokeninfo body")?;
        let identity = info.into_identity(client_id)?;
        debug!(email = %identity.email, "google token verified");
        Ok(identity)
    }
}
