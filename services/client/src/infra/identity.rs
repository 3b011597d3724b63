//! Identity provider adapter (GoTrue-compatible auth endpoints).

use anyhow::Context as _;
use reqwest::header::AUTHORIZATION;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::domain::repository::{IdentityService, LocalStore};
use crate::domain::types::{IdentityUser, Session};
use crate::error::ClientError;

/// Local storage key owned by the identity adapter.
pub const AUTH_TOKEN_KEY: &str = "slotbook-auth-token";

#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserBody {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: Option<UserMetadata>,
}

impl From<UserBody> for IdentityUser {
    fn from(body: UserBody) -> Self {
        let meta = body.user_metadata.unwrap_or_default();
        Self {
            id: body.id.into(),
            emails: body.email.into_iter().filter(|e| !e.is_empty()).collect(),
            full_name: meta.full_name.or(meta.name),
            first_name: meta.first_name,
            image_url: meta.avatar_url.filter(|u| !u.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    user: UserBody,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Email/password identity provider. Publishes the current [`Session`] on a
/// watch channel and keeps the token in local storage between runs.
pub struct GoTrueIdentity<L: LocalStore> {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    local: L,
    tx: watch::Sender<Session>,
}

impl<L: LocalStore> GoTrueIdentity<L> {
    pub fn new(config: &ClientConfig, local: L) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .context("build HTTP client")?;
        let (tx, _rx) = watch::channel(Session::Loading);
        Ok(Self {
            http,
            base_url: config.supabase_url.clone(),
            anon_key: config.anon_key.clone(),
            local,
            tx,
        })
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(Url::parse(&format!("{}/auth/v1{path}", self.base_url))
            .with_context(|| format!("invalid auth URL {path}"))?)
    }

    fn current_token(&self) -> Option<String> {
        self.tx.borrow().access_token().map(str::to_owned)
    }

    fn publish(&self, session: Session) {
        self.tx.send_replace(session);
    }

    /// Exchange email and password for a session.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IdentityUser, ClientError> {
        let mut url = self.url("/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        let resp = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .context("sign in: request failed")?;
        match resp.status() {
            s if s.is_success() => {}
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                warn!(email, "sign-in rejected");
                return Err(ClientError::Unauthenticated);
            }
            s => return Err(anyhow::anyhow!("sign in: {}", s.as_u16()).into()),
        }
        let body: TokenBody = resp.json().await.context("sign in: decode response")?;
        let stored = StoredToken {
            access_token: body.access_token.clone(),
            refresh_token: body.refresh_token,
        };
        let raw = serde_json::to_string(&stored).context("encode auth token")?;
        self.local.set(AUTH_TOKEN_KEY, &raw)?;

        let user = IdentityUser::from(body.user);
        info!(user_id = %user.id, "signed in");
        self.publish(Session::SignedIn {
            user: user.clone(),
            access_token: body.access_token,
        });
        Ok(user)
    }

    /// Resolve the session from the stored token. Ends `Loading` either way.
    pub async fn restore(&self) -> Result<(), ClientError> {
        let stored = self
            .local
            .get(AUTH_TOKEN_KEY)
            .and_then(|raw| serde_json::from_str::<StoredToken>(&raw).ok());
        let Some(stored) = stored else {
            self.publish(Session::SignedOut);
            return Ok(());
        };
        match self.fetch_user(&stored.access_token).await {
            Ok(user) => {
                self.publish(Session::SignedIn {
                    user,
                    access_token: stored.access_token,
                });
                Ok(())
            }
            Err(ClientError::Unauthenticated) => {
                info!("stored session expired");
                self.local.remove(AUTH_TOKEN_KEY)?;
                self.publish(Session::SignedOut);
                Ok(())
            }
            Err(e) => {
                self.publish(Session::SignedOut);
                Err(e)
            }
        }
    }

    async fn fetch_user(&self, token: &str) -> Result<IdentityUser, ClientError> {
        let resp = self
            .http
            .get(self.url("/user")?)
            .header("apikey", &self.anon_key)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .send()
            .await
            .context("fetch user: request failed")?;
        read_user(resp, "fetch user").await
    }
}

async fn read_user(resp: reqwest::Response, what: &str) -> Result<IdentityUser, ClientError> {
    match resp.status() {
        s if s.is_success() => {}
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            return Err(ClientError::Unauthenticated);
        }
        s => return Err(anyhow::anyhow!("{what}: {}", s.as_u16()).into()),
    }
    let body: UserBody = resp
        .json()
        .await
        .with_context(|| format!("{what}: decode response"))?;
    Ok(body.into())
}

impl<L: LocalStore> IdentityService for GoTrueIdentity<L> {
    fn session(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    async fn sign_out(&self) -> Result<(), ClientError> {
        if let Some(token) = self.current_token() {
            let result = self
                .http
                .post(self.url("/logout")?)
                .header("apikey", &self.anon_key)
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .send()
                .await;
            if let Err(e) = result {
                warn!(error = %e, "logout request failed; clearing local session anyway");
            }
        }
        self.local.remove(AUTH_TOKEN_KEY)?;
        self.publish(Session::SignedOut);
        info!("signed out");
        Ok(())
    }

    async fn update_avatar(&self, url: &str) -> Result<(), ClientError> {
        let token = self.current_token().ok_or(ClientError::Unauthenticated)?;
        let resp = self
            .http
            .put(self.url("/user")?)
            .header("apikey", &self.anon_key)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .json(&json!({ "data": { "avatar_url": url } }))
            .send()
            .await
            .context("update avatar: request failed")?;
        let user = read_user(resp, "update avatar").await?;
        self.publish(Session::SignedIn {
            user,
            access_token: token,
        });
        Ok(())
    }
}
