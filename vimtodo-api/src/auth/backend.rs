use std::{fmt, sync::Arc};

use async_trait::async_trait;
use axum_login::{AuthnBackend, UserId as SessionUserId};
use oauth2::{
    basic::{BasicClient, BasicRequestTokenError},
    reqwest::{async_http_client, AsyncHttpClientError},
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, Scope,
    TokenResponse, TokenUrl,
};
use reqwest::{
    header::{AUTHORIZATION, USER_AGENT},
    Url,
};
use serde::Deserialize;

use crate::{
    config::OAuthSettings,
    domain::{models::UserId, normalize_email, User},
    repositories::{RepositoryError, UserRepository},
};

use super::password::verify_password;

#[derive(Clone, Deserialize)]
pub struct PasswordCredentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for PasswordCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordCredentials")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OAuthCredentials {
    pub code: String,
    pub old_state: CsrfToken,
    pub new_state: CsrfToken,
}

#[derive(Debug, Clone)]
pub enum Credentials {
    Password(PasswordCredentials),
    OAuth(OAuthCredentials),
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    name: Option<String>,
    email: String,
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Reqwest(reqwest::Error),

    #[error(transparent)]
    OAuth2(BasicRequestTokenError<AsyncHttpClientError>),

    #[error("password verification task failed: {0}")]
    Verification(#[from] tokio::task::JoinError),

    #[error("OAuth login is not configured")]
    OAuthDisabled,
}

/// A configured OAuth authorization-code provider.
#[derive(Debug, Clone)]
pub struct OAuthProvider {
    client: BasicClient,
    userinfo_url: Url,
    scopes: Vec<String>,
}

impl OAuthProvider {
    pub fn from_settings(settings: &OAuthSettings) -> anyhow::Result<Self> {
        let client = BasicClient::new(
            ClientId::new(settings.client_id.clone()),
            Some(ClientSecret::new(settings.client_secret.clone())),
            AuthUrl::new(settings.auth_url.clone())?,
            Some(TokenUrl::new(settings.token_url.clone())?),
        )
        .set_redirect_uri(RedirectUrl::new(settings.redirect_url.clone())?);

        Ok(Self {
            client,
            userinfo_url: Url::parse(&settings.userinfo_url)?,
            scopes: settings.scopes.clone(),
        })
    }
}

#[derive(Clone)]
pub struct AuthBackend {
    users: Arc<dyn UserRepository>,
    oauth: Option<OAuthProvider>,
    http: reqwest::Client,
}

impl fmt::Debug for AuthBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthBackend")
            .field("oauth", &self.oauth.is_some())
            .finish()
    }
}

impl AuthBackend {
    pub fn new(users: Arc<dyn UserRepository>, oauth: Option<OAuthProvider>) -> Self {
        Self {
            users,
            oauth,
            http: reqwest::Client::new(),
        }
    }

    pub fn oauth_enabled(&self) -> bool {
        self.oauth.is_some()
    }

    /// Authorization URL plus the CSRF state to stash in the session, or `None`
    /// when OAuth is not configured.
    pub fn authorize_url(&self) -> Option<(Url, CsrfToken)> {
        let provider = self.oauth.as_ref()?;
        let (url, state) = provider
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(provider.scopes.iter().cloned().map(Scope::new))
            .url();
        Some((url, state))
    }

    async fn authenticate_password(
        &self,
        creds: PasswordCredentials,
    ) -> Result<Option<User>, BackendError> {
        let Some(email) = normalize_email(&creds.email) else {
            return Ok(None);
        };
        let Some(user) = self.users.find_by_email(&email).await? else {
            return Ok(None);
        };
        let Some(hash) = user.password_hash.clone() else {
            // OAuth-only account.
            return Ok(None);
        };

        let verified =
            tokio::task::spawn_blocking(move || verify_password(&creds.password, &hash)).await?;

        Ok(verified.then_some(user))
    }

    async fn authenticate_oauth(
        &self,
        creds: OAuthCredentials,
    ) -> Result<Option<User>, BackendError> {
        let provider = self.oauth.as_ref().ok_or(BackendError::OAuthDisabled)?;

        // Ensure the CSRF state has not been tampered with.
        if creds.old_state.secret() != creds.new_state.secret() {
            return Ok(None);
        };

        // Process authorization code, expecting a token response back.
        let token_res = provider
            .client
            .exchange_code(AuthorizationCode::new(creds.code))
            .request_async(async_http_client)
            .await
            .map_err(BackendError::OAuth2)?;

        // Use access token to request user info.
        let user_info = self
            .http
            .get(provider.userinfo_url.clone())
            .header(USER_AGENT.as_str(), "vimtodo-login")
            .header(
                AUTHORIZATION.as_str(),
                format!("Bearer {}", token_res.access_token().secret()),
            )
            .send()
            .await
            .map_err(BackendError::Reqwest)?
            .error_for_status()
            .map_err(BackendError::Reqwest)?
            .json::<UserInfo>()
            .await
            .map_err(BackendError::Reqwest)?;

        let Some(email) = normalize_email(&user_info.email) else {
            tracing::warn!("OAuth provider returned an unusable email address");
            return Ok(None);
        };
        let name = user_info.name.unwrap_or_else(|| email.clone());

        let user = self.users.upsert_oauth_user(&email, &name).await?;
        Ok(Some(user))
    }
}

#[async_trait]
impl AuthnBackend for AuthBackend {
    type User = User;
    type Credentials = Credentials;
    type Error = BackendError;

    async fn authenticate(
        &self,
        creds: Self::Credentials,
    ) -> Result<Option<Self::User>, Self::Error> {
        match creds {
            Credentials::Password(creds) => self.authenticate_password(creds).await,
            Credentials::OAuth(creds) => self.authenticate_oauth(creds).await,
        }
    }

    async fn get_user(
        &self,
        user_id: &SessionUserId<Self>,
    ) -> Result<Option<Self::User>, Self::Error> {
        match self.users.get_user(UserId::from(*user_id)).await {
            Ok(user) => Ok(Some(user)),
            Err(RepositoryError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

pub type AuthSession = axum_login::AuthSession<AuthBackend>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::hash_password,
        repositories::{InMemoryUserRepository, NewUser},
    };

    async fn backend_with_user(email: &str, password: &str) -> AuthBackend {
        let users = Arc::new(InMemoryUserRepository::new());
        users
            .create_user(&NewUser {
                email: email.to_string(),
                name: "Ada".to_string(),
                password_hash: hash_password(password).unwrap(),
            })
            .await
            .unwrap();
        AuthBackend::new(users, None)
    }

    fn password(email: &str, password: &str) -> Credentials {
        Credentials::Password(PasswordCredentials {
            email: email.to_string(),
            password: password.to_string(),
        })
    }

    #[tokio::test]
    async fn password_login_accepts_matching_credentials() {
        let backend = backend_with_user("ada@example.com", "Secret123").await;

        let user = backend
            .authenticate(password("ADA@example.com", "Secret123"))
            .await
            .unwrap();
        assert_eq!(user.map(|u| u.email), Some("ada@example.com".to_string()));
    }

    #[tokio::test]
    async fn password_login_rejects_wrong_password_and_unknown_email() {
        let backend = backend_with_user("ada@example.com", "Secret123").await;

        let wrong = backend
            .authenticate(password("ada@example.com", "Secret124"))
            .await
            .unwrap();
        assert!(wrong.is_none());

        let unknown = backend
            .authenticate(password("bob@example.com", "Secret123"))
            .await
            .unwrap();
        assert!(unknown.is_none());
    }

    #[tokio::test]
    async fn oauth_login_without_provider_is_an_error() {
        let backend = backend_with_user("ada@example.com", "Secret123").await;
        assert!(!backend.oauth_enabled());
        assert!(backend.authorize_url().is_none());

        let result = backend
            .authenticate(Credentials::OAuth(OAuthCredentials {
                code: "code".to_string(),
                old_state: CsrfToken::new("a".to_string()),
                new_state: CsrfToken::new("a".to_string()),
            }))
            .await;
        assert!(matches!(result, Err(BackendError::OAuthDisabled)));
    }

    #[tokio::test]
    async fn unknown_session_user_resolves_to_none() {
        let backend = backend_with_user("ada@example.com", "Secret123").await;
        assert!(backend.get_user(&42).await.unwrap().is_none());
        assert!(backend.get_user(&1).await.unwrap().is_some());
    }
}
