use anyhow::{Context, Result};

use crate::api::{ApiClient, ClientError};
use crate::app::App;
use crate::config::VimtodoConfig;
use crate::session_store;

/// Build a client for the configured server from the saved session.
pub fn connect(config: &VimtodoConfig) -> Result<ApiClient> {
    let session_id = session_store::load_session()?
        .context("Not logged in. Run `vimtodo login` first.")?;
    ApiClient::new(&config.api_url, &session_id)
}

/// Resolve the current user before the terminal is taken over, so an expired
/// session is reported on the plain console.
pub async fn initialize_app(client: &ApiClient) -> Result<App> {
    let me = match client.me().await {
        Ok(me) => me,
        Err(ClientError::Unauthorized) => {
            anyhow::bail!("{}", ClientError::Unauthorized)
        }
        Err(e) => return Err(e).context("Could not reach vimtodo-api"),
    };
    tracing::info!(user_id = me.id, email = %me.email, "signed in");

    Ok(App::new(me.name, client.is_dev()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dev_client_initializes_as_dev_user() {
        let client = ApiClient::dev().unwrap();
        let app = initialize_app(&client).await.unwrap();

        assert_eq!(app.user_name, "Dev User");
        assert!(app.dev_mode);
        assert!(app.tasks().is_empty());
        assert!(app.running);
    }
}
