use std::sync::Arc;

use anyhow::Result;

use crate::builder::{AppRequestBuilder, RequestBuilder, UserRequestBuilder};
use crate::config::DiscordConfig;
use crate::error::DiscordError;
use crate::http::{DiscordHttpTransport, ReqwestTransport};
use crate::session::SessionStore;

#[derive(Clone)]
/// Represents the entry point for every request to the Discord api.
///
/// Cloning is cheap, everything inside is shared and read only.
pub struct DiscordClient {

    /// Settings shared with every builder created by this client.
    config: Arc<DiscordConfig>,

    /// How builders send their requests.
    transport: Arc<dyn DiscordHttpTransport>,

    /// The session of the request currently being served, if any.
    session: Option<Arc<dyn SessionStore>>,

}

impl DiscordClient {

    /// Creates a [`DiscordClient`] sending requests through a [`ReqwestTransport`].
    pub fn new(config: DiscordConfig) -> Result<Self> {
        Ok(Self::with_transport(config, Arc::new(ReqwestTransport::new()?)))
    }

    /// Creates a [`DiscordClient`] sending requests through `transport`.
    pub fn with_transport<T: DiscordHttpTransport + 'static>(config: DiscordConfig, transport: Arc<T>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
            session: None,
        }
    }

    /// A client bound to `session`, used for `@user` lookups and for acting as the logged in user.
    pub fn with_session(&self, session: impl SessionStore + 'static) -> Self {
        Self {
            session: Some(Arc::new(session)),
            ..self.clone()
        }
    }

    pub fn config(&self) -> &DiscordConfig {
        &self.config
    }

    /// A builder acting as the application, authorised with the configured app token.
    pub fn as_app(&self) -> AppRequestBuilder {
        RequestBuilder::new(
            Arc::from(self.config.token.as_str()),
            self.config.clone(),
            self.transport.clone(),
            self.session.clone(),
        )
    }

    /// A builder acting as a user, authorised with `token` or else the OAuth token of the session.
    ///
    /// Fails straight away when neither exists.
    pub fn as_user(&self, token: Option<String>) -> Result<UserRequestBuilder, DiscordError> {

        let token = token.or_else(|| self.session.as_ref().and_then(|session| session.oauth_token()));

        match token {
            Some(token) => Ok(RequestBuilder::new(
                Arc::from(token),
                self.config.clone(),
                self.transport.clone(),
                self.session.clone(),
            )),
            None => self.config.failure_policy.escalate(
                DiscordError::usage("Cannot access Discord API as user without an authenticated session."),
                &[],
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailurePolicy;
    use crate::http::{DiscordHttpRequest, DiscordHttpResponse};
    use crate::session::MemorySession;
    use async_trait::async_trait;

    struct Unused;

    #[async_trait]
    impl DiscordHttpTransport for Unused {
        async fn send(&self, _request: DiscordHttpRequest) -> anyhow::Result<DiscordHttpResponse> {
            anyhow::bail!("not used")
        }
    }

    fn client() -> DiscordClient {
        let config = DiscordConfig::new("app-token").with_failure_policy(FailurePolicy::Propagate);
        DiscordClient::with_transport(config, Arc::new(Unused))
    }

    #[test]
    fn as_user_needs_a_token_or_session() {
        assert!(matches!(client().as_user(None), Err(DiscordError::Usage(_))));
    }

    #[test]
    fn as_user_accepts_explicit_token() {
        assert!(client().as_user(Some("user-token".into())).is_ok());
    }

    #[test]
    fn as_user_falls_back_to_session_token() {
        let client = client().with_session(MemorySession::new().with_oauth_token("session-token"));
        assert!(client.as_user(None).is_ok());
    }

    #[test]
    fn with_session_keeps_config() {
        let client = client().with_session(MemorySession::new());
        assert_eq!(client.config().token, "app-token");
    }
}
