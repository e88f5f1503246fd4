//! Access to the authenticated session of whoever the current request acts for.

/// The session of the current request, as far as Discord is concerned.
///
/// Web frameworks implement this over their own session storage, [`MemorySession`] covers everything else.
pub trait SessionStore: Send + Sync {

    /// The OAuth token the user authorised this application with.
    fn oauth_token(&self) -> Option<String>;

    /// The Discord id of the logged in user.
    fn discord_id(&self) -> Option<String>;
}

#[derive(Debug, Clone, Default)]
/// A [`SessionStore`] holding its values in memory.
pub struct MemorySession {
    oauth_token: Option<String>,
    discord_id: Option<String>,
}

impl MemorySession {

    /// An empty session, nobody is logged in.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_oauth_token(mut self, token: impl Into<String>) -> Self {
        self.oauth_token = Some(token.into());
        self
    }

    pub fn with_discord_id(mut self, discord_id: impl Into<String>) -> Self {
        self.discord_id = Some(discord_id.into());
        self
    }
}

impl SessionStore for MemorySession {
    fn oauth_token(&self) -> Option<String> {
        self.oauth_token.clone()
    }

    fn discord_id(&self) -> Option<String> {
        self.discord_id.clone()
    }
}
