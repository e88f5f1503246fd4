use std::env;
use std::fmt;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::FailurePolicy;
use crate::{BASE_API_URL, DISCORD_API_VERSION};

#[derive(Clone, Deserialize)]
/// Process wide settings a [`DiscordClient`][crate::client::DiscordClient] is created with.
///
/// Nothing in here changes once the client exists, builders only ever read it.
pub struct DiscordConfig {

    /// The token of the application, used by every builder acting as the app.
    pub token: String,

    /// The guild substituted for `@guild` when a builder asks for the guild without naming one.
    #[serde(default)]
    pub guild_id: Option<String>,

    /// The base url of the api, without the version.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// The api version appended to the base url as `/v{api_version}`.
    #[serde(default = "default_api_version")]
    pub api_version: u32,

    /// What happens to a builder failure once it has been logged.
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

fn default_base_url() -> String {
    BASE_API_URL.to_owned()
}

fn default_api_version() -> u32 {
    DISCORD_API_VERSION
}

impl DiscordConfig {

    /// Creates a config for `token` with every other setting at its default.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            guild_id: None,
            base_url: default_base_url(),
            api_version: default_api_version(),
            failure_policy: FailurePolicy::default(),
        }
    }

    /// Reads the config from the environment, loading a `.env` file first if one exists.
    ///
    /// | variable | setting |
    /// |---|---|
    /// | `DISCORD_TOKEN` | [`DiscordConfig::token`], required |
    /// | `DISCORD_GUILD_ID` | [`DiscordConfig::guild_id`] |
    /// | `DISCORD_API_BASE` | [`DiscordConfig::base_url`] |
    /// | `DISCORD_API_VERSION` | [`DiscordConfig::api_version`] |
    /// | `DISCORD_FAILURE_POLICY` | [`DiscordConfig::failure_policy`], `abort` or `propagate` |
    pub fn from_env() -> Result<Self> {

        // A missing .env file is fine, the variables may be set some other way.
        let _ = dotenv::dotenv();

        let token = env::var("DISCORD_TOKEN")
            .context("DISCORD_TOKEN must be set to access the Discord api as the application")?;
        let mut config = Self::new(token);

        config.guild_id = env::var("DISCORD_GUILD_ID").ok().filter(|guild_id| !guild_id.is_empty());

        if let Ok(base_url) = env::var("DISCORD_API_BASE") {
            config.base_url = base_url;
        }

        if let Ok(version) = env::var("DISCORD_API_VERSION") {
            config.api_version = version.parse::<u32>()
                .with_context(|| format!("DISCORD_API_VERSION should be a whole number, got {version}"))?;
        }

        if let Ok(policy) = env::var("DISCORD_FAILURE_POLICY") {
            config.failure_policy = policy.parse::<FailurePolicy>()
                .context("Failed to read DISCORD_FAILURE_POLICY")?;
        }

        Ok(config)
    }

    pub fn with_guild_id(mut self, guild_id: impl Into<String>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    /// The versioned base every request path is joined onto, e.g. `https://discord.com/api/v10`.
    pub fn api_base(&self) -> String {
        format!("{}/v{}", self.base_url.trim_end_matches('/'), self.api_version)
    }
}

// The token is a credential and stays out of logs.
impl fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("token", &"<redacted>")
            .field("guild_id", &self.guild_id)
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("failure_policy", &self.failure_policy)
            .finish()
    }
}
