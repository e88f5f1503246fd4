//! ### What is Pathcord?
//! Pathcord is a small request builder for the Discord REST api where the url path is written as a chain of calls
//! instead of being formatted by hand.
//!
//! ```no_run
//! # async fn run() -> anyhow::Result<()> {
//! use pathcord::prelude::*;
//!
//! let client = DiscordClient::new(DiscordConfig::from_env()?)?;
//!
//! // GET {base}/guilds/@guild/roles with @guild taken from the configured default guild.
//! let roles = client.as_app()
//!     .guild(None)
//!     .path("guilds")
//!     .segment("@guild")
//!     .path("roles")
//!     .execute()
//!     .await?
//!     .result()?;
//! # let _ = roles;
//! # Ok(())
//! # }
//! ```
//!
//! The library is in an experimental state where changes are made rapidly and may be breaking.

pub mod builder;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod path;
pub mod session;

/// The default base url of the Discord api, the version is appended to this.
pub const BASE_API_URL: &str = "https://discord.com/api";

/// The version of the Discord api requested when no other version is configured.
pub const DISCORD_API_VERSION: u32 = 10;

/// Commonly used types, glob import this to get started.
pub mod prelude {
    pub use crate::builder::{App, AppRequestBuilder, Dispatch, RequestBuilder, TokenContext, User, UserRequestBuilder};
    pub use crate::client::DiscordClient;
    pub use crate::config::DiscordConfig;
    pub use crate::error::{DiscordError, FailurePolicy, RequestAborted};
    pub use crate::http::{DiscordHttpRequest, DiscordHttpResponse, DiscordHttpTransport, HttpMethod, ReqwestTransport};
    pub use crate::models::DiscordUser;
    pub use crate::session::{MemorySession, SessionStore};
}
