//! Example showing the most basic request, fetching the default guild as the application.
//!
//! Needs `DISCORD_TOKEN` and `DISCORD_GUILD_ID`, either exported or in a `.env` file.

use pathcord::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {

    // Logs go to stdout, set RUST_LOG=pathcord=debug to see every request being sent.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Failures are handed back here instead of unwinding, there is no web request to abort.
    let config = DiscordConfig::from_env()?
        .with_failure_policy(FailurePolicy::Propagate);
    let client = DiscordClient::new(config)?;

    // GET {base}/guilds/{DISCORD_GUILD_ID}
    let guild = client.as_app()
        .guild(None)
        .path("guilds")
        .segment("@guild")
        .execute()
        .await?
        .result()?;

    println!("{guild:#}");

    Ok(())
}
