//! Objects hydrated from the Discord api through a request builder.
use serde_json::Value;

use crate::client::DiscordClient;
use crate::error::DiscordError;

#[derive(Debug, Clone, PartialEq)]
/// A user as a member of the configured guild.
pub struct DiscordUser {

    /// The snowflake id of the user.
    pub id: String,

    /// The [guild member object](https://discord.com/developers/docs/resources/guild#guild-member-object) as returned
    /// by the api.
    pub attributes: Value,
}

impl DiscordUser {

    /// Fetches the guild member `snowflake` from the configured default guild, acting as the application.
    pub async fn fetch(client: &DiscordClient, snowflake: impl Into<String>) -> Result<Self, DiscordError> {

        let id = snowflake.into();

        let attributes = client.as_app()
            .set_uri("/guilds/@guild/members/@user")
            .guild(None)
            .user(Some(&id))
            .execute()
            .await?
            .result()?;

        Ok(Self { id, attributes })
    }

    /// A single attribute of the member object.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn username(&self) -> Option<&str> {
        self.attributes.get("user")?.get("username")?.as_str()
    }

    /// The guild nickname of the member, if they have one.
    pub fn nick(&self) -> Option<&str> {
        self.get("nick")?.as_str()
    }
}
