//! The chainable request builder.
//!
//! A builder collects path segments from chained calls, resolves them into one uri the first time the uri is needed,
//! sends exactly one request on [`RequestBuilder::execute`] and hands the parsed body out through
//! [`RequestBuilder::result`].
//!
//! ```no_run
//! # async fn run(client: pathcord::client::DiscordClient) -> Result<(), pathcord::error::DiscordError> {
//! // GET {base}/channels/55/messages
//! let messages = client.as_app()
//!     .set_uri("/channels/@user/messages")
//!     .user(Some("55"))
//!     .execute()
//!     .await?
//!     .result()?;
//! # let _ = messages;
//! # Ok(())
//! # }
//! ```
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::config::DiscordConfig;
use crate::error::DiscordError;
use crate::http::{DiscordHttpRequest, DiscordHttpResponse, DiscordHttpTransport, HttpMethod};
use crate::path::{camel_segments, join_path};
use crate::session::SessionStore;

/// Decides how a builder authorises its request.
///
/// The builders for each context behave identically otherwise.
pub trait TokenContext: Send + Sync + 'static {

    /// The scheme put in front of the token in the `Authorization` header.
    const AUTH_SCHEME: &'static str;
}

#[derive(Debug, Clone, Copy)]
/// Acting as the application, authorised with the configured app token.
pub struct App;

impl TokenContext for App {
    const AUTH_SCHEME: &'static str = "Bot";
}

#[derive(Debug, Clone, Copy)]
/// Acting as a user, authorised with their OAuth token.
pub struct User;

impl TokenContext for User {
    const AUTH_SCHEME: &'static str = "Bearer";
}

/// A builder acting as the application.
pub type AppRequestBuilder = RequestBuilder<App>;

/// A builder acting as a user.
pub type UserRequestBuilder = RequestBuilder<User>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The contextual identifiers a uri can contain.
pub enum Placeholder {
    User,
    Guild,
}

impl Placeholder {

    /// The literal text replaced inside the uri.
    pub fn token(&self) -> &'static str {
        match self {
            Placeholder::User => "@user",
            Placeholder::Guild => "@guild",
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placeholder::User => f.write_str("user"),
            Placeholder::Guild => f.write_str("guild"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// The identifier requested for a [`Placeholder`].
pub enum IdRef {

    /// Substitution was never asked for, the placeholder is left alone.
    #[default]
    NotRequested,

    /// Substitute this id.
    Id(String),

    /// Substitution was asked for but no id could be found, resolving the uri fails.
    Unresolved,
}

impl From<Option<String>> for IdRef {
    fn from(id: Option<String>) -> Self {
        match id {
            Some(id) => IdRef::Id(id),
            None => IdRef::Unresolved,
        }
    }
}

/// The control operations [`RequestBuilder::call`] recognises by name, every other name is path data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    User,
    Guild,
    SetUri,
    SetMethod,
    Execute,
    Result,
}

impl Control {

    /// Names are compared in snake case, so `setUri` and `set_uri` are the same operation.
    fn lookup(name: &str) -> Option<Self> {
        match camel_segments(name).join("_").as_str() {
            "user" => Some(Control::User),
            "guild" => Some(Control::Guild),
            "set_uri" => Some(Control::SetUri),
            "set_method" => Some(Control::SetMethod),
            "execute" => Some(Control::Execute),
            "result" => Some(Control::Result),
            _ => None,
        }
    }
}

#[derive(Debug)]
/// What a dynamically dispatched call produced.
pub enum Dispatch<C: TokenContext> {

    /// The builder, ready for the next call in the chain.
    Chain(RequestBuilder<C>),

    /// The parsed body, produced by `result`.
    Result(Value),
}

impl<C: TokenContext> Dispatch<C> {

    pub fn into_builder(self) -> Option<RequestBuilder<C>> {
        match self {
            Dispatch::Chain(builder) => Some(builder),
            Dispatch::Result(_) => None,
        }
    }

    pub fn into_result(self) -> Option<Value> {
        match self {
            Dispatch::Chain(_) => None,
            Dispatch::Result(value) => Some(value),
        }
    }
}

/// Accumulates the intent of one api call and executes it once.
///
/// Builders are created by a [`DiscordClient`][crate::client::DiscordClient] and are not meant to be reused for
/// independent calls.
pub struct RequestBuilder<C: TokenContext> {

    /// Path segments in call order, joined with `/` onto the api base.
    path: Vec<String>,

    /// An explicit uri which replaces the path segments entirely.
    uri: Option<String>,

    /// The uri after assembly & substitution, fixed once computed.
    resolved_uri: Option<String>,

    method: Option<HttpMethod>,

    user: IdRef,

    guild: IdRef,

    /// The credential requests are authorised with, fixed at construction.
    token: Arc<str>,

    /// The response of the last [`RequestBuilder::execute`], whatever its status.
    response: Option<DiscordHttpResponse>,

    config: Arc<DiscordConfig>,
    transport: Arc<dyn DiscordHttpTransport>,
    session: Option<Arc<dyn SessionStore>>,
    context: PhantomData<C>,
}

impl<C: TokenContext> RequestBuilder<C> {

    pub(crate) fn new(
        token: Arc<str>,
        config: Arc<DiscordConfig>,
        transport: Arc<dyn DiscordHttpTransport>,
        session: Option<Arc<dyn SessionStore>>,
    ) -> Self {
        Self {
            path: Vec::new(),
            uri: None,
            resolved_uri: None,
            method: None,
            user: IdRef::NotRequested,
            guild: IdRef::NotRequested,
            token,
            response: None,
            config,
            transport,
            session,
            context: PhantomData,
        }
    }

    /// Runs the control operation called `name`, or appends `name` to the path when it is not one.
    ///
    /// The control operations are `user`, `guild`, `set_uri`, `set_method`, `execute` and `result`, in snake or
    /// camel case. They take their argument from the front of `args`. For path data `args` is ignored.
    pub async fn call(self, name: &str, args: &[&str]) -> Result<Dispatch<C>, DiscordError> {

        let control = match Control::lookup(name) {
            Some(control) => control,
            None => return Ok(Dispatch::Chain(self.path(name))),
        };

        let argument = args.first().copied();

        match control {
            Control::User => Ok(Dispatch::Chain(self.user(argument))),
            Control::Guild => Ok(Dispatch::Chain(self.guild(argument))),
            Control::SetUri => match argument {
                Some(uri) => Ok(Dispatch::Chain(self.set_uri(uri))),
                None => self.fail(DiscordError::usage(format!("{name} requires a uri argument")), &[]),
            },
            Control::SetMethod => match argument {
                Some(method) => self.set_method(method).map(Dispatch::Chain),
                None => self.fail(DiscordError::usage(format!("{name} requires a method argument")), &[]),
            },
            Control::Execute => {
                let mut builder = self;
                builder.execute().await?;
                Ok(Dispatch::Chain(builder))
            },
            Control::Result => self.result().map(Dispatch::Result),
        }
    }

    /// Appends the camelCase segments of `name` to the path, `guildMember` appends `guild` then `member`.
    pub fn path(mut self, name: &str) -> Self {
        self.path.extend(camel_segments(name));
        self
    }

    /// Appends `segment` to the path exactly as given.
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.path.push(segment.into());
        self
    }

    /// The path segments collected so far.
    pub fn path_segments(&self) -> &[String] {
        &self.path
    }

    /// Requests `@user` to be replaced by `user_id`, or by the id of the logged in user when `None`.
    ///
    /// Nobody being logged in only fails once the uri is resolved.
    pub fn user(mut self, user_id: Option<&str>) -> Self {
        self.user = match user_id {
            Some(user_id) => IdRef::Id(user_id.to_owned()),
            None => self.session
                .as_ref()
                .and_then(|session| session.discord_id())
                .into(),
        };
        self
    }

    /// Requests `@guild` to be replaced by `guild_id`, or by the configured default guild when `None`.
    ///
    /// A missing default only fails once the uri is resolved.
    pub fn guild(mut self, guild_id: Option<&str>) -> Self {
        self.guild = match guild_id {
            Some(guild_id) => IdRef::Id(guild_id.to_owned()),
            None => self.config.guild_id.clone().into(),
        };
        self
    }

    /// Calls `uri` instead of the chained path, dropping every segment collected so far.
    ///
    /// A relative uri is joined onto the api base, an absolute `http(s)://` one is used as is.
    /// Placeholders in it are still substituted.
    pub fn set_uri(mut self, uri: impl Into<String>) -> Self {
        self.path.clear();
        self.uri = Some(uri.into());
        self.resolved_uri = None;
        self
    }

    /// The uri this builder calls, resolved on first access and unchanged afterwards.
    pub fn uri(&mut self) -> Result<&str, DiscordError> {
        let uri = match self.resolved_uri.take() {
            Some(uri) => uri,
            None => self.build_uri()?,
        };
        Ok(self.resolved_uri.insert(uri).as_str())
    }

    /// Sets the http method, only `get`, `post` and `put` are allowed.
    pub fn set_method(mut self, method: &str) -> Result<Self, DiscordError> {
        match method.parse::<HttpMethod>() {
            Ok(method) => {
                self.method = Some(method);
                Ok(self)
            },
            Err(error) => self.fail(error, &[]),
        }
    }

    /// The http method, `get` unless another was set.
    pub fn method(&self) -> HttpMethod {
        self.method.unwrap_or_default()
    }

    /// Calls the Discord api for the current chain.
    ///
    /// The response is kept whatever its status, but anything but a `200 OK` answer is a failure.
    pub async fn execute(&mut self) -> Result<&mut Self, DiscordError> {

        let method = self.method();
        let uri = self.uri()?.to_owned();

        let request = match DiscordHttpRequest::new(method, uri, C::AUTH_SCHEME, &self.token) {
            Ok(request) => request,
            Err(cause) => return self.transport_failure(cause),
        };

        debug!(%method, uri = %request.url, "Sending request to Discord Api");

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(cause) => return self.transport_failure(cause),
        };

        debug!(status = %response.status, "Discord Api responded");

        let status = response.status;
        let failed_body = (status != StatusCode::OK).then(|| response.body.clone());
        self.response = Some(response);

        if let Some(body) = failed_body {
            let error = DiscordError::Api {
                status,
                body: body.clone(),
            };
            return self.fail(error, &[&body]);
        }

        Ok(self)
    }

    /// The json body of the executed call.
    pub fn result(&self) -> Result<Value, DiscordError> {
        self.result_as()
    }

    /// The json body of the executed call deserialized into `T`.
    pub fn result_as<T: DeserializeOwned>(&self) -> Result<T, DiscordError> {

        let response = match &self.response {
            Some(response) if response.status == StatusCode::OK => response,
            _ => return self.fail(DiscordError::usage("Attempted to get result set on bad API call."), &[&self.response]),
        };

        match response.json() {
            Ok(value) => Ok(value),
            Err(error) => self.fail(DiscordError::Decode(error), &[&response.body]),
        }
    }

    /// The raw response of the executed call.
    pub fn response(&self) -> Option<&DiscordHttpResponse> {
        self.response.as_ref()
    }

    /// Assembles the uri and applies the requested substitutions.
    fn build_uri(&self) -> Result<String, DiscordError> {

        let base = self.config.api_base();

        let uri = match &self.uri {
            Some(uri) if uri.starts_with("http://") || uri.starts_with("https://") => uri.clone(),
            Some(uri) => join_path(&base, &[uri.trim_start_matches('/')]),
            None => join_path(&base, &self.path),
        };

        let uri = self.substitute(uri, Placeholder::User, &self.user)?;
        self.substitute(uri, Placeholder::Guild, &self.guild)
    }

    fn substitute(&self, uri: String, placeholder: Placeholder, id: &IdRef) -> Result<String, DiscordError> {
        match id {
            IdRef::NotRequested => Ok(uri),
            IdRef::Unresolved => self.fail(DiscordError::MissingIdentifier { placeholder }, &[]),
            IdRef::Id(_) if !uri.contains(placeholder.token()) => {
                self.fail(DiscordError::ConfigurationMismatch { placeholder, uri }, &[])
            },
            IdRef::Id(id) => Ok(uri.replace(placeholder.token(), id)),
        }
    }

    fn transport_failure<T>(&self, cause: anyhow::Error) -> Result<T, DiscordError> {
        let causes: Vec<String> = cause.chain().map(ToString::to_string).collect();
        self.fail(DiscordError::Transport(cause), &[&causes])
    }

    /// Every failure of the builder ends up here.
    fn fail<T>(&self, error: DiscordError, payloads: &[&dyn fmt::Debug]) -> Result<T, DiscordError> {
        self.config.failure_policy.escalate(error, payloads)
    }
}

impl<C: TokenContext> fmt::Debug for RequestBuilder<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("auth_scheme", &C::AUTH_SCHEME)
            .field("path", &self.path)
            .field("uri", &self.uri)
            .field("resolved_uri", &self.resolved_uri)
            .field("method", &self.method)
            .field("user", &self.user)
            .field("guild", &self.guild)
            .field("response", &self.response)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailurePolicy;
    use crate::session::MemorySession;
    use anyhow::anyhow;
    use async_trait::async_trait;

    /// Resolution never touches the network, any send is a test bug.
    struct Offline;

    #[async_trait]
    impl DiscordHttpTransport for Offline {
        async fn send(&self, _request: DiscordHttpRequest) -> anyhow::Result<DiscordHttpResponse> {
            Err(anyhow!("offline"))
        }
    }

    fn builder(config: DiscordConfig, session: Option<MemorySession>) -> AppRequestBuilder {
        let session = session.map(|session| Arc::new(session) as Arc<dyn SessionStore>);
        let config = config.with_failure_policy(FailurePolicy::Propagate);
        RequestBuilder::new(Arc::from(config.token.as_str()), Arc::new(config), Arc::new(Offline), session)
    }

    fn app() -> AppRequestBuilder {
        builder(DiscordConfig::new("token"), None)
    }

    #[test]
    fn chained_names_become_segments_in_order() {
        let mut builder = app().path("guildMember").path("roles");
        assert_eq!(builder.path_segments(), ["guild", "member", "roles"]);
        assert_eq!(builder.uri().unwrap(), "https://discord.com/api/v10/guild/member/roles");
    }

    #[test]
    fn method_defaults_to_get() {
        assert_eq!(app().method(), HttpMethod::Get);
    }

    #[test]
    fn allowed_methods_are_kept() {
        for (name, method) in [("get", HttpMethod::Get), ("post", HttpMethod::Post), ("put", HttpMethod::Put)] {
            assert_eq!(app().set_method(name).unwrap().method(), method);
        }
    }

    #[test]
    fn other_methods_fail_immediately() {
        for name in ["delete", "POST", "patch"] {
            let error = app().set_method(name).unwrap_err();
            assert!(matches!(&error, DiscordError::Usage(message) if message.contains(name)));
        }
    }

    #[test]
    fn resolved_uri_is_fixed_after_first_read() {
        let mut builder = app().path("users").segment("@user").user(Some("1"));
        let first = builder.uri().unwrap().to_owned();

        // Later segments no longer change the already resolved uri.
        let mut builder = builder.path("ignored");
        assert_eq!(builder.uri().unwrap(), first);
        assert_eq!(first, "https://discord.com/api/v10/users/1");
    }

    #[test]
    fn user_id_replaces_placeholder() {
        let mut builder = app().set_uri("/users/@user/channels").user(Some("123"));
        assert_eq!(builder.uri().unwrap(), "https://discord.com/api/v10/users/123/channels");
    }

    #[test]
    fn every_occurrence_is_replaced() {
        let mut builder = app().segment("@user").segment("@user").user(Some("7"));
        assert_eq!(builder.uri().unwrap(), "https://discord.com/api/v10/7/7");
    }

    #[test]
    fn user_without_placeholder_is_a_mismatch() {
        let error = app().path("guildMember").user(Some("123")).uri().unwrap_err();
        assert!(matches!(error, DiscordError::ConfigurationMismatch { placeholder: Placeholder::User, .. }));
    }

    #[test]
    fn user_without_session_fails_at_resolution() {
        // Asking for the user itself is fine, the failure is deferred.
        let mut builder = app().set_uri("/users/@user").user(None);
        assert_eq!(builder.user, IdRef::Unresolved);

        let error = builder.uri().unwrap_err();
        assert!(matches!(error, DiscordError::MissingIdentifier { placeholder: Placeholder::User }));
    }

    #[test]
    fn user_reads_session_when_not_given() {
        let session = MemorySession::new().with_discord_id("321");
        let mut builder = builder(DiscordConfig::new("token"), Some(session))
            .set_uri("/users/@user")
            .user(None);
        assert_eq!(builder.uri().unwrap(), "https://discord.com/api/v10/users/321");
    }

    #[test]
    fn guild_falls_back_to_configured_default() {
        let mut builder = builder(DiscordConfig::new("token").with_guild_id("999"), None)
            .guild(None)
            .segment("@guild")
            .path("member");
        assert_eq!(builder.uri().unwrap(), "https://discord.com/api/v10/999/member");
        assert_eq!(builder.method(), HttpMethod::Get);
    }

    #[test]
    fn guild_without_default_fails_at_resolution() {
        let error = app().segment("@guild").guild(None).uri().unwrap_err();
        assert!(matches!(error, DiscordError::MissingIdentifier { placeholder: Placeholder::Guild }));
    }

    #[test]
    fn untouched_placeholders_pass_through() {
        let mut builder = app().set_uri("/guilds/@guild/members/@user");
        assert_eq!(builder.uri().unwrap(), "https://discord.com/api/v10/guilds/@guild/members/@user");
    }

    #[test]
    fn override_discards_earlier_segments() {
        let mut builder = app()
            .path("guildMember")
            .set_uri("/channels/@user/messages")
            .user(Some("55"))
            .set_method("post")
            .unwrap();

        assert!(builder.path_segments().is_empty());
        assert_eq!(builder.uri().unwrap(), "https://discord.com/api/v10/channels/55/messages");
        assert_eq!(builder.method(), HttpMethod::Post);
    }

    #[test]
    fn absolute_override_is_used_verbatim() {
        let mut builder = app().set_uri("https://example.com/@guild").guild(Some("1"));
        assert_eq!(builder.uri().unwrap(), "https://example.com/1");
    }

    #[test]
    fn result_before_execute_is_a_usage_error() {
        assert!(matches!(app().result(), Err(DiscordError::Usage(_))));
    }

    #[tokio::test]
    async fn call_dispatches_controls_before_path() {
        let builder = app()
            .call("guildMember", &["ignored"]).await.unwrap().into_builder().unwrap()
            .call("setUri", &["/users/@user"]).await.unwrap().into_builder().unwrap()
            .call("user", &["8"]).await.unwrap().into_builder().unwrap()
            .call("set_method", &["put"]).await.unwrap().into_builder().unwrap();

        let mut builder = builder.call("userGuilds", &[]).await.unwrap().into_builder().unwrap();

        assert_eq!(builder.path_segments(), ["user", "guilds"]);
        assert_eq!(builder.method(), HttpMethod::Put);
        assert_eq!(builder.uri().unwrap(), "https://discord.com/api/v10/users/8");
    }

    #[tokio::test]
    async fn call_without_required_argument_is_a_usage_error() {
        assert!(matches!(app().call("setMethod", &[]).await, Err(DiscordError::Usage(_))));
        assert!(matches!(app().call("set_uri", &[]).await, Err(DiscordError::Usage(_))));
    }

    #[tokio::test]
    async fn failed_transport_is_reported() {
        let mut builder = app().path("gateway");
        let error = builder.execute().await.unwrap_err();
        assert!(matches!(error, DiscordError::Transport(_)));
    }
}
