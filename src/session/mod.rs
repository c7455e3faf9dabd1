//! Session acquisition and release.
//!
//! A user is expected to hold one open session per engine. Sessions are looked
//! up in the [`SessionStore`] and only opened through the driver when none is
//! found. Lookups are not locked: two concurrent calls may both open a
//! session, and later lookups simply reuse one of them.

pub mod properties;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::Config;
use crate::driver::{BackendSession, Engine, QueryServerDriver, User};
use crate::error::Result;
use properties::{default_properties, Property};

/// Status code of a successful session operation.
pub const STATUS_OK: i32 = 0;
/// Status code of a session operation that found nothing to act on.
pub const STATUS_NOT_FOUND: i32 = -1;
/// Status code of an operation the configuration told us not to perform.
pub const STATUS_SKIPPED: i32 = -1;

/// Persistent record of server sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The user's current session for an application, if any.
    async fn find_active(&self, user: &User, application: &str) -> Result<Option<BackendSession>>;

    /// A session by id, optionally restricted to an owner.
    async fn find(
        &self,
        id: i64,
        application: &str,
        owner: Option<&str>,
    ) -> Result<Option<BackendSession>>;
}

/// Per-user default session properties.
#[async_trait]
pub trait DefaultConfigurationSource: Send + Sync {
    async fn get_configuration_for_user(
        &self,
        app: &str,
        user: &User,
    ) -> Result<Option<Vec<Property>>>;
}

/// A session as seen by the notebook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    #[serde(rename = "type")]
    pub engine: Engine,
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Impala daemon web address, when the server reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_addr: Option<String>,
}

/// Reference to a session to close.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRef {
    pub id: i64,
    #[serde(rename = "type")]
    pub engine: Engine,
}

/// Outcome of closing a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseSessionResponse {
    pub status: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<ClosedSession>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedSession {
    pub id: i64,
    pub application: String,
    pub status: i32,
}

/// Opens, reuses and closes sessions for one user on one engine's driver.
pub struct SessionManager<'a> {
    driver: &'a dyn QueryServerDriver,
    store: &'a dyn SessionStore,
    defaults: Option<&'a dyn DefaultConfigurationSource>,
    config: &'a Config,
    user: &'a User,
}

impl<'a> SessionManager<'a> {
    pub fn new(
        driver: &'a dyn QueryServerDriver,
        store: &'a dyn SessionStore,
        defaults: Option<&'a dyn DefaultConfigurationSource>,
        config: &'a Config,
        user: &'a User,
    ) -> Self {
        Self {
            driver,
            store,
            defaults,
            config,
            user,
        }
    }

    /// Returns the user's session for `engine`, opening one if needed.
    ///
    /// Without explicit `properties` the session gets the user's default
    /// configuration (when enabled) or the engine's built-in schema.
    pub async fn create_session(
        &self,
        engine: Engine,
        properties: Option<Vec<Property>>,
    ) -> Result<Session> {
        let application = engine.server_name();

        let backend = match self.store.find_active(self.user, application).await? {
            Some(session) => {
                debug!(session_id = session.id, application, "Reusing session");
                session
            }
            None => {
                let session = self.driver.open_session(self.user).await?;
                info!(
                    session_id = session.id,
                    application,
                    user = %self.user.username,
                    "Opened session"
                );
                session
            }
        };

        let properties = match properties.filter(|p| !p.is_empty()) {
            Some(properties) => properties,
            None => self.initial_properties(engine).await?,
        };

        let http_addr = match engine {
            Engine::Impala => backend
                .properties
                .iter()
                .find(|setting| setting.key.eq_ignore_ascii_case("http_addr"))
                .map(|setting| setting.value.clone()),
            Engine::Hive | Engine::SparkSql => None,
        };

        Ok(Session {
            id: backend.id,
            engine,
            properties,
            status: None,
            http_addr,
        })
    }

    async fn initial_properties(&self, engine: Engine) -> Result<Vec<Property>> {
        if self.config.use_default_configuration {
            if let Some(source) = self.defaults {
                if let Some(properties) = source
                    .get_configuration_for_user(engine.as_str(), self.user)
                    .await?
                {
                    return Ok(properties);
                }
            }
        }
        Ok(default_properties(
            engine,
            self.config.settings_whitelist(engine),
        ))
    }

    /// Closes a session owned by the user (any session for a superuser).
    ///
    /// A session that does not exist or belongs to someone else is reported
    /// with [`STATUS_NOT_FOUND`], not as an error.
    pub async fn close_session(&self, session: &SessionRef) -> Result<CloseSessionResponse> {
        let application = session.engine.server_name();
        let owner = (!self.user.is_superuser).then_some(self.user.username.as_str());

        let Some(found) = self.store.find(session.id, application, owner).await? else {
            return Ok(CloseSessionResponse {
                status: STATUS_NOT_FOUND,
                message: "Session does not exist or you do not have permissions to close the session."
                    .to_string(),
                session: None,
            });
        };

        let closed = self.driver.close_session(&found).await?;
        info!(session_id = session.id, application, "Closed session");

        Ok(CloseSessionResponse {
            status: STATUS_OK,
            message: "Session successfully closed.".to_string(),
            session: Some(ClosedSession {
                id: session.id,
                application: closed.application,
                status: closed.status_code,
            }),
        })
    }
}
