//! Notebook and snippet documents sent by the UI.

use serde::{Deserialize, Serialize};

use crate::driver::Engine;
use crate::handle::HandleDocument;
use crate::session::properties::SnippetProperties;
use crate::session::Session;

/// The notebook a snippet belongs to, with its open sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    #[serde(default)]
    pub sessions: Vec<Session>,
}

impl Notebook {
    pub fn new(sessions: Vec<Session>) -> Self {
        Self { sessions }
    }

    /// The notebook's session for `engine`, if one is open.
    pub fn session(&self, engine: Engine) -> Option<&Session> {
        self.sessions.iter().find(|s| s.engine == engine)
    }
}

/// One editor cell: a script, the engine it targets and the handle of its
/// last submitted statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub engine: Engine,
    #[serde(default)]
    pub statement: String,
    #[serde(default)]
    pub properties: SnippetProperties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Last status reported to the UI (`running`, `available`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub result: SnippetResult,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnippetResult {
    #[serde(default)]
    pub handle: HandleDocument,
}

impl Snippet {
    pub fn new(engine: Engine, statement: impl Into<String>) -> Self {
        Self {
            id: None,
            engine,
            statement: statement.into(),
            properties: SnippetProperties::default(),
            database: None,
            status: None,
            result: SnippetResult::default(),
        }
    }

    /// Database named by the snippet, or `fallback` when it names none.
    pub fn database_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.database
            .as_deref()
            .filter(|db| !db.is_empty())
            .unwrap_or(fallback)
    }

    /// The handle document of the last submission.
    pub fn handle(&self) -> &HandleDocument {
        &self.result.handle
    }
}
