//! Session property definitions and execution property merging.
//!
//! A session carries a list of [`Property`] definitions. Three of them are
//! understood by the executor: `files`, `functions` and `settings`. A snippet
//! may override each group; an empty group falls back to the session value.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::warn;

use crate::driver::Engine;

pub const FILES: &str = "files";
pub const FUNCTIONS: &str = "functions";
pub const SETTINGS: &str = "settings";

/// A configurable session property and its current value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub key: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nice_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple: Option<bool>,
    #[serde(
        rename = "defaultValue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl Property {
    /// Creates a bare property holding `value`.
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
            nice_name: None,
            help_text: None,
            kind: None,
            multiple: None,
            default_value: None,
            options: None,
        }
    }

    fn multi(key: &str, nice_name: &str, help_text: &str, kind: &str) -> Self {
        Self {
            nice_name: Some(nice_name.to_string()),
            help_text: Some(help_text.to_string()),
            kind: Some(kind.to_string()),
            multiple: Some(true),
            default_value: Some(Value::Array(Vec::new())),
            ..Self::new(key, Value::Array(Vec::new()))
        }
    }
}

/// A `key=value` configuration setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

impl Setting {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A file, jar or archive added to the session resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileResource {
    #[serde(rename = "type")]
    pub kind: String,
    pub path: String,
}

/// A user-defined function registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub class_name: String,
}

/// Property groups as they appear on a snippet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnippetProperties {
    #[serde(default)]
    pub settings: Vec<Setting>,
    #[serde(default)]
    pub files: Vec<FileResource>,
    #[serde(default)]
    pub functions: Vec<Function>,
}

/// Properties a statement is submitted with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionProperties {
    pub settings: Vec<Setting>,
    pub files: Vec<FileResource>,
    pub functions: Vec<Function>,
}

impl SnippetProperties {
    /// Merges the snippet groups over the session's, one group at a time.
    pub fn merge_with_session(&self, session: &[Property]) -> ExecutionProperties {
        ExecutionProperties {
            settings: or_session_group(&self.settings, session, SETTINGS),
            files: or_session_group(&self.files, session, FILES),
            functions: or_session_group(&self.functions, session, FUNCTIONS),
        }
    }
}

fn or_session_group<T: Clone + DeserializeOwned>(
    snippet: &[T],
    session: &[Property],
    key: &str,
) -> Vec<T> {
    if snippet.is_empty() {
        property_group(session, key)
    } else {
        snippet.to_vec()
    }
}

/// Reads the value of the property `key` as a list of `T`.
///
/// Missing properties give an empty list; malformed ones are logged and
/// treated as empty.
pub fn property_group<T: DeserializeOwned>(properties: &[Property], key: &str) -> Vec<T> {
    let Some(property) = properties.iter().find(|p| p.key == key) else {
        return Vec::new();
    };
    if property.value.is_null() {
        return Vec::new();
    }
    match serde_json::from_value(property.value.clone()) {
        Ok(values) => values,
        Err(e) => {
            warn!(key, "Ignoring malformed session property: {e}");
            Vec::new()
        }
    }
}

/// Built-in property schema of an engine.
///
/// `settings_whitelist` lists the settings the user may pick from.
pub fn default_properties(engine: Engine, settings_whitelist: &[String]) -> Vec<Property> {
    let mut settings = match engine {
        Engine::Impala => Property::multi(
            SETTINGS,
            "Settings",
            "Impala configuration properties.",
            "settings",
        ),
        Engine::Hive | Engine::SparkSql => Property::multi(
            SETTINGS,
            "Settings",
            "Hive and Hadoop configuration properties.",
            "settings",
        ),
    };
    settings.options = Some(
        settings_whitelist
            .iter()
            .map(|option| option.to_lowercase())
            .collect(),
    );

    match engine {
        Engine::Impala => vec![settings],
        Engine::Hive | Engine::SparkSql => vec![
            Property::multi(
                FILES,
                "Files",
                "Add one or more files, jars, or archives to the list of resources.",
                "hdfs-files",
            ),
            Property::multi(
                FUNCTIONS,
                "Functions",
                "Add one or more registered UDFs (requires function name and fully-qualified class name).",
                "functions",
            ),
            settings,
        ],
    }
}

/// Brings stored session properties up to the current schema.
///
/// Anything that is not a list of `{key, value}` objects is replaced by the
/// defaults. A list whose keys differ from the schema is treated as a legacy
/// flat settings list and moved under `settings`.
pub fn upgrade_properties(
    engine: Engine,
    properties: &Value,
    settings_whitelist: &[String],
) -> Vec<Property> {
    let mut upgraded = default_properties(engine, settings_whitelist);

    let well_formed = properties.as_array().filter(|items| {
        items.iter().all(|item| {
            item.as_object()
                .is_some_and(|obj| obj.contains_key("key") && obj.contains_key("value"))
        })
    });
    let Some(items) = well_formed else {
        warn!("Current properties are not formatted correctly, will replace with defaults.");
        return upgraded;
    };

    let same_schema = {
        let schema_keys: BTreeSet<&str> = upgraded.iter().map(|p| p.key.as_str()).collect();
        let current_keys: BTreeSet<&str> = items
            .iter()
            .filter_map(|item| item.get("key").and_then(Value::as_str))
            .collect();
        schema_keys == current_keys
    };

    if same_schema {
        if let Ok(current) = serde_json::from_value::<Vec<Property>>(properties.clone()) {
            return current;
        }
        warn!("Current properties could not be read, will replace with defaults.");
        return upgraded;
    }

    if let Some(settings) = upgraded.iter_mut().find(|p| p.key == SETTINGS) {
        settings.value = properties.clone();
    }
    upgraded
}
