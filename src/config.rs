use std::path::Path;

use serde_json::{json, Map, Value};

use crate::errors::{Error, Result};

/// Key of the configuration section read by this crate.
pub const SECTION: &str = "authorization";

const DEFAULT_PRIVILEGE_KEY: &str = "default_privilege";
const ALLOW_UNNAMED_ROUTES_KEY: &str = "allow_unnamed_routes";

/// Middleware settings taken from the `authorization` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationConfig {
    /// Passed as the privilege of every authorization query.
    pub default_privilege: Option<String>,
    /// Whether matched routes without a name skip authorization.
    pub allow_unnamed_routes: bool,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            default_privilege: None,
            allow_unnamed_routes: true,
        }
    }
}

impl AuthorizationConfig {
    /// Read the settings from a nested configuration document. Values of the
    /// wrong shape fall back to their defaults.
    pub fn from_value(config: &Value) -> Self {
        let section = config.get(SECTION);
        let defaults = Self::default();

        let default_privilege = section
            .and_then(|s| s.get(DEFAULT_PRIVILEGE_KEY))
            .and_then(Value::as_str)
            .map(str::to_string);

        let allow_unnamed_routes = section
            .and_then(|s| s.get(ALLOW_UNNAMED_ROUTES_KEY))
            .and_then(Value::as_bool)
            .unwrap_or(defaults.allow_unnamed_routes);

        Self {
            default_privilege,
            allow_unnamed_routes,
        }
    }
}

/// Default configuration document with an empty `authorization` section.
pub fn default_config() -> Value {
    json!({ SECTION: {} })
}

pub fn load_file(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| Error::invalid_config(format!("cannot read {}: {err}", path.display())))?;

    serde_json::from_str(&raw)
        .map_err(|err| Error::invalid_config(format!("{} is not valid JSON: {err}", path.display())))
}

/// Apply `AUTHZ_DEFAULT_PRIVILEGE` and `AUTHZ_ALLOW_UNNAMED_ROUTES` on top of
/// the document.
pub fn merge_env(config: Value) -> Result<Value> {
    merge_overrides(
        config,
        std::env::var("AUTHZ_DEFAULT_PRIVILEGE").ok(),
        std::env::var("AUTHZ_ALLOW_UNNAMED_ROUTES").ok(),
    )
}

fn merge_overrides(
    mut config: Value,
    default_privilege: Option<String>,
    allow_unnamed_routes: Option<String>,
) -> Result<Value> {
    let allow_unnamed_routes = allow_unnamed_routes
        .map(|raw| match raw.trim().to_lowercase().as_str() {
            "1" | "true" => Ok(true),
            "0" | "false" => Ok(false),
            _ => Err(Error::invalid_config(
                "AUTHZ_ALLOW_UNNAMED_ROUTES must be one of true, false, 1, 0",
            )),
        })
        .transpose()?;

    if default_privilege.is_none() && allow_unnamed_routes.is_none() {
        return Ok(config);
    }

    let root = config
        .as_object_mut()
        .ok_or_else(|| Error::invalid_config("configuration root must be an object"))?;

    let section = root
        .entry(SECTION)
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| Error::invalid_config("authorization section must be an object"))?;

    if let Some(privilege) = default_privilege {
        section.insert(DEFAULT_PRIVILEGE_KEY.to_string(), Value::String(privilege));
    }
    if let Some(allow) = allow_unnamed_routes {
        section.insert(ALLOW_UNNAMED_ROUTES_KEY.to_string(), Value::Bool(allow));
    }

    Ok(config)
}
