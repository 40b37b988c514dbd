//! Test context: the closed set of test parameters and how they are loaded
//!
//! Parameters come from two sources. The direct source (command-line flags)
//! is loaded first and wins; the structured config document (`test_config`)
//! can only fill in what is still unset.
//!
//! ```toml
//! [test_config]
//! user = "alice@social.example"
//!
//! [test_config.resources]
//! object_id = "/notes/1"
//! deleted_object_id = "/notes/2"
//! use_tombstone = true
//! ```

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, error, info};
use url::Url;

use crate::error::{ConfigError, ConfigResult};
use crate::transport::{ACTIVITY_TYPE, Dereferenced, Transport};

/// Recognized test parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Parameter {
    ActorId,
    ObjectId,
    DeletedObjectId,
    InvalidObjectId,
    PrivateObjectId,
    UseTombstone,
    UseForbidden,
}

impl Parameter {
    pub const ALL: [Parameter; 7] = [
        Parameter::ActorId,
        Parameter::ObjectId,
        Parameter::DeletedObjectId,
        Parameter::InvalidObjectId,
        Parameter::PrivateObjectId,
        Parameter::UseTombstone,
        Parameter::UseForbidden,
    ];

    /// Name used in config documents and direct sources
    pub fn name(self) -> &'static str {
        match self {
            Parameter::ActorId => "actor_id",
            Parameter::ObjectId => "object_id",
            Parameter::DeletedObjectId => "deleted_object_id",
            Parameter::InvalidObjectId => "invalid_object_id",
            Parameter::PrivateObjectId => "private_object_id",
            Parameter::UseTombstone => "use_tombstone",
            Parameter::UseForbidden => "use_forbidden",
        }
    }

    pub fn kind(self) -> ParamKind {
        match self {
            Parameter::UseTombstone | Parameter::UseForbidden => ParamKind::Flag,
            _ => ParamKind::Identifier,
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Parameter {
    type Err = ConfigError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Parameter::ALL
            .into_iter()
            .find(|param| param.name() == name)
            .ok_or_else(|| ConfigError::UnknownParameter(name.to_string()))
    }
}

/// Declared kind of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// A URL, optionally relative to the configured server
    Identifier,
    /// A boolean switch
    Flag,
}

impl ParamKind {
    pub fn describe(self) -> &'static str {
        match self {
            ParamKind::Identifier => "a URL string",
            ParamKind::Flag => "a boolean",
        }
    }

    /// Validate a raw value for `param`.
    ///
    /// Returns `None` for an empty identifier string, which counts as not
    /// supplied. Identifiers are joined against `base` when one is given.
    pub fn validate(
        self,
        param: Parameter,
        raw: &toml::Value,
        base: Option<&Url>,
    ) -> ConfigResult<Option<ParamValue>> {
        let wrong_kind = || ConfigError::WrongKind {
            param: param.name(),
            expected: self.describe(),
            found: raw.type_str(),
        };

        match self {
            ParamKind::Identifier => {
                let text = raw.as_str().ok_or_else(wrong_kind)?;
                if text.is_empty() {
                    return Ok(None);
                }
                let parsed = match base {
                    Some(base) => base.join(text),
                    None => Url::parse(text),
                };
                parsed
                    .map(|url| Some(ParamValue::Identifier(url)))
                    .map_err(|source| ConfigError::InvalidUrl {
                        param: param.name(),
                        value: text.to_string(),
                        source,
                    })
            }
            ParamKind::Flag => raw
                .as_bool()
                .map(|flag| Some(ParamValue::Flag(flag)))
                .ok_or_else(wrong_kind),
        }
    }
}

/// A validated parameter value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Identifier(Url),
    Flag(bool),
}

impl ParamValue {
    /// Whether the value counts towards "something was configured"
    fn is_supplied(&self) -> bool {
        match self {
            ParamValue::Identifier(_) => true,
            ParamValue::Flag(flag) => *flag,
        }
    }
}

/// Source of directly supplied parameter values (e.g. parsed CLI flags)
pub trait ParamSource {
    fn lookup(&self, param: Parameter) -> Option<toml::Value>;
}

impl ParamSource for HashMap<String, toml::Value> {
    fn lookup(&self, param: Parameter) -> Option<toml::Value> {
        self.get(param.name()).cloned()
    }
}

impl ParamSource for toml::Table {
    fn lookup(&self, param: Parameter) -> Option<toml::Value> {
        self.get(param.name()).cloned()
    }
}

/// Parameters for one run of the suite.
///
/// Populated by [`load_direct`](Self::load_direct) and
/// [`load_config`](Self::load_config), then only read by test cases.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestContext {
    actor_id: Option<Url>,
    object_id: Option<Url>,
    deleted_object_id: Option<Url>,
    invalid_object_id: Option<Url>,
    private_object_id: Option<Url>,
    use_tombstone: Option<bool>,
    use_forbidden: Option<bool>,
    /// Base URL for relative identifiers in the config document
    server: Option<Url>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actor_id(&self) -> Option<&Url> {
        self.actor_id.as_ref()
    }

    pub fn object_id(&self) -> Option<&Url> {
        self.object_id.as_ref()
    }

    pub fn deleted_object_id(&self) -> Option<&Url> {
        self.deleted_object_id.as_ref()
    }

    pub fn invalid_object_id(&self) -> Option<&Url> {
        self.invalid_object_id.as_ref()
    }

    pub fn private_object_id(&self) -> Option<&Url> {
        self.private_object_id.as_ref()
    }

    /// Deleted objects answer 410 instead of 404. Unset means false.
    pub fn use_tombstone(&self) -> bool {
        self.use_tombstone.unwrap_or(false)
    }

    /// Private objects answer 403 instead of 404. Unset means false.
    pub fn use_forbidden(&self) -> bool {
        self.use_forbidden.unwrap_or(false)
    }

    pub fn server(&self) -> Option<&Url> {
        self.server.as_ref()
    }

    /// Current value of any parameter
    pub fn get(&self, param: Parameter) -> Option<ParamValue> {
        match param {
            Parameter::ActorId => self.actor_id.clone().map(ParamValue::Identifier),
            Parameter::ObjectId => self.object_id.clone().map(ParamValue::Identifier),
            Parameter::DeletedObjectId => {
                self.deleted_object_id.clone().map(ParamValue::Identifier)
            }
            Parameter::InvalidObjectId => {
                self.invalid_object_id.clone().map(ParamValue::Identifier)
            }
            Parameter::PrivateObjectId => {
                self.private_object_id.clone().map(ParamValue::Identifier)
            }
            Parameter::UseTombstone => self.use_tombstone.map(ParamValue::Flag),
            Parameter::UseForbidden => self.use_forbidden.map(ParamValue::Flag),
        }
    }

    pub fn is_set(&self, param: Parameter) -> bool {
        self.get(param).is_some()
    }

    /// True when no parameter has been set from any source
    pub fn is_empty(&self) -> bool {
        Parameter::ALL.iter().all(|param| !self.is_set(*param))
    }

    /// Set a parameter by name.
    ///
    /// Fails for names outside the parameter set and for values of the wrong
    /// kind. A parameter that is already set keeps its value. Returns whether
    /// a non-empty value was supplied.
    pub fn set(&mut self, name: &str, raw: &toml::Value) -> ConfigResult<bool> {
        let param = name.parse()?;
        self.set_param(param, raw, None)
    }

    fn set_param(
        &mut self,
        param: Parameter,
        raw: &toml::Value,
        base: Option<&Url>,
    ) -> ConfigResult<bool> {
        let Some(value) = param.kind().validate(param, raw, base)? else {
            return Ok(false);
        };
        let supplied = value.is_supplied();

        if self.is_set(param) {
            debug!("{} already set; ignoring lower-precedence value", param);
            return Ok(supplied);
        }

        debug!("Setting {} = {:?}", param, value);
        match value {
            ParamValue::Identifier(url) => {
                if let Some(slot) = self.identifier_slot(param) {
                    *slot = Some(url);
                }
            }
            ParamValue::Flag(flag) => {
                if let Some(slot) = self.flag_slot(param) {
                    *slot = Some(flag);
                }
            }
        }
        Ok(supplied)
    }

    fn identifier_slot(&mut self, param: Parameter) -> Option<&mut Option<Url>> {
        match param {
            Parameter::ActorId => Some(&mut self.actor_id),
            Parameter::ObjectId => Some(&mut self.object_id),
            Parameter::DeletedObjectId => Some(&mut self.deleted_object_id),
            Parameter::InvalidObjectId => Some(&mut self.invalid_object_id),
            Parameter::PrivateObjectId => Some(&mut self.private_object_id),
            Parameter::UseTombstone | Parameter::UseForbidden => None,
        }
    }

    fn flag_slot(&mut self, param: Parameter) -> Option<&mut Option<bool>> {
        match param {
            Parameter::UseTombstone => Some(&mut self.use_tombstone),
            Parameter::UseForbidden => Some(&mut self.use_forbidden),
            _ => None,
        }
    }

    /// Load directly supplied values for every recognized parameter.
    ///
    /// Returns whether at least one non-empty value was supplied.
    pub fn load_direct(&mut self, source: &impl ParamSource) -> ConfigResult<bool> {
        let mut any_arg = false;
        for param in Parameter::ALL {
            if let Some(raw) = source.lookup(param) {
                any_arg |= self.set_param(param, &raw, None)?;
            }
        }
        Ok(any_arg)
    }

    /// Load the `test_config` section of a parsed config document.
    ///
    /// A `user` (`name@host`) fixes the server to `https://host` and resolves
    /// `actor_id` via webfinger; otherwise `server` is taken as is. Entries in
    /// `resources` are validated like direct values, with identifiers joined
    /// against the server. Webfinger failures are logged, not returned.
    pub async fn load_config(
        &mut self,
        document: &toml::Table,
        transport: &dyn Transport,
    ) -> ConfigResult<bool> {
        let Some(section) = document.get("test_config") else {
            debug!("Config document has no test_config section");
            return Ok(false);
        };
        let section = section
            .as_table()
            .ok_or_else(|| ConfigError::document("test_config must be a table"))?;

        let mut any_arg = false;
        if let Some(user) = section.get("user") {
            let user = user.as_str().ok_or_else(|| ConfigError::WrongKind {
                param: "user",
                expected: "a string",
                found: user.type_str(),
            })?;
            let host = account_host(user)?;
            self.server = Some(server_url(&format!("https://{host}"))?);
            any_arg |= self.discover_actor(user, transport).await;
        } else if let Some(server) = section.get("server") {
            let server = server.as_str().ok_or_else(|| ConfigError::WrongKind {
                param: "server",
                expected: "a string",
                found: server.type_str(),
            })?;
            self.server = Some(server_url(server)?);
        }

        if let Some(resources) = section.get("resources") {
            let resources = resources
                .as_table()
                .ok_or_else(|| ConfigError::document("resources must be a table"))?;
            let base = self.server.clone();
            for (name, raw) in resources {
                let param: Parameter = name.parse()?;
                any_arg |= self.set_param(param, raw, base.as_ref())?;
            }
        }

        Ok(any_arg)
    }

    async fn discover_actor(&mut self, user: &str, transport: &dyn Transport) -> bool {
        if self.actor_id.is_some() {
            debug!("actor_id already set; skipping webfinger lookup for {}", user);
            return false;
        }
        let Some(server) = self.server.clone() else {
            return false;
        };

        info!("Loading info for user {}", user);
        let info = match transport.webfinger(&server, user).await {
            Ok(Dereferenced::Object(info)) => info,
            Ok(Dereferenced::Rejected(err)) => {
                error!("Failed to fetch webfinger info for {}: {}", user, err);
                return false;
            }
            Err(err) => {
                error!("Failed to fetch webfinger info for {}: {}", user, err);
                return false;
            }
        };

        match self_link(&info).and_then(|href| Url::parse(href).ok()) {
            Some(actor) => {
                info!("Resolved {} to {}", user, actor);
                self.actor_id = Some(actor);
                true
            }
            None => {
                error!("Webfinger info for {} has no usable self link", user);
                false
            }
        }
    }
}

/// Host part of a `name@host` account
fn account_host(user: &str) -> ConfigResult<&str> {
    let mut parts = user.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(name), Some(host), None) if !name.is_empty() && !host.is_empty() => Ok(host),
        _ => Err(ConfigError::InvalidUser(user.to_string())),
    }
}

fn server_url(value: &str) -> ConfigResult<Url> {
    let url = Url::parse(value).map_err(|e| ConfigError::InvalidServer {
        value: value.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidServer {
            value: value.to_string(),
            reason: "not usable as a base URL".to_string(),
        });
    }
    Ok(url)
}

/// `href` of the webfinger `self` link, preferring the ActivityStreams one
fn self_link(info: &Value) -> Option<&str> {
    let links: Vec<&Value> = info
        .get("links")?
        .as_array()?
        .iter()
        .filter(|link| link.get("rel").and_then(Value::as_str) == Some("self"))
        .collect();

    links
        .iter()
        .find(|link| link.get("type").and_then(Value::as_str) == Some(ACTIVITY_TYPE))
        .or_else(|| links.first())
        .copied()
        .and_then(|link| link.get("href"))
        .and_then(Value::as_str)
}
