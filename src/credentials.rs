//! Service bindings discovered from the platform environment.
//!
//! On a Cloud Foundry style platform, `VCAP_APPLICATION` marks that the
//! process runs on the platform and `VCAP_SERVICES` carries the bound
//! services as a JSON object of `label -> [binding, ...]`. Each binding has a
//! free-form `credentials` object whose values may be scalars, lists or
//! nested objects; those are modelled by [`CredentialValue`].

use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::env;
use thiserror::Error;

/// A credential field could not be read in the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("malformed credential `{field}`: {reason}")]
    Malformed { field: String, reason: String },
}

impl CredentialError {
    fn malformed(field: &str, reason: impl Into<String>) -> Self {
        CredentialError::Malformed {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// One value inside a binding's credentials.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "serde_json::Value")]
pub enum CredentialValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<CredentialValue>),
    Map(Credentials),
}

impl From<JsonValue> for CredentialValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => CredentialValue::Null,
            JsonValue::Bool(b) => CredentialValue::Bool(b),
            JsonValue::Number(n) => CredentialValue::Number(n),
            JsonValue::String(s) => CredentialValue::String(s),
            JsonValue::Array(items) => {
                CredentialValue::List(items.into_iter().map(CredentialValue::from).collect())
            }
            JsonValue::Object(map) => CredentialValue::Map(Credentials(
                map.into_iter()
                    .map(|(k, v)| (k, CredentialValue::from(v)))
                    .collect(),
            )),
        }
    }
}

impl From<&str> for CredentialValue {
    fn from(value: &str) -> Self {
        CredentialValue::String(value.to_string())
    }
}

impl From<u16> for CredentialValue {
    fn from(value: u16) -> Self {
        CredentialValue::Number(value.into())
    }
}

impl CredentialValue {
    /// Text rendering of a scalar. Null and empty strings read as absent.
    pub fn as_text(&self, field: &str) -> Result<Option<String>, CredentialError> {
        match self {
            CredentialValue::Null => Ok(None),
            CredentialValue::String(s) if s.is_empty() => Ok(None),
            CredentialValue::String(s) => Ok(Some(s.clone())),
            CredentialValue::Bool(b) => Ok(Some(b.to_string())),
            CredentialValue::Number(n) => Ok(Some(n.to_string())),
            CredentialValue::List(_) => Err(CredentialError::malformed(field, "expected a scalar, found a list")),
            CredentialValue::Map(_) => Err(CredentialError::malformed(field, "expected a scalar, found a mapping")),
        }
    }

    /// A TCP port given either as a number or as a numeric string.
    pub fn as_port(&self, field: &str) -> Result<u16, CredentialError> {
        let raw = match self {
            CredentialValue::Number(n) => n
                .as_u64()
                .ok_or_else(|| CredentialError::malformed(field, format!("`{}` is not a port number", n)))?,
            CredentialValue::String(s) => s
                .trim()
                .parse::<u64>()
                .map_err(|_| CredentialError::malformed(field, format!("`{}` is not a port number", s)))?,
            other => {
                return Err(CredentialError::malformed(
                    field,
                    format!("expected a port number, found {:?}", other),
                ))
            }
        };

        match u16::try_from(raw) {
            Ok(port) if port > 0 => Ok(port),
            _ => Err(CredentialError::malformed(field, format!("port {} is out of range 1-65535", raw))),
        }
    }

    pub fn as_list(&self) -> Option<&[CredentialValue]> {
        match self {
            CredentialValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Credentials> {
        match self {
            CredentialValue::Map(map) => Some(map),
            _ => None,
        }
    }
}

/// String-keyed credential mapping of a binding (or of a nested object).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Credentials(BTreeMap<String, CredentialValue>);

impl Credentials {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with(mut self, key: &str, value: impl Into<CredentialValue>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&CredentialValue> {
        self.0.get(key)
    }

    /// Text value of `key`; missing, null and empty all read as `None`.
    pub fn text(&self, key: &str) -> Result<Option<String>, CredentialError> {
        match self.0.get(key) {
            Some(value) => value.as_text(key),
            None => Ok(None),
        }
    }

    /// Port value of `key`; missing and null read as `None`.
    pub fn port(&self, key: &str) -> Result<Option<u16>, CredentialError> {
        match self.0.get(key) {
            None | Some(CredentialValue::Null) => Ok(None),
            Some(value) => value.as_port(key).map(Some),
        }
    }
}

/// A named service bound to the application.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceBinding {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub credentials: Credentials,
}

#[cfg(test)]
impl ServiceBinding {
    pub fn new(name: &str, credentials: Credentials) -> Self {
        Self {
            name: name.to_string(),
            label: None,
            tags: Vec::new(),
            credentials,
        }
    }
}

/// Snapshot of the platform environment taken once at startup.
#[derive(Debug, Clone, Default)]
pub struct PlatformEnv {
    on_platform: bool,
    services: Vec<ServiceBinding>,
}

impl PlatformEnv {
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let on_platform = lookup("VCAP_APPLICATION").is_some();

        let services = match lookup("VCAP_SERVICES") {
            Some(raw) if !raw.trim().is_empty() => {
                match serde_json::from_str::<BTreeMap<String, Vec<ServiceBinding>>>(&raw) {
                    // Labels come back sorted; bindings keep their order within a label.
                    Ok(by_label) => by_label.into_values().flatten().collect(),
                    Err(e) => {
                        tracing::warn!("Ignoring unparseable VCAP_SERVICES: {}", e);
                        Vec::new()
                    }
                }
            }
            _ => Vec::new(),
        };

        Self {
            on_platform,
            services,
        }
    }

    pub fn is_on_platform(&self) -> bool {
        self.on_platform
    }

    /// All bindings called `name`, across every service label.
    pub fn find_services_by_name(&self, name: &str) -> Vec<&ServiceBinding> {
        self.services.iter().filter(|s| s.name == name).collect()
    }

    /// The binding to use for `name`, if the process runs on the platform.
    pub fn binding(&self, name: &str) -> Option<&ServiceBinding> {
        if !self.on_platform {
            return None;
        }
        self.find_services_by_name(name).into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const VCAP_SERVICES: &str = r#"{
        "p.redis": [
            {
                "name": "ha-redis",
                "label": "p.redis",
                "tags": ["redis"],
                "credentials": {
                    "host": "redis.internal",
                    "port": 6379,
                    "tls_port": "6380",
                    "password": "secret",
                    "sentinels": [{"host": "s1", "port": 26379}, "junk"]
                }
            },
            { "name": "other-redis", "credentials": {} }
        ],
        "user-provided": [
            { "name": "ha-redis", "credentials": { "host": "second" } }
        ]
    }"#;

    fn platform(vars: &[(&str, &str)]) -> PlatformEnv {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PlatformEnv::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_find_services_by_name_across_labels() {
        let env = platform(&[("VCAP_APPLICATION", "{}"), ("VCAP_SERVICES", VCAP_SERVICES)]);

        let found = env.find_services_by_name("ha-redis");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].label.as_deref(), Some("p.redis"));
        assert_eq!(found[0].tags, vec!["redis".to_string()]);
        assert!(env.find_services_by_name("missing").is_empty());

        let binding = env.binding("ha-redis").unwrap();
        assert_eq!(binding.credentials.text("host").unwrap().as_deref(), Some("redis.internal"));
    }

    #[test]
    fn test_not_on_platform_has_no_binding() {
        let env = platform(&[("VCAP_SERVICES", VCAP_SERVICES)]);
        assert!(!env.is_on_platform());
        assert!(env.binding("ha-redis").is_none());
    }

    #[test]
    fn test_unparseable_services_are_ignored() {
        let env = platform(&[("VCAP_APPLICATION", "{}"), ("VCAP_SERVICES", "{not json")]);
        assert!(env.is_on_platform());
        assert!(env.binding("ha-redis").is_none());
    }

    #[test]
    fn test_heterogeneous_credential_values() {
        let env = platform(&[("VCAP_APPLICATION", "{}"), ("VCAP_SERVICES", VCAP_SERVICES)]);
        let creds = &env.binding("ha-redis").unwrap().credentials;

        let sentinels = creds.get("sentinels").and_then(CredentialValue::as_list).unwrap();
        assert_eq!(sentinels.len(), 2);
        assert!(sentinels[0].as_map().is_some());
        assert!(sentinels[1].as_map().is_none());

        assert_eq!(creds.port("port").unwrap(), Some(6379));
        assert_eq!(creds.port("tls_port").unwrap(), Some(6380));
        assert_eq!(creds.port("missing").unwrap(), None);
    }

    #[test]
    fn test_text_reads_empty_and_null_as_absent() {
        let creds = Credentials::new()
            .with("empty", "")
            .with("null", CredentialValue::Null)
            .with("number", 42u16);

        assert_eq!(creds.text("empty").unwrap(), None);
        assert_eq!(creds.text("null").unwrap(), None);
        assert_eq!(creds.text("missing").unwrap(), None);
        assert_eq!(creds.text("number").unwrap().as_deref(), Some("42"));
    }

    #[test]
    fn test_text_rejects_structured_values() {
        let creds = Credentials::new().with("password", CredentialValue::List(vec![]));
        let err = creds.text("password").unwrap_err();
        assert!(err.to_string().contains("password"));
    }

    #[test]
    fn test_port_rejects_garbage_and_out_of_range() {
        let creds = Credentials::new()
            .with("word", "sixty")
            .with("zero", 0u16)
            .with("big", "70000")
            .with("negative", CredentialValue::Number((-1i64).into()));

        assert!(matches!(creds.port("word"), Err(CredentialError::Malformed { .. })));
        assert!(creds.port("zero").is_err());
        assert!(creds.port("big").is_err());
        assert!(creds.port("negative").is_err());
    }
}
