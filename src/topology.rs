//! Connection topology resolution.
//!
//! Turns an (optional) service binding into a [`ResolvedTopology`]: either a
//! single standalone endpoint or a sentinel group watching a named master,
//! plus whether the transport uses TLS. This is pure data transformation;
//! nothing here touches the network.

use crate::credentials::{CredentialError, CredentialValue, Credentials, ServiceBinding};
use std::fmt;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 6379;
pub const DEFAULT_MASTER_NAME: &str = "mymaster";

/// A single `host:port` sentinel address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentinelNode {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for SentinelNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Where and how to reach the store.
#[derive(Clone, PartialEq, Eq)]
pub enum ConnectionDescriptor {
    Standalone {
        host: String,
        port: u16,
        password: Option<String>,
    },
    Sentinel {
        master_name: String,
        /// Never empty.
        sentinel_nodes: Vec<SentinelNode>,
        password: Option<String>,
        sentinel_password: Option<String>,
    },
}

// Hand-written so passwords never reach the logs.
impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionDescriptor::Standalone { host, port, password } => f
                .debug_struct("Standalone")
                .field("host", host)
                .field("port", port)
                .field("password", &password.as_ref().map(|_| "***"))
                .finish(),
            ConnectionDescriptor::Sentinel {
                master_name,
                sentinel_nodes,
                password,
                sentinel_password,
            } => f
                .debug_struct("Sentinel")
                .field("master_name", master_name)
                .field("sentinel_nodes", sentinel_nodes)
                .field("password", &password.as_ref().map(|_| "***"))
                .field("sentinel_password", &sentinel_password.as_ref().map(|_| "***"))
                .finish(),
        }
    }
}

/// A descriptor together with its TLS policy, which covers every node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTopology {
    pub descriptor: ConnectionDescriptor,
    pub tls: bool,
}

impl ResolvedTopology {
    /// `localhost:6379`, no password, plaintext.
    pub fn local() -> Self {
        Self {
            descriptor: ConnectionDescriptor::Standalone {
                host: DEFAULT_HOST.to_string(),
                port: DEFAULT_PORT,
                password: None,
            },
            tls: false,
        }
    }

    pub fn log_startup(&self) {
        match &self.descriptor {
            ConnectionDescriptor::Standalone { host, port, password } => {
                tracing::info!("Redis topology: standalone at {}:{}", host, port);
                tracing::info!("  Password: {}", if password.is_some() { "set" } else { "none" });
            }
            ConnectionDescriptor::Sentinel {
                master_name,
                sentinel_nodes,
                ..
            } => {
                let nodes: Vec<String> = sentinel_nodes.iter().map(ToString::to_string).collect();
                tracing::info!("Redis topology: sentinel, master '{}'", master_name);
                tracing::info!("  Sentinels: {}", nodes.join(", "));
            }
        }
        tracing::info!("  TLS: {}", if self.tls { "enabled" } else { "disabled" });
    }
}

/// Resolve a binding into a topology. `None` yields [`ResolvedTopology::local`].
pub fn resolve(binding: Option<&ServiceBinding>) -> Result<ResolvedTopology, CredentialError> {
    let Some(binding) = binding else {
        return Ok(ResolvedTopology::local());
    };

    let credentials = &binding.credentials;
    let descriptor = if is_sentinel(credentials) {
        resolve_sentinel(credentials)?
    } else {
        resolve_standalone(credentials)?
    };

    Ok(ResolvedTopology {
        descriptor,
        tls: has_tls_port(credentials),
    })
}

/// Like [`resolve`], but a malformed binding falls back to the local default.
pub fn resolve_or_local(binding: Option<&ServiceBinding>) -> ResolvedTopology {
    match resolve(binding) {
        Ok(topology) => topology,
        Err(e) => {
            tracing::warn!(
                "Could not resolve Redis binding '{}', falling back to {}:{}: {}",
                binding.map(|b| b.name.as_str()).unwrap_or_default(),
                DEFAULT_HOST,
                DEFAULT_PORT,
                e
            );
            ResolvedTopology::local()
        }
    }
}

fn is_sentinel(credentials: &Credentials) -> bool {
    credentials.contains_key("sentinels") || credentials.contains_key("master_name")
}

fn has_tls_port(credentials: &Credentials) -> bool {
    credentials.contains_key("tls_port")
}

fn resolve_standalone(credentials: &Credentials) -> Result<ConnectionDescriptor, CredentialError> {
    let host = credentials
        .text("host")?
        .unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = match credentials.port("tls_port")? {
        Some(port) => port,
        None => credentials.port("port")?.unwrap_or(DEFAULT_PORT),
    };

    Ok(ConnectionDescriptor::Standalone {
        host,
        port,
        password: credentials.text("password")?,
    })
}

fn resolve_sentinel(credentials: &Credentials) -> Result<ConnectionDescriptor, CredentialError> {
    let master_name = credentials
        .text("master_name")?
        .unwrap_or_else(|| DEFAULT_MASTER_NAME.to_string());

    let entries = credentials
        .get("sentinels")
        .and_then(CredentialValue::as_list)
        .unwrap_or_default();

    let mut sentinel_nodes = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let Some(entry) = entry.as_map() else {
            tracing::debug!("Skipping sentinel entry {}: not a mapping", index);
            continue;
        };
        match sentinel_node(entry)? {
            Some(node) => sentinel_nodes.push(node),
            None => tracing::debug!("Skipping sentinel entry {}: missing host or port", index),
        }
    }

    if sentinel_nodes.is_empty() {
        return Err(CredentialError::Malformed {
            field: "sentinels".to_string(),
            reason: "no usable sentinel nodes".to_string(),
        });
    }

    let password = credentials.text("password")?;
    let sentinel_password = credentials
        .text("sentinel_password")?
        .or_else(|| password.clone());

    Ok(ConnectionDescriptor::Sentinel {
        master_name,
        sentinel_nodes,
        password,
        sentinel_password,
    })
}

/// A node from one sentinel mapping, preferring `tls_port` over `port`.
fn sentinel_node(entry: &Credentials) -> Result<Option<SentinelNode>, CredentialError> {
    let Some(host) = entry.text("host")? else {
        return Ok(None);
    };
    let port = match entry.port("tls_port")? {
        Some(port) => Some(port),
        None => entry.port("port")?,
    };
    Ok(port.map(|port| SentinelNode { host, port }))
}
