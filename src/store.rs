use async_trait::async_trait;
use bb8::{ManageConnection, Pool, PooledConnection, RunError};
use redis::aio::MultiplexedConnection;
use redis::sentinel::{SentinelClient, SentinelNodeConnectionInfo, SentinelServerType};
use redis::{Client, ConnectionAddr, ConnectionInfo, RedisConnectionInfo, RedisError, TlsMode};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::topology::{ConnectionDescriptor, ResolvedTopology};

/// Errors raised while building or using the store connection pool.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The client could not be constructed from the resolved topology.
    #[error("failed to initialise Redis client: {0}")]
    ConnectionInit(#[source] RedisError),
    /// No pooled connection could be borrowed.
    #[error("failed to borrow Redis connection: {0}")]
    Pool(#[source] RunError<RedisError>),
    #[error("Redis command failed: {0}")]
    Command(#[from] RedisError),
}

/// Pool policy. Sizes are fixed; only the borrow timeout follows configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_size: u32,
    /// Idle connections never exceed `max_size` in bb8, so this is informational.
    pub max_idle: u32,
    pub min_idle: u32,
    pub test_on_borrow: bool,
    pub borrow_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_size: 8,
            max_idle: 8,
            min_idle: 1,
            test_on_borrow: true,
            borrow_timeout: Duration::from_secs(5),
        }
    }
}

impl PoolSettings {
    pub fn with_borrow_timeout(borrow_timeout: Duration) -> Self {
        Self {
            borrow_timeout,
            ..Self::default()
        }
    }
}

/// Opens connections for the pool, either directly or through sentinels.
pub enum RedisConnector {
    Standalone(Client),
    // `SentinelClient` needs `&mut self` to connect.
    Sentinel(Mutex<SentinelClient>),
}

impl RedisConnector {
    pub fn from_topology(topology: &ResolvedTopology) -> Result<Self, StoreError> {
        match &topology.descriptor {
            ConnectionDescriptor::Standalone { host, port, password } => {
                let info = ConnectionInfo {
                    addr: address(host, *port, topology.tls),
                    redis: auth(password.as_deref()),
                };
                let client = Client::open(info).map_err(StoreError::ConnectionInit)?;
                Ok(RedisConnector::Standalone(client))
            }
            ConnectionDescriptor::Sentinel {
                master_name,
                sentinel_nodes,
                password,
                sentinel_password,
            } => {
                let sentinels: Vec<ConnectionInfo> = sentinel_nodes
                    .iter()
                    .map(|node| ConnectionInfo {
                        addr: address(&node.host, node.port, topology.tls),
                        redis: auth(sentinel_password.as_deref()),
                    })
                    .collect();

                let master_info = SentinelNodeConnectionInfo {
                    tls_mode: topology.tls.then_some(TlsMode::Secure),
                    redis_connection_info: Some(auth(password.as_deref())),
                };

                let client = SentinelClient::build(
                    sentinels,
                    master_name.clone(),
                    Some(master_info),
                    SentinelServerType::Master,
                )
                .map_err(StoreError::ConnectionInit)?;
                Ok(RedisConnector::Sentinel(Mutex::new(client)))
            }
        }
    }
}

fn address(host: &str, port: u16, tls: bool) -> ConnectionAddr {
    if tls {
        ConnectionAddr::TcpTls {
            host: host.to_string(),
            port,
            insecure: false,
            tls_params: None,
        }
    } else {
        ConnectionAddr::Tcp(host.to_string(), port)
    }
}

fn auth(password: Option<&str>) -> RedisConnectionInfo {
    RedisConnectionInfo {
        password: password.map(str::to_string),
        ..RedisConnectionInfo::default()
    }
}

#[async_trait]
impl ManageConnection for RedisConnector {
    type Connection = MultiplexedConnection;
    type Error = RedisError;

    async fn connect(&self) -> Result<Self::Connection, Self::Error> {
        match self {
            RedisConnector::Standalone(client) => client.get_multiplexed_async_connection().await,
            RedisConnector::Sentinel(client) => client.lock().await.get_async_connection().await,
        }
    }

    async fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        match self {
            RedisConnector::Standalone(_) => {
                let pong: String = redis::cmd("PING").query_async(conn).await?;
                if pong == "PONG" {
                    Ok(())
                } else {
                    Err(RedisError::from((
                        redis::ErrorKind::ResponseError,
                        "unexpected PING reply",
                        pong,
                    )))
                }
            }
            // A demoted master still answers PING, so ask for its role instead.
            RedisConnector::Sentinel(_) => {
                let role: Vec<redis::Value> = redis::cmd("ROLE").query_async(conn).await?;
                ensure_master(&role)
            }
        }
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}

/// Accept a `ROLE` reply only if it names a master.
fn ensure_master(role: &[redis::Value]) -> Result<(), RedisError> {
    let name: String = match role.first() {
        Some(value) => redis::from_redis_value(value)?,
        None => String::new(),
    };
    if name == "master" {
        Ok(())
    } else {
        Err(RedisError::from((
            redis::ErrorKind::ReadOnly,
            "pooled connection no longer points at the master",
            name,
        )))
    }
}

/// Pooled handle to the store; cheap to clone and shared by every request.
#[derive(Clone)]
pub struct StoreClient {
    pool: Pool<RedisConnector>,
}

impl StoreClient {
    /// Build the pool for a resolved topology.
    ///
    /// No connection is opened here: reachability shows up on first use.
    /// Must be called from within a Tokio runtime.
    pub fn build(topology: &ResolvedTopology, settings: &PoolSettings) -> Result<Self, StoreError> {
        let connector = RedisConnector::from_topology(topology)?;

        let pool = Pool::builder()
            .max_size(settings.max_size)
            .min_idle(Some(settings.min_idle))
            .test_on_check_out(settings.test_on_borrow)
            .connection_timeout(settings.borrow_timeout)
            .build_unchecked(connector);

        tracing::info!(
            "Redis pool ready (max {}, idle {}..={}, validate on borrow: {})",
            settings.max_size,
            settings.min_idle,
            settings.max_idle,
            settings.test_on_borrow
        );

        Ok(Self { pool })
    }

    /// Borrow a connection, waiting at most the configured borrow timeout.
    pub async fn connection(&self) -> Result<PooledConnection<'_, RedisConnector>, StoreError> {
        self.pool.get().await.map_err(StoreError::Pool)
    }
}
