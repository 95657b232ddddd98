use std::time::Duration;

use oracle::pool::{Pool, PoolBuilder};

use crate::config::OracleConfig;

pub type OraclePool = Pool;

/// Create the session pool shared by the synchronous and background paths.
///
/// Blocks while the initial sessions are opened; call it from
/// `spawn_blocking` or before the runtime starts serving.
pub fn create_pool(config: &OracleConfig) -> Result<OraclePool, oracle::Error> {
    let mut builder = PoolBuilder::new(
        config.user.as_str(),
        config.password.as_str(),
        config.connect_string(),
    );
    builder
        .min_connections(config.pool_min)
        .max_connections(config.pool_max)
        .timeout(Duration::from_secs(config.idle_timeout_secs))?;
    builder.build()
}
