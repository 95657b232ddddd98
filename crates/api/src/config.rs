use crate::middleware::auth::AuthConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `300`). Synchronous calls
    /// hold the request open for the whole backend round trip.
    pub request_timeout_secs: u64,
    /// Upper bound on draining in-flight requests at shutdown (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Finished jobs are evicted from memory this long after they end.
    pub job_retention_hours: i64,
    /// Interval between retention sweeps.
    pub job_sweep_interval_secs: u64,
    /// Bearer token and IP allow-list.
    pub auth: AuthConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                 |
    /// |---------------------------|-------------------------|
    /// | `HOST`                    | `0.0.0.0`               |
    /// | `PORT`                    | `8080`                  |
    /// | `CORS_ORIGINS`            | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`    | `300`                   |
    /// | `SHUTDOWN_TIMEOUT_SECS`   | `30`                    |
    /// | `JOB_RETENTION_HOURS`     | `24`                    |
    /// | `JOB_SWEEP_INTERVAL_SECS` | `3600` (must be > 0)    |
    ///
    /// See [`AuthConfig::from_env`] for `API_TOKEN`, `API_NO_AUTH` and
    /// `API_ALLOWED_IPS`.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let job_retention_hours: i64 = std::env::var("JOB_RETENTION_HOURS")
            .unwrap_or_else(|_| "24".into())
            .parse()
            .expect("JOB_RETENTION_HOURS must be a valid i64");

        let job_sweep_interval_secs = positive_secs(
            "JOB_SWEEP_INTERVAL_SECS",
            &std::env::var("JOB_SWEEP_INTERVAL_SECS").unwrap_or_else(|_| "3600".into()),
        );

        let auth = AuthConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            job_retention_hours,
            job_sweep_interval_secs,
            auth,
        }
    }
}

/// Parse a seconds value that must be strictly positive. Panics on bad input
/// so misconfiguration fails at startup.
fn positive_secs(var: &str, raw: &str) -> u64 {
    let secs: u64 = raw
        .trim()
        .parse()
        .unwrap_or_else(|_| panic!("{var} must be a valid u64"));
    assert!(secs > 0, "{var} must be greater than zero");
    secs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_secs_accepts_non_zero() {
        assert_eq!(positive_secs("JOB_SWEEP_INTERVAL_SECS", "3600"), 3600);
        assert_eq!(positive_secs("JOB_SWEEP_INTERVAL_SECS", " 1 "), 1);
    }

    #[test]
    #[should_panic(expected = "JOB_SWEEP_INTERVAL_SECS must be greater than zero")]
    fn zero_sweep_interval_is_rejected() {
        positive_secs("JOB_SWEEP_INTERVAL_SECS", "0");
    }

    #[test]
    #[should_panic(expected = "JOB_SWEEP_INTERVAL_SECS must be a valid u64")]
    fn non_numeric_sweep_interval_is_rejected() {
        positive_secs("JOB_SWEEP_INTERVAL_SECS", "hourly");
    }
}
