/// Default upper bound on pooled sessions.
pub const DEFAULT_POOL_MAX: u32 = 25;
/// Default number of sessions kept open while idle.
pub const DEFAULT_POOL_MIN: u32 = 5;
/// Default idle time after which surplus sessions are closed, in seconds.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;

const REQUIRED_VARS: [&str; 5] = [
    "ORACLE_USER",
    "ORACLE_PASSWORD",
    "ORACLE_HOST",
    "ORACLE_PORT",
    "ORACLE_SERVICE",
];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum OracleConfigError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("{var} must be a valid {expected}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
    },
}

/// Connection settings for the Oracle backend.
#[derive(Clone)]
pub struct OracleConfig {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub service: String,
    pub pool_max: u32,
    pub pool_min: u32,
    pub idle_timeout_secs: u64,
}

impl std::fmt::Debug for OracleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleConfig")
            .field("user", &self.user)
            .field("password", &"***")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("service", &self.service)
            .field("pool_max", &self.pool_max)
            .field("pool_min", &self.pool_min)
            .finish()
    }
}

impl OracleConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var           | Default      |
    /// |-------------------|--------------|
    /// | `ORACLE_USER`     | (required)   |
    /// | `ORACLE_PASSWORD` | (required)   |
    /// | `ORACLE_HOST`     | (required)   |
    /// | `ORACLE_PORT`     | (required)   |
    /// | `ORACLE_SERVICE`  | (required)   |
    /// | `ORACLE_POOL_MAX` | `25`         |
    /// | `ORACLE_POOL_MIN` | `5`          |
    ///
    /// All missing required variables are reported in one error.
    pub fn from_env() -> Result<Self, OracleConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, OracleConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let missing: Vec<&'static str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|key| get(*key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(OracleConfigError::Missing(missing));
        }

        let required = |key: &str| get(key).unwrap_or_default();

        let port = required("ORACLE_PORT")
            .trim()
            .parse::<u16>()
            .map_err(|_| OracleConfigError::Invalid {
                var: "ORACLE_PORT",
                expected: "u16",
            })?;

        let pool_max = parse_or(get("ORACLE_POOL_MAX"), DEFAULT_POOL_MAX, "ORACLE_POOL_MAX")?;
        let pool_min = parse_or(get("ORACLE_POOL_MIN"), DEFAULT_POOL_MIN, "ORACLE_POOL_MIN")?;

        Ok(Self {
            user: required("ORACLE_USER"),
            password: required("ORACLE_PASSWORD"),
            host: required("ORACLE_HOST"),
            port,
            service: required("ORACLE_SERVICE"),
            pool_max,
            pool_min: pool_min.min(pool_max),
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
        })
    }

    /// Easy Connect string: `//host:port/service`.
    pub fn connect_string(&self) -> String {
        format!("//{}:{}/{}", self.host, self.port, self.service)
    }
}

fn parse_or(
    raw: Option<String>,
    default: u32,
    var: &'static str,
) -> Result<u32, OracleConfigError> {
    match raw {
        Some(v) => v.trim().parse().map_err(|_| OracleConfigError::Invalid {
            var,
            expected: "u32",
        }),
        None => Ok(default),
    }
}
