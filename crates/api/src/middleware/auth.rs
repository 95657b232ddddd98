//! Bearer-token and IP allow-list authentication.
//!
//! Applied with [`axum::middleware::from_fn_with_state`] to every route
//! except `/health`. The caller IP is attached to the request as a
//! [`ClientIp`] extension whether or not checks are enabled.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use oragate_core::error::CoreError;
use serde_json::json;

use crate::error::AppError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Authentication settings.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// Expected bearer token. With no token every request is rejected.
    pub token: Option<String>,
    /// Skip all checks.
    pub disabled: bool,
    /// Allowed caller addresses. Empty means no IP restriction.
    pub allowed_ips: Vec<IpRule>,
}

impl AuthConfig {
    /// Load authentication settings from environment variables.
    ///
    /// | Env Var           | Default                                   |
    /// |-------------------|-------------------------------------------|
    /// | `API_TOKEN`       | none                                      |
    /// | `API_NO_AUTH`     | unset (`1` disables checks)               |
    /// | `API_ALLOWED_IPS` | empty; exact IPs, CIDR ranges, `localhost` |
    pub fn from_env() -> Self {
        let token = std::env::var("API_TOKEN").ok().filter(|t| !t.is_empty());
        let disabled = std::env::var("API_NO_AUTH").is_ok_and(|v| v == "1");
        let allowed_ips = std::env::var("API_ALLOWED_IPS")
            .map(|raw| parse_allow_list(&raw))
            .unwrap_or_default();

        Self {
            token,
            disabled,
            allowed_ips,
        }
    }
}

// ---------------------------------------------------------------------------
// IP rules
// ---------------------------------------------------------------------------

/// One entry of the IP allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpRule {
    /// `127.0.0.1` or `::1`.
    Localhost,
    Exact(IpAddr),
    Cidr { network: IpAddr, prefix: u8 },
}

impl IpRule {
    /// Parse one entry. Unparseable entries yield `None` and are skipped.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if raw.eq_ignore_ascii_case("localhost") {
            return Some(IpRule::Localhost);
        }
        match raw.split_once('/') {
            Some((addr, prefix)) => {
                let network: IpAddr = addr.trim().parse().ok()?;
                let prefix: u8 = prefix.trim().parse().ok()?;
                let max = if network.is_ipv4() { 32 } else { 128 };
                (prefix <= max).then_some(IpRule::Cidr { network, prefix })
            }
            None => raw.parse().ok().map(IpRule::Exact),
        }
    }

    pub fn matches(&self, ip: IpAddr) -> bool {
        let ip = canonical(ip);
        match self {
            IpRule::Localhost => {
                ip == IpAddr::V4(Ipv4Addr::LOCALHOST) || ip == IpAddr::V6(Ipv6Addr::LOCALHOST)
            }
            IpRule::Exact(allowed) => canonical(*allowed) == ip,
            IpRule::Cidr { network, prefix } => in_network(ip, canonical(*network), *prefix),
        }
    }
}

/// Parse a comma-separated allow-list.
pub fn parse_allow_list(raw: &str) -> Vec<IpRule> {
    raw.split(',')
        .filter_map(|entry| {
            let rule = IpRule::parse(entry);
            if rule.is_none() && !entry.trim().is_empty() {
                tracing::warn!(entry = entry.trim(), "Ignoring invalid API_ALLOWED_IPS entry");
            }
            rule
        })
        .collect()
}

/// Whether `ip` passes `rules`. An empty list allows everyone.
pub fn ip_allowed(ip: IpAddr, rules: &[IpRule]) -> bool {
    rules.is_empty() || rules.iter().any(|rule| rule.matches(ip))
}

/// Unwrap IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`).
fn canonical(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6
            .to_ipv4_mapped()
            .map(IpAddr::V4)
            .unwrap_or(IpAddr::V6(v6)),
        v4 => v4,
    }
}

fn in_network(ip: IpAddr, network: IpAddr, prefix: u8) -> bool {
    match (ip, network) {
        (IpAddr::V4(ip), IpAddr::V4(net)) => {
            let mask = u32::MAX.checked_shl(32 - u32::from(prefix)).unwrap_or(0);
            u32::from(ip) & mask == u32::from(net) & mask
        }
        (IpAddr::V6(ip), IpAddr::V6(net)) => {
            let mask = u128::MAX.checked_shl(128 - u32::from(prefix)).unwrap_or(0);
            u128::from(ip) & mask == u128::from(net) & mask
        }
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Middleware
// ---------------------------------------------------------------------------

/// Caller address, attached to every request that passes the middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub Option<IpAddr>);

impl ClientIp {
    pub fn to_option_string(self) -> Option<String> {
        self.0.map(|ip| canonical(ip).to_string())
    }
}

/// Authenticate the request against [`AuthConfig`].
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let client_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| canonical(addr.ip()));
    req.extensions_mut().insert(ClientIp(client_ip));

    if req.method() == Method::OPTIONS {
        return next.run(req).await;
    }

    let auth = &state.config.auth;
    if auth.disabled {
        return next.run(req).await;
    }

    let presented = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let token_ok = match (&auth.token, presented) {
        (Some(expected), Some(presented)) => expected == presented,
        _ => false,
    };
    if !token_ok {
        return AppError::Core(CoreError::Unauthorized("Unauthorized".into())).into_response();
    }

    if !auth.allowed_ips.is_empty() {
        let allowed = client_ip.is_some_and(|ip| ip_allowed(ip, &auth.allowed_ips));
        if !allowed {
            let ip = client_ip.map(|ip| ip.to_string()).unwrap_or_else(|| "unknown".into());
            tracing::warn!(%ip, "Rejected request from disallowed IP");
            return (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": "IP not allowed", "ip": ip })),
            )
                .into_response();
        }
    }

    next.run(req).await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
