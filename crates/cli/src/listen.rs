//! Where `serve-http` listens. The test API has no authentication, so an
//! address reachable from other hosts needs an explicit `--public`.

use crate::config::ServerConfig;
use anyhow::{Context as AnyhowContext, Result};
use std::net::SocketAddr;

/// Resolved listen address for the test API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenAddr {
    pub addr: SocketAddr,
    /// Reachable from other hosts.
    pub exposed: bool,
}

impl ListenAddr {
    /// Resolve `server.bind` (host names included) and apply the exposure rule.
    pub async fn resolve(server: &ServerConfig, public: bool) -> Result<Self> {
        let bind = server.bind.trim();
        let candidates: Vec<SocketAddr> = tokio::net::lookup_host(bind)
            .await
            .with_context(|| format!("Cannot resolve server.bind '{bind}'"))?
            .collect();
        Self::pick(bind, &candidates, public)
    }

    /// Choose among resolved candidates. Any non-loopback candidate makes the
    /// whole bind exposed; IPv4 candidates are preferred.
    pub fn pick(bind: &str, candidates: &[SocketAddr], public: bool) -> Result<Self> {
        let exposed = candidates.iter().any(|addr| !addr.ip().is_loopback());
        if exposed && !public {
            anyhow::bail!(
                "Refusing to bind to non-loopback address without --public: {bind}. \
                 Chi-square requests are served without authentication."
            );
        }
        let addr = candidates
            .iter()
            .min_by_key(|addr| addr.is_ipv6())
            .copied()
            .with_context(|| format!("server.bind '{bind}' resolved to no addresses"))?;
        if exposed {
            log::warn!("test API exposed beyond loopback on {addr}");
        }
        Ok(Self { addr, exposed })
    }
}
