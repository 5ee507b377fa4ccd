//! Role Resolution & Access-Control Gate
//!
//! Authorization for every protected route funnels through one decision
//! point, [`AccessGate::authorize`]. Handlers never consult the session map
//! themselves — earlier revisions of this firmware let each route do its own
//! check and they drifted apart.
//!
//! Privilege is derived from network position: a client that connected
//! through the device's own access point gets `Admin`, anyone reaching the
//! panel over the station network gets `Viewer`. The role is resolved once
//! at login and stored in the session; it is not re-derived per request even
//! if the client later moves between networks.

use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;

use crate::session::{ClientIdentity, Role, SessionStore};

/// First three octets of the device access point's IPv4 range
/// (192.168.4.0/24 is the stock softAP assignment).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApSubnet([u8; 3]);

impl ApSubnet {
    pub const fn new(prefix: [u8; 3]) -> Self {
        Self(prefix)
    }

    /// True iff `addr` sits inside the AP's /24.
    ///
    /// IPv6 peers never match: the softAP hands out IPv4 leases only, so an
    /// IPv6 origin cannot have come through it.
    pub fn contains(&self, addr: IpAddr) -> bool {
        match addr {
            IpAddr::V4(v4) => {
                let octets = v4.octets();
                octets[0] == self.0[0] && octets[1] == self.0[1] && octets[2] == self.0[2]
            }
            IpAddr::V6(_) => false,
        }
    }
}

impl Default for ApSubnet {
    fn default() -> Self {
        Self([192, 168, 4])
    }
}

impl std::fmt::Display for ApSubnet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.0[0], self.0[1], self.0[2])
    }
}

impl FromStr for ApSubnet {
    type Err = String;

    /// Parses `"192.168.4"` (three dotted octets)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.len() != 3 {
            return Err(format!("expected three dotted octets, got {s:?}"));
        }
        let mut prefix = [0u8; 3];
        for (i, part) in parts.iter().enumerate() {
            prefix[i] = part
                .parse()
                .map_err(|_| format!("invalid octet {part:?} in {s:?}"))?;
        }
        Ok(Self(prefix))
    }
}

/// Derive a client's privilege tier from its network origin.
///
/// Called exactly once per login; the result is frozen into the session.
pub fn resolve_role(identity: ClientIdentity, ap_subnet: &ApSubnet) -> Role {
    if ap_subnet.contains(identity.0) {
        Role::Admin
    } else {
        Role::Viewer
    }
}

/// Outcome of an authorization check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    /// Denied; the client should be redirected to `target` instead of the
    /// handler running.
    DenyRedirect(&'static str),
}

/// The single choke point between the route table and handler bodies
#[derive(Clone)]
pub struct AccessGate {
    sessions: Arc<SessionStore>,
}

impl AccessGate {
    pub fn new(sessions: Arc<SessionStore>) -> Self {
        Self { sessions }
    }

    /// Decide whether `identity` may reach a route requiring `required`.
    ///
    /// `None` means any authenticated client. An unauthenticated (or
    /// expired) client goes back to the login form; an authenticated client
    /// with the wrong role goes to the dashboard — the two denials are
    /// deliberately distinguishable.
    pub fn authorize(&self, identity: ClientIdentity, required: Option<Role>) -> AccessDecision {
        match self.sessions.current_role(identity) {
            None => AccessDecision::DenyRedirect("/login"),
            Some(role) => match required {
                Some(required) if role != required => AccessDecision::DenyRedirect("/"),
                _ => AccessDecision::Allow,
            },
        }
    }
}
