//! Session Store
//!
//! Per-client authentication state, keyed by network origin.
//!
//! The store is the only owner of the identity → session map; handlers never
//! touch it directly and go through [`crate::access::AccessGate`] instead.
//! All operations take a single write lock, so concurrent logins, lookups and
//! the periodic sweep cannot observe a session mid-removal.
//!
//! Expiry is lazy: a lookup that finds a stale session removes it in the same
//! lock scope, so the entry is gone by the next read. [`SessionStore::sweep`]
//! covers clients that disappear without logging out.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use crate::clock::Clock;

/// Network-origin identifier used as the session key.
///
/// This is the peer IP address. Shared or rotating addresses (NAT, DHCP
/// reassignment) collide on the same session — an accepted limitation of the
/// device's trust model, not something the store tries to paper over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientIdentity(pub IpAddr);

impl From<SocketAddr> for ClientIdentity {
    fn from(addr: SocketAddr) -> Self {
        Self(addr.ip())
    }
}

impl From<IpAddr> for ClientIdentity {
    fn from(ip: IpAddr) -> Self {
        Self(ip)
    }
}

impl std::fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Privilege tier, fixed for the lifetime of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Viewer,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Viewer => write!(f, "viewer"),
        }
    }
}

/// Authenticated client record
#[derive(Debug, Clone)]
pub struct Session {
    pub identity: ClientIdentity,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Identity-keyed session map with fixed-TTL expiry.
///
/// Sessions expire on an absolute clock counted from `created_at`; continued
/// use does not re-timestamp them. There is no renew transition.
pub struct SessionStore {
    inner: RwLock<HashMap<ClientIdentity, Session>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl SessionStore {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    /// Insert or overwrite the session for `identity` with a fresh timestamp.
    ///
    /// Overwrite is deliberate: a re-login from the same origin replaces the
    /// old session, role included.
    pub fn create(&self, identity: ClientIdentity, role: Role) -> Session {
        let session = Session {
            identity,
            role,
            created_at: self.clock.now(),
        };
        self.inner.write().insert(identity, session.clone());
        session
    }

    /// Pure lookup, no expiry side effect
    pub fn get(&self, identity: ClientIdentity) -> Option<Session> {
        self.inner.read().get(&identity).cloned()
    }

    /// Remove the session; no-op if absent
    pub fn invalidate(&self, identity: ClientIdentity) {
        self.inner.write().remove(&identity);
    }

    /// Drop every session. Used when the portal credentials rotate: the
    /// device has one global username/password, so no session can outlive a
    /// credential change.
    pub fn invalidate_all(&self) {
        self.inner.write().clear();
    }

    /// Role of the live session for `identity`, running lazy expiry.
    ///
    /// Checking validity and reading the role happen under one lock so the
    /// access decision cannot see a session another request is mid-way
    /// through expiring.
    pub fn current_role(&self, identity: ClientIdentity) -> Option<Role> {
        let now = self.clock.now();
        let mut map = self.inner.write();
        match map.get(&identity) {
            Some(session) if now - session.created_at <= self.ttl => Some(session.role),
            Some(_) => {
                // Stale: remove now so the next lookup agrees with this
                // decision instead of reporting a session that exists but
                // is treated as invalid.
                map.remove(&identity);
                None
            }
            None => None,
        }
    }

    /// True iff a non-expired session exists for `identity`
    pub fn is_valid(&self, identity: ClientIdentity) -> bool {
        self.current_role(identity).is_some()
    }

    /// Batch-remove every session older than the TTL; returns the number
    /// removed. Called periodically so memory stays bounded when clients
    /// vanish without logging out.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut map = self.inner.write();
        let before = map.len();
        map.retain(|_, session| now - session.created_at <= self.ttl);
        before - map.len()
    }

    /// Number of live entries (expired-but-unswept included)
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
