use chrono::{Duration, Local};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

use crate::identity::{ServerId, ServerIdentity};
use crate::server::{AccountIdent, AccountInfo, ServerInfo, ServerSnapshot, SharedServer};
use crate::session::{ConnectionHandle, ProgressCallback};
use crate::status::CrawlStatus;

/// Concurrent table of crawl targets, keyed by derived server id.
///
/// One registry exists per crawl session and outlives every worker driving
/// it. Entries are created once per distinct identity and mutated in place
/// behind their own lock, so workers on different servers never contend.
/// Nothing is evicted implicitly; [`ServerRegistry::remove_idle`] is the
/// explicit sweep for long-running processes.
#[derive(Default)]
pub struct ServerRegistry {
    servers: RwLock<HashMap<ServerId, SharedServer>>,
}

impl ServerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches the entry for `identity`, creating it on first registration
    /// with status `Waiting` and no accounts.
    ///
    /// First registration wins: when the entry already exists, the supplied
    /// connection and progress sink are dropped and the existing entry is
    /// returned unchanged. Callers that really want a fresh session go
    /// through [`ServerInfo::replace_connection`].
    pub fn get_or_insert(
        &self,
        identity: ServerIdentity,
        connection: ConnectionHandle,
        progress: ProgressCallback,
    ) -> SharedServer {
        let mut servers = self.servers.write().unwrap();
        let entry = servers.entry(identity.id.clone()).or_insert_with(|| {
            debug!("registering server {} ({})", identity.canonical_token, identity.id);
            Arc::new(RwLock::new(ServerInfo::new(identity, connection, progress)))
        });
        Arc::clone(entry)
    }

    /// Looks up a server by id. Never creates.
    ///
    /// The returned handle serves reads and writes alike; take the entry's
    /// write lock to transition status or insert accounts, or use
    /// [`ServerRegistry::snapshot`] for a plain view.
    pub fn get(&self, id: &ServerId) -> Option<SharedServer> {
        self.servers.read().unwrap().get(id).cloned()
    }

    /// Consistent point-in-time view of one entry.
    pub fn snapshot(&self, id: &ServerId) -> Option<ServerSnapshot> {
        let server = self.get(id)?;
        let guard = server.read().unwrap();
        Some(guard.snapshot())
    }

    /// Views of every entry, each internally consistent.
    pub fn snapshots(&self) -> Vec<ServerSnapshot> {
        let servers = self.servers.read().unwrap();
        servers
            .values()
            .map(|server| server.read().unwrap().snapshot())
            .collect()
    }

    /// Resolves a composite (server, account) key.
    ///
    /// Absent when the server is unknown, and absent when the server is
    /// known but has no such account.
    pub fn resolve_account(
        &self,
        ident: &AccountIdent,
    ) -> Option<(ServerSnapshot, AccountInfo)> {
        let server = self.get(&ident.server)?;
        let guard = server.read().unwrap();
        let account = guard.account(ident.account)?.clone();
        Some((guard.snapshot(), account))
    }

    pub fn len(&self) -> usize {
        self.servers.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.read().unwrap().is_empty()
    }

    pub fn server_ids(&self) -> Vec<ServerId> {
        self.servers.read().unwrap().keys().cloned().collect()
    }

    /// Drops entries whose last activity is older than `max_idle`, skipping
    /// anything currently in progress. Returns the removed ids.
    ///
    /// Called explicitly by the orchestrator; the registry never sweeps on
    /// its own.
    pub fn remove_idle(&self, max_idle: Duration) -> Vec<ServerId> {
        let cutoff = Local::now() - max_idle;
        let mut removed = Vec::new();
        let mut servers = self.servers.write().unwrap();
        servers.retain(|id, server| {
            let guard = server.read().unwrap();
            let keep = guard.status() == CrawlStatus::InProgress
                || guard.last_activity() > cutoff;
            if !keep {
                debug!("evicting idle server {id}");
                removed.push(id.clone());
            }
            keep
        });
        removed
    }
}
