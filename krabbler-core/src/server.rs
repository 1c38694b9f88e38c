use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

use crate::identity::{ServerId, ServerIdentity};
use crate::session::{ConnectionHandle, ProgressCallback};
use crate::status::{CrawlStatus, Transition};

/// Numeric account identifier, unique within one server.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct AccountId(pub u32);

/// Composite key addressing one account on one server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountIdent {
    pub server: ServerId,
    pub account: AccountId,
}

/// Record for one account discovered while crawling a server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub id: AccountId,
    pub name: String,
    pub level: u32,
    pub fetch_date: Option<DateTime<Utc>>,
}

/// Live state for one crawl target.
///
/// Created exactly once per distinct identity by the registry and mutated
/// in place afterwards. Status changes go through [`ServerInfo::transition`]
/// so the lifecycle table cannot be bypassed.
pub struct ServerInfo {
    identity: ServerIdentity,
    status: CrawlStatus,
    accounts: HashMap<AccountId, AccountInfo>,
    connection: ConnectionHandle,
    progress: ProgressCallback,
    last_activity: DateTime<Local>,
}

/// Shared handle to one registry entry. Readers take the read lock;
/// status transitions and account updates take the write lock, which keeps
/// the (status, accounts) pair consistent for any observer.
pub type SharedServer = Arc<RwLock<ServerInfo>>;

impl ServerInfo {
    pub(crate) fn new(
        identity: ServerIdentity,
        connection: ConnectionHandle,
        progress: ProgressCallback,
    ) -> Self {
        ServerInfo {
            identity,
            status: CrawlStatus::default(),
            accounts: HashMap::new(),
            connection,
            progress,
            last_activity: Local::now(),
        }
    }

    pub fn identity(&self) -> &ServerIdentity {
        &self.identity
    }

    pub fn id(&self) -> &ServerId {
        &self.identity.id
    }

    pub fn status(&self) -> CrawlStatus {
        self.status
    }

    /// Attempts a status transition, keeping the current state on rejection.
    pub fn transition(&mut self, next: CrawlStatus) -> Transition {
        let outcome = self.status.transition_to(next);
        match outcome {
            Transition::Accepted { from, to } => {
                debug!("server {}: {} -> {}", self.identity.id, from, to);
                self.touch();
            }
            Transition::Rejected {
                retained,
                attempted,
            } => {
                debug!(
                    "server {}: rejected transition {} -> {}",
                    self.identity.id, retained, attempted
                );
            }
        }
        outcome
    }

    pub fn accounts(&self) -> &HashMap<AccountId, AccountInfo> {
        &self.accounts
    }

    pub fn account(&self, id: AccountId) -> Option<&AccountInfo> {
        self.accounts.get(&id)
    }

    /// Inserts or replaces an account record, returning the previous record
    /// for that id if there was one.
    pub fn insert_account(&mut self, account: AccountInfo) -> Option<AccountInfo> {
        self.touch();
        self.accounts.insert(account.id, account)
    }

    pub fn connection(&self) -> &ConnectionHandle {
        &self.connection
    }

    /// Swaps in a new transport session, e.g. after a re-login.
    pub fn replace_connection(&mut self, connection: ConnectionHandle) {
        self.touch();
        self.connection = connection;
    }

    pub fn progress(&self) -> &ProgressCallback {
        &self.progress
    }

    pub fn replace_progress(&mut self, progress: ProgressCallback) {
        self.progress = progress;
    }

    pub fn last_activity(&self) -> DateTime<Local> {
        self.last_activity
    }

    pub fn touch(&mut self) {
        self.last_activity = Local::now();
    }

    /// Point-in-time view of this entry. Taken under the entry lock, so the
    /// status and the account set always belong together.
    pub fn snapshot(&self) -> ServerSnapshot {
        let mut accounts: Vec<AccountInfo> = self.accounts.values().cloned().collect();
        accounts.sort_by_key(|a| a.id);
        ServerSnapshot {
            identity: self.identity.clone(),
            status: self.status,
            accounts,
        }
    }
}

/// Consistent view of one registry entry for the reporting layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerSnapshot {
    pub identity: ServerIdentity,
    pub status: CrawlStatus,
    /// Account records ordered by id.
    pub accounts: Vec<AccountInfo>,
}
