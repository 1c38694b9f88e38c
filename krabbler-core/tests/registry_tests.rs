// Tests for the server registry

use chrono::Duration;
use krabbler_core::{
    null_progress, AccountId, AccountIdent, AccountInfo, Connection, ConnectionHandle,
    CrawlStatus, ServerIdentity, ServerRegistry,
};
use std::sync::Arc;

struct FakeConnection(String);

impl Connection for FakeConnection {
    fn endpoint(&self) -> &str {
        &self.0
    }
}

fn fake_connection(endpoint: &str) -> ConnectionHandle {
    Arc::new(FakeConnection(endpoint.to_string()))
}

fn account(id: u32, name: &str) -> AccountInfo {
    AccountInfo {
        id: AccountId(id),
        name: name.to_string(),
        level: 1,
        fetch_date: None,
    }
}

// ============================================================================
// Registration Tests
// ============================================================================

#[test]
fn test_get_or_insert_creates_waiting_entry() {
    let registry = ServerRegistry::new();
    let identity = ServerIdentity::derive("https://s1.sfgame.net");

    let server = registry.get_or_insert(identity.clone(), fake_connection("s1"), null_progress());

    let guard = server.read().unwrap();
    assert_eq!(guard.identity(), &identity);
    assert_eq!(guard.status(), CrawlStatus::Waiting);
    assert!(guard.accounts().is_empty());
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_first_registration_wins() {
    let registry = ServerRegistry::new();
    let identity = ServerIdentity::derive("https://s1.sfgame.net");

    let first = registry.get_or_insert(identity.clone(), fake_connection("first"), null_progress());
    let second = registry.get_or_insert(identity, fake_connection("second"), null_progress());

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(registry.len(), 1);
    // The replacement connection was dropped, not swapped in.
    assert_eq!(second.read().unwrap().connection().endpoint(), "first");
}

#[test]
fn test_equivalent_urls_reach_the_same_entry() {
    let registry = ServerRegistry::new();

    let created = registry.get_or_insert(
        ServerIdentity::derive("https://Sfgame.Net/"),
        fake_connection("s1"),
        null_progress(),
    );

    let looked_up = registry
        .get(&ServerIdentity::derive("sfgame.net").id)
        .expect("equivalent spelling must hit the same entry");
    assert!(Arc::ptr_eq(&created, &looked_up));
}

#[test]
fn test_get_unknown_server_is_none() {
    let registry = ServerRegistry::new();
    assert!(registry.get(&ServerIdentity::derive("sfgame.net").id).is_none());
    assert!(registry.is_empty());
}

#[test]
fn test_explicit_connection_replacement() {
    let registry = ServerRegistry::new();
    let server = registry.get_or_insert(
        ServerIdentity::derive("sfgame.net"),
        fake_connection("old"),
        null_progress(),
    );

    server
        .write()
        .unwrap()
        .replace_connection(fake_connection("new"));
    assert_eq!(server.read().unwrap().connection().endpoint(), "new");
}

// ============================================================================
// Account Resolution Tests
// ============================================================================

#[test]
fn test_resolve_account_two_stage_lookup() {
    let registry = ServerRegistry::new();
    let identity = ServerIdentity::derive("https://s1.sfgame.net");
    let server_id = identity.id.clone();

    let server = registry.get_or_insert(identity, fake_connection("s1"), null_progress());
    server.write().unwrap().insert_account(account(42, "player-42"));

    let (snapshot, found) = registry
        .resolve_account(&AccountIdent {
            server: server_id.clone(),
            account: AccountId(42),
        })
        .expect("account 42 was inserted");
    assert_eq!(snapshot.identity.id, server_id);
    assert_eq!(found.id, AccountId(42));
    assert_eq!(found.name, "player-42");

    // Known server, unknown account.
    assert!(registry
        .resolve_account(&AccountIdent {
            server: server_id,
            account: AccountId(99),
        })
        .is_none());

    // Unknown server.
    assert!(registry
        .resolve_account(&AccountIdent {
            server: ServerIdentity::derive("other.net").id,
            account: AccountId(42),
        })
        .is_none());
}

#[test]
fn test_insert_account_replaces_by_id() {
    let registry = ServerRegistry::new();
    let server = registry.get_or_insert(
        ServerIdentity::derive("sfgame.net"),
        fake_connection("s1"),
        null_progress(),
    );

    let mut guard = server.write().unwrap();
    assert!(guard.insert_account(account(7, "before")).is_none());
    let replaced = guard.insert_account(account(7, "after"));
    assert_eq!(replaced.unwrap().name, "before");
    assert_eq!(guard.accounts().len(), 1);
    assert_eq!(guard.account(AccountId(7)).unwrap().name, "after");
}

// ============================================================================
// Snapshot Tests
// ============================================================================

#[test]
fn test_snapshot_orders_accounts_by_id() {
    let registry = ServerRegistry::new();
    let identity = ServerIdentity::derive("sfgame.net");
    let id = identity.id.clone();
    let server = registry.get_or_insert(identity, fake_connection("s1"), null_progress());

    {
        let mut guard = server.write().unwrap();
        for n in [5u32, 1, 3] {
            guard.insert_account(account(n, &format!("player-{n}")));
        }
    }

    let snapshot = registry.snapshot(&id).unwrap();
    let ids: Vec<u32> = snapshot.accounts.iter().map(|a| a.id.0).collect();
    assert_eq!(ids, vec![1, 3, 5]);
}

#[test]
fn test_snapshot_serializes_to_json() {
    let registry = ServerRegistry::new();
    let identity = ServerIdentity::derive("https://s1.sfgame.net");
    let id = identity.id.clone();
    let server = registry.get_or_insert(identity, fake_connection("s1"), null_progress());
    {
        let mut guard = server.write().unwrap();
        let _ = guard.transition(CrawlStatus::InProgress);
        guard.insert_account(account(42, "player-42"));
    }

    let json = serde_json::to_value(registry.snapshot(&id).unwrap()).unwrap();
    assert_eq!(json["status"], "InProgress");
    assert_eq!(json["identity"]["canonical_token"], "s1sfgamenet");
    assert_eq!(json["accounts"][0]["name"], "player-42");
}

#[test]
fn test_snapshots_cover_every_server() {
    let registry = ServerRegistry::new();
    for n in 0..3 {
        registry.get_or_insert(
            ServerIdentity::derive(&format!("s{n}.sfgame.net")),
            fake_connection(&format!("s{n}")),
            null_progress(),
        );
    }
    assert_eq!(registry.snapshots().len(), 3);
    assert_eq!(registry.server_ids().len(), 3);
}

// ============================================================================
// Status Transition Tests (through the registry)
// ============================================================================

#[test]
fn test_terminal_entry_rejects_further_transitions() {
    let registry = ServerRegistry::new();
    let identity = ServerIdentity::derive("sfgame.net");
    let id = identity.id.clone();
    let server = registry.get_or_insert(identity, fake_connection("s1"), null_progress());

    {
        let mut guard = server.write().unwrap();
        assert!(guard.transition(CrawlStatus::InProgress).is_accepted());
        assert!(guard.transition(CrawlStatus::Completed).is_accepted());
        assert!(!guard.transition(CrawlStatus::InProgress).is_accepted());
    }

    assert_eq!(registry.snapshot(&id).unwrap().status, CrawlStatus::Completed);
}

// ============================================================================
// Idle Sweep Tests
// ============================================================================

#[test]
fn test_remove_idle_skips_in_progress_entries() {
    let registry = ServerRegistry::new();

    let idle_identity = ServerIdentity::derive("idle.sfgame.net");
    let idle_id = idle_identity.id.clone();
    registry.get_or_insert(idle_identity, fake_connection("idle"), null_progress());

    let busy_identity = ServerIdentity::derive("busy.sfgame.net");
    let busy_id = busy_identity.id.clone();
    let busy = registry.get_or_insert(busy_identity, fake_connection("busy"), null_progress());
    assert!(busy
        .write()
        .unwrap()
        .transition(CrawlStatus::InProgress)
        .is_accepted());

    // Give the clock a moment so both entries are strictly older than the
    // zero-idle cutoff.
    std::thread::sleep(std::time::Duration::from_millis(5));

    let removed = registry.remove_idle(Duration::zero());
    assert_eq!(removed, vec![idle_id.clone()]);
    assert!(registry.get(&idle_id).is_none());
    assert!(registry.get(&busy_id).is_some());
}

#[test]
fn test_remove_idle_keeps_recently_active_entries() {
    let registry = ServerRegistry::new();
    registry.get_or_insert(
        ServerIdentity::derive("sfgame.net"),
        fake_connection("s1"),
        null_progress(),
    );

    let removed = registry.remove_idle(Duration::hours(1));
    assert!(removed.is_empty());
    assert_eq!(registry.len(), 1);
}
