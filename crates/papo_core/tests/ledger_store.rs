use papo_core::db::open_db_in_memory;
use papo_core::{LedgerRepository, RepoError, SqliteLedgerRepository};
use rusqlite::Connection;

const COMMUNITY: i64 = 100;

#[test]
fn adjust_balance_creates_account_lazily_at_zero() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLedgerRepository::try_new(&conn).unwrap();

    assert_eq!(repo.balance_of(COMMUNITY, 7).unwrap(), 0);
    assert_eq!(repo.adjust_balance(COMMUNITY, 7, 5).unwrap(), 5);
    assert_eq!(repo.balance_of(COMMUNITY, 7).unwrap(), 5);
}

#[test]
fn balance_can_go_negative() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLedgerRepository::try_new(&conn).unwrap();

    assert_eq!(repo.adjust_balance(COMMUNITY, 7, -15).unwrap(), -15);
}

#[test]
fn repeated_unit_adjustments_sum_exactly() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLedgerRepository::try_new(&conn).unwrap();

    for _ in 0..25 {
        repo.adjust_with_audit(COMMUNITY, 1, 7, 1, None, 0).unwrap();
    }

    assert_eq!(repo.balance_of(COMMUNITY, 7).unwrap(), 25);
    assert_eq!(audit_rows(&conn, 7), 25);
    assert_eq!(audit_sum(&conn, 7), 25);
}

#[test]
fn balance_equals_sum_of_audit_deltas_after_mixed_mutations() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLedgerRepository::try_new(&conn).unwrap();

    let deltas = [5, 10, -5, 50, -10, 5];
    for (index, delta) in deltas.iter().enumerate() {
        repo.adjust_with_audit(COMMUNITY, 1, 7, *delta, Some("test"), index as i64)
            .unwrap();
    }

    let balance = repo.balance_of(COMMUNITY, 7).unwrap();
    assert_eq!(balance, deltas.iter().sum::<i64>());
    assert_eq!(audit_sum(&conn, 7), balance);
    assert_eq!(audit_rows(&conn, 7), deltas.len() as i64);
}

#[test]
fn audit_entries_record_actor_target_and_reason() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLedgerRepository::try_new(&conn).unwrap();

    repo.adjust_with_audit(COMMUNITY, 1, 7, 10, Some("for testing"), 42)
        .unwrap();
    repo.adjust_with_audit(COMMUNITY, 2, 7, -5, None, 43).unwrap();

    let entries = repo.entries_for(COMMUNITY, 7, 10).unwrap();
    assert_eq!(entries.len(), 2);
    // Newest first.
    assert_eq!(entries[0].actor, 2);
    assert_eq!(entries[0].delta, -5);
    assert_eq!(entries[0].reason, None);
    assert_eq!(entries[1].actor, 1);
    assert_eq!(entries[1].delta, 10);
    assert_eq!(entries[1].reason.as_deref(), Some("for testing"));
    assert!(entries[0].seq > entries[1].seq);
}

#[test]
fn communities_do_not_share_balances() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLedgerRepository::try_new(&conn).unwrap();

    repo.adjust_balance(COMMUNITY, 7, 10).unwrap();
    repo.adjust_balance(COMMUNITY + 1, 7, 3).unwrap();

    assert_eq!(repo.balance_of(COMMUNITY, 7).unwrap(), 10);
    assert_eq!(repo.balance_of(COMMUNITY + 1, 7).unwrap(), 3);
}

#[test]
fn rank_top_orders_by_balance_then_account_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLedgerRepository::try_new(&conn).unwrap();

    repo.adjust_balance(COMMUNITY, 3, 10).unwrap();
    repo.adjust_balance(COMMUNITY, 1, 10).unwrap();
    repo.adjust_balance(COMMUNITY, 2, 25).unwrap();
    repo.adjust_balance(COMMUNITY, 4, -5).unwrap();

    let ranked = repo.rank_top(COMMUNITY, 10).unwrap();
    assert_eq!(ranked, vec![(2, 25), (1, 10), (3, 10), (4, -5)]);
}

#[test]
fn rank_top_respects_limit() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLedgerRepository::try_new(&conn).unwrap();

    for account in 1..=5 {
        repo.adjust_balance(COMMUNITY, account, account * 10).unwrap();
    }

    let ranked = repo.rank_top(COMMUNITY, 2).unwrap();
    assert_eq!(ranked, vec![(5, 50), (4, 40)]);
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteLedgerRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert!(expected_version > 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

fn audit_rows(conn: &Connection, target: i64) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM ledger_entries WHERE community_id = ?1 AND target_id = ?2;",
        [COMMUNITY, target],
        |row| row.get(0),
    )
    .unwrap()
}

fn audit_sum(conn: &Connection, target: i64) -> i64 {
    conn.query_row(
        "SELECT COALESCE(SUM(delta), 0)
         FROM ledger_entries
         WHERE community_id = ?1 AND target_id = ?2;",
        [COMMUNITY, target],
        |row| row.get(0),
    )
    .unwrap()
}
