use papo_core::db::open_db_in_memory;
use papo_core::{
    ActionClass, ActionRequest, CooldownGate, ExecuteError, PapoConfig, SqliteLedgerRepository,
    TransactionService,
};
use rusqlite::Connection;
use std::sync::Arc;

const COMMUNITY: i64 = 100;
const TARGET: i64 = 1001;
const GIVER: i64 = 2002;
const ADMIN: i64 = 3003;
const SYSTEM: i64 = 4004;
const STRANGER: i64 = 5005;

fn test_config() -> PapoConfig {
    let mut config = PapoConfig::default();
    config.ledger.authorized_actors = vec![GIVER];
    config.ledger.admin_actors = vec![ADMIN];
    config.ledger.system_actor = SYSTEM;
    config.ledger.designated_target = Some(TARGET);
    config.bonk.target = TARGET;
    config
}

fn service<'a>(
    conn: &'a Connection,
    config: &Arc<PapoConfig>,
) -> TransactionService<SqliteLedgerRepository<'a>> {
    let gate = Arc::new(CooldownGate::from_config(config));
    let ledger = SqliteLedgerRepository::try_new(conn).unwrap();
    TransactionService::new(ledger, gate, Arc::clone(config))
}

fn grant(actor: i64, amount: i64) -> ActionRequest {
    ActionRequest {
        community: COMMUNITY,
        actor,
        target: TARGET,
        amount,
        reason: None,
        class: ActionClass::Grant,
    }
}

#[test]
fn grant_applies_amount_and_returns_receipt() {
    let conn = open_db_in_memory().unwrap();
    let config = Arc::new(test_config());
    let service = service(&conn, &config);

    let receipt = service.execute(&grant(GIVER, 10)).unwrap();
    assert_eq!(receipt.new_balance, 10);
    assert!(!receipt.jackpot);
    assert_eq!(service.balance_of(COMMUNITY, TARGET).unwrap(), 10);
}

#[test]
fn jackpot_grant_is_flagged_on_the_receipt() {
    let conn = open_db_in_memory().unwrap();
    let config = Arc::new(test_config());
    let service = service(&conn, &config);

    let receipt = service.execute(&grant(GIVER, 50)).unwrap();
    assert_eq!(receipt.new_balance, 50);
    assert!(receipt.jackpot);
}

#[test]
fn revoke_applies_negative_delta_and_may_go_negative() {
    let conn = open_db_in_memory().unwrap();
    let config = Arc::new(test_config());
    let service = service(&conn, &config);

    let receipt = service
        .execute(&ActionRequest {
            class: ActionClass::Revoke,
            ..grant(GIVER, 10)
        })
        .unwrap();
    assert_eq!(receipt.new_balance, -10);
    assert!(!receipt.jackpot);
}

#[test]
fn unauthorized_actor_is_rejected_before_amount_validation() {
    let conn = open_db_in_memory().unwrap();
    let config = Arc::new(test_config());
    let service = service(&conn, &config);

    // The amount is also out of shape; authorization must win.
    let err = service.execute(&grant(STRANGER, 7)).unwrap_err();
    assert!(matches!(err, ExecuteError::NotAuthorized));
    assert_eq!(err.code(), "not_authorized");
    assert_no_state(&conn);
}

#[test]
fn non_designated_target_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let config = Arc::new(test_config());
    let service = service(&conn, &config);

    let err = service
        .execute(&ActionRequest {
            target: STRANGER,
            ..grant(GIVER, 10)
        })
        .unwrap_err();
    assert!(matches!(err, ExecuteError::IneligibleTarget(id) if id == STRANGER));
    assert_no_state(&conn);
}

#[test]
fn off_step_zero_and_negative_amounts_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let config = Arc::new(test_config());
    let service = service(&conn, &config);

    for amount in [7, 0, -5, 49] {
        let err = service.execute(&grant(GIVER, amount)).unwrap_err();
        assert!(matches!(err, ExecuteError::InvalidAmount(a) if a == amount));
    }
    assert_no_state(&conn);
}

#[test]
fn second_grant_inside_cooldown_window_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let config = Arc::new(test_config());
    let service = service(&conn, &config);

    service.execute(&grant(GIVER, 5)).unwrap();
    let err = service.execute(&grant(GIVER, 5)).unwrap_err();
    assert!(matches!(err, ExecuteError::OnCooldown));
    assert_eq!(service.balance_of(COMMUNITY, TARGET).unwrap(), 5);
}

#[test]
fn rejected_request_does_not_consume_the_cooldown_slot() {
    let conn = open_db_in_memory().unwrap();
    let config = Arc::new(test_config());
    let service = service(&conn, &config);

    // An invalid amount is rejected before the gate is consulted, so the
    // follow-up valid grant must still pass.
    assert!(matches!(
        service.execute(&grant(GIVER, 7)).unwrap_err(),
        ExecuteError::InvalidAmount(7)
    ));
    service.execute(&grant(GIVER, 5)).unwrap();
}

#[test]
fn admin_actor_is_exempt_from_cooldown() {
    let conn = open_db_in_memory().unwrap();
    let config = Arc::new(test_config());
    let service = service(&conn, &config);

    service.execute(&grant(ADMIN, 5)).unwrap();
    service.execute(&grant(ADMIN, 5)).unwrap();
    assert_eq!(service.balance_of(COMMUNITY, TARGET).unwrap(), 10);
}

#[test]
fn penalty_class_is_reserved_for_the_system_actor() {
    let conn = open_db_in_memory().unwrap();
    let config = Arc::new(test_config());
    let service = service(&conn, &config);

    let penalty = ActionRequest {
        actor: SYSTEM,
        amount: 5,
        class: ActionClass::Penalty,
        ..grant(SYSTEM, 5)
    };
    let receipt = service.execute(&penalty).unwrap();
    assert_eq!(receipt.new_balance, -5);

    let err = service
        .execute(&ActionRequest {
            actor: ADMIN,
            ..penalty.clone()
        })
        .unwrap_err();
    assert!(matches!(err, ExecuteError::NotAuthorized));
}

#[test]
fn bonk_class_is_not_a_ledger_operation() {
    let conn = open_db_in_memory().unwrap();
    let config = Arc::new(test_config());
    let service = service(&conn, &config);

    let err = service
        .execute(&ActionRequest {
            class: ActionClass::Bonk,
            ..grant(GIVER, 5)
        })
        .unwrap_err();
    assert!(matches!(err, ExecuteError::UnsupportedClass(ActionClass::Bonk)));
}

#[test]
fn every_successful_execute_writes_exactly_one_audit_row() {
    let conn = open_db_in_memory().unwrap();
    let config = Arc::new(test_config());
    let service = service(&conn, &config);

    service.execute(&grant(ADMIN, 5)).unwrap();
    service.execute(&grant(ADMIN, 10)).unwrap();
    service
        .execute(&ActionRequest {
            actor: ADMIN,
            class: ActionClass::Revoke,
            ..grant(ADMIN, 5)
        })
        .unwrap();

    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM ledger_entries;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 3);
    let sum: i64 = conn
        .query_row("SELECT SUM(delta) FROM ledger_entries;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(sum, service.balance_of(COMMUNITY, TARGET).unwrap());
}

#[test]
fn leaderboard_clamps_limit_and_orders_deterministically() {
    let conn = open_db_in_memory().unwrap();
    let mut config = test_config();
    // Open targeting so several accounts can hold balances.
    config.ledger.designated_target = None;
    let config = Arc::new(config);
    let service = service(&conn, &config);

    for target in [11, 12, 13] {
        service
            .execute(&ActionRequest {
                target,
                ..grant(ADMIN, 10)
            })
            .unwrap();
    }

    let all = service.leaderboard(COMMUNITY, None).unwrap();
    assert_eq!(all, vec![(11, 10), (12, 10), (13, 10)]);

    let capped = service.leaderboard(COMMUNITY, Some(2)).unwrap();
    assert_eq!(capped.len(), 2);

    let clamped = service.leaderboard(COMMUNITY, Some(500)).unwrap();
    assert_eq!(clamped.len(), 3);
}

fn assert_no_state(conn: &Connection) {
    let accounts: i64 = conn
        .query_row("SELECT COUNT(*) FROM accounts;", [], |row| row.get(0))
        .unwrap();
    let entries: i64 = conn
        .query_row("SELECT COUNT(*) FROM ledger_entries;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(accounts, 0);
    assert_eq!(entries, 0);
}
