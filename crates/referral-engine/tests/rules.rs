mod common;

use std::sync::Arc;

use referral_engine::{Actor, EngineError, ErrorKind, RuleInput, RuleService};
use referral_shared::context::Context;
use referral_shared::types::{AccountId, DiscountType, Role, RuleParams};
use referral_store::RuleStore;

use common::{account, open, open_temp};

fn fixed_input(total: i64, submitted_max: i64) -> RuleInput {
    RuleInput {
        total_discount: total,
        discount_type: "fixed".to_string(),
        expired_days: None,
        max_discount: submitted_max,
        max_usage: None,
        reward_per_referral: 5_000,
    }
}

#[test]
fn get_rule_initializes_defaults() {
    let (_dir, db) = open_temp();
    let ctx = Context::background();
    let rules = RuleService::new(&db);

    let rule = rules.get_rule(&ctx).unwrap();
    assert_eq!(rule.params.total_discount, 100);
    assert_eq!(rule.params.discount_type, DiscountType::Percentage);
    assert_eq!(rule.params.max_discount, 20_000);
    assert_eq!(rule.params.reward_per_referral, 20_000);
    assert_eq!(rule.params.expired_days, None);
    assert_eq!(rule.params.max_usage, None);

    assert_eq!(rules.get_rule(&ctx).unwrap(), rule);
    assert_eq!(db.count_rule_changes().unwrap(), 0);
}

#[test]
fn fixed_rule_persists_max_equal_to_total() {
    let (_dir, db) = open_temp();
    let ctx = Context::background();
    let admin = Actor::new(account(&db, Role::Admin), Role::Admin);
    let rules = RuleService::new(&db);

    let rule = rules
        .upsert_rule(&ctx, &admin, &fixed_input(50, 123_456))
        .unwrap();
    assert_eq!(rule.params.max_discount, 50);
    assert_eq!(db.read_rule(&ctx).unwrap().params.max_discount, 50);
}

#[test]
fn percentage_over_hundred_writes_nothing() {
    let (_dir, db) = open_temp();
    let ctx = Context::background();
    let admin = Actor::new(account(&db, Role::Admin), Role::Admin);
    let rules = RuleService::new(&db);

    let input = RuleInput {
        total_discount: 150,
        discount_type: "percentage".to_string(),
        expired_days: None,
        max_discount: 1_000,
        max_usage: None,
        reward_per_referral: 0,
    };
    let err = rules.upsert_rule(&ctx, &admin, &input).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation {
            field: "total_discount",
            ..
        }
    ));
    assert_eq!(db.count_rule_changes().unwrap(), 0);
    assert!(db.read_rule(&ctx).is_err(), "validation must not initialize the rule");
}

#[test]
fn identical_submission_is_a_no_op() {
    let (_dir, db) = open_temp();
    let ctx = Context::background();
    let admin = Actor::new(account(&db, Role::Admin), Role::Admin);
    let rules = RuleService::new(&db);

    let current = rules.get_rule(&ctx).unwrap();
    let again = rules
        .upsert_rule(&ctx, &admin, &RuleInput::from(&current.params))
        .unwrap();

    assert_eq!(again, current);
    assert_eq!(db.count_rule_changes().unwrap(), 0);
}

#[test]
fn no_op_against_missing_rule_initializes_only() {
    let (_dir, db) = open_temp();
    let ctx = Context::background();
    let admin = Actor::new(account(&db, Role::Admin), Role::Admin);
    let rules = RuleService::new(&db);

    let rule = rules
        .upsert_rule(&ctx, &admin, &RuleInput::from(&RuleParams::default()))
        .unwrap();
    assert_eq!(rule.params, RuleParams::default());
    assert_eq!(db.count_rule_changes().unwrap(), 0);
}

#[test]
fn change_produces_one_matching_audit_row() {
    let (_dir, db) = open_temp();
    let ctx = Context::background();
    let admin_id = account(&db, Role::Admin);
    let admin = Actor::new(admin_id, Role::Admin);
    let rules = RuleService::new(&db);

    let mut input = RuleInput::from(&rules.get_rule(&ctx).unwrap().params);
    input.max_usage = Some(3);
    let rule = rules.upsert_rule(&ctx, &admin, &input).unwrap();

    let changes = rules.list_rule_changes(&ctx, &admin, 10, 0).unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].params, rule.params);
    assert_eq!(changes[0].changed_by, admin_id);
    assert_eq!(changes[0].created_at, rule.updated_at);

    // Re-submitting the new values adds nothing.
    rules.upsert_rule(&ctx, &admin, &input).unwrap();
    assert_eq!(db.count_rule_changes().unwrap(), 1);
}

#[test]
fn non_admin_is_forbidden_without_writes() {
    let (_dir, db) = open_temp();
    let ctx = Context::background();
    let user = Actor::new(account(&db, Role::User), Role::User);
    let rules = RuleService::new(&db);

    let err = rules
        .upsert_rule(&ctx, &user, &fixed_input(10, 0))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert!(db.read_rule(&ctx).is_err());
    assert_eq!(db.count_rule_changes().unwrap(), 0);

    let err = rules.list_rule_changes(&ctx, &user, 10, 0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[test]
fn claimed_admin_with_user_account_is_forbidden() {
    let (_dir, db) = open_temp();
    let ctx = Context::background();
    let impostor = Actor::new(account(&db, Role::User), Role::Admin);

    let err = RuleService::new(&db)
        .upsert_rule(&ctx, &impostor, &fixed_input(10, 0))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert_eq!(db.count_rule_changes().unwrap(), 0);
}

#[test]
fn unknown_admin_is_not_found() {
    let (_dir, db) = open_temp();
    let ctx = Context::background();
    let ghost = Actor::new(AccountId::new(), Role::Admin);

    let err = RuleService::new(&db)
        .upsert_rule(&ctx, &ghost, &fixed_input(10, 0))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn authorization_precedes_validation() {
    let (_dir, db) = open_temp();
    let ctx = Context::background();
    let user = Actor::new(account(&db, Role::User), Role::User);

    let mut bad = fixed_input(10, 0);
    bad.discount_type = "bogus".to_string();
    let err = RuleService::new(&db)
        .upsert_rule(&ctx, &user, &bad)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[test]
fn cancelled_context_is_internal_and_atomic() {
    let (_dir, db) = open_temp();
    let admin = Actor::new(account(&db, Role::Admin), Role::Admin);
    let (ctx, cancel) = Context::background().with_cancel();
    cancel.cancel();

    let err = RuleService::new(&db)
        .upsert_rule(&ctx, &admin, &fixed_input(10, 0))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert_eq!(err.public_message(), "Internal server error");
    assert_eq!(db.count_rule_changes().unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_identical_changes_audit_once() {
    const CALLERS: usize = 8;
    const ROUNDS: i64 = 10;

    let dir = tempfile::tempdir().unwrap();
    let path = Arc::new(dir.path().join("referrals.db"));
    let admin = {
        let db = open(&path);
        RuleService::new(&db)
            .get_rule(&Context::background())
            .unwrap();
        Actor::new(account(&db, Role::Admin), Role::Admin)
    };

    for round in 1..=ROUNDS {
        let input = fixed_input(round * 10, 0);
        let barrier = Arc::new(std::sync::Barrier::new(CALLERS));
        let mut handles = Vec::new();
        for _ in 0..CALLERS {
            let path = path.clone();
            let barrier = barrier.clone();
            let input = input.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                let db = open(&path);
                barrier.wait();
                RuleService::new(&db)
                    .upsert_rule(&Context::background(), &admin, &input)
                    .map(|rule| rule.params.total_discount)
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), round * 10);
        }

        let db = open(&path);
        assert_eq!(
            db.count_rule_changes().unwrap(),
            round,
            "round {round} must add exactly one audit row"
        );
    }
}
