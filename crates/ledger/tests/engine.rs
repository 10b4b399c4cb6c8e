use chrono::{DateTime, Duration, TimeZone, Utc};
use sea_orm::{Database, DatabaseConnection};

use ledger::{
    AccrualPolicy, Engine, LedgerError, MoneyMinor, RecordKind, RecordListFilter, RecordStatus,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn engine_with_file_db() -> (Engine, DatabaseConnection, String, std::path::PathBuf) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("ledger_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();

    (engine, db, url, path)
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 10, 0, 0).unwrap()
}

fn policy() -> AccrualPolicy {
    AccrualPolicy::default()
}

async fn register(engine: &Engine, name: &str, phone: &str) -> ledger::Account {
    engine
        .register(name, phone, "password", None, start())
        .await
        .unwrap()
}

async fn product_named(engine: &Engine, name: &str) -> ledger::Product {
    engine
        .products()
        .await
        .unwrap()
        .into_iter()
        .find(|p| p.name == name)
        .expect("seeded product missing")
}

#[tokio::test]
async fn register_creates_account_with_zero_wallets() {
    let (engine, _db) = engine_with_db().await;

    let account = register(&engine, "Asha", "9800000001").await;

    assert_eq!(account.deposit_wallet, MoneyMinor::ZERO);
    assert_eq!(account.withdrawal_wallet, MoneyMinor::ZERO);
    assert!(!account.referral_code.is_empty());

    let found = engine.account_by_phone("9800000001").await.unwrap();
    assert_eq!(found.id, account.id);
}

#[tokio::test]
async fn register_rejects_duplicate_phone() {
    let (engine, _db) = engine_with_db().await;
    register(&engine, "Asha", "9800000001").await;

    let err = engine
        .register("Imposter", "9800000001", "password", None, start())
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::ExistingKey("9800000001".to_string()));
}

#[tokio::test]
async fn register_rejects_unknown_referral_code() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .register("Asha", "9800000001", "password", Some("NOCODE99"), start())
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::KeyNotFound(_)));
}

#[tokio::test]
async fn deposit_purchase_accrue_withdraw_full_cycle() {
    let (engine, _db) = engine_with_db().await;
    let account = register(&engine, "Asha", "9800000001").await;

    let t = engine
        .deposit(account.id, MoneyMinor::new(100000), None, start())
        .await
        .unwrap();
    assert!(t.applied);
    assert_eq!(t.account.deposit_wallet, MoneyMinor::new(100000));

    // Starter Plan: price 50000, yield 1500/day.
    let product = product_named(&engine, "Starter Plan").await;
    let t = engine.purchase(account.id, product.id, start()).await.unwrap();
    assert!(t.applied);
    assert_eq!(t.account.deposit_wallet, MoneyMinor::new(50000));
    assert_eq!(t.account.positions.len(), 1);
    assert_eq!(t.account.daily_income_rate, MoneyMinor::new(1500));

    let next_day = start() + Duration::days(1);
    let t = engine.accrue(account.id, &policy(), next_day).await.unwrap();
    assert!(t.applied);
    assert_eq!(t.account.withdrawal_wallet, MoneyMinor::new(1500));
    assert_eq!(t.record.as_ref().unwrap().kind, RecordKind::DailyIncome);

    // Second pass the same day changes nothing.
    let again = engine
        .accrue(account.id, &policy(), next_day + Duration::hours(3))
        .await
        .unwrap();
    assert!(again.record.is_none());
    assert_eq!(again.account.withdrawal_wallet, MoneyMinor::new(1500));

    let t = engine
        .withdraw(account.id, MoneyMinor::new(1500), Some("upi:asha@bank".to_string()), next_day)
        .await
        .unwrap();
    assert!(t.applied);
    assert_eq!(t.account.withdrawal_wallet, MoneyMinor::ZERO);
    assert_eq!(t.account.total_withdrawn, MoneyMinor::new(1500));
}

#[tokio::test]
async fn withdraw_insufficient_persists_failed_record() {
    let (engine, _db) = engine_with_db().await;
    let account = register(&engine, "Asha", "9800000001").await;

    let t = engine
        .withdraw(account.id, MoneyMinor::new(5000), None, start())
        .await
        .unwrap();
    assert!(!t.applied);
    assert_eq!(t.account.withdrawal_wallet, MoneyMinor::ZERO);

    let records = engine
        .records(account.id, &RecordListFilter::default())
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, RecordKind::Withdraw);
    assert_eq!(records[0].status, RecordStatus::Failed);
}

#[tokio::test]
async fn purchase_without_funds_is_rejected_without_a_record() {
    let (engine, _db) = engine_with_db().await;
    let account = register(&engine, "Asha", "9800000001").await;
    let product = product_named(&engine, "Starter Plan").await;

    let err = engine
        .purchase(account.id, product.id, start())
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientFunds(_)));

    let records = engine
        .records(account.id, &RecordListFilter::default())
        .await
        .unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn sell_credits_resale_value_into_withdrawal_wallet() {
    let (engine, _db) = engine_with_db().await;
    let account = register(&engine, "Asha", "9800000001").await;
    engine
        .deposit(account.id, MoneyMinor::new(100000), None, start())
        .await
        .unwrap();

    let product = product_named(&engine, "Starter Plan").await;
    let t = engine.purchase(account.id, product.id, start()).await.unwrap();
    let position_id = t.account.positions[0].id;

    let t = engine.sell(account.id, position_id, start()).await.unwrap();
    assert!(t.applied);
    assert_eq!(t.account.withdrawal_wallet, MoneyMinor::new(20000));
    assert_eq!(t.account.deposit_wallet, MoneyMinor::new(50000));
    assert!(t.account.positions.is_empty());
    assert_eq!(t.account.daily_income_rate, MoneyMinor::ZERO);

    // The position row is gone, so selling again is a lookup failure.
    let err = engine.sell(account.id, position_id, start()).await.unwrap_err();
    assert!(matches!(err, LedgerError::KeyNotFound(_)));
}

#[tokio::test]
async fn accrual_prunes_expired_position_rows() {
    let (engine, _db) = engine_with_db().await;
    let account = register(&engine, "Asha", "9800000001").await;
    engine
        .deposit(account.id, MoneyMinor::new(100000), None, start())
        .await
        .unwrap();
    let product = product_named(&engine, "Starter Plan").await;
    engine.purchase(account.id, product.id, start()).await.unwrap();

    // Starter Plan cycle is 30 days; day 30 is past the cycle.
    let after_cycle = start() + Duration::days(30);
    let t = engine.accrue(account.id, &policy(), after_cycle).await.unwrap();
    assert!(t.record.is_none());
    assert!(t.account.positions.is_empty());

    // Pruning hit the rows too, not only the snapshot.
    let reloaded = engine.account(account.id).await.unwrap();
    assert!(reloaded.positions.is_empty());
    assert_eq!(reloaded.daily_income_rate, MoneyMinor::ZERO);
}

#[tokio::test]
async fn accrue_all_skips_blocked_accounts() {
    let (engine, _db) = engine_with_db().await;
    let asha = register(&engine, "Asha", "9800000001").await;
    let ravi = register(&engine, "Ravi", "9800000002").await;
    let product = product_named(&engine, "Starter Plan").await;

    for id in [asha.id, ravi.id] {
        engine
            .deposit(id, MoneyMinor::new(100000), None, start())
            .await
            .unwrap();
        engine.purchase(id, product.id, start()).await.unwrap();
    }
    engine.set_blocked(ravi.id, true).await.unwrap();

    let credited = engine
        .accrue_all(&policy(), start() + Duration::days(1))
        .await
        .unwrap();
    assert_eq!(credited, 1);

    let asha = engine.account(asha.id).await.unwrap();
    assert_eq!(asha.withdrawal_wallet, MoneyMinor::new(1500));
    let ravi = engine.account(ravi.id).await.unwrap();
    assert_eq!(ravi.withdrawal_wallet, MoneyMinor::ZERO);
}

#[tokio::test]
async fn blocked_account_cannot_move_money() {
    let (engine, _db) = engine_with_db().await;
    let asha = register(&engine, "Asha", "9800000001").await;
    let product = product_named(&engine, "Starter Plan").await;
    engine
        .deposit(asha.id, MoneyMinor::new(100000), None, start())
        .await
        .unwrap();
    let t = engine.purchase(asha.id, product.id, start()).await.unwrap();
    let position_id = t.account.positions[0].id;

    engine.set_blocked(asha.id, true).await.unwrap();

    let err = engine
        .deposit(asha.id, MoneyMinor::new(1000), None, start())
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::Blocked("9800000001".to_string()));
    assert!(matches!(
        engine
            .withdraw(asha.id, MoneyMinor::new(1000), None, start())
            .await
            .unwrap_err(),
        LedgerError::Blocked(_)
    ));
    assert!(matches!(
        engine.purchase(asha.id, product.id, start()).await.unwrap_err(),
        LedgerError::Blocked(_)
    ));
    assert!(matches!(
        engine.sell(asha.id, position_id, start()).await.unwrap_err(),
        LedgerError::Blocked(_)
    ));

    // Unblocking restores the account as it was.
    engine.set_blocked(asha.id, false).await.unwrap();
    let t = engine
        .deposit(asha.id, MoneyMinor::new(1000), None, start())
        .await
        .unwrap();
    assert!(t.applied);
    assert_eq!(t.account.deposit_wallet, MoneyMinor::new(51000));
}

#[tokio::test]
async fn first_deposit_opens_pending_referral_and_approval_credits_referrer() {
    let (engine, _db) = engine_with_db().await;
    let referrer = register(&engine, "Asha", "9800000001").await;
    let referred = engine
        .register(
            "Ravi",
            "9800000002",
            "password",
            Some(&referrer.referral_code),
            start(),
        )
        .await
        .unwrap();

    engine
        .deposit(referred.id, MoneyMinor::new(100000), None, start())
        .await
        .unwrap();

    let pending = engine.pending_referrals().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].referrer_account_id, referrer.id);
    assert_eq!(pending[0].first_deposit, MoneyMinor::new(100000));

    // A second deposit must not open another entry.
    engine
        .deposit(referred.id, MoneyMinor::new(50000), None, start())
        .await
        .unwrap();
    assert_eq!(engine.pending_referrals().await.unwrap().len(), 1);

    // Tier 1 pays 10% of the first deposit.
    let t = engine
        .approve_referral(pending[0].id, start() + Duration::days(1))
        .await
        .unwrap();
    assert_eq!(t.record.as_ref().unwrap().kind, RecordKind::ReferralBonus);
    assert_eq!(t.record.as_ref().unwrap().amount, MoneyMinor::new(10000));

    let referrer = engine.account(referrer.id).await.unwrap();
    assert_eq!(referrer.withdrawal_wallet, MoneyMinor::new(10000));
    assert_eq!(referrer.deposit_wallet, MoneyMinor::ZERO);

    let summary = engine.referral_summary(referrer.id).await.unwrap();
    assert_eq!(summary.approved, 1);
    assert_eq!(summary.pending, 0);
    assert_eq!(summary.current_tier.unwrap().bonus_percent, 10);

    // Approvals are final.
    let err = engine
        .approve_referral(pending[0].id, start() + Duration::days(2))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::ExistingKey(_)));
}

#[tokio::test]
async fn rejected_referral_touches_no_wallet() {
    let (engine, _db) = engine_with_db().await;
    let referrer = register(&engine, "Asha", "9800000001").await;
    let referred = engine
        .register(
            "Ravi",
            "9800000002",
            "password",
            Some(&referrer.referral_code),
            start(),
        )
        .await
        .unwrap();
    engine
        .deposit(referred.id, MoneyMinor::new(100000), None, start())
        .await
        .unwrap();

    let pending = engine.pending_referrals().await.unwrap();
    engine
        .reject_referral(pending[0].id, start() + Duration::days(1))
        .await
        .unwrap();

    let referrer = engine.account(referrer.id).await.unwrap();
    assert_eq!(referrer.withdrawal_wallet, MoneyMinor::ZERO);
    assert!(engine.pending_referrals().await.unwrap().is_empty());
}

#[tokio::test]
async fn referral_on_a_tiny_first_deposit_can_still_be_approved() {
    let (engine, _db) = engine_with_db().await;
    let referrer = register(&engine, "Asha", "9800000001").await;
    let referred = engine
        .register(
            "Ravi",
            "9800000002",
            "password",
            Some(&referrer.referral_code),
            start(),
        )
        .await
        .unwrap();

    // 10% of 5 paise rounds down to zero bonus.
    engine
        .deposit(referred.id, MoneyMinor::new(5), None, start())
        .await
        .unwrap();
    let pending = engine.pending_referrals().await.unwrap();

    let t = engine
        .approve_referral(pending[0].id, start() + Duration::days(1))
        .await
        .unwrap();
    assert!(t.applied);
    assert!(t.record.is_none());

    let referrer = engine.account(referrer.id).await.unwrap();
    assert_eq!(referrer.withdrawal_wallet, MoneyMinor::ZERO);

    let summary = engine.referral_summary(referrer.id).await.unwrap();
    assert_eq!(summary.approved, 1);
    assert!(engine.pending_referrals().await.unwrap().is_empty());
}

#[tokio::test]
async fn records_filter_by_kind_and_limit() {
    let (engine, _db) = engine_with_db().await;
    let account = register(&engine, "Asha", "9800000001").await;

    for i in 0..3 {
        engine
            .deposit(
                account.id,
                MoneyMinor::new(10000),
                None,
                start() + Duration::minutes(i),
            )
            .await
            .unwrap();
    }
    engine
        .withdraw(account.id, MoneyMinor::new(100), None, start() + Duration::hours(1))
        .await
        .unwrap();

    let deposits = engine
        .records(
            account.id,
            &RecordListFilter {
                kinds: Some(vec![RecordKind::Deposit]),
                limit: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(deposits.len(), 3);
    assert!(deposits.iter().all(|r| r.kind == RecordKind::Deposit));

    let latest = engine
        .records(
            account.id,
            &RecordListFilter {
                kinds: None,
                limit: Some(2),
            },
        )
        .await
        .unwrap();
    assert_eq!(latest.len(), 2);
    // Newest first.
    assert_eq!(latest[0].kind, RecordKind::Withdraw);

    let err = engine
        .records(Uuid::new_v4(), &RecordListFilter::default())
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::KeyNotFound(_)));
}

#[tokio::test]
async fn restart_engine_reads_same_state() {
    let (engine, db, url, path) = engine_with_file_db().await;
    let account = register(&engine, "Asha", "9800000001").await;
    engine
        .deposit(account.id, MoneyMinor::new(100000), None, start())
        .await
        .unwrap();

    drop(engine);
    drop(db);

    let db2 = Database::connect(&url).await.unwrap();
    let engine2 = Engine::builder().database(db2.clone()).build().await.unwrap();

    let reloaded = engine2.account(account.id).await.unwrap();
    assert_eq!(reloaded.deposit_wallet, MoneyMinor::new(100000));
    assert_eq!(reloaded.total_deposited, MoneyMinor::new(100000));

    drop(db2);
    let _ = std::fs::remove_file(path);
}
