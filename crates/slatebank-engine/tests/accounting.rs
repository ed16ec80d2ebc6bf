//! Accounting sweep scenarios: fee warning and charge cycle, deferred fees,
//! and inactive-account eviction.

mod common;

use common::{dec, harness, seed_spendable};
use slatebank_types::{AccountId, BalanceDelta, PolicyConfig};
use std::time::Duration;

const ALICE: AccountId = AccountId(1);

fn fee_config() -> PolicyConfig {
    PolicyConfig {
        max_free_balance: dec(10),
        monthly_fee: dec(1),
        fee_warning_secs: 0,
        billing_period_secs: 1,
        ..PolicyConfig::default()
    }
}

#[tokio::test]
async fn over_ceiling_account_is_warned_then_charged() {
    let mut h = harness(fee_config());
    seed_spendable(&h, ALICE, 20).await;

    // First sweep starts the cycle and warns.
    let summary = h.scheduler.sweep_accounting().await;
    assert_eq!(summary.warned, 1);
    assert_eq!(summary.charged, 0);
    let notice = h.notices.try_recv().unwrap();
    assert!(notice.text.contains("ceiling"));

    // Same cycle: no second warning.
    let summary = h.scheduler.sweep_accounting().await;
    assert_eq!(summary.warned, 0);

    // After the billing period the fee is taken from spendable.
    tokio::time::sleep(Duration::from_millis(1100)).await;
    let summary = h.scheduler.sweep_accounting().await;
    assert_eq!(summary.charged, 1);

    let balance = h.store.balance(ALICE).await.unwrap();
    assert_eq!(balance.spendable, dec(19));
    assert_eq!(h.bank.total_charged(), dec(1));
    h.scheduler.audit_custody().await.unwrap();
}

#[tokio::test]
async fn fee_is_deferred_when_spendable_cannot_cover_it() {
    let h = harness(fee_config());

    // All the value is still awaiting confirmation: over the ceiling, but
    // nothing spendable to charge against.
    let cell = h.store.open(ALICE);
    cell.lock()
        .await
        .adjust(&BalanceDelta::new(dec(0), dec(20), dec(0), dec(0)))
        .unwrap();
    drop(cell);
    h.bank.credit(dec(20));

    h.scheduler.sweep_accounting().await;
    tokio::time::sleep(Duration::from_millis(1100)).await;
    let summary = h.scheduler.sweep_accounting().await;

    assert_eq!(summary.charged, 0);
    assert_eq!(h.bank.total_charged(), dec(0));
    let balance = h.store.balance(ALICE).await.unwrap();
    assert_eq!(balance.awaiting_confirmation, dec(20));
}

#[tokio::test]
async fn dropping_under_ceiling_resets_the_cycle() {
    let h = harness(fee_config());
    seed_spendable(&h, ALICE, 20).await;

    h.scheduler.sweep_accounting().await;

    // The user withdraws most of it out-of-band of this test: balance back
    // under the ceiling.
    let cell = h.store.open(ALICE);
    cell.lock()
        .await
        .adjust(&BalanceDelta::new(dec(-15), dec(0), dec(0), dec(0)))
        .unwrap();
    drop(cell);
    h.bank.debit(dec(15));

    tokio::time::sleep(Duration::from_millis(1100)).await;
    let summary = h.scheduler.sweep_accounting().await;
    assert_eq!(summary.charged, 0);
    assert_eq!(h.bank.total_charged(), dec(0));
}

#[tokio::test]
async fn inactive_empty_account_is_destroyed() {
    let config = PolicyConfig {
        inactivity_window_secs: 0,
        ..PolicyConfig::default()
    };
    let h = harness(config);

    h.store.open(ALICE);
    assert_eq!(h.store.len(), 1);

    tokio::time::sleep(Duration::from_millis(20)).await;
    let summary = h.scheduler.sweep_accounting().await;
    assert_eq!(summary.evicted, 1);
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn account_with_balance_survives_inactivity() {
    let config = PolicyConfig {
        inactivity_window_secs: 0,
        ..PolicyConfig::default()
    };
    let h = harness(config);
    seed_spendable(&h, ALICE, 1).await;

    tokio::time::sleep(Duration::from_millis(20)).await;
    let summary = h.scheduler.sweep_accounting().await;
    assert_eq!(summary.evicted, 0);
    assert_eq!(h.store.len(), 1);
}
