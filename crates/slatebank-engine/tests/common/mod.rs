//! Shared test harness: a scripted in-memory wallet backend and a fully
//! wired engine + scheduler.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::mpsc;

use slatebank_engine::{ProtocolEngine, ReconciliationScheduler, WalletBackend};
use slatebank_ledger::{AccountStore, BankLedger, TransactionRegistry};
use slatebank_policy::{DefaultPolicy, Policy};
use slatebank_types::{
    EngineConfig, OutboundMessage, PolicyConfig, Result, SchedulerConfig, Slate, SlateInit,
    SlatebankError, TxId, TxStatusReport,
};

#[derive(Default)]
struct MockState {
    offline: bool,
    decodes: HashMap<String, Slate>,
    statuses: HashMap<TxId, TxStatusReport>,
    released: Vec<TxId>,
    finalized: usize,
    minted: u64,
    forced_tx_id: Option<TxId>,
}

/// Scripted wallet backend. Tests register decode results and status
/// reports up front and inspect what the engine asked for afterwards.
pub struct MockWallet {
    state: Mutex<MockState>,
}

impl MockWallet {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_ready(&self, ready: bool) {
        self.lock().offline = !ready;
    }

    /// Force the next minted transaction id (e.g. to provoke a duplicate).
    pub fn force_next_tx_id(&self, tx_id: TxId) {
        self.lock().forced_tx_id = Some(tx_id);
    }

    /// Register the decoded header for a slatepack the test will paste.
    pub fn script_decode(&self, slatepack: &str, slate: Slate) {
        self.lock().decodes.insert(slatepack.to_string(), slate);
    }

    pub fn set_status(&self, tx_id: &TxId, report: TxStatusReport) {
        self.lock().statuses.insert(tx_id.clone(), report);
    }

    pub fn released(&self) -> Vec<TxId> {
        self.lock().released.clone()
    }

    pub fn finalized_count(&self) -> usize {
        self.lock().finalized
    }

    fn mint(&self, tag: &str) -> SlateInit {
        let mut state = self.lock();
        state.minted += 1;
        let tx_id = state
            .forced_tx_id
            .take()
            .unwrap_or_else(|| TxId::new(uuid::Uuid::new_v4().to_string()));
        SlateInit {
            slatepack: format!("BEGINSLATEPACK. {tag}{} ENDSLATEPACK.", state.minted),
            tx_id,
        }
    }
}

#[async_trait]
impl WalletBackend for MockWallet {
    async fn sync(&self) -> Result<()> {
        Ok(())
    }

    async fn is_ready(&self) -> Result<()> {
        if self.lock().offline {
            return Err(SlatebankError::BackendFailure {
                reason: "wallet locked".into(),
            });
        }
        Ok(())
    }

    async fn send(&self, _amount: Decimal, _dest: Option<&str>) -> Result<SlateInit> {
        Ok(self.mint("send"))
    }

    async fn invoice(&self, _amount: Decimal, _dest: Option<&str>) -> Result<SlateInit> {
        Ok(self.mint("inv"))
    }

    async fn receive(&self, _slatepack: &str) -> Result<SlateInit> {
        Ok(self.mint("recv"))
    }

    async fn finalize(&self, _slatepack: &str) -> Result<String> {
        self.lock().finalized += 1;
        Ok("BEGINSLATEPACK. fin ENDSLATEPACK.".to_string())
    }

    async fn release_lock(&self, tx_id: &TxId) -> Result<()> {
        self.lock().released.push(tx_id.clone());
        Ok(())
    }

    async fn decode_slatepack(&self, slatepack: &str) -> Result<Slate> {
        self.lock()
            .decodes
            .get(slatepack)
            .cloned()
            .ok_or_else(|| SlatebankError::MalformedSlatepack {
                reason: "unscripted slatepack".into(),
            })
    }

    async fn query_status(&self, tx_id: &TxId) -> Result<TxStatusReport> {
        self.lock()
            .statuses
            .get(tx_id)
            .cloned()
            .ok_or_else(|| SlatebankError::BackendFailure {
                reason: format!("no status for {tx_id}"),
            })
    }
}

/// Everything a scenario needs, wired the way a deployment would.
pub struct Harness {
    pub store: Arc<AccountStore>,
    pub registry: Arc<TransactionRegistry>,
    pub bank: Arc<BankLedger>,
    pub wallet: Arc<MockWallet>,
    pub engine: ProtocolEngine,
    pub scheduler: ReconciliationScheduler,
    pub notices: mpsc::Receiver<OutboundMessage>,
}

pub fn harness(policy_config: PolicyConfig) -> Harness {
    let store = Arc::new(AccountStore::new());
    let registry = Arc::new(TransactionRegistry::new());
    let bank = Arc::new(BankLedger::new());
    let wallet = Arc::new(MockWallet::new());
    let policy: Arc<dyn Policy> = Arc::new(DefaultPolicy::new(
        Arc::clone(&registry),
        Arc::clone(&bank),
        policy_config.clone(),
    ));
    let engine_config = EngineConfig { rpc_timeout_secs: 5 };

    let engine = ProtocolEngine::new(
        Arc::clone(&store),
        Arc::clone(&registry),
        Arc::clone(&policy),
        wallet.clone() as Arc<dyn WalletBackend>,
        engine_config.clone(),
    );

    let (notify_tx, notices) = mpsc::channel(64);
    let scheduler = ReconciliationScheduler::new(
        Arc::clone(&store),
        Arc::clone(&registry),
        policy,
        wallet.clone() as Arc<dyn WalletBackend>,
        Arc::clone(&bank),
        policy_config,
        engine_config,
        SchedulerConfig::default(),
        notify_tx,
    );

    Harness {
        store,
        registry,
        bank,
        wallet,
        engine,
        scheduler,
        notices,
    }
}

/// Opt into engine traces for a test run (`RUST_LOG=debug cargo test ...`).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

pub fn dec(n: i64) -> Decimal {
    Decimal::new(n, 0)
}

/// Seed an account with spendable funds as if an earlier deposit confirmed,
/// keeping the bank's custody expectation in line.
pub async fn seed_spendable(h: &Harness, account: slatebank_types::AccountId, amount: i64) {
    use slatebank_types::BalanceDelta;
    let cell = h.store.open(account);
    cell.lock()
        .await
        .adjust(&BalanceDelta::new(dec(amount), dec(0), dec(0), dec(0)))
        .unwrap();
    h.bank.credit(dec(amount));
}
