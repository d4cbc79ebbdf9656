use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ed25519_dalek::SigningKey;
use fhe::address_from_verifying_key;
use fleet_core::{MintShip, TokenId};
use runtime::{
    Event, FileLedgerRepository, FleetQuery, InMemoryLedgerRepo, Ledger, LedgerRepository,
    QueryResponse, RepositoryError, Runtime, RuntimeConfig, RuntimeError, Topic, Transaction,
    TransactionEvent,
};

/// Snapshot store whose disk can fill up.
#[derive(Default)]
struct FlakyDisk {
    inner: InMemoryLedgerRepo,
    full: AtomicBool,
}

impl LedgerRepository for FlakyDisk {
    fn save(&self, block: u64, ledger: &Ledger) -> runtime::repository::Result<()> {
        if self.full.load(Ordering::SeqCst) {
            return Err(RepositoryError::Io(std::io::Error::other("disk full")));
        }
        self.inner.save(block, ledger)
    }

    fn load(&self, block: u64) -> runtime::repository::Result<Option<Ledger>> {
        self.inner.load(block)
    }

    fn exists(&self, block: u64) -> bool {
        self.inner.exists(block)
    }

    fn delete(&self, block: u64) -> runtime::repository::Result<()> {
        self.inner.delete(block)
    }

    fn list_blocks(&self) -> runtime::repository::Result<Vec<u64>> {
        self.inner.list_blocks()
    }
}

#[tokio::test]
async fn ledger_resumes_from_latest_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let key = SigningKey::from_bytes(&[9u8; 32]);
    let pilot = address_from_verifying_key(&key.verifying_key());

    let contract = {
        let repository = Arc::new(FileLedgerRepository::new(dir.path()).unwrap());
        let runtime = Runtime::builder()
            .repository(repository)
            .build()
            .await
            .unwrap();
        let handle = runtime.handle();

        let deploy = Transaction::deploy(pilot, "CipherverseFleet").sign(&key, handle.chain_id());
        let contract = handle
            .submit(deploy)
            .await
            .unwrap()
            .wait()
            .await
            .unwrap()
            .contract_address
            .unwrap();

        let mint = Transaction::call(pilot, contract, MintShip).sign(&key, handle.chain_id());
        handle.submit(mint).await.unwrap().wait().await.unwrap();

        drop(handle);
        runtime.shutdown().await.unwrap();
        contract
    };

    let repository = Arc::new(FileLedgerRepository::new(dir.path()).unwrap());
    assert_eq!(repository.list_blocks().unwrap(), vec![1, 2]);

    let runtime = Runtime::builder()
        .repository(repository)
        .build()
        .await
        .unwrap();
    let handle = runtime.handle();

    assert_eq!(handle.block_number(), 2);
    assert_eq!(
        handle.query(&contract, FleetQuery::ShipOf(pilot)).unwrap(),
        QueryResponse::ShipOf(TokenId(1))
    );
}

#[tokio::test]
async fn old_snapshots_are_pruned() {
    let dir = tempfile::tempdir().unwrap();
    let key = SigningKey::from_bytes(&[9u8; 32]);
    let pilot = address_from_verifying_key(&key.verifying_key());
    let repository = Arc::new(FileLedgerRepository::new(dir.path()).unwrap());

    let config = RuntimeConfig {
        snapshot_retention: 2,
        ..RuntimeConfig::default()
    };
    let runtime = Runtime::builder()
        .config(config)
        .repository(repository.clone())
        .build()
        .await
        .unwrap();
    let handle = runtime.handle();

    for _ in 0..4 {
        let deploy = Transaction::deploy(pilot, "CipherverseFleet").sign(&key, handle.chain_id());
        handle.submit(deploy).await.unwrap().wait().await.unwrap();
    }

    assert_eq!(repository.list_blocks().unwrap(), vec![3, 4]);
    assert_eq!(handle.checkpoint().await.unwrap(), 4);
}

#[tokio::test]
async fn snapshot_from_other_chain_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let repository = Arc::new(FileLedgerRepository::new(dir.path()).unwrap());
    repository.save(0, &runtime::Ledger::new(1)).unwrap();

    let result = Runtime::builder()
        .repository(repository)
        .build()
        .await;

    assert!(matches!(
        result,
        Err(RuntimeError::ChainMismatch { expected: 31337, found: 1 })
    ));
}

#[tokio::test]
async fn unsaved_block_fails_and_is_rolled_back() {
    let key = SigningKey::from_bytes(&[9u8; 32]);
    let pilot = address_from_verifying_key(&key.verifying_key());
    let disk = Arc::new(FlakyDisk::default());
    disk.full.store(true, Ordering::SeqCst);

    let runtime = Runtime::builder()
        .repository(disk.clone())
        .build()
        .await
        .unwrap();
    let handle = runtime.handle();
    let mut transactions = handle.subscribe(Topic::Transactions);

    let deploy = Transaction::deploy(pilot, "CipherverseFleet").sign(&key, handle.chain_id());
    let result = handle.submit(deploy).await.unwrap().wait().await;
    assert!(matches!(
        result,
        Err(RuntimeError::Repository(RepositoryError::Io(_)))
    ));
    assert_eq!(handle.block_number(), 0);
    assert_eq!(handle.nonce(&pilot), 0);
    assert!(matches!(
        transactions.recv().await.unwrap(),
        Event::Transaction(TransactionEvent::Rejected { .. })
    ));

    disk.full.store(false, Ordering::SeqCst);
    let deploy = Transaction::deploy(pilot, "CipherverseFleet").sign(&key, handle.chain_id());
    let contract = handle
        .submit(deploy)
        .await
        .unwrap()
        .wait()
        .await
        .unwrap()
        .contract_address
        .unwrap();

    disk.full.store(true, Ordering::SeqCst);
    let mint = Transaction::call(pilot, contract, MintShip).sign(&key, handle.chain_id());
    let mint_hash = mint.hash(handle.chain_id());
    let result = handle.submit(mint).await.unwrap().wait().await;
    assert!(matches!(result, Err(RuntimeError::Repository(_))));
    assert_eq!(handle.block_number(), 1);
    assert_eq!(handle.receipt(&mint_hash), None);
    assert_eq!(
        handle.query(&contract, FleetQuery::ShipOf(pilot)).unwrap(),
        QueryResponse::ShipOf(TokenId::NONE)
    );
    assert_eq!(
        handle.query(&contract, FleetQuery::TotalSupply).unwrap(),
        QueryResponse::TotalSupply(0)
    );
    assert_eq!(disk.list_blocks().unwrap(), vec![1]);

    disk.full.store(false, Ordering::SeqCst);
    let mint = Transaction::call(pilot, contract, MintShip).sign(&key, handle.chain_id());
    let receipt = handle.submit(mint).await.unwrap().wait().await.unwrap();
    assert!(receipt.is_success());
    assert_eq!(receipt.block_number, 2);
    assert_eq!(
        handle.query(&contract, FleetQuery::ShipOf(pilot)).unwrap(),
        QueryResponse::ShipOf(TokenId(1))
    );
    assert_eq!(disk.list_blocks().unwrap(), vec![1, 2]);
}

#[tokio::test]
async fn checkpoint_interval_batches_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    let key = SigningKey::from_bytes(&[9u8; 32]);
    let pilot = address_from_verifying_key(&key.verifying_key());
    let repository = Arc::new(FileLedgerRepository::new(dir.path()).unwrap());

    let config = RuntimeConfig {
        checkpoint_interval: 3,
        ..RuntimeConfig::default()
    };
    let runtime = Runtime::builder()
        .config(config)
        .repository(repository.clone())
        .build()
        .await
        .unwrap();
    let handle = runtime.handle();

    for _ in 0..4 {
        let deploy = Transaction::deploy(pilot, "CipherverseFleet").sign(&key, handle.chain_id());
        handle.submit(deploy).await.unwrap().wait().await.unwrap();
    }
    assert_eq!(repository.list_blocks().unwrap(), vec![3]);

    drop(handle);
    runtime.shutdown().await.unwrap();
    assert_eq!(repository.list_blocks().unwrap(), vec![3, 4]);
}
