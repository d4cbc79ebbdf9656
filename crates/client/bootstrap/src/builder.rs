//! Builds the runtime, repositories and wallet used by front-ends.
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use client_blockchain_core::{Address, LocalFhevm, LocalFleetClient, Wallet};
use fleet_core::FleetConfig;
use runtime::{
    DeploymentRecord, DeploymentRepository, FileDeploymentRepository, FileLedgerRepository,
    LedgerHandle, Runtime,
};

use crate::config::ClientConfig;

/// Builder that assembles the local ledger runtime for clients.
pub struct RuntimeBuilder {
    config: ClientConfig,
}

impl RuntimeBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub async fn build(self) -> Result<RuntimeSetup> {
        let config = self.config;

        let ledger_repo = FileLedgerRepository::new(config.ledger_dir()).with_context(|| {
            format!("failed to open ledger directory {}", config.ledger_dir().display())
        })?;
        let deployments = FileDeploymentRepository::new(config.deployments_dir())
            .with_context(|| {
                format!(
                    "failed to open deployments directory {}",
                    config.deployments_dir().display()
                )
            })?;
        let wallet = config.wallet()?;

        let runtime = Runtime::builder()
            .config(config.runtime_config())
            .repository(Arc::new(ledger_repo))
            .build()
            .await
            .context("failed to start ledger runtime")?;

        tracing::info!(
            network = %config.network,
            block = runtime.handle().block_number(),
            pilot = %wallet.address(),
            "ledger runtime ready"
        );

        Ok(RuntimeSetup {
            config,
            runtime,
            deployments: Arc::new(deployments),
            wallet,
        })
    }
}

/// Result of [`RuntimeSetup::deploy`].
#[derive(Debug, Clone)]
pub struct DeployOutcome {
    pub record: DeploymentRecord,
    /// `false` when an existing deployment was reused.
    pub newly_deployed: bool,
}

pub struct RuntimeSetup {
    pub config: ClientConfig,
    pub runtime: Runtime,
    pub deployments: Arc<dyn DeploymentRepository>,
    pub wallet: Wallet,
}

impl RuntimeSetup {
    pub fn handle(&self) -> LedgerHandle {
        self.runtime.handle()
    }

    /// Recorded registry deployment on the configured network, if it still
    /// exists on the ledger.
    pub fn deployment(&self) -> Result<Option<DeploymentRecord>> {
        let record = self
            .deployments
            .load(&self.config.network, FleetConfig::DEFAULT_CONTRACT_NAME)?;

        Ok(record.filter(|record| {
            let live = self.handle().contract(&record.address).is_some();
            if !live {
                tracing::warn!(address = %record.address, "recorded deployment missing from ledger");
            }
            live
        }))
    }

    /// Deploys the registry from the configured wallet unless a live
    /// deployment is recorded. `force` always deploys a fresh instance.
    pub async fn deploy(&self, force: bool) -> Result<DeployOutcome> {
        if !force && let Some(record) = self.deployment()? {
            return Ok(DeployOutcome {
                record,
                newly_deployed: false,
            });
        }

        let (_, receipt) =
            LocalFleetClient::deploy(self.handle(), &self.wallet, &self.config.network)
                .await
                .context("deployment failed")?;
        let address = receipt
            .contract_address
            .ok_or_else(|| anyhow!("deployment receipt has no contract address"))?;

        let record = DeploymentRecord {
            contract_name: FleetConfig::DEFAULT_CONTRACT_NAME.to_string(),
            address,
            deployer: self.wallet.address(),
            block_number: receipt.block_number,
            tx_hash: receipt.tx_hash,
            deployed_at: Utc::now(),
        };
        self.deployments.save(&self.config.network, &record)?;

        Ok(DeployOutcome {
            record,
            newly_deployed: true,
        })
    }

    /// Client bound to `address`, or to the recorded deployment.
    pub fn fleet(&self, address: Option<Address>) -> Result<LocalFleetClient> {
        let address = match address {
            Some(address) => address,
            None => {
                self.deployment()?
                    .ok_or_else(|| {
                        anyhow!(
                            "{} is not deployed on {}. Run `fleet deploy` first.",
                            FleetConfig::DEFAULT_CONTRACT_NAME,
                            self.config.network
                        )
                    })?
                    .address
            }
        };

        Ok(LocalFleetClient::connect(
            self.handle(),
            address,
            &self.config.network,
        )?)
    }

    pub fn fhevm(&self) -> LocalFhevm {
        LocalFhevm::new(self.handle()).with_grant_duration(self.config.grant_duration_days)
    }
}
