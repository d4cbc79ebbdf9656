//! Task output against a ledger in a temporary data directory.

use client_bootstrap::{ClientConfig, RuntimeBuilder, RuntimeSetup};
use fleet_client::{Command, tasks};

async fn setup(dir: &std::path::Path, account: u32) -> RuntimeSetup {
    let config = ClientConfig {
        data_dir: dir.to_path_buf(),
        account_index: account,
        file_logs: false,
        ..ClientConfig::default()
    };
    RuntimeBuilder::new(config).build().await.unwrap()
}

fn lines(out: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(out)
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn deploy_then_reuse() {
    let dir = tempfile::tempdir().unwrap();
    let setup = setup(dir.path(), 0).await;

    let mut out = Vec::new();
    tasks::deploy(&setup, false, &mut out).await.unwrap();
    let first = lines(&out);
    assert!(first[0].starts_with("deploying \"CipherverseFleet\""));
    let address = setup.deployment().unwrap().unwrap().address;
    assert_eq!(first[1], format!("CipherverseFleet contract:  {address}"));

    let mut out = Vec::new();
    tasks::deploy(&setup, false, &mut out).await.unwrap();
    assert_eq!(lines(&out)[0], format!("reusing \"CipherverseFleet\" at {address}"));

    let mut out = Vec::new();
    tasks::address(&setup, None, &mut out).unwrap();
    assert_eq!(lines(&out), [format!("CipherverseFleet address is {address}")]);
}

#[tokio::test]
async fn tasks_require_a_deployment() {
    let dir = tempfile::tempdir().unwrap();
    let setup = setup(dir.path(), 0).await;

    let err = tasks::mint_ship(&setup, None, &mut Vec::new())
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "CipherverseFleet is not deployed on localhost. Run `fleet deploy` first."
    );
}

#[tokio::test]
async fn mint_and_decrypt_power() {
    let dir = tempfile::tempdir().unwrap();
    let setup = setup(dir.path(), 1).await;
    tasks::deploy(&setup, false, &mut Vec::new()).await.unwrap();
    let pilot = setup.wallet.address();

    let mut out = Vec::new();
    tasks::decrypt_attack(&setup, None, &mut out).await.unwrap();
    assert_eq!(lines(&out)[1], "No spaceship minted for this address.");

    let mut out = Vec::new();
    tasks::mint_ship(&setup, None, &mut out).await.unwrap();
    let minted = lines(&out);
    assert_eq!(minted.len(), 4);
    assert!(minted[0].starts_with("CipherverseFleet: 0x"));
    assert!(minted[1].starts_with("Wait for tx:0x"));
    assert!(minted[2].ends_with("status=1"));
    assert_eq!(minted[3], format!("Minted spaceship tokenId 1 for pilot {pilot}"));

    let mut out = Vec::new();
    tasks::mint_ship(&setup, None, &mut out).await.unwrap();
    assert_eq!(lines(&out)[1], "Pilot already owns spaceship tokenId 1.");

    let mut out = Vec::new();
    tasks::decrypt_attack(&setup, None, &mut out).await.unwrap();
    let decrypted = lines(&out);
    assert_eq!(decrypted[1], "Spaceship tokenId : 1");
    assert!(decrypted[2].starts_with("Encrypted power   : 0x"));
    assert_eq!(decrypted[3], "Clear attack power: 100");
}

#[tokio::test]
async fn launch_attack_reports_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let setup = setup(dir.path(), 2).await;
    tasks::deploy(&setup, false, &mut Vec::new()).await.unwrap();

    let err = tasks::launch_attack(&setup, None, "90", &mut Vec::new())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Pilot has no spaceship. Run mint-ship first.");

    tasks::mint_ship(&setup, None, &mut Vec::new()).await.unwrap();

    for (defense, success) in [("160", true), ("60", false), ("100", true)] {
        let mut out = Vec::new();
        tasks::launch_attack(&setup, None, defense, &mut out)
            .await
            .unwrap();
        let report = lines(&out);
        assert!(report[2].ends_with("status=1"));
        assert!(report[3].starts_with("Encrypted result: 0x"));
        assert_eq!(report[4], format!("Attack success  : {success}"));
    }
}

#[tokio::test]
async fn invalid_defense_fails_before_touching_the_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let setup = setup(dir.path(), 3).await;

    for bad in ["-1", "+5", "abc", "", "4294967296"] {
        let mut out = Vec::new();
        let err = tasks::launch_attack(&setup, None, bad, &mut out)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Argument --defense must be a non-negative integer");
        assert!(out.is_empty());
    }
}

#[tokio::test]
async fn status_renders_the_panel() {
    let dir = tempfile::tempdir().unwrap();
    let setup = setup(dir.path(), 4).await;
    tasks::deploy(&setup, false, &mut Vec::new()).await.unwrap();
    tasks::mint_ship(&setup, None, &mut Vec::new()).await.unwrap();

    let mut out = Vec::new();
    tasks::status(&setup, None, true, &mut out).await.unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.starts_with("Relayer ready for encrypted operations"));
    assert!(text.contains("Token #1"));
    assert!(text.contains("Fleet supply: 1"));
    assert!(text.contains("[Decrypted: 100]"));
    assert!(text.contains("No attacks yet"));

    let pilot = setup.wallet.address();
    let activity: Vec<&str> = text
        .lines()
        .skip_while(|line| *line != "Recent activity")
        .collect();
    assert_eq!(
        activity[1],
        format!("  block 2     Spaceship #1 minted by {pilot}")
    );
}

#[tokio::test]
async fn state_persists_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    {
        let setup = setup(dir.path(), 5).await;
        tasks::deploy(&setup, false, &mut Vec::new()).await.unwrap();
        tasks::mint_ship(&setup, None, &mut Vec::new()).await.unwrap();
        setup.runtime.shutdown().await.unwrap();
    }

    let setup = setup(dir.path(), 5).await;
    let mut out = Vec::new();
    tasks::mint_ship(&setup, None, &mut out).await.unwrap();
    assert_eq!(lines(&out)[1], "Pilot already owns spaceship tokenId 1.");
}

/// Runtime whose unsaved blocks can no longer be written at shutdown.
async fn setup_with_lost_ledger_dir(dir: &std::path::Path) -> RuntimeSetup {
    let config = ClientConfig {
        data_dir: dir.to_path_buf(),
        account_index: 6,
        checkpoint_interval: 100,
        file_logs: false,
        ..ClientConfig::default()
    };
    let ledger_dir = config.ledger_dir();
    let setup = RuntimeBuilder::new(config).build().await.unwrap();
    tasks::deploy(&setup, false, &mut Vec::new()).await.unwrap();

    std::fs::remove_dir_all(&ledger_dir).unwrap();
    std::fs::write(&ledger_dir, b"").unwrap();
    setup
}

#[tokio::test]
async fn task_error_is_reported_before_shutdown_failure() {
    let dir = tempfile::tempdir().unwrap();
    let setup = setup_with_lost_ledger_dir(dir.path()).await;

    let command = Command::LaunchAttack {
        defense: "+5".to_string(),
    };
    let err = tasks::run_to_completion(setup, None, &command, &mut Vec::new())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Argument --defense must be a non-negative integer");
}

#[tokio::test]
async fn shutdown_failure_fails_a_successful_task() {
    let dir = tempfile::tempdir().unwrap();
    let setup = setup_with_lost_ledger_dir(dir.path()).await;

    let mut out = Vec::new();
    let err = tasks::run_to_completion(setup, None, &Command::Address, &mut out)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "ledger shutdown failed");
    assert!(lines(&out)[0].starts_with("CipherverseFleet address is 0x"));
}
