#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! へ移行

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn vaultline() -> Command {
    let mut cmd = Command::cargo_bin("vaultline").unwrap();
    cmd.env_remove("VAULTLINE_CONFIG_PATH").env_remove("RUST_LOG");
    cmd
}

/// CLIヘルプが正しく表示されることを確認
#[test]
fn test_cli_help() {
    vaultline()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("apply"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--region"));
}

/// バージョン表示が正しく動作することを確認
#[test]
fn test_cli_version() {
    vaultline()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vaultline"));
}

/// バージョン表示は設定ファイルがなくても動作する
#[test]
fn test_version_without_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    vaultline()
        .current_dir(temp_dir.path())
        .arg("version")
        .assert()
        .success();
}

/// 不正なコマンドでエラーになることを確認
#[test]
fn test_invalid_command() {
    vaultline().arg("invalid-command").assert().failure();
}

/// 指定した設定ファイルが存在しない場合はエラー
#[test]
fn test_apply_with_missing_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    vaultline()
        .current_dir(temp_dir.path())
        .arg("apply")
        .arg("--config")
        .arg("missing.yaml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("IO エラー"));
}

/// 不正な設定はAWSに接続する前に拒否される
#[test]
fn test_plan_rejects_invalid_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("vaultline.yaml");
    fs::write(
        &config_path,
        "source_bucket: media-primary\n\
         destination_bucket: media-primary\n\
         role_name: media-replication\n\
         trail_name: media-audit\n",
    )
    .unwrap();

    vaultline()
        .current_dir(temp_dir.path())
        .arg("plan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("設定が不正です"))
        .stdout(predicate::str::contains("AWSに接続中").not());
}

/// 必須項目が欠けた設定は YAML エラーになる
#[test]
fn test_apply_rejects_incomplete_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("incomplete.yaml");
    fs::write(&config_path, "source_bucket: media-primary\n").unwrap();

    vaultline()
        .arg("apply")
        .arg("--config")
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("YAML の解析に失敗しました"));
}
