use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use vaultline_cloud::{Action, ActionType, CloudClients, ProvisionError};
use vaultline_cloud_aws::AwsSettings;
use vaultline_config::ProvisionConfig;

/// stderr へのログ出力を初期化（RUST_LOG が優先）
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// 設定ファイルを決定して読み込む（--config 指定時は自動検出しない）
pub fn load_provision_config(path: Option<&Path>) -> anyhow::Result<(PathBuf, ProvisionConfig)> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => vaultline_config::find_config_file()?,
    };
    let config = vaultline_config::load_config(&path)?;
    Ok((path, config))
}

/// 読み込んだ設定ファイル情報を表示
pub fn print_loaded_config_file(path: &Path) {
    println!("📄 読み込んだ設定ファイル:");
    println!("  • {}", path.display().to_string().cyan());
}

pub fn print_targets(config: &ProvisionConfig, region: &str) {
    println!("リージョン: {}", region.cyan());
    println!("  ソースバケット:   {}", config.source_bucket.cyan());
    println!("  バックアップ先:   {}", config.destination_bucket.cyan());
    println!("  レプリケーション: {}", config.role_name.cyan());
    println!("  監査証跡:         {}", config.trail_name.cyan());
}

/// AWS クライアントを初期化
pub async fn connect(config: &ProvisionConfig, region: &str) -> CloudClients {
    println!();
    println!("{}", "AWSに接続中...".blue());
    let settings = AwsSettings::new(region).with_retry(config.retry_config());
    vaultline_cloud_aws::connect(&settings).await
}

pub fn print_action(action: &Action) {
    let marker = match action.action_type {
        ActionType::Create => "+".green().bold(),
        ActionType::Update => "~".yellow().bold(),
        ActionType::NoOp => "=".dimmed(),
    };
    println!(
        "  {} [{}] {} {}",
        marker,
        action.stage.to_string().dimmed(),
        action.resource_id.cyan(),
        action.description
    );
}

/// 失敗したステップと到達済みステージを表示
pub fn print_failure(err: &ProvisionError) {
    eprintln!();
    eprintln!(
        "{}",
        format!("✗ ステップ '{}' で失敗しました", err.step()).red().bold()
    );
    eprintln!("  到達済みステージ: {}", err.reached().to_string().yellow());
    eprintln!("  原因: {}", err.cloud_error());
    eprintln!();
    eprintln!(
        "{}",
        "原因を解消してから再実行してください。作成済みのリソースは再利用されます。".yellow()
    );
}
