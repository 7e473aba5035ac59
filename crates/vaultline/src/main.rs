mod commands;
mod utils;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vaultline")]
#[command(about = "レプリケーションと監査証跡つきのバケットを、何度でも安全に構築する", long_about = None)]
struct Cli {
    /// 設定ファイルのパス（省略時は自動検出）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// AWS リージョン（設定ファイルの region より優先）
    #[arg(short, long, global = true, env = "AWS_REGION")]
    region: Option<String>,

    /// デバッグログを出力
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// リソースを構築（既存のものは再利用）
    Apply,
    /// 変更内容を表示（何も変更しない）
    Plan,
    /// バージョン情報を表示
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    utils::init_tracing(cli.verbose);

    // Versionコマンドは設定ファイル不要
    if matches!(cli.command, Commands::Version) {
        println!("vaultline {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let (config_path, config) = utils::load_provision_config(cli.config.as_deref())?;
    utils::print_loaded_config_file(&config_path);
    let region = config.resolve_region(cli.region.as_deref());

    match cli.command {
        Commands::Apply => commands::apply::handle(&config, &region).await?,
        Commands::Plan => commands::plan::handle(&config, &region).await?,
        Commands::Version => unreachable!("Version is handled before config loading"),
    }

    Ok(())
}
