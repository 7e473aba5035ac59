use crate::utils;
use colored::Colorize;
use vaultline_cloud::Orchestrator;
use vaultline_config::ProvisionConfig;

pub async fn handle(config: &ProvisionConfig, region: &str) -> anyhow::Result<()> {
    println!("{}", "プロビジョニングを開始します...".blue().bold());
    utils::print_targets(config, region);

    let clients = utils::connect(config, region).await;
    let orchestrator = Orchestrator::new(clients, config.to_request(region));

    let report = match orchestrator.run().await {
        Ok(report) => report,
        Err(e) => {
            utils::print_failure(&e);
            return Err(e.into());
        }
    };

    println!();
    println!("{}", format!("実行結果 ({} 件):", report.actions.len()).bold());
    for action in &report.actions {
        utils::print_action(action);
    }

    println!();
    println!(
        "{}",
        format!("✓ プロビジョニング完了 ({})", report.summary())
            .green()
            .bold()
    );
    println!("  所要時間: {:.1}秒", report.duration_ms as f64 / 1000.0);

    Ok(())
}
