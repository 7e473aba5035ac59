use crate::utils;
use colored::Colorize;
use vaultline_cloud::Orchestrator;
use vaultline_config::ProvisionConfig;

pub async fn handle(config: &ProvisionConfig, region: &str) -> anyhow::Result<()> {
    println!("{}", "実行計画を作成中...".blue().bold());
    utils::print_targets(config, region);

    let clients = utils::connect(config, region).await;
    let orchestrator = Orchestrator::new(clients, config.to_request(region));

    let plan = match orchestrator.plan().await {
        Ok(plan) => plan,
        Err(e) => {
            utils::print_failure(&e);
            return Err(e.into());
        }
    };

    println!();
    println!("{}", format!("実行計画 ({} 件):", plan.actions.len()).bold());
    for action in &plan.actions {
        utils::print_action(action);
    }

    println!();
    println!("{}", plan.summary().to_string().bold());
    if plan.has_creations {
        println!("実行するには {} を使用してください", "vaultline apply".cyan());
    } else {
        println!("{}", "✓ すべてのリソースが存在します".green());
    }

    Ok(())
}
