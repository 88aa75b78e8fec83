//! CLI commands: `steelgate models` and `steelgate recommend`

use steelgate_llm::{AiGateway, ProviderName, TaskType};

/// Run the models subcommand.
pub fn run(gateway: &AiGateway, provider: Option<ProviderName>) -> anyhow::Result<()> {
    let policy = gateway.policy();
    let providers: Vec<ProviderName> = match provider {
        Some(p) => vec![p],
        None => ProviderName::ALL.to_vec(),
    };

    for provider in providers {
        println!();
        println!("  {provider}");
        println!("  {}", "-".repeat(64));
        for (task, quality, model) in policy.models_for(provider) {
            println!("  {:<15} {:<10} {}", task, quality, model);
        }
        if let Ok(model) = policy.embedding_model(provider) {
            println!("  {:<15} {:<10} {}", TaskType::Embeddings, "-", model);
        }

        let rates = policy.rates_for(provider);
        if !rates.is_empty() {
            println!();
            println!("  {:<32} {:>12} {:>12}", "Model", "In $/1M", "Out $/1M");
            for rate in rates {
                println!(
                    "  {:<32} {:>12.2} {:>12.2}",
                    rate.model, rate.input_per_million, rate.output_per_million
                );
            }
        }
    }
    println!();
    Ok(())
}

/// Run the recommend subcommand.
pub fn recommend(gateway: &AiGateway, task: TaskType) -> anyhow::Result<()> {
    match gateway.recommend(task) {
        Some(rec) => println!("{} / {} ({})", rec.provider, rec.model, rec.reason),
        None => println!("No provider available for task '{task}'"),
    }
    Ok(())
}
